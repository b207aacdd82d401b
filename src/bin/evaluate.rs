use augury::*;
use rand::prelude::*;
use std::env;

/// One event in a synthetic instruction stream.
enum Event {
    Conditional { pc: usize, outcome: Outcome },
    Unconditional { pc: usize },
}

/// Build a synthetic workload with a mix of branch behaviors: a heavily
/// biased branch, two branches correlated with it through history, a
/// coin-flip branch, an occasional unconditional jump, and a loop
/// backedge that falls through every 16th round.
fn synthesize(rng: &mut ThreadRng, rounds: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for i in 0..rounds {
        let lead = rng.gen_bool(0.9);
        events.push(Event::Conditional {
            pc: 0x1000,
            outcome: lead.into(),
        });
        events.push(Event::Conditional {
            pc: 0x1010,
            outcome: lead.into(),
        });
        events.push(Event::Conditional {
            pc: 0x1020,
            outcome: (!lead).into(),
        });
        if rng.gen_bool(0.2) {
            events.push(Event::Unconditional { pc: 0x1030 });
        }
        events.push(Event::Conditional {
            pc: 0x1040,
            outcome: rng.gen_bool(0.5).into(),
        });
        events.push(Event::Conditional {
            pc: 0x1050,
            outcome: (i % 16 != 15).into(),
        });
    }
    events
}

/// Drive a predictor through the full prediction protocol. This models
/// an in-order machine: a wrong guess squashes the speculative path, so
/// the resolving call also rolls the history back.
fn run<P: BranchPredictor>(bp: &mut P, events: &[Event]) -> BranchStats {
    let mut stats = BranchStats::new();
    for event in events {
        match event {
            Event::Conditional { pc, outcome } => {
                let (guess, record) = bp.predict(*pc);
                bp.resolve(*pc, *outcome, Some(record), guess != *outcome);
                stats.update(*pc, guess, *outcome);
            }
            Event::Unconditional { pc } => {
                let record = bp.predict_unconditional();
                bp.resolve(*pc, Outcome::T, Some(record), false);
            }
        }
    }
    stats
}

fn report(name: &str, stats: &BranchStats) {
    println!(
        "[*] {}: {}/{} ({:.2}% correct) ({} misses)",
        name,
        stats.global_hits,
        stats.global_brns,
        stats.hit_rate() * 100.0,
        stats.global_miss()
    );
    println!(
        "[*] {} unique branches ({} always taken, {} never taken)",
        stats.num_unique_branches(),
        stats.num_always_taken(),
        stats.num_never_taken()
    );
    println!("[*] Most common:");
    for (pc, data) in stats.most_common(3) {
        println!(
            "      {:#06x}: {:6} occurrences, {:6} taken, {:.2}% correct",
            pc,
            data.occ,
            data.times_taken(),
            data.hit_rate() * 100.0
        );
    }
    println!("[*] Worst predicted:");
    for (pc, data) in stats.worst_predicted(3) {
        println!(
            "      {:#06x}: {:6} occurrences, {:6} taken, {:.2}% correct",
            pc,
            data.occ,
            data.times_taken(),
            data.hit_rate() * 100.0
        );
    }
}

fn main() {
    env_logger::init();

    let rounds = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let mut rng = rand::thread_rng();
    let events = synthesize(&mut rng, rounds);
    println!("[*] Synthesized {} branch events", events.len());

    let mut gshare = GshareConfig {
        table_size: 4096,
        ctr_bits: 2,
        inst_shift_amt: 2,
    }
    .build()
    .unwrap();
    println!("[*] gshare storage: {} bits", gshare.config().storage_bits());
    let stats = run(&mut gshare, &events);
    report(gshare.name(), &stats);

    let mut yags = YagsConfig {
        choice_size: 4096,
        choice_ctr_bits: 2,
        global_size: 4096,
        global_ctr_bits: 2,
        inst_shift_amt: 2,
        tag_bits: 8,
        associativity: 2,
    }
    .build()
    .unwrap();
    println!("[*] yags storage: {} bits", yags.config().storage_bits());
    let stats = run(&mut yags, &events);
    report(yags.name(), &stats);
}
