use os_model::mem::{self, MemoryCore, PlacementPolicy};
use os_model::sched::{DispatchPolicy, ProcessSpec, SchedulerCore};
use rand::prelude::*;

fn main() -> Result<(), os_model::InputError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let specs = bernoulli_processes(40, 0.25, 1, 8, 0);
    println!("{} processes generated", specs.len());

    let policies = [
        DispatchPolicy::Fcfs,
        DispatchPolicy::Sjf,
        DispatchPolicy::Srtf,
        DispatchPolicy::Priority,
        DispatchPolicy::round_robin(),
    ];
    for policy in policies {
        let mut core = SchedulerCore::new(policy)?;
        core.initialize(specs.clone())?;
        let result = core.run_full_simulation();
        println!(
            "{policy:?}: avg wait {:.2} ticks, avg turnaround {:.2} ticks, throughput {:.3}/tick",
            result.stats.average_waiting_time,
            result.stats.average_turnaround_time,
            result.stats.throughput,
        );
    }

    for policy in [
        PlacementPolicy::FirstFit,
        PlacementPolicy::BestFit,
        PlacementPolicy::WorstFit,
    ] {
        let mut core = MemoryCore::new(policy, 1024)?;
        drive_memory_trace(&mut core, 0)?;
        let blocks = core.block_list();
        println!(
            "{policy:?}: {} blocks, {:.1}% utilized, external fragmentation {} units",
            blocks.len(),
            mem::utilization(&blocks),
            mem::external_fragmentation(&blocks),
        );
    }

    Ok(())
}

fn bernoulli_processes(
    ticks: u64,
    p_arrival: f64,
    short_burst: u64,
    long_burst: u64,
    seed: u64,
) -> Vec<ProcessSpec> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut specs = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let n = specs.len();
            specs.push(ProcessSpec::new(
                format!("p{n}"),
                format!("P{n}"),
                t,
                rng.random_range(short_burst..=long_burst),
                rng.random_range(0..10),
            ));
        }
    }

    specs
}

fn drive_memory_trace(core: &mut MemoryCore, seed: u64) -> Result<(), os_model::InputError> {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..60 {
        let process = format!("p{}", rng.random_range(0..8));
        if rng.random::<f64>() < 0.7 {
            let _ = core.allocate(process, rng.random_range(8..96))?;
        } else {
            let _ = core.deallocate(&process);
        }
    }
    Ok(())
}
