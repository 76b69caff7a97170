use os_model::mem::{BlockState, MemoryCore, PlacementPolicy};
use os_model::sched::{DispatchPolicy, ProcessSpec, SchedulerCore};
use proptest::prelude::*;

const TOTAL: u64 = 256;

#[derive(Debug, Clone)]
enum MemOp {
    Allocate { pid: u8, size: u64 },
    Deallocate { pid: u8 },
}

fn mem_op() -> impl Strategy<Value = MemOp> {
    prop_oneof![
        (0u8..6, 1u64..64).prop_map(|(pid, size)| MemOp::Allocate { pid, size }),
        (0u8..6).prop_map(|pid| MemOp::Deallocate { pid }),
    ]
}

fn placement() -> impl Strategy<Value = PlacementPolicy> {
    prop_oneof![
        Just(PlacementPolicy::FirstFit),
        Just(PlacementPolicy::BestFit),
        Just(PlacementPolicy::WorstFit),
    ]
}

fn dispatch() -> impl Strategy<Value = DispatchPolicy> {
    prop_oneof![
        Just(DispatchPolicy::Fcfs),
        Just(DispatchPolicy::Sjf),
        Just(DispatchPolicy::Srtf),
        Just(DispatchPolicy::Priority),
        (1u64..5).prop_map(|quantum| DispatchPolicy::RoundRobin { quantum }),
    ]
}

fn process_set() -> impl Strategy<Value = Vec<ProcessSpec>> {
    proptest::collection::vec((0u64..12, 1u64..8, -4i64..5), 1..8).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (arrival, burst, priority))| {
                ProcessSpec::new(format!("p{i}"), format!("P{i}"), arrival, burst, priority)
            })
            .collect()
    })
}

proptest! {
    /// Every reachable memory state partitions [0, TOTAL) in address order,
    /// and no two adjacent FREE blocks survive any operation.
    #[test]
    fn block_set_always_partitions_memory(
        policy in placement(),
        ops in proptest::collection::vec(mem_op(), 0..40),
    ) {
        let mut core = MemoryCore::new(policy, TOTAL).unwrap();
        for op in ops {
            match op {
                MemOp::Allocate { pid, size } => {
                    let _ = core.allocate(format!("p{pid}"), size).unwrap();
                }
                MemOp::Deallocate { pid } => {
                    let _ = core.deallocate(&format!("p{pid}"));
                }
            }

            let blocks = core.block_list();
            let mut next = 0;
            for block in &blocks {
                prop_assert_eq!(block.start, next, "gap or overlap at {}", next);
                prop_assert!(block.size > 0);
                next = block.start + block.size;
            }
            prop_assert_eq!(next, TOTAL);

            for pair in blocks.windows(2) {
                prop_assert!(
                    pair[0].state != BlockState::Free || pair[1].state != BlockState::Free,
                    "adjacent free blocks at {} and {}",
                    pair[0].start,
                    pair[1].start
                );
            }
        }
    }

    /// Freeing everything returns memory to a single FREE block.
    #[test]
    fn freeing_all_owners_restores_one_block(
        policy in placement(),
        ops in proptest::collection::vec(mem_op(), 1..30),
    ) {
        let mut core = MemoryCore::new(policy, TOTAL).unwrap();
        for op in &ops {
            if let MemOp::Allocate { pid, size } = op {
                let _ = core.allocate(format!("p{pid}"), *size).unwrap();
            }
        }
        for pid in 0..6u8 {
            let _ = core.deallocate(&format!("p{pid}"));
        }

        let blocks = core.block_list();
        prop_assert_eq!(blocks.len(), 1);
        prop_assert_eq!(blocks[0].size, TOTAL);
        prop_assert_eq!(blocks[0].state, BlockState::Free);
    }

    /// Every policy runs every process to completion, executes each for
    /// exactly its burst, and upholds the timing identities.
    #[test]
    fn every_run_conserves_bursts_and_timing(
        policy in dispatch(),
        specs in process_set(),
    ) {
        let mut core = SchedulerCore::new(policy).unwrap();
        core.initialize(specs.clone()).unwrap();
        let result = core.run_full_simulation();

        prop_assert!(core.is_finished());
        prop_assert_eq!(result.processes.len(), specs.len());

        for spec in &specs {
            let executed = result
                .timeline
                .iter()
                .filter(|slot| slot.process_id.as_deref() == Some(spec.id.as_str()))
                .count() as u64;
            prop_assert_eq!(executed, spec.burst_time, "burst mismatch for {}", &spec.id);
        }

        for proc in &result.processes {
            let finish = proc.finish_time.unwrap();
            prop_assert!(proc.start_time.unwrap() >= proc.arrival_time);
            prop_assert_eq!(proc.turnaround_time, finish - proc.arrival_time);
            prop_assert_eq!(proc.waiting_time, proc.turnaround_time - proc.burst_time);
            let run_ticks: u64 = proc.slices.iter().map(|(s, e)| e - s).sum();
            prop_assert_eq!(run_ticks, proc.burst_time);
        }
    }

    /// Re-running a fresh initialization of the same input reproduces the
    /// timeline and statistics bit for bit.
    #[test]
    fn repeated_runs_are_identical(
        policy in dispatch(),
        specs in process_set(),
    ) {
        let mut core = SchedulerCore::new(policy).unwrap();
        core.initialize(specs).unwrap();
        let first = core.run_full_simulation();
        let second = core.run_full_simulation();
        prop_assert_eq!(first, second);
    }
}
