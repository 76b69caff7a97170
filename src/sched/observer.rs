use super::state::{ProcessState, SchedCtx, TimelineSlot};

/// Debug-build invariant sweep, run after every step.
#[derive(Debug)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn observe(&mut self, ctx: &SchedCtx, timeline: &[TimelineSlot]) {
        self.step += 1;

        debug_assert_eq!(
            timeline.len() as u64,
            ctx.now,
            "step {}: timeline must carry exactly one record per elapsed tick",
            self.step
        );

        if let Some(slot) = ctx.running {
            debug_assert_eq!(
                ctx.proc(slot).state,
                ProcessState::Running,
                "running slot holds process {} in a non-running state",
                ctx.proc(slot).id
            );
        }

        for (slot, proc) in ctx.procs().iter().enumerate() {
            debug_assert!(
                proc.remaining_time <= proc.burst_time,
                "process {} consumed more than its burst",
                proc.id
            );
            match proc.state {
                ProcessState::Ready => debug_assert!(
                    ctx.ready.contains(slot),
                    "ready process {} missing from the ready queue",
                    proc.id
                ),
                ProcessState::Running => debug_assert_eq!(
                    ctx.running,
                    Some(slot),
                    "running process {} not in the running slot",
                    proc.id
                ),
                ProcessState::Completed => {
                    debug_assert_eq!(proc.remaining_time, 0);
                    debug_assert!(
                        proc.finish_time.is_some(),
                        "completed process {} has no finish time",
                        proc.id
                    );
                    debug_assert!(
                        !ctx.ready.contains(slot),
                        "completed process {} still enqueued",
                        proc.id
                    );
                }
                ProcessState::New | ProcessState::Waiting => {}
            }
        }
    }
}
