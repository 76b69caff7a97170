use super::state::{Process, ReadyQueue, SchedCtx, SortKey};
use crate::Ticks;
use crate::error::InputError;
use tracing::debug;

pub const DEFAULT_QUANTUM: Ticks = 2;

/// Closed set of dispatch policies. The driver holds the active variant and
/// calls [`DispatchPolicy::select_next`] once per tick; policies differ only
/// in selection and preemption rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// First-Come, First-Served: non-preemptive, earliest arrival first.
    Fcfs,
    /// Shortest Job First: non-preemptive, smallest burst time first.
    Sjf,
    /// Shortest Remaining Time First: preemptive SJF, re-evaluated every tick.
    Srtf,
    /// Non-preemptive priority scheduling, lower value = higher priority.
    Priority,
    /// Time-sharing with forced preemption once `quantum` consecutive ticks
    /// have been consumed.
    RoundRobin { quantum: Ticks },
}

impl DispatchPolicy {
    /// Round Robin with the default quantum of 2.
    pub fn round_robin() -> Self {
        Self::RoundRobin {
            quantum: DEFAULT_QUANTUM,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), InputError> {
        match self {
            Self::RoundRobin { quantum: 0 } => Err(InputError::ZeroQuantum),
            _ => Ok(()),
        }
    }

    /// Queue shape this policy dispatches from.
    pub(crate) fn ready_queue(&self) -> ReadyQueue {
        match self {
            Self::Fcfs | Self::RoundRobin { .. } => ReadyQueue::new_fifo(),
            Self::Sjf | Self::Srtf | Self::Priority => ReadyQueue::new_keyed(),
        }
    }

    /// Selection key for the key-ordered variants; ties break on arrival
    /// time, then admission order.
    pub(crate) fn sort_key(&self, proc: &Process) -> Option<SortKey> {
        let primary = match self {
            Self::Fcfs | Self::RoundRobin { .. } => return None,
            Self::Sjf => proc.burst_time as i64,
            Self::Srtf => proc.remaining_time as i64,
            Self::Priority => proc.priority,
        };
        Some(SortKey {
            primary,
            arrival: proc.arrival_time,
            seq: proc.seq,
        })
    }

    /// Decide who owns the CPU for the coming tick. May keep the incumbent,
    /// preempt it back into the ready queue, or dispatch a new process.
    pub(crate) fn select_next(&self, ctx: &mut SchedCtx) {
        match self {
            Self::Fcfs | Self::Sjf | Self::Priority => {
                if ctx.running.is_none() {
                    if let Some(slot) = ctx.ready.pop() {
                        ctx.set_running(slot);
                        debug!(pid = %ctx.proc(slot).id, now = ctx.now, "dispatch");
                    }
                }
            }
            Self::Srtf => {
                // Requeue the incumbent, then pick the smallest remaining time
                // among everyone ready.
                if let Some(slot) = ctx.running.take() {
                    ctx.mark_ready(slot);
                    let key = self.sort_key(ctx.proc(slot));
                    ctx.ready.push(slot, key);
                }
                if let Some(slot) = ctx.ready.pop() {
                    ctx.set_running(slot);
                }
            }
            Self::RoundRobin { quantum } => {
                if let Some(slot) = ctx.running {
                    if ctx.quantum_used < *quantum {
                        return;
                    }
                    ctx.running = None;
                    ctx.mark_ready(slot);
                    ctx.ready.push(slot, None);
                    debug!(pid = %ctx.proc(slot).id, now = ctx.now, "quantum expired");
                }
                if let Some(slot) = ctx.ready.pop() {
                    ctx.set_running(slot);
                    ctx.quantum_used = 0;
                    debug!(pid = %ctx.proc(slot).id, now = ctx.now, "dispatch");
                }
            }
        }
    }
}
