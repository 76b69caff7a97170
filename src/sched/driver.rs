use super::observer::Observer;
use super::policy::DispatchPolicy;
use super::state::{Process, ProcessSpec, ProcessState, SchedCtx, TimelineSlot};
use crate::error::InputError;
use crate::Ticks;
use average::{Estimate, Mean};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Aggregate timing statistics over the completed set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchedStats {
    pub average_turnaround_time: f64,
    pub average_waiting_time: f64,
    /// Completed processes per elapsed virtual tick.
    pub throughput: f64,
}

/// Everything a caller needs to render one finished (or in-flight) run.
/// Every field is an independent clone of engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub timeline: Vec<TimelineSlot>,
    pub processes: Vec<Process>,
    pub stats: SchedStats,
}

/// Time-stepped scheduling state machine. One instance owns one simulation;
/// callers drive it with [`SchedulerCore::step`] or
/// [`SchedulerCore::run_full_simulation`] and read back cloned snapshots.
pub struct SchedulerCore {
    policy: DispatchPolicy,
    specs: Vec<ProcessSpec>,
    ctx: SchedCtx,
    timeline: Vec<TimelineSlot>,
    finished: bool,
    observer: Observer,
}

impl SchedulerCore {
    pub fn new(policy: DispatchPolicy) -> Result<Self, InputError> {
        policy.validate()?;
        Ok(Self {
            policy,
            specs: Vec::new(),
            ctx: SchedCtx::new(policy.ready_queue()),
            timeline: Vec::new(),
            finished: true,
            observer: Observer::new(),
        })
    }

    /// Validate and take a working copy of the input, resetting all engine
    /// state back to time zero. The caller's specs are never mutated.
    pub fn initialize(&mut self, specs: Vec<ProcessSpec>) -> Result<(), InputError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.burst_time == 0 {
                return Err(InputError::ZeroBurst {
                    id: spec.id.clone(),
                });
            }
            if !seen.insert(spec.id.clone()) {
                return Err(InputError::DuplicateProcess {
                    id: spec.id.clone(),
                });
            }
        }
        self.specs = specs;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.ctx = SchedCtx::new(self.policy.ready_queue());
        for spec in &self.specs {
            let _ = self.ctx.admit(spec);
        }
        self.timeline.clear();
        self.finished = self.ctx.all_completed();
        self.observer = Observer::new();
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Working copy of one process, looked up by id.
    pub fn process(&self, id: &str) -> Option<&Process> {
        self.ctx.lookup(id)
    }

    /// Strict completion: every known process has reached COMPLETED.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Observational idle predicate: true when nothing is ready, nothing is
    /// running, and every incomplete process arrives strictly in the future.
    /// Agrees with
    /// [`SchedulerCore::is_finished`] on gap-free inputs.
    pub fn out_of_work(&self) -> bool {
        self.ctx.all_completed() || self.ctx.idle_before_remaining_arrivals()
    }

    /// Advance the simulation by one tick: admission, dispatch, execution,
    /// aging, then time advance. Returns false as a no-op once finished.
    pub fn step(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.admit_arrivals();
        self.policy.select_next(&mut self.ctx);
        self.execute();
        self.finished = self.ctx.all_completed();
        self.observer.observe(&self.ctx, &self.timeline);
        true
    }

    fn admit_arrivals(&mut self) {
        let now = self.ctx.now;
        for slot in 0..self.ctx.procs().len() {
            let proc = self.ctx.proc(slot);
            if proc.state != ProcessState::New || proc.arrival_time > now {
                continue;
            }
            let seq = self.ctx.next_seq();
            self.ctx.proc_mut(slot).seq = seq;
            self.ctx.mark_ready(slot);
            let key = self.policy.sort_key(self.ctx.proc(slot));
            self.ctx.ready.push(slot, key);
            trace!(pid = %self.ctx.proc(slot).id, now, "admitted");
        }
    }

    fn execute(&mut self) {
        let now = self.ctx.now;
        match self.ctx.running {
            Some(slot) => {
                let proc = self.ctx.proc_mut(slot);
                self.timeline.push(TimelineSlot {
                    time: now,
                    process_id: Some(proc.id.clone()),
                    process_name: proc.name.clone(),
                });
                if proc.start_time.is_none() {
                    proc.start_time = Some(now);
                }
                proc.record_slice(now);
                proc.remaining_time -= 1;

                if proc.remaining_time == 0 {
                    self.ctx.mark_completed(slot, now + 1);
                    self.ctx.running = None;
                    debug!(pid = %self.ctx.proc(slot).id, finish = now + 1, "completed");
                } else {
                    self.ctx.quantum_used += 1;
                }
            }
            None => self.timeline.push(TimelineSlot::idle(now)),
        }

        // Age everyone still sitting in the ready state.
        for slot in 0..self.ctx.procs().len() {
            if self.ctx.proc(slot).state == ProcessState::Ready {
                self.ctx.proc_mut(slot).waiting_time += 1;
            }
        }

        self.ctx.advance_time(1);
    }

    /// Re-initialize from the retained input and run to completion. The step
    /// loop is capped at the exact worst case (latest arrival plus total
    /// burst) as a guard against a driver bug; valid inputs always finish
    /// within it.
    pub fn run_full_simulation(&mut self) -> SimulationResult {
        self.reset();
        let cap = self
            .specs
            .iter()
            .map(|s| s.arrival_time)
            .max()
            .unwrap_or(0)
            + self.specs.iter().map(|s| s.burst_time).sum::<Ticks>()
            + 1;
        for _ in 0..cap {
            if !self.step() {
                break;
            }
        }
        self.snapshot()
    }

    /// Cloned view of the current timeline, process set, and statistics.
    pub fn snapshot(&self) -> SimulationResult {
        SimulationResult {
            timeline: self.timeline.clone(),
            processes: self.ctx.procs().to_vec(),
            stats: self.calculate_stats(),
        }
    }

    fn calculate_stats(&self) -> SchedStats {
        let completed: Vec<&Process> = self
            .ctx
            .procs()
            .iter()
            .filter(|p| p.state == ProcessState::Completed)
            .collect();
        if completed.is_empty() || self.ctx.now == 0 {
            return SchedStats::default();
        }

        let turnaround: Mean = completed
            .iter()
            .map(|p| p.turnaround_time as f64)
            .collect();
        let waiting: Mean = completed.iter().map(|p| p.waiting_time as f64).collect();

        SchedStats {
            average_turnaround_time: turnaround.estimate(),
            average_waiting_time: waiting.estimate(),
            throughput: completed.len() as f64 / self.ctx.now as f64,
        }
    }
}
