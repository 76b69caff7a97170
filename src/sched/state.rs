use crate::{ProcessId, Ticks};
use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

// Index into the working process table
pub type Slot = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Completed,
}

/// Caller-facing description of one process to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub id: ProcessId,
    pub name: String,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    /// Lower value = higher priority.
    pub priority: i64,
}

impl ProcessSpec {
    pub fn new(
        id: impl Into<ProcessId>,
        name: impl Into<String>,
        arrival_time: Ticks,
        burst_time: Ticks,
        priority: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arrival_time,
            burst_time,
            priority,
        }
    }
}

/// Working copy of a process inside the engine. The caller's `ProcessSpec`s
/// are never mutated; snapshots hand back clones of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub priority: i64,
    pub state: ProcessState,
    pub remaining_time: Ticks,
    pub start_time: Option<Ticks>,
    pub finish_time: Option<Ticks>,
    pub waiting_time: Ticks,
    pub turnaround_time: Ticks,
    /// Half-open [start, end) runs of consecutive execution ticks.
    pub slices: Vec<(Ticks, Ticks)>,
    // Admission order, assigned when the process first turns Ready.
    pub(crate) seq: u64,
}

impl Process {
    pub(crate) fn from_spec(spec: &ProcessSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            arrival_time: spec.arrival_time,
            burst_time: spec.burst_time,
            priority: spec.priority,
            state: ProcessState::New,
            remaining_time: spec.burst_time,
            start_time: None,
            finish_time: None,
            waiting_time: 0,
            turnaround_time: 0,
            slices: Vec::new(),
            seq: 0,
        }
    }

    /// Record one executed tick, extending the current slice if contiguous.
    pub(crate) fn record_slice(&mut self, now: Ticks) {
        match self.slices.last_mut() {
            Some(last) if last.1 == now => last.1 = now + 1,
            _ => self.slices.push((now, now + 1)),
        }
    }
}

/// One virtual tick of the dispatch timeline. `process_id == None` denotes
/// an idle tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSlot {
    pub time: Ticks,
    pub process_id: Option<ProcessId>,
    pub process_name: String,
}

impl TimelineSlot {
    pub(crate) fn idle(time: Ticks) -> Self {
        Self {
            time,
            process_id: None,
            process_name: "Idle".to_string(),
        }
    }
}

/// Selection key for the key-ordered ready queue variants. Lexicographic on
/// (primary, arrival, seq); the primary component is the policy's criterion
/// (burst, remaining, or priority).
// KeyedPriorityQueue is a max-heap, so we need to flip-flop SortKey's Ord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub primary: i64,
    pub arrival: Ticks,
    pub seq: u64,
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (other.primary, other.arrival, other.seq).cmp(&(self.primary, self.arrival, self.seq))
    }
}

/// Ready queue with the ordering the active policy asked for: plain FIFO for
/// FCFS/Round-Robin, key-ordered for SJF/SRTF/Priority.
#[derive(Debug)]
pub enum ReadyQueue {
    Fifo { slots: VecDeque<Slot> },
    Keyed { slots: KeyedPriorityQueue<Slot, SortKey> },
}

impl ReadyQueue {
    pub fn new_fifo() -> Self {
        Self::Fifo {
            slots: VecDeque::new(),
        }
    }

    pub fn new_keyed() -> Self {
        Self::Keyed {
            slots: KeyedPriorityQueue::new(),
        }
    }

    pub fn push(&mut self, slot: Slot, key: Option<SortKey>) {
        match self {
            Self::Fifo { slots } => slots.push_back(slot),
            Self::Keyed { slots } => {
                slots.push(slot, key.expect("Attempted to push to a keyed queue with no key"));
            }
        }
    }

    pub fn pop(&mut self) -> Option<Slot> {
        match self {
            Self::Fifo { slots } => slots.pop_front(),
            Self::Keyed { slots } => slots.pop().map(|s| s.0),
        }
    }

    pub fn contains(&self, slot: Slot) -> bool {
        match self {
            Self::Fifo { slots } => slots.contains(&slot),
            Self::Keyed { slots } => slots.iter().any(|s| *s.0 == slot),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { slots } => slots.len(),
            Self::Keyed { slots } => slots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutable scheduling state shared between the driver and the policy hook.
#[derive(Debug)]
pub struct SchedCtx {
    pub now: Ticks,
    pub(crate) procs: Vec<Process>,
    pub(crate) index: FxHashMap<ProcessId, Slot>,
    pub(crate) ready: ReadyQueue,
    pub(crate) running: Option<Slot>,
    // Consecutive ticks the running process has held the CPU (Round Robin)
    pub(crate) quantum_used: Ticks,
    next_seq: u64,
}

impl SchedCtx {
    pub(crate) fn new(ready: ReadyQueue) -> Self {
        Self {
            now: 0,
            procs: Vec::new(),
            index: FxHashMap::default(),
            ready,
            running: None,
            quantum_used: 0,
            next_seq: 0,
        }
    }

    pub(crate) fn admit(&mut self, spec: &ProcessSpec) -> Slot {
        let slot = self.procs.len();
        self.procs.push(Process::from_spec(spec));
        self.index.insert(spec.id.clone(), slot);
        slot
    }

    pub fn proc(&self, slot: Slot) -> &Process {
        &self.procs[slot]
    }

    pub fn proc_mut(&mut self, slot: Slot) -> &mut Process {
        &mut self.procs[slot]
    }

    pub fn procs(&self) -> &[Process] {
        &self.procs
    }

    pub fn lookup(&self, id: &str) -> Option<&Process> {
        self.index.get(id).map(|&slot| &self.procs[slot])
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub(crate) fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub(crate) fn mark_ready(&mut self, slot: Slot) {
        let proc = self.proc_mut(slot);
        debug_assert!(
            proc.state != ProcessState::Completed,
            "Completed process {} cannot turn ready",
            proc.id
        );
        proc.state = ProcessState::Ready;
    }

    pub(crate) fn set_running(&mut self, slot: Slot) {
        debug_assert!(
            !self.ready.contains(slot),
            "Running process must not stay enqueued"
        );
        debug_assert!(self.running.is_none(), "CPU already running a process");

        self.running = Some(slot);
        self.proc_mut(slot).state = ProcessState::Running;
    }

    pub(crate) fn mark_completed(&mut self, slot: Slot, finish: Ticks) {
        let proc = &mut self.procs[slot];
        debug_assert_eq!(
            proc.state,
            ProcessState::Running,
            "Process {} must have been running before completion",
            proc.id
        );
        debug_assert_eq!(proc.remaining_time, 0);

        proc.state = ProcessState::Completed;
        proc.finish_time = Some(finish);
        proc.turnaround_time = finish - proc.arrival_time;
        // The aged counter and the closed-form identity must agree.
        debug_assert_eq!(
            proc.waiting_time,
            proc.turnaround_time - proc.burst_time,
            "Aged waiting time diverged for {}",
            proc.id
        );
        proc.waiting_time = proc.turnaround_time - proc.burst_time;
    }

    pub fn all_completed(&self) -> bool {
        self.procs
            .iter()
            .all(|p| p.state == ProcessState::Completed)
    }

    /// Nothing ready, nothing running, and every incomplete process arrives
    /// strictly in the future.
    pub fn idle_before_remaining_arrivals(&self) -> bool {
        self.ready.is_empty()
            && self.running.is_none()
            && self
                .procs
                .iter()
                .all(|p| p.state == ProcessState::Completed || p.arrival_time > self.now)
    }
}
