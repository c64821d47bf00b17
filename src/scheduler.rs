//! The dependency-aware task scheduler.
//!
//! [`TaskScheduler::order_and_execute`] takes a FIFO of tasks, builds the
//! dependency graph from their declared accesses, and runs the batch with
//! maximum concurrency consistent with that graph: for any two tasks
//! sharing a resource with at least one write, the earlier-submitted task
//! finishes before the later one starts. Tasks with no shared non-read
//! claims run concurrently.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::diagnostics::{RunDiagnostics, RunReport, RunResult, TaskTiming, TimingReport, explain_conflicts};
use crate::flow::FlowBuilder;
use crate::task::{Task, TaskId};

/// A task failure surfaced at the scheduler's join step.
///
/// Produced when a task's action panics. The panic terminates only that
/// task's work unit; siblings run to completion and the scheduler joins
/// everything before reporting.
#[derive(Debug)]
pub struct TaskError {
    /// Label of the failed task.
    pub task: String,
    /// The panic payload, rendered as text.
    pub message: String,
}

impl TaskError {
    fn from_panic(task: String, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked with a non-string payload".to_string()
        };
        Self { task, message }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task `{}` panicked: {}", self.task, self.message)
    }
}

impl std::error::Error for TaskError {}

/// Completion latch for one graph vertex.
///
/// Signalled exactly once, when the vertex's work unit terminates,
/// whether normally or by panic. Children wait on their parents' gates
/// before running.
struct CompletionGate {
    done: Mutex<bool>,
    signal: Condvar,
}

impl CompletionGate {
    fn new() -> Self {
        Self {
            done: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut done = self.done.lock().unwrap();
        while !*done {
            done = self.signal.wait(done).unwrap();
        }
    }

    fn complete(&self) {
        *self.done.lock().unwrap() = true;
        self.signal.notify_all();
    }
}

/// Completes the gate when dropped, so an unwinding task still releases
/// its children. The dependency is on completion, not success.
struct SignalOnDrop(Arc<CompletionGate>);

impl Drop for SignalOnDrop {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// Orders and executes batches of tasks.
///
/// Stateless between batches; a single scheduler can run any number of
/// FIFOs in sequence.
///
/// # Example
///
/// ```ignore
/// let mut queue = VecDeque::new();
/// queue.push_back(Arc::new(Task::new::<SettleResources>(|| settle())));
/// queue.push_back(Arc::new(Task::new::<AuditResources>(|| audit())));
///
/// let scheduler = TaskScheduler::new();
/// let errors = scheduler.order_and_execute(queue);
/// assert!(errors.is_empty());
/// ```
pub struct TaskScheduler;

impl TaskScheduler {
    /// Creates a scheduler.
    pub fn new() -> Self {
        Self
    }

    /// Runs every task in `queue`, returning when all have completed.
    ///
    /// The returned vector holds one [`TaskError`] per panicked task and
    /// is empty on success.
    pub fn order_and_execute(&self, queue: VecDeque<Arc<Task>>) -> Vec<TaskError> {
        self.order_and_execute_with(queue, &RunDiagnostics::default())
            .errors
    }

    /// Like [`order_and_execute`](Self::order_and_execute), but collects
    /// a diagnostic report per the given [`RunDiagnostics`].
    pub fn order_and_execute_with(
        &self,
        queue: VecDeque<Arc<Task>>,
        diagnostics: &RunDiagnostics,
    ) -> RunResult {
        let run_start = diagnostics.collect_timings.then(Instant::now);

        // Drain the FIFO in submission order; bind each task and issue
        // its claims. A task whose annotation misses the registry binds
        // with zero claims and becomes a free root.
        let mut queue = queue;
        let mut tasks: Vec<Arc<Task>> = Vec::with_capacity(queue.len());
        let mut builder = FlowBuilder::new();
        while let Some(task) = queue.pop_front() {
            let id = TaskId::new(Arc::as_ptr(&task) as u64);
            let before = builder.vertex_count();
            task.register_with(&mut builder, id);
            if builder.vertex_count() > before {
                tasks.push(task);
            }
            // Re-submitting the same Arc re-binds the existing vertex:
            // one vertex, one execution.
        }

        let conflicts = diagnostics.explain_graph.then(|| explain_conflicts(&tasks));

        let graph = builder.graph();
        let vertex_count = graph.vertex_count();

        // One completion gate per vertex, created before any launch, so a
        // child can collect its parents' handles no matter the order in
        // which the working queue is drained.
        let gates: Vec<Arc<CompletionGate>> =
            (0..vertex_count).map(|_| Arc::new(CompletionGate::new())).collect();

        let timings: Arc<Mutex<Vec<TaskTiming>>> = Arc::new(Mutex::new(Vec::new()));
        let mut handles: Vec<Option<JoinHandle<()>>> =
            (0..vertex_count).map(|_| None).collect();

        // Breadth-first from the roots. The reserved set keeps a vertex
        // with several parents from entering the queue more than once.
        let mut reserved = vec![false; vertex_count];
        let mut scheduled = VecDeque::new();
        for root in graph.roots() {
            reserved[root] = true;
            scheduled.push_back(root);
        }

        while let Some(vertex) = scheduled.pop_front() {
            let parents: Vec<Weak<CompletionGate>> = graph
                .in_edges(vertex)
                .map(|parent| Arc::downgrade(&gates[parent]))
                .collect();
            let gate = gates[vertex].clone();
            let task = tasks[vertex].clone();
            let label = diagnostics
                .collect_timings
                .then(|| task.label(vertex));
            let timings_slot = timings.clone();

            let handle = thread::spawn(move || {
                let _signal = SignalOnDrop(gate);
                // A parent that can no longer be upgraded has been fully
                // drained; no wait is required.
                for parent in &parents {
                    if let Some(parent) = parent.upgrade() {
                        parent.wait();
                    }
                }
                let task_start = label.as_ref().map(|_| Instant::now());
                task.run();
                if let (Some(label), Some(start)) = (label, task_start) {
                    timings_slot.lock().unwrap().push(TaskTiming {
                        task: label,
                        duration: start.elapsed(),
                    });
                }
            });
            handles[vertex] = Some(handle);

            for child in graph.out_edges(vertex) {
                if !reserved[child] {
                    reserved[child] = true;
                    scheduled.push_back(child);
                }
            }
        }

        // Join every launched work unit; nothing from this batch outlives
        // the call. Panics surface here as the failure of their handle.
        let mut errors = Vec::new();
        for (vertex, handle) in handles.into_iter().enumerate() {
            if let Some(handle) = handle
                && let Err(payload) = handle.join()
            {
                errors.push(TaskError::from_panic(tasks[vertex].label(vertex), payload));
            }
        }

        let timings = run_start.map(|start| {
            let wall_time = start.elapsed();
            let collected = Arc::into_inner(timings)
                .expect("all worker threads joined")
                .into_inner()
                .unwrap();
            let total_task_time = collected.iter().map(|t| t.duration).sum();
            TimingReport {
                wall_time,
                total_task_time,
                tasks: collected,
            }
        });

        RunResult {
            errors,
            report: RunReport { conflicts, timings },
        }
    }

    /// Runs every task on the calling thread, in submission order.
    ///
    /// Submission order is compatible with every graph edge (edges always
    /// point from an earlier submission to a later one), so this gives the
    /// same per-resource ordering guarantees as
    /// [`order_and_execute`](Self::order_and_execute) with no concurrency.
    /// Useful for debugging and deterministic tests.
    pub fn order_and_execute_sequential(&self, queue: VecDeque<Arc<Task>>) -> Vec<TaskError> {
        let mut errors = Vec::new();
        for (index, task) in queue.into_iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.run()));
            if let Err(payload) = result {
                errors.push(TaskError::from_panic(task.label(index), payload));
            }
        }
        errors
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}
