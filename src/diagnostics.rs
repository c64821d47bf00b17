//! Opt-in diagnostics for scheduler runs.
//!
//! Pass a [`RunDiagnostics`] to
//! [`order_and_execute_with`](crate::TaskScheduler::order_and_execute_with)
//! to collect a per-run report. Everything defaults to off and costs
//! nothing when disabled.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::access::ResourceAccess;
use crate::scheduler::TaskError;
use crate::task::Task;

/// Configuration for what diagnostic data to collect during a run.
#[derive(Debug, Clone, Default)]
pub struct RunDiagnostics {
    /// Record which task pairs conflict on which resources (the origin of
    /// every graph edge).
    pub explain_graph: bool,
    /// Record per-task wall-clock timing.
    pub collect_timings: bool,
}

/// Result of a single scheduler run: execution errors plus the report.
#[derive(Debug)]
pub struct RunResult {
    /// Errors from task execution (panics), empty on success.
    pub errors: Vec<TaskError>,
    /// Diagnostic report, populated per [`RunDiagnostics`].
    pub report: RunReport,
}

/// Diagnostic report from a single run.
///
/// Fields are `None` when the corresponding collection was not requested.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Conflicting task pairs, in submission order.
    pub conflicts: Option<Vec<ConflictInfo>>,
    /// Timing data.
    pub timings: Option<TimingReport>,
}

/// Two tasks ordered by the scheduler because of overlapping claims.
#[derive(Debug)]
pub struct ConflictInfo {
    /// Label of the earlier-submitted task.
    pub earlier: String,
    /// Label of the later-submitted task.
    pub later: String,
    /// The shared resources that forced the ordering.
    pub resources: Vec<ResourceConflict>,
}

/// A single shared resource between two conflicting tasks.
#[derive(Debug)]
pub struct ResourceConflict {
    /// Display name of the resource (`Owner::member`).
    pub resource: String,
    /// Whether the earlier task writes it.
    pub earlier_writes: bool,
    /// Whether the later task writes it.
    pub later_writes: bool,
}

/// Timing data from a single run.
#[derive(Debug)]
pub struct TimingReport {
    /// Wall-clock time for the entire run, including graph construction.
    pub wall_time: Duration,
    /// Sum of task execution durations across all threads.
    pub total_task_time: Duration,
    /// Per-task timing, in completion order.
    pub tasks: Vec<TaskTiming>,
}

/// Timing for one task execution.
#[derive(Debug)]
pub struct TaskTiming {
    /// Task label.
    pub task: String,
    /// Execution duration, excluding the wait for parents.
    pub duration: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(conflicts) = &self.conflicts {
            if conflicts.is_empty() {
                writeln!(f, "No resource conflicts; all tasks independent.")?;
            } else {
                writeln!(f, "Ordered pairs ({}):", conflicts.len())?;
                for c in conflicts {
                    writeln!(f, "  {c}")?;
                }
            }
        }
        if let Some(timings) = &self.timings {
            writeln!(
                f,
                "Timing: {:.2?} wall, {:.2?} total task time",
                timings.wall_time, timings.total_task_time,
            )?;
            for t in &timings.tasks {
                writeln!(f, "  {}: {:.2?}", t.task, t.duration)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: ", self.earlier, self.later)?;
        for (i, r) in self.resources.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let earlier = if r.earlier_writes { "write" } else { "read" };
            let later = if r.later_writes { "write" } else { "read" };
            write!(f, "{} ({earlier}/{later})", r.resource)?;
        }
        Ok(())
    }
}

/// Finds every conflicting task pair, i.e. the origin of every edge the
/// flow builder creates for this batch.
pub(crate) fn explain_conflicts(tasks: &[Arc<Task>]) -> Vec<ConflictInfo> {
    let accesses: Vec<Vec<ResourceAccess>> = tasks.iter().map(|t| t.access_list()).collect();
    let mut conflicts = Vec::new();
    for i in 0..tasks.len() {
        for j in (i + 1)..tasks.len() {
            let resources = find_conflicts(&accesses[i], &accesses[j]);
            if !resources.is_empty() {
                conflicts.push(ConflictInfo {
                    earlier: tasks[i].label(i),
                    later: tasks[j].label(j),
                    resources,
                });
            }
        }
    }
    conflicts
}

fn find_conflicts(a: &[ResourceAccess], b: &[ResourceAccess]) -> Vec<ResourceConflict> {
    let mut out = Vec::new();
    for ai in a {
        for bi in b {
            if ai.id == bi.id && (ai.is_write() || bi.is_write()) {
                out.push(ResourceConflict {
                    resource: ai.id.to_string(),
                    earlier_writes: ai.is_write(),
                    later_writes: bi.is_write(),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Read, Write};
    use crate::registry::register;

    struct Meter {
        _level: u32,
        _unit: String,
    }

    crate::members! {
        struct MeterLevel: Meter { _level: u32 }
        struct MeterUnit: Meter { _unit: String }
    }

    crate::annotation! {
        struct Calibrate => (Write<MeterLevel>, Read<MeterUnit>);
        struct Sample => (Read<MeterLevel>,);
        struct Relabel => (Write<MeterUnit>,);
    }

    #[test]
    fn conflicting_pair_is_reported() {
        register::<Calibrate>();
        register::<Sample>();
        let tasks = vec![
            Arc::new(Task::named::<Calibrate>("calibrate", || {})),
            Arc::new(Task::named::<Sample>("sample", || {})),
        ];
        let conflicts = explain_conflicts(&tasks);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].earlier, "calibrate");
        assert_eq!(conflicts[0].later, "sample");
        assert_eq!(conflicts[0].resources.len(), 1);
        assert!(conflicts[0].resources[0].earlier_writes);
        assert!(!conflicts[0].resources[0].later_writes);
    }

    #[test]
    fn independent_tasks_report_nothing() {
        register::<Sample>();
        register::<Relabel>();
        let tasks = vec![
            Arc::new(Task::new::<Sample>(|| {})),
            Arc::new(Task::new::<Relabel>(|| {})),
        ];
        assert!(explain_conflicts(&tasks).is_empty());
    }

    #[test]
    fn conflict_display_names_modes() {
        let info = ConflictInfo {
            earlier: "a".into(),
            later: "b".into(),
            resources: vec![ResourceConflict {
                resource: "Meter::level".into(),
                earlier_writes: true,
                later_writes: false,
            }],
        };
        assert_eq!(info.to_string(), "a -> b: Meter::level (write/read)");
    }

    #[test]
    fn empty_report_displays_nothing() {
        let report = RunReport::default();
        assert!(report.to_string().is_empty());
    }
}
