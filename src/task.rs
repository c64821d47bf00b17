//! Tasks: a one-shot action paired with its resource annotation.

use std::fmt;
use std::sync::Mutex;

use crate::access::{AccessMode, ResourceAccess};
use crate::annotation::Annotation;
use crate::flow::FlowBuilder;
use crate::visitor::{ErasedAnnotation, visit};

/// Opaque identifier of one submitted task.
///
/// Unique within one scheduler invocation. The scheduler derives it from
/// the task's address; the flow builder treats it as an opaque key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw id value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({:#x})", self.0)
    }
}

/// A unit of work: a nullary action plus the annotation describing the
/// resources the action touches.
///
/// The action closes over whatever state it needs and is invoked exactly
/// once. Tasks are immutable after submission; the scheduler is the only
/// caller of [`run()`](Task::run).
pub struct Task {
    name: Option<&'static str>,
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    resources: ErasedAnnotation,
}

impl Task {
    /// Creates a task whose accesses are described by annotation `A`.
    pub fn new<A: Annotation>(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: None,
            action: Mutex::new(Some(Box::new(action))),
            resources: ErasedAnnotation::of::<A>(),
        }
    }

    /// Like [`new`](Task::new), with a name used in errors and reports.
    pub fn named<A: Annotation>(name: &'static str, action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: Some(name),
            ..Self::new::<A>(action)
        }
    }

    /// The task's name, if one was given.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// The erased annotation carried by this task.
    pub fn annotation(&self) -> &ErasedAnnotation {
        &self.resources
    }

    /// The task's filtered access list.
    ///
    /// Resolved through the registry; an unregistered annotation yields an
    /// empty list (and the visitor logs the miss), making the task a free
    /// graph root.
    pub fn access_list(&self) -> Vec<ResourceAccess> {
        visit(&self.resources, |entry| entry.accesses().to_vec()).unwrap_or_default()
    }

    /// Invokes the action. The first call consumes it; later calls are
    /// no-ops.
    pub fn run(&self) {
        let action = self.action.lock().unwrap().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Binds `id` in the builder, then claims every resource in this
    /// task's filtered list.
    pub fn register_with(&self, builder: &mut FlowBuilder, id: TaskId) {
        builder.bind(id);
        for access in self.access_list() {
            match access.mode {
                AccessMode::Read => builder.ro(access.key()),
                AccessMode::Write => builder.rw(access.key()),
            };
        }
    }

    /// Label used in errors and reports: the name when present, the
    /// submission index otherwise.
    pub(crate) fn label(&self, vertex: usize) -> String {
        match self.name {
            Some(name) => name.to_string(),
            None => format!("task #{vertex}"),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("annotation", &self.resources.type_name())
            .finish_non_exhaustive()
    }
}
