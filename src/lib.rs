//! # accessflow
//!
//! Declared resource-access reflection with a dependency-aware parallel
//! task scheduler.
//!
//! A callable's resource usage is described once, as an annotation listing
//! which members of which types it reads or writes, including everything
//! inherited from the annotations of the routines it calls. The scheduler
//! takes a FIFO of tasks carrying such annotations, derives the dependency
//! graph implied by their access lists, and runs the batch with maximum
//! concurrency while preserving read/write ordering per resource.
//!
//! ## Declaring resources
//!
//! - [`Member`] — marker type naming one field of an owning type
//!   (declared with [`members!`])
//! - [`Read`] / [`Write`] — a single access claim on a member
//! - [`Annotation`] — a named bundle of claims and/or other annotations
//!   (declared with [`annotation!`]); exposes [`expanded()`](Annotation::expanded)
//!   and [`filtered()`](Annotation::filtered)
//! - [`normalize`] — deduplication plus read/write absorption, the fold
//!   behind every filtered list
//!
//! ## Registry & type erasure
//!
//! - [`registry::register`] — enters an annotation into the process-wide
//!   registry, caching its filtered list
//! - [`ErasedAnnotation`] / [`visit`] — type-erased carrier and the
//!   registry scan that recovers its entry
//!
//! ## Scheduling
//!
//! - [`Task`] — a one-shot action paired with an annotation
//! - [`FlowBuilder`] / [`AdjacencyMatrix`] — claims in, dependency DAG out
//! - [`TaskScheduler`] — orders and executes a FIFO of tasks, joining the
//!   whole batch before returning
//! - [`RunDiagnostics`] / [`RunReport`] — opt-in conflict explanations and
//!   timings
//!
//! ## Example
//!
//! ```
//! use std::collections::VecDeque;
//! use std::sync::Arc;
//! use accessflow::{annotation, members, registry, Read, Task, TaskScheduler, Write};
//!
//! struct Ledger {
//!     balance: i64,
//!     owner: String,
//! }
//!
//! members! {
//!     pub struct LedgerBalance: Ledger { balance: i64 }
//!     pub struct LedgerOwner: Ledger { owner: String }
//! }
//!
//! annotation! {
//!     /// `settle` rewrites the balance.
//!     pub struct SettleResources => (Write<LedgerBalance>,);
//!     /// `report` reads what `settle` writes.
//!     pub struct ReportResources => (Read<LedgerBalance>, Read<LedgerOwner>);
//! }
//!
//! registry::register::<SettleResources>();
//! registry::register::<ReportResources>();
//!
//! let mut queue = VecDeque::new();
//! queue.push_back(Arc::new(Task::new::<SettleResources>(|| { /* settle */ })));
//! queue.push_back(Arc::new(Task::new::<ReportResources>(|| { /* report */ })));
//!
//! // `report` starts only after `settle` completes.
//! let errors = TaskScheduler::new().order_and_execute(queue);
//! assert!(errors.is_empty());
//! ```

mod access;
mod annotation;
mod diagnostics;
mod flow;
mod member;
mod normalize;
pub mod registry;
mod scheduler;
mod task;
mod visitor;

pub use access::{AccessMode, ResourceAccess, ResourceId};
pub use annotation::{Annotation, Claim, ClaimList, NoAccess, Read, Write};
pub use diagnostics::{
    ConflictInfo, ResourceConflict, RunDiagnostics, RunReport, RunResult, TaskTiming, TimingReport,
};
pub use flow::{AdjacencyMatrix, FlowBuilder};
pub use member::Member;
pub use normalize::{absorb_reads, dedup_exact, normalize};
pub use scheduler::{TaskError, TaskScheduler};
pub use task::{Task, TaskId};
pub use visitor::{ErasedAnnotation, visit};
