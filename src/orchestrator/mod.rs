mod builder;
mod core;
mod dispatcher;
mod executor;
mod fanout;
mod lifecycle;
mod outcome;
mod transfer;
mod workflow;

pub use builder::OrchestratorBuilder;
pub use core::*;
pub use dispatcher::{Dispatcher, Task, TaskCatalog, CONTROL_GROUP, DEFAULT_TASK, ENGINE_GROUP};
pub use executor::{CommandBatch, CommandExecutor, SEQUENTIAL_AND};
pub use lifecycle::{RestartPolicy, ServiceLifecycle};
pub use outcome::{AggregateOutcome, SkippedStage, TargetOutcome, WorkflowReport};
pub use transfer::{TransferEngine, TransferJob, TransferKind};
pub use workflow::Step;
