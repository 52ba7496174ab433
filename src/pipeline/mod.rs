mod events;
mod executor;
mod plan;
mod retry;
mod runner;
mod state;

pub use events::{EventLog, LifecycleEvent};
pub use executor::{OUT_OF_SCOPE, TaskExecutor, TaskOutcome};
pub use plan::{Plan, PlanFile, ScopeSpec};
pub use retry::RetryPolicy;
pub use runner::{PipelineRunner, ProgressMode};
pub use state::{TaskEvent, TransitionError, next_status};
