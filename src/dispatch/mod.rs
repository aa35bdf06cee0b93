pub mod http;
pub mod poll;
pub mod task;

pub use http::{SunoClient, UpstreamResponse};
pub use poll::{PollOutcome, StatusSource, TaskPoller};
pub use task::{TaskKind, TaskStatus};
