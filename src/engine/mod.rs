pub mod controller;
pub mod details;
pub mod filter;
pub mod presenter;
pub mod state;

pub use controller::{completion_channel, Completion, FeedController};
pub use details::{details_channel, DetailsCompletion, DetailsLoader, DetailsOutcome};
pub use filter::LocalFilter;
pub use presenter::{Presenter, StatusKind};
pub use state::{CompletionOutcome, FeedState, FeedStatus, FetchTicket};
