pub mod args;
pub mod dispatcher;
pub mod handler;
pub mod options;
pub mod planner;

pub use args::Args;
pub use dispatcher::Dispatcher;
pub use handler::{Handler, HandlerId, HandlerRef, IntoHandlers};
pub use options::{make_options, CallOrder, Propagate, PublishOptions, UniqueCall};
pub use planner::plan;
