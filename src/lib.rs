//! Hierarchical in-process publish/subscribe.
//!
//! Topics are colon-delimited names (`"app:window:resize"`). Publishing a
//! topic reaches its ancestors and, on request, its registered descendants.
//! Patterns with `*` or `~` expand against the registered topics.

/// Settings: dispatcher defaults and logging, loaded from file and env.
pub mod config;
/// Built-in consumers: config store and progress indicator.
pub mod consumers;
/// Dispatcher, handlers, publish options and call planning.
pub mod dispatch;
/// Error types and re-exports from `eventree-error`.
pub mod error;
/// Well-known event names.
pub mod events;
/// Logging initialization (filters, formats).
pub mod logging;
/// Line-oriented command interpreter used by the CLI.
pub mod shell;
/// Topic names, patterns and wildcard resolution.
pub mod topic;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Settings.
pub use config::{DispatcherConfig, Settings};
/// Consumers built on the dispatcher.
pub use consumers::{ConfigStore, Progress, ProgressEvent};
/// Dispatcher and publish options.
pub use dispatch::{
    make_options, Args, CallOrder, Dispatcher, Handler, HandlerId, HandlerRef, IntoHandlers,
    Propagate, PublishOptions, UniqueCall,
};
/// Errors.
pub use error::{DispatchError, EventreeResult, OptionError, SettingsError, StackError, TopicError};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Script interpreter.
pub use shell::Shell;
/// Topics and patterns.
pub use topic::{IntoPatterns, Pattern, Topic};
