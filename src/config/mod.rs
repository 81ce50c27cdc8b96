mod dispatcher;
mod settings;

pub use dispatcher::DispatcherConfig;
pub use settings::Settings;
