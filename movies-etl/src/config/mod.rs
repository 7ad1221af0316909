//! Configuration and dependency wiring for the sync service.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::Settings;
