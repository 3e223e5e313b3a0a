pub mod config_service;
pub mod default_preferences;
pub mod paths;

pub use config_service::ConfigService;
pub use default_preferences::load_default_preferences;
pub use paths::PrefchatPaths;
