pub mod config;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod paths;
pub mod search;

pub use config::{
    Config, ConfigError, LogLevel, LoggingConfig, SearchConfig, UiConfig, ValidationError,
};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use mapping::map_results;
pub use models::{RawResultItem, SearchResponse, SearchResultItem};
pub use paths::{AppDirs, DirsError};
pub use search::{NetworkError, NetworkResult, SearchService};

pub const APP_NAME: &str = "tunesearch";
pub const APP_AUTHOR: &str = "Tunesearch";
pub const APP_QUALIFIER: &str = "io";
