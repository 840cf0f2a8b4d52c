pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "server")]
pub use app::server::router;
#[cfg(feature = "server")]
pub use config::CliArgs;

pub use adapters::RemoteCompilerClient;
pub use config::GatewayConfig;
pub use self::core::{service::CompileService, translator::CompileResponse};
pub use utils::error::{GatewayError, Result};
