#[cfg(feature = "server")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "server")]
pub use cli::CliArgs;
pub use toml_config::{DiagnosticsConfig, GatewayConfig, Limits, OperatingMode};
