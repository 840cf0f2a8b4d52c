use crate::config::toml_config::OperatingMode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_filter(verbose: bool) -> EnvFilter {
    let default_directive = if verbose {
        "latex_gateway=debug,tower_http=debug,info"
    } else {
        "latex_gateway=info,tower_http=info"
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// 依運行模式初始化日誌：開發模式用精簡格式，正式環境輸出 JSON
pub fn init_logger(mode: OperatingMode, verbose: bool) {
    let filter = build_filter(verbose);

    match mode {
        OperatingMode::Development => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .init();
        }
        OperatingMode::Production => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .json(),
                )
                .init();
        }
    }
}
