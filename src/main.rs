use clap::Parser;
use latex_gateway::utils::{logger, validation::Validate};
use latex_gateway::{router, CliArgs, CompileService, RemoteCompilerClient};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入設定
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.mode, args.verbose);

    tracing::info!("🚀 Starting latex-gateway ({:?} mode)", config.mode);
    if args.verbose {
        tracing::debug!("Gateway config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let client = RemoteCompilerClient::from_config(&config)?;
    let service = CompileService::new(client, &config);
    let app = router(service, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Compilation service: {}", config.remote.endpoint);
    tracing::info!("Compile timeout: {:?}", config.request_timeout());

    axum::serve(listener, app)
        .with_graceful_shutdown(latex_gateway::app::server::shutdown_signal())
        .await?;

    tracing::info!("✅ Server stopped");
    Ok(())
}
