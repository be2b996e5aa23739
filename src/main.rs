use clap::Parser;
use pokedex_backend::app::server;
use pokedex_backend::domain::ports::RecognitionConfig;
use pokedex_backend::utils::{logger, validation::Validate};
use pokedex_backend::{AppState, CliConfig, GeminiClient, RecognitionEngine, TomlConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pokedex-backend");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入配置：優先配置檔，否則退回環境變數
    let loaded = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path)
        }
        None => TomlConfig::from_env(),
    };

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration loading failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    config.apply_cli_overrides(&cli);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("🎯 Recognition model: {}", config.model());

    let client = GeminiClient::new(&config);
    let engine = RecognitionEngine::with_retry_policy(
        client,
        config.retry_attempts(),
        Duration::from_secs(config.retry_delay_seconds()),
    );
    let state = AppState::new(engine);

    server::serve(config.host(), config.port(), state, config.max_upload_bytes()).await?;

    Ok(())
}
