use clap::Parser;
use quiz_bot::utils::error::ErrorSeverity;
use quiz_bot::utils::{logger, validation::Validate};
use quiz_bot::{AppConfig, BotEngine, BotError, CliArgs};

fn report(e: &BotError) -> i32 {
    tracing::error!(
        "❌ quiz-bot failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting quiz-bot v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => std::process::exit(report(&e).max(1)),
    };
    args.apply_to(&mut config);

    if args.verbose {
        tracing::debug!("Configuration: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        std::process::exit(report(&e).max(1));
    }

    let engine = BotEngine::new_with_monitoring(config, true);
    if let Err(e) = engine.run().await {
        let exit_code = report(&e);
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    tracing::info!("✅ quiz-bot exited cleanly");
    Ok(())
}
