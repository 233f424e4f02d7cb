use clap::Parser;
use essay_marker::adapters::http;
use essay_marker::config::Command;
use essay_marker::utils::{logger, validation::Validate};
use essay_marker::{
    BedrockClient, CliConfig, FolderPipeline, LocalStorage, Marker, MarkerConfig, MarkerError,
    MarkingEngine,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.command {
        Command::Serve { .. } => logger::init_json_logger(),
        Command::Mark { .. } => logger::init_cli_logger(cli.verbose),
    }

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e);
        }
    };

    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    let model = match BedrockClient::from_config(&config.model).await {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::error!("❌ Failed to create Bedrock client: {}", e);
            exit_with(&e);
        }
    };

    let result = match cli.command {
        Command::Mark { .. } => run_marking(config, model).await,
        Command::Serve { .. } => {
            let marker = Arc::new(Marker::new(model));
            http::serve(marker, &config.server.bind_address()).await
        }
    };

    if let Err(e) = result {
        tracing::error!("❌ {}", e);
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    Ok(())
}

async fn run_marking(config: MarkerConfig, model: Arc<BedrockClient>) -> essay_marker::Result<()> {
    tracing::info!("Starting essay-marker (model: {})", model.model_id());

    let marker = Marker::new(model).with_failure_policy(config.marking.on_essay_failure);
    let pipeline = FolderPipeline::new(LocalStorage::new(".".to_string()), config, marker);
    let engine = MarkingEngine::new(pipeline);

    let output_path = engine.run().await?;
    println!("✅ Marking completed successfully!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

fn exit_with(e: &MarkerError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    let exit_code = if e.is_validation() { 2 } else { 1 };
    std::process::exit(exit_code);
}
