//! Retention Engine - Main Entry Point

use clap::Parser;
use retention_engine::cli::{
    cmd_fit, cmd_info, cmd_predict, cmd_preprocess, cmd_serve, cmd_train, Cli, Commands,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retention_engine=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { data } => {
            cmd_info(data)?;
        }
        Commands::Preprocess { data, models_dir, processed_dir, test_size, seed } => {
            cmd_preprocess(data, models_dir, processed_dir, test_size, seed)?;
        }
        Commands::Train { models_dir, processed_dir, n_estimators, seed } => {
            cmd_train(models_dir, processed_dir, n_estimators, seed)?;
        }
        Commands::Fit { data, models_dir, test_size, n_estimators, seed } => {
            cmd_fit(data, models_dir, test_size, n_estimators, seed)?;
        }
        Commands::Predict { models_dir, input, record } => {
            cmd_predict(models_dir, input, record)?;
        }
        Commands::Serve { port, host, models_dir, cors_origin } => {
            cmd_serve(host, port, models_dir, cors_origin).await?;
        }
    }

    Ok(())
}
