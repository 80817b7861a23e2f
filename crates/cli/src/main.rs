use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop_cli::cli::Cli;
use workshop_cli::config::CliConfig;
use workshop_cli::{build_client, commands};
use workshop_client::AuthEvent;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workshop_cli=info,workshop_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- Configuration ---
    let config = CliConfig::from_env()?.with_overrides(cli.base_url, cli.session_file);
    tracing::debug!(
        base_url = %config.client.base_url,
        session_file = %config.session_file.display(),
        "Loaded configuration"
    );

    let client = build_client(&config)?;
    let mut events = client.subscribe();

    let result = commands::run(&client, cli.command).await;

    while let Ok(event) = events.try_recv() {
        if let AuthEvent::SessionEnded { redirect_to, reason } = event {
            tracing::info!(?reason, redirect_to, "Session ended");
        }
    }

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            if let Some(target) = e
                .downcast_ref::<workshop_client::ApiError>()
                .and_then(|api| api.redirect_target())
            {
                eprintln!("Next: {target}");
            }
            Err(e)
        }
    }
}
