use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;

mod bootstrap;
mod cli;
mod error;
mod output;
mod picker;
mod router;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("tally error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Startup and output failures come back as `Err`. A failed directive has
/// already been logged inside its span and only sets the exit code.
async fn run() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    init_tracing()?;

    let config = bootstrap::load_config()?;
    let router = bootstrap::build_router(&config).await?;

    let result = match cli.into_intent() {
        cli::Intent::Prompt(prompt) if std::io::stdin().is_terminal() => {
            let mut picker = picker::PromptPicker::stdio();
            router.execute_prompt(&prompt, &mut picker).await
        }
        cli::Intent::Prompt(prompt) => {
            router
                .execute_prompt(&prompt, &mut picker::NonInteractive)
                .await
        }
        cli::Intent::Request(request) => router.handle_request(&request).await,
    };

    match result {
        Ok(outcome) => {
            output::output(&outcome)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TALLY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
