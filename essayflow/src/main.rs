//! Essayflow CLI - generate, review and revise an essay in one run.

mod cli;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use essayflow::prelude::*;

use cli::Cli;
use progress::ConsoleProgress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error during workflow execution: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let request = EssayRequest::new(cli.topic(), cli.language.clone())?;

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }

    let cancel = Arc::new(CancellationToken::new());
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                cancel.cancel("interrupted by user");
            }
        });
    }

    let progress: Arc<dyn EventSink> = if cli.quiet {
        Arc::new(LoggingEventSink::debug())
    } else {
        Arc::new(ConsoleProgress)
    };
    let client = Arc::new(OpenRouterClient::new(config.provider_config())?);
    let pipeline = EssayPipeline::new(client, config.models.clone(), config.retry)
        .with_events(progress.clone())
        .with_cancellation(cancel);
    let workflow = EssayWorkflow::new(pipeline, ArtifactWriter::new(&config.output_dir))
        .with_events(progress);

    if !cli.quiet {
        println!("Starting essay generation workflow...");
        println!("Prompt: {}", request.topic());
        if let Some(language) = request.language() {
            println!("Language: {language}");
        }
        println!();
    }

    let report = workflow.run(&request).await?;

    if !cli.quiet {
        println!("Workflow completed successfully!\n");
    }
    println!("Generated files:");
    for artifact in report.artifacts() {
        println!("   - {}", artifact.path.display());
    }
    Ok(())
}

/// Initialize tracing; `RUST_LOG` wins over the command-line flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
