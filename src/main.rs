mod cli;

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use docverify::{
    core::{
        analysis::DocumentImage,
        crypto::digest_file,
        services::{event_channel, EventReceiver, WorkflowEvent, WorkflowState},
    },
    utils::config::Config,
    Application,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.global.config.as_deref()).context("failed to load configuration")?;

    // Logs go to stderr so stdout only carries results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting docverify v{}", env!("CARGO_PKG_VERSION"));

    let (events_tx, events_rx) = event_channel();
    let app = match &cli.global.ledger_file {
        Some(path) => Application::with_ledger_file(config, path, Some(events_tx)).await,
        None => Application::new(config, Some(events_tx)).await,
    }
    .map_err(|e| {
        error!("Failed to initialize application: {}", e);
        e
    })?;
    let notices = tokio::spawn(print_notices(events_rx));

    let code = run(&app, cli.command, cli.global.json).await;
    app.shutdown();
    drop(app);
    notices.await.ok();
    code
}

async fn run(app: &Application, command: Commands, json: bool) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Hash { file } => {
            let fingerprint = digest_file(app.digest().as_ref(), &file).await?;
            println!("{}", fingerprint);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { file, export } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let state = app.controller().submit_file(&bytes).await?;
            finish(app, &state, export, json)
        }
        Commands::Check { hash, export } => {
            let state = app.controller().submit_fingerprint(hash.trim()).await?;
            finish(app, &state, export, json)
        }
        Commands::Analyze { image, selfie } => {
            let id_card = read_image(&image).await?;
            let selfie = match selfie.as_deref() {
                Some("-") => Some(read_stdin_image().await?),
                Some(source) => Some(DocumentImage::from_source(source).await?),
                None => None,
            };
            let extraction = app.analyze(&id_card, selfie.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&extraction)?);
            Ok(if extraction.is_tampered {
                ExitCode::from(3)
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

fn finish(app: &Application, state: &WorkflowState, export: bool, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        print_state(state);
    }

    match state {
        WorkflowState::Verified(_) => {
            if export {
                let artifact = app.controller().export_current()?;
                if !json {
                    println!("Card:          {}", artifact.path.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        WorkflowState::NotFound => Ok(ExitCode::from(1)),
        _ => Ok(ExitCode::from(2)),
    }
}

fn print_state(state: &WorkflowState) {
    println!("{}", state.status_message());
    match state {
        WorkflowState::Verified(record) => {
            println!("Full name:     {}", record.full_name);
            println!("Date of birth: {}", record.dob);
            println!("Gender:        {}", record.gender);
            let optional = [
                ("Address:      ", &record.physical_address),
                ("Phone:        ", &record.phone),
                ("Email:        ", &record.email),
                ("National ID:  ", &record.national_id),
                ("Tax ID:       ", &record.tax_id),
                ("Passport:     ", &record.passport),
                ("Driving lic.: ", &record.driving_license),
                ("Voter ID:     ", &record.voter_id),
                ("Photo:        ", &record.photo_url),
            ];
            for (label, value) in optional {
                if let Some(value) = value {
                    println!("{} {}", label, value);
                }
            }
            println!("Fingerprint:   {}", record.fingerprint);
            println!("Verified at:   {}", record.verified_at.to_rfc3339());
        }
        WorkflowState::ConnectionError { reason } => println!("Reason:        {}", reason),
        _ => {}
    }
}

async fn print_notices(mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        if let WorkflowEvent::Notice(notice) = event {
            eprintln!("{}", notice.message());
        }
    }
}

async fn read_image(path: &std::path::Path) -> anyhow::Result<DocumentImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(DocumentImage::new(DocumentImage::mime_for_path(path), data))
}

async fn read_stdin_image() -> anyhow::Result<DocumentImage> {
    use tokio::io::AsyncReadExt;

    let mut encoded = String::new();
    tokio::io::stdin()
        .read_to_string(&mut encoded)
        .await
        .context("failed to read selfie from stdin")?;
    Ok(DocumentImage::from_base64(encoded.trim())?)
}
