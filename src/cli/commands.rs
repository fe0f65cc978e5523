use anyhow::{Result, bail};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::application::MessageRouter;
use crate::cli::args::{ArchiveArgs, Cli, Command, PageArgs, PrefsArgs};
use crate::cli::render::render_event;
use crate::domain::{CommandResponse, InboundCommand, OutboundEvent};
use crate::infrastructure::{AppConfig, PortalClient, PreferenceStore};

/// Runs the parsed command against an already loaded configuration and the
/// preference file that belongs to it.
pub async fn execute(cli: Cli, config: AppConfig, preferences: PreferenceStore) -> Result<()> {
    match cli.command {
        Command::Archive(args) => archive(args, &config, &preferences).await,
        Command::ResolveId(page) => {
            print_response(&page, &config, InboundCommand::GetCurrentId).await
        }
        Command::TestId(page) => {
            print_response(&page, &config, InboundCommand::TestIdExtraction).await
        }
        Command::Prefs(args) => prefs(args, &config, &preferences).await,
    }
}

/// Router over the page context described by `page`, with every observed
/// request already fed to the network observer.
async fn build_router(page: &PageArgs, config: &AppConfig) -> Result<MessageRouter> {
    let context = page.snapshot_sources().load().await?;
    let client = PortalClient::with_config(config.portal.clone())?;
    let router = MessageRouter::bootstrap(Arc::new(client), Arc::new(context), &config.archiving);

    let observer = router.archiver().network_observer();
    for url in &page.observed_requests {
        observer.on_request_issued(url);
    }
    Ok(router)
}

async fn print_response(
    page: &PageArgs,
    config: &AppConfig,
    command: InboundCommand,
) -> Result<()> {
    let router = build_router(page, config).await?;
    let response = router.dispatch(command).await;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

async fn archive(args: ArchiveArgs, config: &AppConfig, store: &PreferenceStore) -> Result<()> {
    let older_than_months = match args.older_than {
        Some(months) => {
            store.set_older_than(months).await?;
            months
        }
        None => store
            .load()
            .await
            .older_than_months
            .unwrap_or(config.archiving.default_cutoff_months),
    };
    info!("🗓️ Archiving applications older than {} months", older_than_months);

    let router = build_router(&args.page, config).await?;
    let mut events = router.subscribe();

    if let CommandResponse::Ack { success: false, error } = router
        .dispatch(InboundCommand::StartArchiving { older_than_months })
        .await
    {
        bail!(error.unwrap_or_else(|| "Archiving could not be started".to_string()));
    }

    let mut saw_progress = false;
    let mut stop_sent = false;
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", render_event(&event));
                    match event {
                        OutboundEvent::UpdateProgress(_) => saw_progress = true,
                        OutboundEvent::ProcessComplete { .. } => break,
                        // Validation failures end the run without a completion event
                        OutboundEvent::ProcessError { .. } if !saw_progress => break,
                        OutboundEvent::ProcessError { .. } => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("⚠️ Skipped {} progress events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c(), if !stop_sent => {
                println!("Stopping after the current request...");
                router.dispatch(InboundCommand::StopArchiving).await;
                stop_sent = true;
            }
        }
    }
    Ok(())
}

async fn prefs(args: PrefsArgs, config: &AppConfig, store: &PreferenceStore) -> Result<()> {
    if let Some(months) = args.older_than {
        if store.set_older_than(months).await? {
            println!("Cutoff set to {months} months");
        } else {
            println!("Cutoff already {months} months");
        }
        return Ok(());
    }

    match store.load().await.older_than_months {
        Some(months) => println!("Cutoff: {months} months ({})", store.path().display()),
        None => println!(
            "Cutoff: {} months (default, nothing stored yet)",
            config.archiving.default_cutoff_months
        ),
    }
    Ok(())
}
