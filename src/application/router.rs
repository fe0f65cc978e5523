//! Routes UI commands to the archiver and fans archiver events out to every
//! listening UI.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::application::archiver::JobArchiver;
use crate::domain::{
    CommandResponse, EventSink, InboundCommand, OutboundEvent, PageContextProvider,
};
use crate::infrastructure::config::ArchivingConfig;
use crate::infrastructure::portal_client::PortalApi;

pub const NOT_ON_PORTAL: &str = "Not on VDAB website";

/// [`EventSink`] over a broadcast channel. Events sent while nobody is
/// subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<OutboundEvent>,
}

impl BroadcastSink {
    pub const fn new(sender: broadcast::Sender<OutboundEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: OutboundEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            debug!("No UI listening, dropped {:?}", event);
        }
    }
}

#[derive(Clone)]
pub struct MessageRouter {
    archiver: JobArchiver,
    page: Arc<dyn PageContextProvider>,
    events: broadcast::Sender<OutboundEvent>,
    default_cutoff_months: u32,
}

impl MessageRouter {
    /// Wires an archiver for `page` to a fresh event channel.
    pub fn bootstrap(
        api: Arc<dyn PortalApi>,
        page: Arc<dyn PageContextProvider>,
        config: &ArchivingConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer_size.max(1));
        let sink = Arc::new(BroadcastSink::new(events.clone()));
        let archiver = JobArchiver::new(api, Arc::clone(&page), sink, config);

        Self {
            archiver,
            page,
            events,
            default_cutoff_months: config.default_cutoff_months,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.events.subscribe()
    }

    pub const fn archiver(&self) -> &JobArchiver {
        &self.archiver
    }

    /// Handles one command. Failures come back as responses, never as errors.
    pub async fn dispatch(&self, command: InboundCommand) -> CommandResponse {
        debug!("📨 Received command: {:?}", command);

        match command {
            InboundCommand::StartArchiving { older_than_months } => {
                if !self.page.snapshot().is_on_portal() {
                    warn!("⚠️ Refusing to start, page is not on the portal");
                    return CommandResponse::refused(NOT_ON_PORTAL);
                }
                self.archiver.start(older_than_months);
                CommandResponse::ok()
            }
            InboundCommand::StopArchiving => {
                self.archiver.stop();
                CommandResponse::ok()
            }
            InboundCommand::TestIdExtraction => {
                let check = self.archiver.test_identifier().await;
                CommandResponse::Identifier {
                    success: check.valid,
                    id: check.id.map(String::from),
                }
            }
            InboundCommand::GetCurrentId => {
                let id = self.archiver.current_identifier();
                CommandResponse::Identifier {
                    success: id.is_some(),
                    id: id.map(String::from),
                }
            }
        }
    }

    /// [`Self::dispatch`] for a raw JSON message.
    pub async fn dispatch_json(&self, raw: &str) -> CommandResponse {
        match serde_json::from_str::<InboundCommand>(raw) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                warn!("⚠️ Unrecognised command {}: {}", raw, e);
                CommandResponse::refused(format!("Unrecognised command: {e}"))
            }
        }
    }

    /// The page menu shortcut: start with the default cutoff.
    pub async fn start_from_context_menu(&self) -> CommandResponse {
        info!("📋 Archiving started from the page menu");
        self.dispatch(InboundCommand::StartArchiving {
            older_than_months: self.default_cutoff_months,
        })
        .await
    }
}
