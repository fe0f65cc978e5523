//! Infrastructure layer: configuration, logging, HTTP access to the portal and
//! everything that reads session details out of a page context.

pub mod config;
pub mod logging;
pub mod portal_error;
pub mod network_observer;
pub mod identifier_resolver;
pub mod request_builder;
pub mod portal_client;
pub mod page_snapshot;
pub mod preference_store;

pub use config::{AppConfig, ArchivingConfig, ConfigManager, LoggingConfig, PortalConfig};
pub use identifier_resolver::{
    DiscoveryContext, DiscoverySource, ResolvedIdentifier, resolve_identifier,
};
pub use logging::init_logging_with_config;
pub use network_observer::{IdentifierCache, IdentifierPolicy, NetworkObserver};
pub use page_snapshot::PageSnapshotSources;
pub use portal_client::{PortalApi, PortalClient};
pub use portal_error::PortalError;
pub use preference_store::{PreferenceStore, UserPreferences};
pub use request_builder::{RequestKind, SessionRequestBuilder};
