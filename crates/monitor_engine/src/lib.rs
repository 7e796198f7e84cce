//! Monitor engine: login, listing fetch, state persistence and notification.
mod auth;
mod credentials;
mod decode;
mod dedup;
mod fetch;
mod monitor;
mod notify;
mod persist;
mod scheduler;
mod site;
mod types;

pub use auth::{AuthError, SessionAuthenticator};
pub use credentials::{load_credentials, CredentialFileError};
pub use decode::{decode_utf8, DecodedHtml};
pub use dedup::DedupStore;
pub use fetch::{FetchSettings, ListingFetcher, Session};
pub use monitor::{ContentMonitor, MonitorError, MonitorSetup, RunReport};
pub use notify::{CommandNotifier, DeliveryReport, NotificationDispatcher, Notifier, NotifyError};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use scheduler::{Scheduler, TriggerOutcome};
pub use site::SiteSettings;
pub use types::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, LogSink, ProgressSink, RunEvent, Stage,
};
