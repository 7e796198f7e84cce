use std::sync::Arc;

use monitor_core::{ChannelTarget, Credential, Delta, ListingParser, ParseTier, RunStatus};
use monitor_logging::{monitor_error, monitor_info, monitor_warn};
use thiserror::Error;

use crate::auth::{AuthError, SessionAuthenticator};
use crate::dedup::DedupStore;
use crate::fetch::{FetchSettings, ListingFetcher};
use crate::notify::{DeliveryReport, NotificationDispatcher, Notifier};
use crate::site::SiteSettings;
use crate::{FetchError, LogSink, ProgressSink, RunEvent, Stage};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("network error: {0}")]
    Network(#[from] FetchError),
}

/// Outcome of a run that got as far as parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub delta: Delta,
    pub tier: ParseTier,
    /// Empty when the delta was empty.
    pub deliveries: Vec<DeliveryReport>,
    /// Set when the known items could not be saved. The delta was still
    /// delivered and stays known for the rest of this process.
    pub persist_error: Option<String>,
}

/// Everything a monitor needs, gathered by the caller.
pub struct MonitorSetup {
    pub site: SiteSettings,
    pub fetch: FetchSettings,
    pub credential: Credential,
    pub store: DedupStore,
    pub notifier: Arc<dyn Notifier>,
    pub targets: Vec<ChannelTarget>,
}

/// Runs the authenticate, fetch, parse, diff, notify, persist pipeline.
///
/// Only this type mutates the dedup store. Notification happens before the
/// store is saved: an interrupted run re-reports its items on the next run
/// instead of losing them.
pub struct ContentMonitor {
    authenticator: SessionAuthenticator,
    fetcher: ListingFetcher,
    parser: ListingParser,
    site: SiteSettings,
    credential: Credential,
    store: DedupStore,
    dispatcher: NotificationDispatcher,
    targets: Vec<ChannelTarget>,
    sink: Arc<dyn ProgressSink>,
}

impl ContentMonitor {
    pub fn new(setup: MonitorSetup) -> Self {
        Self {
            authenticator: SessionAuthenticator::new(setup.site.clone(), setup.fetch),
            fetcher: ListingFetcher::default(),
            parser: ListingParser::new(setup.site.base_url.clone()),
            site: setup.site,
            credential: setup.credential,
            store: setup.store,
            dispatcher: NotificationDispatcher::new(setup.notifier),
            targets: setup.targets,
            sink: Arc::new(LogSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    pub async fn run(&mut self) -> Result<RunReport, MonitorError> {
        match self.run_inner().await {
            Ok(report) => {
                self.sink.emit(RunEvent::Finished {
                    status: report.status,
                    new_items: report.delta.len(),
                });
                Ok(report)
            }
            Err(err) => {
                monitor_error!("Run failed: {}", err);
                self.sink.emit(RunEvent::Finished {
                    status: RunStatus::Failed,
                    new_items: 0,
                });
                Err(err)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<RunReport, MonitorError> {
        self.sink.emit(RunEvent::Stage(Stage::Authenticating));
        let session = self.authenticator.authenticate(&self.credential).await?;

        self.sink.emit(RunEvent::Stage(Stage::Fetching));
        let listing_url = self.site.listing_url()?;
        let page = self.fetcher.fetch(&session, &listing_url).await?;
        drop(session);

        self.sink.emit(RunEvent::Stage(Stage::Parsing));
        let parsed = self.parser.parse(&page.html);
        monitor_info!("Parsed {} items ({} tier)", parsed.items.len(), parsed.tier);

        self.sink.emit(RunEvent::Stage(Stage::Diffing));
        let delta = self.store.known_mut().absorb(&parsed.items);
        monitor_info!("{} new items", delta.len());

        let mut deliveries = Vec::new();
        if !delta.is_empty() {
            self.sink.emit(RunEvent::Stage(Stage::Notifying));
            deliveries = self.dispatcher.dispatch(&delta, &self.targets).await;
        }

        self.sink.emit(RunEvent::Stage(Stage::Persisting));
        let persist_error = match self.store.save() {
            Ok(()) => None,
            Err(err) => {
                monitor_error!("Could not persist known items: {}", err);
                Some(err.to_string())
            }
        };

        let degraded = parsed.is_degraded()
            || page.had_errors
            || persist_error.is_some()
            || deliveries.iter().any(|report| !report.ok);
        if degraded {
            monitor_warn!("Run completed with degraded results");
        }
        self.sink.emit(RunEvent::Stage(Stage::Done));

        Ok(RunReport {
            status: if degraded {
                RunStatus::Degraded
            } else {
                RunStatus::Success
            },
            delta,
            tier: parsed.tier,
            deliveries,
            persist_error,
        })
    }
}
