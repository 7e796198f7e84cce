#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use monitor_core::{ChannelTarget, Credential};
use monitor_engine::{
    DedupStore, FetchSettings, MonitorSetup, Notifier, NotifyError, ProgressSink, RunEvent,
    SiteSettings,
};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOGIN_PAGE: &str = r#"
<html><body>
<form id="search" action="/search.php"><input name="q"></form>
<form method="post" action="takelogin.php">
  <input type="hidden" name="csrf_token" value="abc123">
  <input type="text" name="username">
  <input type="password" name="password">
  <input type="submit" value="Sign in">
</form>
</body></html>
"#;

pub const WELCOME_PAGE: &str =
    r#"<html><body>Hello alice | <a href="/logout.php">Logout</a></body></html>"#;

pub const LISTING_PAGE: &str = r#"
<html><body>
<table class="torrents">
  <tr class="hover_hr" id="792001">
    <td><a href="/details.php?id=792001">Spirited Away</a></td>
    <td><nobr>2024-03-01 08:15:00</nobr></td>
  </tr>
  <tr class="hover_hr" id="792002">
    <td><a href="/details.php?id=792002">My Neighbor Totoro</a></td>
    <td><nobr>2024-03-02 21:40:05</nobr></td>
  </tr>
</table>
</body></html>
"#;

pub fn credential() -> Credential {
    Credential::new("alice", "secret")
}

pub fn site_for(server: &MockServer) -> SiteSettings {
    let mut site = SiteSettings::new(Url::parse(&server.uri()).unwrap());
    site.warm_up = false;
    site
}

pub fn fast_fetch() -> FetchSettings {
    FetchSettings {
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
        ..FetchSettings::default()
    }
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Login page plus a submit endpoint that accepts alice/secret and sets a session cookie.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login.php"))
        .respond_with(html(LOGIN_PAGE))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/takelogin.php"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=secret"))
        .respond_with(html(WELCOME_PAGE).insert_header("set-cookie", "uid=1; Path=/"))
        .mount(server)
        .await;
}

pub async fn mount_listing(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(html(body))
        .mount(server)
        .await;
}

pub fn setup(
    server: &MockServer,
    store: DedupStore,
    notifier: Arc<dyn Notifier>,
    targets: Vec<ChannelTarget>,
) -> MonitorSetup {
    monitor_logging::initialize_for_tests();
    MonitorSetup {
        site: site_for(server),
        fetch: fast_fetch(),
        credential: credential(),
        store,
        notifier,
        targets,
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<RunEvent>>,
}

impl TestSink {
    pub fn take(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Records every message and fails for the listed channels. When `watch` is
/// set, also records the content of that file at send time.
#[derive(Default)]
pub struct RecordingNotifier {
    pub failing_channels: Vec<String>,
    pub watch: Option<PathBuf>,
    pub sent: Mutex<Vec<(ChannelTarget, String)>>,
    pub watched: Mutex<Vec<Option<String>>>,
}

impl RecordingNotifier {
    pub fn failing(channels: &[&str]) -> Self {
        Self {
            failing_channels: channels.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(ChannelTarget, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, target: &ChannelTarget, message: &str) -> Result<(), NotifyError> {
        if let Some(path) = &self.watch {
            self.watched
                .lock()
                .unwrap()
                .push(std::fs::read_to_string(path).ok());
        }
        self.sent
            .lock()
            .unwrap()
            .push((target.clone(), message.to_string()));
        if self.failing_channels.contains(&target.channel) {
            return Err(NotifyError::ExitStatus {
                code: Some(1),
                stderr: "channel down".to_string(),
            });
        }
        Ok(())
    }
}
