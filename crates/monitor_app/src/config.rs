//! RON configuration for the monitor binary.
//!
//! Every field has a default, so a config file only needs the values that
//! differ. Without `--config`, `./monitor.ron` is used when present.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use monitor_core::{ChannelTarget, DailySchedule, LoginFieldNames, ScheduleError, TriggerPhrase};
use monitor_engine::{CommandNotifier, FetchSettings, SiteSettings};
use monitor_logging::{monitor_info, LogDestination};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "monitor.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid site url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub credentials_path: PathBuf,
    pub known_items_path: PathBuf,
    /// Daily check times, `HH:MM`, local time.
    pub schedule: Vec<String>,
    pub trigger_phrase: String,
    pub notify: NotifyConfig,
    pub log: LogConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            http: HttpConfig::default(),
            credentials_path: PathBuf::from("config.txt"),
            known_items_path: PathBuf::from("known_posts.json"),
            schedule: vec!["08:00".into(), "14:00".into(), "20:00".into()],
            trigger_phrase: "Check TTG for new movies".to_string(),
            notify: NotifyConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub base_url: String,
    pub login_path: String,
    pub submit_path: String,
    pub protected_path: String,
    pub listing_path: String,
    pub username_field: String,
    pub password_field: String,
    pub logout_markers: Vec<String>,
    pub protected_url_hints: Vec<String>,
    pub warm_up: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let names = LoginFieldNames::default();
        Self {
            base_url: "https://totheglory.im/".to_string(),
            login_path: "/login.php".to_string(),
            submit_path: "/takelogin.php".to_string(),
            protected_path: "/my.php".to_string(),
            listing_path: "/browse.php?c=M".to_string(),
            username_field: names.username,
            password_field: names.password,
            logout_markers: vec!["logout".into(), "退出".into(), "欢迎".into()],
            protected_url_hints: vec!["my.php".into(), "profile".into()],
            warm_up: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_body_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            user_agent: fetch.user_agent,
            accept_language: fetch.accept_language,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_body_bytes: fetch.max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub program: String,
    /// `{channel}`, `{target}` and `{message}` are replaced per delivery.
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub targets: Vec<TargetConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            program: "openclaw".to_string(),
            args: [
                "message",
                "send",
                "--channel",
                "{channel}",
                "--target",
                "{target}",
                "--message",
                "{message}",
            ]
            .iter()
            .map(|arg| arg.to_string())
            .collect(),
            timeout_secs: 30,
            targets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetConfig {
    pub channel: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogOutput {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub output: LogOutput,
    pub file: PathBuf,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Both,
            file: PathBuf::from("monitor.log"),
            level: "info".to_string(),
        }
    }
}

/// Load `path`, or `./monitor.ron` if it exists, or the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    match path {
        Some(path) => read_config(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                read_config(fallback)
            } else {
                Ok(MonitorConfig::default())
            }
        }
    }
}

fn read_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    monitor_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

fn parse_config(text: &str) -> Result<MonitorConfig, String> {
    ron::from_str(text).map_err(|err| err.to_string())
}

impl MonitorConfig {
    pub fn site_settings(&self) -> Result<SiteSettings, ConfigError> {
        let base_url = Url::parse(&self.site.base_url).map_err(|err| ConfigError::InvalidUrl {
            url: self.site.base_url.clone(),
            message: err.to_string(),
        })?;
        Ok(SiteSettings {
            base_url,
            login_path: self.site.login_path.clone(),
            submit_path: self.site.submit_path.clone(),
            protected_path: self.site.protected_path.clone(),
            listing_path: self.site.listing_path.clone(),
            field_names: LoginFieldNames {
                username: self.site.username_field.clone(),
                password: self.site.password_field.clone(),
            },
            logout_markers: self.site.logout_markers.clone(),
            protected_url_hints: self.site.protected_url_hints.clone(),
            warm_up: self.site.warm_up,
        })
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http.request_timeout_secs),
            redirect_limit: self.http.redirect_limit,
            max_bytes: self.http.max_body_bytes,
            user_agent: self.http.user_agent.clone(),
            accept_language: self.http.accept_language.clone(),
        }
    }

    pub fn daily_schedule(&self) -> Result<DailySchedule, ConfigError> {
        Ok(DailySchedule::parse(self.schedule.as_slice())?)
    }

    pub fn trigger(&self) -> TriggerPhrase {
        TriggerPhrase::new(self.trigger_phrase.clone())
    }

    pub fn notifier(&self) -> CommandNotifier {
        CommandNotifier::new(
            self.notify.program.clone(),
            self.notify.args.clone(),
            Duration::from_secs(self.notify.timeout_secs),
        )
    }

    pub fn targets(&self) -> Vec<ChannelTarget> {
        self.notify
            .targets
            .iter()
            .map(|t| ChannelTarget::new(t.channel.clone(), t.recipient.clone()))
            .collect()
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log.output {
            LogOutput::File => LogDestination::File(self.log.file.clone()),
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both(self.log.file.clone()),
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.log.level.trim())
            .map_err(|_| ConfigError::InvalidLogLevel(self.log.level.clone()))
    }
}
