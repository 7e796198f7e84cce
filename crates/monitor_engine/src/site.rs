use monitor_core::LoginFieldNames;
use url::Url;

use crate::{FailureKind, FetchError};

/// Where things live on the monitored site and how to recognise a login.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_url: Url,
    pub login_path: String,
    /// Used when the login form declares no action.
    pub submit_path: String,
    /// Page only visible when logged in; used to confirm an unclear login.
    pub protected_path: String,
    pub listing_path: String,
    pub field_names: LoginFieldNames,
    /// Body fragments (case-insensitive) only shown to a logged-in user.
    pub logout_markers: Vec<String>,
    /// URL fragments that mean the login landed on a member page.
    pub protected_url_hints: Vec<String>,
    /// Visit the site root before the login page to collect pre-login cookies.
    pub warm_up: bool,
}

impl SiteSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: "/login.php".to_string(),
            submit_path: "/takelogin.php".to_string(),
            protected_path: "/my.php".to_string(),
            listing_path: "/browse.php?c=M".to_string(),
            field_names: LoginFieldNames::default(),
            logout_markers: vec!["logout".to_string(), "退出".to_string(), "欢迎".to_string()],
            protected_url_hints: vec!["my.php".to_string(), "profile".to_string()],
            warm_up: true,
        }
    }

    pub fn login_url(&self) -> Result<Url, FetchError> {
        self.join(&self.login_path)
    }

    pub fn submit_url(&self) -> Result<Url, FetchError> {
        self.join(&self.submit_path)
    }

    pub fn protected_url(&self) -> Result<Url, FetchError> {
        self.join(&self.protected_path)
    }

    pub fn listing_url(&self) -> Result<Url, FetchError> {
        self.join(&self.listing_path)
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{path}: {err}")))
    }
}
