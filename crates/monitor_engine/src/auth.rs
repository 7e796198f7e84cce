use monitor_core::{find_login_form, page_text, Credential};
use monitor_logging::{monitor_debug, monitor_info, monitor_warn};
use thiserror::Error;
use url::Url;

use crate::decode::decode_utf8;
use crate::fetch::{FetchSettings, Session};
use crate::site::SiteSettings;
use crate::{FetchError, FetchOutput};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no form on the login page has both credential fields")]
    FormNotFound,
    #[error("login rejected")]
    InvalidCredentials,
    #[error("login outcome could not be determined: {0}")]
    AmbiguousOutcome(String),
    #[error(transparent)]
    Network(#[from] FetchError),
}

/// Logs in through whatever form the login page currently serves.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    site: SiteSettings,
    fetch: FetchSettings,
}

impl SessionAuthenticator {
    pub fn new(site: SiteSettings, fetch: FetchSettings) -> Self {
        Self { site, fetch }
    }

    /// A fresh session holding the login cookies.
    pub async fn authenticate(&self, credential: &Credential) -> Result<Session, AuthError> {
        let session = Session::new(&self.fetch, &self.site.base_url)?;
        let login_url = self.site.login_url()?;

        if self.site.warm_up {
            match session.get(&self.site.base_url).await {
                Ok(output) => monitor_debug!("Warm-up visit returned {}", output.metadata.status),
                Err(err) => monitor_warn!("Warm-up visit failed: {}", err),
            }
        }

        let page = session.get(&login_url).await?.ensure_success()?;
        let page_html = decode_utf8(&page.bytes).html;
        let form = find_login_form(&page_html, &self.site.field_names)
            .ok_or(AuthError::FormNotFound)?;

        let target = form.submission_target(&self.site.base_url, &self.site.submit_url()?);
        let params = form.submission_params(&self.site.field_names, credential);
        monitor_info!("Submitting login for {:?} to {}", credential.username(), target);
        let response = session.post_form(&target, &params).await?;

        if is_redirect_to(&response, &login_url) {
            monitor_warn!("Login bounced back to the login page");
            return Err(AuthError::InvalidCredentials);
        }
        if self.body_shows_logged_in(&response, credential) {
            monitor_info!("Login confirmed by the submit response");
            return Ok(session);
        }
        if self.redirected_to_protected_area(&response) {
            monitor_info!("Login confirmed by redirect to {}", response.metadata.final_url);
            return Ok(session);
        }

        monitor_debug!("No login marker in submit response; checking the protected page");
        let protected = session.get(&self.site.protected_url()?).await?;
        if !(200..300).contains(&protected.metadata.status) {
            return Err(AuthError::AmbiguousOutcome(format!(
                "protected page returned {}",
                protected.metadata.status
            )));
        }
        if is_redirect_to(&protected, &login_url) {
            return Err(AuthError::InvalidCredentials);
        }
        if self.body_shows_logged_in(&protected, credential) {
            monitor_info!("Login confirmed by the protected page");
            return Ok(session);
        }
        Err(AuthError::InvalidCredentials)
    }

    /// A logout marker anywhere in the page, or the username in its visible text.
    fn body_shows_logged_in(&self, output: &FetchOutput, credential: &Credential) -> bool {
        let body = decode_utf8(&output.bytes).html;
        let lowered = body.to_lowercase();
        if self
            .site
            .logout_markers
            .iter()
            .any(|marker| lowered.contains(&marker.to_lowercase()))
        {
            return true;
        }
        !credential.username().is_empty() && page_text(&body).contains(credential.username())
    }

    fn redirected_to_protected_area(&self, output: &FetchOutput) -> bool {
        output.metadata.redirect_count > 0
            && self
                .site
                .protected_url_hints
                .iter()
                .any(|hint| output.metadata.final_url.contains(hint.as_str()))
    }
}

/// Redirected, and landed on `page` (path only; the query may carry a return URL).
fn is_redirect_to(output: &FetchOutput, page: &Url) -> bool {
    if output.metadata.redirect_count == 0 {
        return false;
    }
    Url::parse(&output.metadata.final_url)
        .map(|landed| landed.path() == page.path())
        .unwrap_or(false)
}
