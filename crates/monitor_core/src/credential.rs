use std::fmt;

const ACCOUNT_KEY: &str = "account";
const PASSWORD_KEY: &str = "passwd";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential source has no `{0}=` line")]
    MissingKey(&'static str),
    #[error("credential source has an empty `{0}=` value")]
    EmptyValue(&'static str),
}

/// Login name and password for the monitored site.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse the line-oriented `account=...` / `passwd=...` format.
    ///
    /// No quoting or escaping: everything after the first `=` is the value.
    /// Later lines override earlier ones; unrelated lines are ignored.
    pub fn parse(text: &str) -> Result<Self, CredentialError> {
        let mut username = None;
        let mut password = None;
        for line in text.lines().map(str::trim) {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                ACCOUNT_KEY => username = Some(value.to_string()),
                PASSWORD_KEY => password = Some(value.to_string()),
                _ => {}
            }
        }

        let username = require(username, ACCOUNT_KEY)?;
        let password = require(password, PASSWORD_KEY)?;
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

fn require(value: Option<String>, key: &'static str) -> Result<String, CredentialError> {
    match value {
        None => Err(CredentialError::MissingKey(key)),
        Some(v) if v.is_empty() => Err(CredentialError::EmptyValue(key)),
        Some(v) => Ok(v),
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_and_passwd_lines() {
        let cred = Credential::parse("# site login\naccount=alice\n  passwd=s3cr=t  \n").unwrap();
        assert_eq!(cred.username(), "alice");
        assert_eq!(cred.password(), "s3cr=t");
    }

    #[test]
    fn later_lines_override_earlier_ones() {
        let cred = Credential::parse("account=old\naccount=new\npasswd=x").unwrap();
        assert_eq!(cred.username(), "new");
    }

    #[test]
    fn missing_password_is_reported() {
        let err = Credential::parse("account=alice\n").unwrap_err();
        assert_eq!(err, CredentialError::MissingKey("passwd"));
    }

    #[test]
    fn empty_account_is_reported() {
        let err = Credential::parse("account=\npasswd=x\n").unwrap_err();
        assert_eq!(err, CredentialError::EmptyValue("account"));
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", Credential::new("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
