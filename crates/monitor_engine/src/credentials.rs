use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use monitor_core::{Credential, CredentialError};
use monitor_logging::monitor_info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialFileError {
    #[error("cannot read credential file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("credential file {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: CredentialError,
    },
}

/// Read the `account=` / `passwd=` file.
pub fn load_credentials(path: &Path) -> Result<Credential, CredentialFileError> {
    let text = fs::read_to_string(path).map_err(|source| CredentialFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let credential = Credential::parse(&text).map_err(|source| CredentialFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    monitor_info!("Loaded credentials for account {:?}", credential.username());
    Ok(credential)
}
