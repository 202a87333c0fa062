//! Key/value persistence for the artifacts an environment produces.
//!
//! Boot writes each artifact once under a fixed key; `show` reads them
//! back. Key names are consumed by other tooling and must stay stable.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// Canonical artifact keys.
pub mod keys {
    /// PEM private key of the environment's key pair.
    pub const SSH_KEY: &str = "ssh-key";
    /// Elastic IP of the director.
    pub const BOSH_IP: &str = "bosh-ip";
    /// Elastic IP of the NAT instance.
    pub const NAT_IP: &str = "nat-ip";
    /// Sourcable shell exports for targeting the director.
    pub const BOSH_ENVIRONMENT: &str = "bosh-environment";
    /// Director deployment manifest.
    pub const DIRECTOR_MANIFEST: &str = "director.yml";
    /// Director admin password.
    pub const BOSH_PASSWORD: &str = "bosh-password";
    /// Cloud config for the application stack.
    pub const CLOUD_CONFIG: &str = "cloud-config.yml";
}

/// Errors raised by artifact stores.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ArtifactStoreError {
    /// Raised when no artifact exists under `key`.
    #[error("artifact {key} not found")]
    NotFound {
        /// Key that was requested.
        key: String,
    },
    /// Raised when a key is not a plain file name.
    #[error("invalid artifact key {key:?}")]
    InvalidKey {
        /// Key that was rejected.
        key: String,
    },
    /// Raised when file system operations fail.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that could not be accessed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// Storage for environment artifacts.
pub trait ArtifactStore {
    /// Reads the artifact stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::NotFound`] when nothing is stored under
    /// `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, ArtifactStoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError`] when the write fails.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), ArtifactStoreError>;

    /// Returns `true` when no artifact has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError`] when the store cannot be listed.
    fn is_empty(&self) -> Result<bool, ArtifactStoreError>;
}

/// Stores each artifact as a file inside one directory.
#[derive(Debug)]
pub struct FilesystemArtifactStore {
    root: Utf8PathBuf,
    dir: Dir,
}

impl FilesystemArtifactStore {
    /// Opens an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::Io`] when `root` is missing or is not a
    /// directory.
    pub fn open(root: &Utf8Path) -> Result<Self, ArtifactStoreError> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|err| io_error(root, &err))?;
        Ok(Self {
            root: root.to_path_buf(),
            dir,
        })
    }

    /// Creates `root` and any missing parents, then opens it.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::Io`] when the directory cannot be
    /// created or opened.
    pub fn create(root: &Utf8Path) -> Result<Self, ArtifactStoreError> {
        Dir::create_ambient_dir_all(root, ambient_authority())
            .map_err(|err| io_error(root, &err))?;
        Self::open(root)
    }

    /// Directory holding the artifacts.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn checked_key(key: &str) -> Result<&Utf8Path, ArtifactStoreError> {
        let path = Utf8Path::new(key);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(camino::Utf8Component::Normal(_)), None) => Ok(path),
            _ => Err(ArtifactStoreError::InvalidKey {
                key: key.to_owned(),
            }),
        }
    }
}

impl ArtifactStore for FilesystemArtifactStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let path = Self::checked_key(key)?;
        self.dir.read(path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ArtifactStoreError::NotFound {
                    key: key.to_owned(),
                }
            } else {
                io_error(&self.root.join(path), &err)
            }
        })
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ArtifactStoreError> {
        let path = Self::checked_key(key)?;
        self.dir
            .write(path, value)
            .map_err(|err| io_error(&self.root.join(path), &err))
    }

    fn is_empty(&self) -> Result<bool, ArtifactStoreError> {
        let mut entries = self
            .dir
            .entries()
            .map_err(|err| io_error(&self.root, &err))?;
        Ok(entries.next().is_none())
    }
}

fn io_error(path: &Utf8Path, err: &io::Error) -> ArtifactStoreError {
    ArtifactStoreError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
