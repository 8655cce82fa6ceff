use log::{debug, error, info};
use russh::keys::ssh_key::rand_core::OsRng;
use russh::keys::ssh_key::LineEnding;
use russh::keys::{Algorithm, HashAlg, PrivateKey};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error_handling::types::IdentityError;

/// Where the host key came from during this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    Generated,
    Loaded,
}

/// The SSH host key presented to every attacker.
///
/// Exactly one exists per process; it is created at startup by [`acquire`] and only read
/// afterwards.
#[derive(Debug, Clone)]
pub struct HostIdentity {
    key: PrivateKey,
    origin: IdentityOrigin,
}

impl HostIdentity {
    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn origin(&self) -> IdentityOrigin {
        self.origin
    }

    /// SHA-256 fingerprint of the public half, as shown by `ssh-keygen -l`.
    pub fn fingerprint(&self) -> String {
        self.key.public_key().fingerprint(HashAlg::Sha256).to_string()
    }
}

/// Loads the host key at `path`, generating and persisting one first if none exists.
///
/// A generated key is an Ed25519 key written in OpenSSH format. It is written to a temporary
/// file next to `path` and renamed into place, so a crash never leaves a half-written key
/// behind, then read back from `path` so both branches return what is on disk.
///
/// # Errors
///
/// - [`IdentityError::Persist`] / [`IdentityError::IoError`] if the location is not writable
/// - [`IdentityError::Corrupt`] if the existing file is not a usable unencrypted key
pub fn acquire(path: &Path) -> Result<HostIdentity, IdentityError> {
    let origin = if path.exists() {
        debug!("Host key found at {}", path.display());
        IdentityOrigin::Loaded
    } else {
        info!("No host key at {}, generating a new one", path.display());
        generate_and_persist(path)?;
        IdentityOrigin::Generated
    };

    let key = russh::keys::load_secret_key(path, None).map_err(|e| {
        error!("Unable to load host key from {}: {}", path.display(), e);
        IdentityError::Corrupt(format!("{}: {}", path.display(), e))
    })?;

    Ok(HostIdentity { key, origin })
}

fn generate_and_persist(path: &Path) -> Result<(), IdentityError> {
    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)
        .map_err(|e| IdentityError::Generate(e.to_string()))?;
    let encoded = key
        .to_openssh(LineEnding::LF)
        .map_err(|e| IdentityError::Encode(e.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(IdentityError::Persist)?;
    tmp.write_all(encoded.as_bytes())
        .map_err(IdentityError::Persist)?;
    tmp.as_file().sync_all().map_err(IdentityError::Persist)?;
    restrict_permissions(tmp.as_file())?;
    tmp.persist(path).map_err(|e| IdentityError::Persist(e.error))?;

    info!("Host key persisted to {}", path.display());
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<(), IdentityError> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(IdentityError::Persist)
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> Result<(), IdentityError> {
    Ok(())
}
