//! On-disk key storage.
//!
//! A [`KeyStore`] persists one signing key as two base64 text files, a secret
//! key file and a public key file, both written with owner-only permissions.
//!
//! # Bootstrap
//!
//! Several workers may cold-start at the same time and all find no key. The
//! secret key is therefore never written in place: each worker writes a
//! private temp file and publishes it with [`std::fs::hard_link`], which fails
//! if the target already exists. Exactly one worker wins; the others discard
//! their key and load the winner's. The public key is derivable from the
//! secret, so it is (re)written with temp-then-rename and readers never see a
//! partially written file.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::{KeyPair, PublicKey};

/// How the secret key is laid out inside the secret key file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyEncoding {
    /// 32-byte seed; the public key is stored only in the public key file.
    #[default]
    Seed,
    /// 64-byte `seed || public`; the public key is the 32-byte suffix.
    Expanded,
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed => write!(f, "seed"),
            Self::Expanded => write!(f, "expanded"),
        }
    }
}

impl FromStr for KeyEncoding {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" => Ok(Self::Seed),
            "expanded" => Ok(Self::Expanded),
            other => Err(CryptoError::UnknownEncoding(other.to_owned())),
        }
    }
}

/// A secret/public key file pair.
#[derive(Debug, Clone)]
pub struct KeyStore {
    secret_path: PathBuf,
    public_path: PathBuf,
    encoding: KeyEncoding,
}

impl KeyStore {
    /// Create a store for the given paths and encoding. Nothing is touched on disk.
    #[must_use]
    pub fn new(
        secret_path: impl Into<PathBuf>,
        public_path: impl Into<PathBuf>,
        encoding: KeyEncoding,
    ) -> Self {
        Self {
            secret_path: secret_path.into(),
            public_path: public_path.into(),
            encoding,
        }
    }

    /// Path of the secret key file.
    #[must_use]
    pub fn secret_path(&self) -> &Path {
        &self.secret_path
    }

    /// Path of the public key file.
    #[must_use]
    pub fn public_path(&self) -> &Path {
        &self.public_path
    }

    /// Secret key encoding.
    #[must_use]
    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Whether a secret key file is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        std::fs::symlink_metadata(&self.secret_path).is_ok()
    }

    /// Load an existing key pair without ever generating one.
    ///
    /// A missing public key file is rewritten from the secret key; a public
    /// key file that belongs to a different secret is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if no secret key exists,
    /// [`CryptoError::KeyMismatch`] if the two files disagree, or a decoding
    /// / I/O error.
    pub fn load(&self) -> CryptoResult<KeyPair> {
        self.load_checked(PublicRepair::MissingOnly)
    }

    /// Out-of-band provisioning: create a new key pair, refusing to replace
    /// an existing one.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AlreadyProvisioned`] if a secret key already
    /// exists (including one published concurrently), or an I/O error.
    pub fn provision(&self) -> CryptoResult<KeyPair> {
        self.ensure_parents()?;
        if self.exists() {
            return Err(CryptoError::AlreadyProvisioned {
                path: self.secret_path.display().to_string(),
            });
        }

        let keypair = KeyPair::generate();
        if !self.publish_secret(&keypair)? {
            return Err(CryptoError::AlreadyProvisioned {
                path: self.secret_path.display().to_string(),
            });
        }
        self.write_public(&keypair.export_public_key())?;

        info!(
            key_id = %keypair.key_id_hex(),
            path = %self.secret_path.display(),
            "provisioned signing key"
        );
        Ok(keypair)
    }

    /// Load the key pair, generating and persisting one on first use.
    ///
    /// Safe to call from concurrent cold starts: all callers end up with the
    /// same key. The secret key is authoritative here, so a missing or stale
    /// public key file is rewritten from it.
    ///
    /// # Errors
    ///
    /// Returns a decoding or I/O error.
    pub fn load_or_generate(&self) -> CryptoResult<KeyPair> {
        self.ensure_parents()?;
        if self.exists() {
            return self.load_checked(PublicRepair::Always);
        }

        let keypair = KeyPair::generate();
        if self.publish_secret(&keypair)? {
            self.write_public(&keypair.export_public_key())?;
            info!(
                key_id = %keypair.key_id_hex(),
                path = %self.secret_path.display(),
                "generated signing key"
            );
            Ok(keypair)
        } else {
            debug!("another worker published the signing key first");
            self.load_checked(PublicRepair::Always)
        }
    }

    fn load_checked(&self, repair: PublicRepair) -> CryptoResult<KeyPair> {
        if !self.exists() {
            return Err(CryptoError::KeyNotFound {
                path: self.secret_path.display().to_string(),
            });
        }

        let text = read_key_file(&self.secret_path)?;
        let bytes = Zeroizing::new(
            STANDARD
                .decode(text.trim())
                .map_err(|_| CryptoError::InvalidBase64Encoding)?,
        );
        let keypair = KeyPair::from_encoded(&bytes, self.encoding)?;
        self.reconcile_public(&keypair, repair)?;

        debug!(key_id = %keypair.key_id_hex(), "loaded signing key");
        Ok(keypair)
    }

    fn ensure_parents(&self) -> CryptoResult<()> {
        for path in [&self.secret_path, &self.public_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Returns `false` when another writer published a secret key first.
    fn publish_secret(&self, keypair: &KeyPair) -> CryptoResult<bool> {
        let encoded = keypair.to_encoded(self.encoding);
        let text = Zeroizing::new(STANDARD.encode(encoded.as_slice()));
        let tmp = temp_sibling(&self.secret_path);

        write_private_file(&tmp, text.as_bytes())?;
        let linked = std::fs::hard_link(&tmp, &self.secret_path);
        if let Err(e) = std::fs::remove_file(&tmp) {
            warn!(path = %tmp.display(), error = %e, "failed to remove temp key file");
        }

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn write_public(&self, public_key: &PublicKey) -> CryptoResult<()> {
        let tmp = temp_sibling(&self.public_path);
        write_private_file(&tmp, public_key.to_base64().as_bytes())?;
        std::fs::rename(&tmp, &self.public_path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            CryptoError::from(e)
        })
    }

    fn reconcile_public(&self, keypair: &KeyPair, repair: PublicRepair) -> CryptoResult<()> {
        let derived = keypair.export_public_key();
        if std::fs::symlink_metadata(&self.public_path).is_err() {
            warn!(
                path = %self.public_path.display(),
                "public key file missing; rewriting it from the secret key"
            );
            return self.write_public(&derived);
        }

        let stored = PublicKey::from_base64(&read_key_file(&self.public_path)?)?;
        if stored == derived {
            return Ok(());
        }
        if repair == PublicRepair::Always {
            warn!(
                path = %self.public_path.display(),
                stale = %stored.key_id_hex(),
                key_id = %derived.key_id_hex(),
                "public key file is stale; rewriting it from the secret key"
            );
            return self.write_public(&derived);
        }
        Err(CryptoError::KeyMismatch(format!(
            "{} holds {} but the secret key derives {}",
            self.public_path.display(),
            stored.key_id_hex(),
            derived.key_id_hex()
        )))
    }
}

/// How [`KeyStore`] treats a public key file that disagrees with the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublicRepair {
    /// Rewrite only a missing file; a foreign one is [`CryptoError::KeyMismatch`].
    MissingOnly,
    /// The secret is authoritative: rewrite a missing or stale file.
    Always,
}

/// A uniquely named temp file next to `path`, so rename/link stay on one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "key".to_owned());
    path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}

/// Create a new file readable only by the owner and write `contents` durably.
fn write_private_file(path: &Path, contents: &[u8]) -> CryptoResult<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Read a key file, refusing symlinks.
fn read_key_file(path: &Path) -> CryptoResult<Zeroizing<String>> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Err(CryptoError::IoError(format!(
            "refusing to read key file {}: path is a symlink",
            path.display()
        )));
    }
    Ok(Zeroizing::new(std::fs::read_to_string(path)?))
}
