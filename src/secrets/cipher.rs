//! Symmetric encryption of configuration values.
//!
//! Tokens use the Fernet format (AES-128-CBC with an HMAC-SHA256 tag,
//! URL-safe base64). The key lives in a local key store and is read at most
//! once per [`Cipher`].

use super::value::SecretValue;
use crate::error::{ConfigError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE};
use fernet::Fernet;
use std::cell::OnceCell;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the key file location.
pub const KEY_FILE_ENV: &str = "CONFIG_GRAPH_KEY_FILE";

/// Decoded key length required by Fernet.
const KEY_LEN: usize = 32;

/// Validated key material (URL-safe base64 of 32 bytes).
#[derive(Clone)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    /// Validate an encoded key, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        let encoded = raw.trim();
        let decoded = URL_SAFE
            .decode(encoded)
            .map_err(|_| ConfigError::decryption("key is not valid URL-safe base64"))?;
        if decoded.len() != KEY_LEN {
            return Err(ConfigError::decryption(format!(
                "key must decode to {} bytes, got {}",
                KEY_LEN,
                decoded.len()
            )));
        }
        Ok(Self(encoded.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(**********)")
    }
}

/// Generate a fresh encoded key.
pub fn generate_key() -> String {
    Fernet::generate_key()
}

/// Source of the symmetric key.
pub trait KeyStore {
    fn load_key(&self) -> Result<KeyMaterial>;
}

/// Key store backed by a single file holding the encoded key.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the key file: `CONFIG_GRAPH_KEY_FILE`, else the user config dir.
    pub fn discover() -> Self {
        let path = std::env::var(KEY_FILE_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("config-graph").join("secret.key")))
            .unwrap_or_else(|| PathBuf::from("secret.key"));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a newly generated key. Refuses to replace an existing file unless `force`.
    pub fn write_new_key(&self, force: bool) -> io::Result<KeyMaterial> {
        if self.path.exists() && !force {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("key file already exists: {}", self.path.display()),
            ));
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let key = generate_key();
        std::fs::write(&self.path, format!("{}\n", key))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(KeyMaterial(key))
    }
}

impl KeyStore for FileKeyStore {
    fn load_key(&self) -> Result<KeyMaterial> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::decryption(format!(
                "failed to read key file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        KeyMaterial::parse(&raw)
    }
}

/// Replaces ciphertext with a [`SecretValue`].
pub trait Decryptor {
    fn decrypt(&self, ciphertext: &str) -> Result<SecretValue>;
}

/// Fernet cipher with lazily loaded, cached key material.
pub struct Cipher {
    store: Box<dyn KeyStore>,
    fernet: OnceCell<Fernet>,
}

impl Cipher {
    /// Create a cipher that reads its key from `store` on first use.
    pub fn new(store: impl KeyStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            fernet: OnceCell::new(),
        }
    }

    /// Create a cipher from key material already in hand.
    pub fn from_key(key: &KeyMaterial) -> Result<Self> {
        let cipher = Self::new(NoKeyStore);
        let fernet = build_fernet(key)?;
        let _ = cipher.fernet.set(fernet);
        Ok(cipher)
    }

    fn fernet(&self) -> Result<&Fernet> {
        if let Some(fernet) = self.fernet.get() {
            return Ok(fernet);
        }
        let key = self.store.load_key()?;
        let fernet = build_fernet(&key)?;
        Ok(self.fernet.get_or_init(|| fernet))
    }

    /// Encrypt plaintext into a token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(self.fernet()?.encrypt(plaintext.as_bytes()))
    }
}

impl Decryptor for Cipher {
    fn decrypt(&self, ciphertext: &str) -> Result<SecretValue> {
        let bytes = self
            .fernet()?
            .decrypt(ciphertext.trim())
            .map_err(|_| ConfigError::decryption("token is malformed or failed authentication"))?;
        let plaintext = String::from_utf8(bytes)
            .map_err(|_| ConfigError::decryption("decrypted value is not valid UTF-8"))?;
        Ok(SecretValue::new(plaintext))
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("key_loaded", &self.fernet.get().is_some())
            .finish()
    }
}

fn build_fernet(key: &KeyMaterial) -> Result<Fernet> {
    Fernet::new(key.as_str()).ok_or_else(|| ConfigError::decryption("invalid key material"))
}

/// Key store for ciphers constructed with explicit key material.
struct NoKeyStore;

impl KeyStore for NoKeyStore {
    fn load_key(&self) -> Result<KeyMaterial> {
        Err(ConfigError::decryption("no key store configured"))
    }
}
