//! Secret handling: redaction-aware values, the cipher, and the tag pass.

mod cipher;
mod tags;
mod value;

pub use cipher::{
    Cipher, Decryptor, FileKeyStore, KEY_FILE_ENV, KeyMaterial, KeyStore, generate_key,
};
pub use tags::{ENCRYPTED_TAG, contains_tags, resolve_tags};
pub use value::{REDACTION_MARKER, SecretValue};
