// ── Credential collaborator ──
//
// The stored password is a cipher; core asks this collaborator for the
// plaintext right before authenticating and never keeps it around.

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Password cipher is empty")]
    Empty,

    #[error("Password cipher is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Credential store error: {0}")]
    Store(String),
}

/// Read-only access to stored credentials.
pub trait CredentialService: Send + Sync {
    fn decrypt_password(&self, cipher: &[u8]) -> Result<SecretString, CredentialError>;
}

/// Treats the cipher as UTF-8 plaintext.
///
/// For deployments where the password already came out of a secure store
/// (OS keyring, environment) and needs no further decryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextCredentials;

impl CredentialService for PlainTextCredentials {
    fn decrypt_password(&self, cipher: &[u8]) -> Result<SecretString, CredentialError> {
        if cipher.is_empty() {
            return Err(CredentialError::Empty);
        }
        let text = std::str::from_utf8(cipher)?;
        Ok(SecretString::from(text.to_owned()))
    }
}
