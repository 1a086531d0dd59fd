//! Persistence of the bearer credential through the key-value capability.

use crux_kv::error::KeyValueError;

use crate::error::SessionError;

pub const MAX_KEY_LENGTH: usize = 512;

/// What the shell answers for get, set and delete. An empty value means
/// nothing was stored.
pub type KvResult = Result<Vec<u8>, KeyValueError>;

fn storage_error(e: &KeyValueError) -> SessionError {
    SessionError::Storage(e.to_string())
}

/// Stored form of the credential: the raw token as UTF-8.
#[must_use]
pub fn encode_credential(token: &str) -> Vec<u8> {
    token.as_bytes().to_vec()
}

/// Reads a stored credential. Empty or non-UTF-8 values count as absent.
pub fn decode_credential(result: KvResult) -> Result<Option<String>, SessionError> {
    let bytes = result.map_err(|e| storage_error(&e))?;
    Ok(String::from_utf8(bytes)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty()))
}

/// Write and delete acknowledgements only matter for logging.
pub fn acknowledge(result: KvResult) -> Result<(), SessionError> {
    result.map(drop).map_err(|e| storage_error(&e))
}

#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty() && key.len() <= MAX_KEY_LENGTH
}
