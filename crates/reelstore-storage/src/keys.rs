//! Storage key derivation.
//!
//! Key format: `{prefix}/{name}.{ext}` when a prefix is given, otherwise `{name}.{ext}`.
//! `name` is drawn from the thread-local CSPRNG and never derived from user input.

use base64::Engine;
use rand::RngCore;
use reelstore_core::constants::KEY_ENTROPY_BYTES;

use crate::traits::{StorageError, StorageResult};

/// File extension for a supported media type.
pub fn extension_for(media_type: &str) -> Option<&'static str> {
    match media_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        _ => None,
    }
}

/// Derive a fresh storage key for an object of `media_type`.
pub fn derive_key(media_type: &str, prefix: Option<&str>) -> StorageResult<String> {
    let ext = extension_for(media_type)
        .ok_or_else(|| StorageError::UnsupportedMediaType(media_type.to_string()))?;

    let mut bytes = [0u8; KEY_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let name = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);

    Ok(match prefix {
        Some(prefix) => format!("{}/{}.{}", prefix, name, ext),
        None => format!("{}.{}", name, ext),
    })
}
