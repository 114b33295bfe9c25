//! Signed artifact manifest.
//!
//! `manifest.json` binds each artifact file to its SHA-256 digest and
//! `artifacts.sig` holds an Ed25519 signature over the exact manifest bytes.
//! Digests are checked against the bytes the loader actually parses, so a
//! file swapped after verification is never used.

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ArtifactError, MANIFEST_FILE, MODEL_FILE, SCALER_FILE, SIGNATURE_FILE};

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub created_at: i64,
    pub nonce_b64: String,
    /// File name -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Check that `bytes` match the digest bound for `name`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` if the file is unbound or differs.
    pub fn check_file(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let expected = self.files.get(name).ok_or_else(|| {
            ArtifactError::Integrity(format!("{name} is not bound by {MANIFEST_FILE}"))
        })?;
        let actual = sha256_hex(bytes);
        if !constant_time_eq(actual.as_bytes(), expected.to_ascii_lowercase().as_bytes()) {
            return Err(ArtifactError::Integrity(format!("digest mismatch for {name}")));
        }
        Ok(())
    }
}

/// How strictly artifacts are authenticated.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Key the manifest must be signed with. When set, signing is mandatory.
    pub verifying_key: Option<VerifyingKey>,

    /// Permit loading with no verifying key configured.
    pub allow_unsigned: bool,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ArtifactError::Integrity` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| ArtifactError::Integrity(format!("invalid verifying key base64: {e}")))?;
    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Integrity(format!(
            "verifying key must be 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| ArtifactError::Integrity("invalid verifying key".into()))
}

/// Verify the signed manifest in `dir`.
///
/// Returns `None` when unsigned loading is permitted and no key is set.
///
/// # Errors
/// Returns `ArtifactError::Integrity` if the manifest is missing, malformed
/// or not signed by the configured key.
pub fn verify(dir: &Path, options: &VerifyOptions) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let Some(key) = options.verifying_key.as_ref() else {
        if options.allow_unsigned {
            tracing::warn!("Loading UNSIGNED artifacts from {:?}", dir);
            return Ok(None);
        }
        return Err(ArtifactError::Integrity(
            "no verifying key configured and unsigned artifacts are not allowed".into(),
        ));
    };

    let manifest_path = dir.join(MANIFEST_FILE);
    let sig_path = dir.join(SIGNATURE_FILE);

    let manifest_bytes = std::fs::read(&manifest_path).map_err(|source| ArtifactError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    let sig_bytes = std::fs::read(&sig_path).map_err(|source| ArtifactError::Io {
        path: sig_path.clone(),
        source,
    })?;

    let sig_bytes: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Integrity(format!(
            "signature must be 64 bytes, got {}",
            sig_bytes.len()
        ))
    })?;
    key.verify(&manifest_bytes, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| ArtifactError::Integrity("invalid manifest signature".into()))?;

    let manifest: ArtifactManifest =
        serde_json::from_slice(&manifest_bytes).map_err(|source| ArtifactError::Parse {
            path: manifest_path,
            source,
        })?;

    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Integrity(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    let nonce = base64::engine::general_purpose::STANDARD
        .decode(manifest.nonce_b64.trim())
        .map_err(|e| ArtifactError::Integrity(format!("invalid nonce base64: {e}")))?;
    if nonce.len() != 16 {
        return Err(ArtifactError::Integrity(
            "nonce must decode to exactly 16 bytes".into(),
        ));
    }

    if manifest.created_at > chrono::Utc::now().timestamp() + MAX_FUTURE_SKEW_SECS {
        return Err(ArtifactError::Integrity(
            "manifest created_at is in the future".into(),
        ));
    }

    for required in [SCALER_FILE, MODEL_FILE] {
        if !manifest.files.contains_key(required) {
            return Err(ArtifactError::Integrity(format!(
                "{MANIFEST_FILE} must bind {required}"
            )));
        }
    }

    tracing::info!("Artifact manifest signature verified");
    Ok(Some(manifest))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_file() {
        let mut files = BTreeMap::new();
        files.insert("scaler.json".to_string(), sha256_hex(b"{}").to_uppercase());
        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            created_at: 0,
            nonce_b64: String::new(),
            files,
        };
        assert!(manifest.check_file("scaler.json", b"{}").is_ok());
        assert!(manifest.check_file("scaler.json", b"{ }").is_err());
        assert!(manifest.check_file("model.json", b"{}").is_err());
    }

    #[test]
    fn test_unsigned_requires_opt_in() {
        let dir = Path::new("does-not-matter");
        assert!(verify(dir, &VerifyOptions::default()).is_err());

        let options = VerifyOptions {
            verifying_key: None,
            allow_unsigned: true,
        };
        assert_eq!(verify(dir, &options).expect("Should allow"), None);
    }

    #[test]
    fn test_verifying_key_from_b64_rejects_bad_length() {
        let short = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        assert!(verifying_key_from_b64(&short).is_err());
        assert!(verifying_key_from_b64("not base64!").is_err());
    }
}
