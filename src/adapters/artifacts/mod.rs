//! Artifact adapter: loads the trained scaler and classifier from disk.
//!
//! Expected layout of the artifact directory:
//!
//! ```text
//! scaler.json      fitted standard scaler
//! model.json       fitted classifier, tagged by "kind"
//! manifest.json    SHA-256 digests of the two files above (signed mode)
//! artifacts.sig    Ed25519 signature over manifest.json (signed mode)
//! ```
//!
//! Loading happens once at startup. Any error here leaves the service in
//! its degraded state; it never aborts the process.

mod classifier;
pub mod manifest;
mod scaler;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

pub use classifier::{ClassifierModel, DecisionTree, LogisticRegression, RandomForest, TreeNode};
pub use manifest::{ArtifactManifest, VerifyOptions};
pub use scaler::StandardScaler;

use crate::ports::{Classifier, Scaler};

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";

/// Errors raised while loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("artifact integrity check failed: {0}")]
    Integrity(String),
}

/// A scaler and classifier known to agree on feature count.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub scaler: StandardScaler,
    pub classifier: ClassifierModel,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Load and validate both artifacts from `dir`.
///
/// # Errors
/// Returns error if a file is missing, malformed, fails integrity checks, or
/// the two artifacts disagree on feature count.
pub fn load(dir: &Path, options: &VerifyOptions) -> Result<LoadedArtifacts, ArtifactError> {
    let manifest = manifest::verify(dir, options)?;

    let scaler: StandardScaler = read_json(dir, SCALER_FILE, manifest.as_ref())?;
    scaler.validate()?;

    let classifier: ClassifierModel = read_json(dir, MODEL_FILE, manifest.as_ref())?;
    classifier.validate()?;

    let n = scaler.feature_names().len();
    if classifier.num_features() != n {
        return Err(ArtifactError::Invalid(format!(
            "classifier expects {} features but scaler produces {n}",
            classifier.num_features()
        )));
    }

    tracing::info!(
        "Loaded artifacts from {:?} (classifier={}, n_features={}, signed={})",
        dir,
        classifier.kind(),
        n,
        manifest.is_some()
    );

    Ok(LoadedArtifacts {
        scaler,
        classifier,
        loaded_at: chrono::Utc::now(),
    })
}

fn read_json<T: DeserializeOwned>(
    dir: &Path,
    name: &str,
    manifest: Option<&ArtifactManifest>,
) -> Result<T, ArtifactError> {
    let path = dir.join(name);
    let bytes = std::fs::read(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    if let Some(manifest) = manifest {
        manifest.check_file(name, &bytes)?;
    }
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse { path, source })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for writing artifact directories in tests.

    use std::collections::BTreeMap;
    use std::path::Path;

    use base64::Engine;
    use ed25519_dalek::{Signer, SigningKey};

    use super::*;
    use crate::domain::FEATURE_COLUMNS;

    /// Scaler over the production columns with mean 0 and scale 1.
    pub fn identity_scaler() -> StandardScaler {
        StandardScaler {
            feature_names_in: FEATURE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            mean: vec![0.0; FEATURE_COLUMNS.len()],
            scale: vec![1.0; FEATURE_COLUMNS.len()],
        }
    }

    /// Logistic regression that only looks at `age`.
    pub fn age_only_model(weight: f64, intercept: f64) -> ClassifierModel {
        let mut coefficients = vec![0.0; FEATURE_COLUMNS.len()];
        coefficients[0] = weight;
        ClassifierModel::LogisticRegression(LogisticRegression {
            coefficients,
            intercept,
        })
    }

    pub fn write_artifacts(dir: &Path, scaler: &StandardScaler, model: &ClassifierModel) {
        std::fs::write(
            dir.join(SCALER_FILE),
            serde_json::to_vec(scaler).expect("serialize scaler"),
        )
        .expect("write scaler");
        std::fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(model).expect("serialize model"),
        )
        .expect("write model");
    }

    pub fn write_signed_manifest(dir: &Path, signing_key: &SigningKey) {
        let mut files = BTreeMap::new();
        for name in [SCALER_FILE, MODEL_FILE] {
            let bytes = std::fs::read(dir.join(name)).expect("read artifact");
            files.insert(name.to_string(), manifest::sha256_hex(&bytes));
        }
        let manifest = ArtifactManifest {
            version: manifest::MANIFEST_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            nonce_b64: base64::engine::general_purpose::STANDARD.encode([7u8; 16]),
            files,
        };
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize manifest");
        std::fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        let signature = signing_key.sign(&bytes);
        std::fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
    }

    pub fn unsigned() -> VerifyOptions {
        VerifyOptions {
            verifying_key: None,
            allow_unsigned: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use ed25519_dalek::SigningKey;
    use rand::RngCore;
    use tempfile::tempdir;

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    #[test]
    fn test_load_unsigned() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &identity_scaler(), &age_only_model(0.1, -5.0));

        let loaded = load(temp.path(), &unsigned()).expect("Should load");
        assert_eq!(loaded.classifier.kind(), "logistic_regression");
        assert_eq!(loaded.scaler.feature_names().len(), 13);
    }

    #[test]
    fn test_load_missing_files_fails() {
        let temp = tempdir().expect("tempdir");
        let err = load(temp.path(), &unsigned()).expect_err("Should fail");
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_load_rejects_feature_count_disagreement() {
        let temp = tempdir().expect("tempdir");
        let model = ClassifierModel::LogisticRegression(LogisticRegression {
            coefficients: vec![1.0; 5],
            intercept: 0.0,
        });
        write_artifacts(temp.path(), &identity_scaler(), &model);
        let err = load(temp.path(), &unsigned()).expect_err("Should fail");
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn test_load_signed() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &identity_scaler(), &age_only_model(0.1, -5.0));
        let key = signing_key();
        write_signed_manifest(temp.path(), &key);

        let options = VerifyOptions {
            verifying_key: Some(key.verifying_key()),
            allow_unsigned: false,
        };
        load(temp.path(), &options).expect("Should load signed artifacts");
    }

    #[test]
    fn test_load_signed_rejects_tampered_model() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &identity_scaler(), &age_only_model(0.1, -5.0));
        let key = signing_key();
        write_signed_manifest(temp.path(), &key);

        // Replace the model after signing.
        write_artifacts(temp.path(), &identity_scaler(), &age_only_model(0.1, 5.0));

        let options = VerifyOptions {
            verifying_key: Some(key.verifying_key()),
            allow_unsigned: false,
        };
        let err = load(temp.path(), &options).expect_err("Should reject");
        assert!(matches!(err, ArtifactError::Integrity(_)));
    }

    #[test]
    fn test_load_signed_rejects_wrong_key() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &identity_scaler(), &age_only_model(0.1, -5.0));
        write_signed_manifest(temp.path(), &signing_key());

        let options = VerifyOptions {
            verifying_key: Some(signing_key().verifying_key()),
            allow_unsigned: true,
        };
        let err = load(temp.path(), &options).expect_err("Should reject");
        assert!(matches!(err, ArtifactError::Integrity(_)));
    }

    #[test]
    fn test_load_signed_requires_manifest() {
        let temp = tempdir().expect("tempdir");
        write_artifacts(temp.path(), &identity_scaler(), &age_only_model(0.1, -5.0));

        let options = VerifyOptions {
            verifying_key: Some(signing_key().verifying_key()),
            allow_unsigned: false,
        };
        assert!(load(temp.path(), &options).is_err());
    }

    #[test]
    fn test_shipped_artifacts_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let loaded = load(&dir, &unsigned()).expect("Shipped artifacts should load");
        assert_eq!(
            loaded.scaler.feature_names(),
            crate::domain::FEATURE_COLUMNS
                .iter()
                .map(|c| (*c).to_string())
                .collect::<Vec<_>>()
                .as_slice()
        );
    }
}
