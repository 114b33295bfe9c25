//! Artifact signing utility.
//!
//! Writes `manifest.json` (SHA-256 of `scaler.json` and `model.json`) and
//! `artifacts.sig` (Ed25519 over the manifest bytes) into an artifact
//! directory, or generates a new signing seed.
//!
//! # Usage
//!
//! ```bash
//! sign_artifacts <artifact_dir>
//! sign_artifacts --generate-key <seed_path> [--force]
//! ```
//!
//! The signing seed (base64, 32 bytes) is read from the file named by
//! `CARDIORISK_SIGNING_KEY_B64_FILE`. Debug builds also accept it inline in
//! `CARDIORISK_SIGNING_KEY_B64`. Seed material is zeroized after use.

use std::collections::BTreeMap;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use cardiorisk::adapters::artifacts::manifest::{sha256_hex, ArtifactManifest, MANIFEST_VERSION};
use cardiorisk::adapters::artifacts::{MANIFEST_FILE, MODEL_FILE, SCALER_FILE, SIGNATURE_FILE};

const USAGE: &str =
    "Usage: sign_artifacts <artifact_dir>\n       sign_artifacts --generate-key <seed_path> [--force]";

enum Command {
    Sign(PathBuf),
    GenerateKey { seed_path: PathBuf, force: bool },
}

fn parse_args() -> Result<Command> {
    let mut args = std::env::args().skip(1);
    let mut dir: Option<PathBuf> = None;
    let mut seed_path: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--generate-key" => {
                let p = args.next().context(USAGE)?;
                seed_path = Some(PathBuf::from(p));
            }
            "--force" => force = true,
            "-h" | "--help" => bail!(USAGE),
            _ if dir.is_none() && !arg.starts_with('-') => dir = Some(PathBuf::from(arg)),
            _ => bail!("Unknown argument {arg:?}\n{USAGE}"),
        }
    }

    match (dir, seed_path) {
        (Some(dir), None) => Ok(Command::Sign(dir)),
        (None, Some(seed_path)) => Ok(Command::GenerateKey { seed_path, force }),
        _ => bail!(USAGE),
    }
}

fn read_signing_seed() -> Result<Zeroizing<[u8; 32]>> {
    const KEY_FILE_ENV: &str = "CARDIORISK_SIGNING_KEY_B64_FILE";
    const KEY_ENV: &str = "CARDIORISK_SIGNING_KEY_B64";

    let b64: Zeroizing<String> = if let Ok(path) = std::env::var(KEY_FILE_ENV) {
        Zeroizing::new(
            std::fs::read_to_string(path.trim())
                .with_context(|| format!("Failed reading signing key file {path:?}"))?,
        )
    } else if cfg!(debug_assertions) {
        Zeroizing::new(
            std::env::var(KEY_ENV)
                .with_context(|| format!("Missing signing key: set {KEY_FILE_ENV} or {KEY_ENV}"))?,
        )
    } else {
        bail!("Missing signing key: set {KEY_FILE_ENV}");
    };

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );
    if raw.len() != 32 {
        bail!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        );
    }

    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&raw);
    Ok(seed)
}

fn sign(dir: &Path) -> Result<()> {
    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed);

    let mut files = BTreeMap::new();
    for name in [SCALER_FILE, MODEL_FILE] {
        let path = dir.join(name);
        let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let mut nonce = [0u8; 16];
    OsRng.fill_bytes(&mut nonce);

    let manifest = ArtifactManifest {
        version: MANIFEST_VERSION,
        created_at: chrono::Utc::now().timestamp(),
        nonce_b64: general_purpose::STANDARD.encode(nonce),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig_path = dir.join(SIGNATURE_FILE);
    std::fs::write(&sig_path, signing_key.sign(&manifest_bytes).to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "CARDIORISK_ARTIFACT_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn generate_key(seed_path: &Path, force: bool) -> Result<()> {
    if seed_path.exists() && !force {
        bail!("Refusing to overwrite existing file {seed_path:?}. Use --force.");
    }

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let verifying_key = SigningKey::from_bytes(&seed).verifying_key();
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed));
    seed.zeroize();

    if let Some(parent) = seed_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(0o600);

    use std::io::Write;
    let mut file = opts
        .open(seed_path)
        .with_context(|| format!("Failed to open {seed_path:?}"))?;
    file.write_all(seed_b64.as_bytes())?;
    file.write_all(b"\n")?;

    // Print only non-secret material.
    println!("Wrote signing seed (base64) to {seed_path:?}");
    println!(
        "CARDIORISK_ARTIFACT_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );
    Ok(())
}

fn main() -> Result<()> {
    match parse_args()? {
        Command::Sign(dir) => sign(&dir),
        Command::GenerateKey { seed_path, force } => generate_key(&seed_path, force),
    }
}
