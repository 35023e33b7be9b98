//! CLI command implementations

pub mod import;
pub mod migrate;
pub mod report;
pub mod visit;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use vizit_core::adapters::{FirestoreStore, ServiceAccountKey};
use vizit_core::config::{self, Config};

/// Get the vizit directory from environment or default
pub fn vizit_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("VIZIT_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".vizit")
    }
}

/// Load operator settings from the vizit directory
pub fn load_config() -> Result<Config> {
    Config::load(&vizit_dir()).context("Failed to load settings")
}

/// Resolve service account key material.
///
/// Order: the `--service-account` path, inline JSON in
/// `FIREBASE_SERVICE_ACCOUNT_JSON`, then the standard
/// `GOOGLE_APPLICATION_CREDENTIALS` path.
pub fn resolve_service_account(explicit: Option<&Path>) -> Result<Option<ServiceAccountKey>> {
    if let Some(path) = explicit {
        return Ok(Some(ServiceAccountKey::from_file(path)?));
    }

    if let Ok(raw) = std::env::var("FIREBASE_SERVICE_ACCOUNT_JSON") {
        if !raw.trim().is_empty() {
            return Ok(Some(ServiceAccountKey::from_json(&raw)?));
        }
    }

    if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
        if !path.trim().is_empty() {
            return Ok(Some(ServiceAccountKey::from_file(Path::new(&path))?));
        }
    }

    Ok(None)
}

/// Build the Firestore store from flags, settings and the environment.
///
/// With `FIRESTORE_EMULATOR_HOST` set the store talks to the emulator
/// and skips the token grant, matching the Admin SDK convention.
pub fn build_store(
    project_id: Option<&str>,
    collection: Option<&str>,
    service_account: Option<&Path>,
    config: &Config,
) -> Result<FirestoreStore> {
    let key = resolve_service_account(service_account)?;

    let working_dir = std::env::current_dir().context("Cannot resolve the working directory")?;
    let project_id = config::resolve_project_id(project_id, config, &working_dir)
        .or_else(|| key.as_ref().and_then(|key| key.project_id.clone()))
        .context("Unable to detect a project id in the current environment")?;

    let collection = collection.unwrap_or_else(|| config.collection());

    if let Ok(host) = std::env::var("FIRESTORE_EMULATOR_HOST") {
        if !host.trim().is_empty() {
            debug!("Using the Firestore emulator at {}", host.trim());
            let base_url = format!("http://{}/v1", host.trim());
            return FirestoreStore::with_fixed_token(&project_id, collection, &base_url, "owner");
        }
    }

    let key = key.context(
        "No service account credentials found. Pass --service-account, set \
         FIREBASE_SERVICE_ACCOUNT_JSON, or set GOOGLE_APPLICATION_CREDENTIALS.",
    )?;

    FirestoreStore::new(&project_id, collection, key)
}
