//! Centralized configuration for the implementor index.
//!
//! Constants describing the generated artifact layout live on [`ArtifactConfig`];
//! runtime behavior of the gateway is set through [`GatewayConfig`].

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout of the generated implementor artifacts.
pub struct ArtifactConfig;

impl ArtifactConfig {
    pub const SCRIPT_EXTENSION: &'static str = "js";
    pub const JSON_EXTENSION: &'static str = "json";

    /// Local table name used inside the generated script.
    pub const TABLE_NAME: &'static str = "implementors";
    /// Consumer hook the script calls when the UI is already initialized.
    pub const CONSUMER_HOOK: &'static str = "window.register_implementors";
    /// Global slot the script fills when the UI is not ready yet.
    pub const PENDING_SLOT: &'static str = "window.pending_implementors";

    /// File name prefix of a per-trait artifact, as in `trait.Debug.js`.
    pub const TRAIT_FILE_PREFIX: &'static str = "trait.";
    /// Separator used when turning an artifact's relative path into a trait path.
    pub const TRAIT_PATH_SEPARATOR: &'static str = "::";

    pub const SCRIPT_PROLOGUE: &'static str = "(function() {var implementors = {};";
    pub const SCRIPT_EPILOGUE: &'static str = "if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()";
}

/// How the gateway buffers payloads submitted before a consumer is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// A single pending slot. A newer payload replaces the buffered one.
    #[default]
    SingleSlot,
    /// Pending payloads are merged per library name, newest set wins per library.
    MergeByLibrary,
}

/// Runtime configuration for a [`crate::RegistryGateway`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GatewayConfig {
    pub pending_policy: PendingPolicy,
}

impl GatewayConfig {
    /// Load a gateway configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| IndexError::Io {
            message: format!("Failed to read gateway config: {}", e),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;

        serde_json::from_str(&content).map_err(|e| IndexError::Json {
            message: format!("Failed to parse gateway config {}: {}", path.display(), e),
            source: Some(e),
        })
    }

    pub fn with_pending_policy(mut self, policy: PendingPolicy) -> Self {
        self.pending_policy = policy;
        self
    }
}
