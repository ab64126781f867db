//! Artifact loader.
//!
//! Collects generated artifacts from a documentation output tree. Every
//! artifact describes one trait, named by its path under the root
//! (`core/fmt/trait.Debug.js` is `core::fmt::Debug`), so artifacts are kept
//! apart per trait and only artifacts of the same trait are ever merged.

use crate::artifact::ArtifactFormat;
use crate::config::ArtifactConfig;
use crate::error::{IndexError, Result};
use crate::gateway::RegistryGateway;
use crate::model::{ImplementorRecord, Registry};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// An artifact that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: String,
}

/// One loaded artifact: the implementors of a single trait.
#[derive(Debug, Clone, Serialize)]
pub struct TraitArtifact {
    /// Trait path derived from the artifact location, e.g. `core::fmt::Debug`.
    pub trait_path: String,
    pub path: PathBuf,
    pub registry: Registry,
}

/// A record matched by subject type, with the trait and library it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMatch {
    pub trait_path: String,
    pub library: String,
    pub record: ImplementorRecord,
}

/// Outcome of loading one or more artifact trees.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Loaded artifacts in load order.
    pub artifacts: Vec<TraitArtifact>,
    /// Artifacts skipped because they failed to parse.
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn files_loaded(&self) -> usize {
        self.artifacts.len()
    }

    /// Append another report, e.g. from a second documentation root.
    pub fn extend(&mut self, other: LoadReport) {
        self.artifacts.extend(other.artifacts);
        self.failures.extend(other.failures);
    }

    /// Artifacts grouped by trait, traits in order of first appearance.
    pub fn by_trait(&self) -> IndexMap<&str, Vec<&TraitArtifact>> {
        let mut grouped: IndexMap<&str, Vec<&TraitArtifact>> = IndexMap::new();
        for artifact in &self.artifacts {
            grouped
                .entry(artifact.trait_path.as_str())
                .or_default()
                .push(artifact);
        }
        grouped
    }

    /// Distinct trait paths in order of first appearance.
    pub fn traits(&self) -> Vec<&str> {
        self.by_trait().into_keys().collect()
    }

    /// Merged view of one trait. Artifacts of the same trait are folded in
    /// load order, newest set wins per library.
    pub fn trait_registry(&self, trait_path: &str) -> Option<Registry> {
        let mut merged: Option<Registry> = None;
        for artifact in self.artifacts.iter().filter(|a| a.trait_path == trait_path) {
            merged
                .get_or_insert_with(Registry::default)
                .absorb(artifact.registry.clone());
        }
        merged
    }

    /// Merged view of every trait.
    pub fn trait_registries(&self) -> IndexMap<String, Registry> {
        self.traits()
            .into_iter()
            .filter_map(|t| self.trait_registry(t).map(|r| (t.to_string(), r)))
            .collect()
    }

    /// Record count across every trait's merged view.
    pub fn total_records(&self) -> usize {
        self.trait_registries()
            .values()
            .map(Registry::total_records)
            .sum()
    }

    /// Every record, across all traits, naming `type_path` as a subject type.
    pub fn records_for_type(&self, type_path: &str) -> Vec<TypeMatch> {
        let mut matches = Vec::new();
        for (trait_path, registry) in self.trait_registries() {
            for (library, record) in registry.records_for_type(type_path) {
                matches.push(TypeMatch {
                    trait_path: trait_path.clone(),
                    library: library.to_string(),
                    record: record.clone(),
                });
            }
        }
        matches
    }

    /// Submit each artifact of `trait_path` to `gateway`, one payload per file.
    ///
    /// The gateway's pending policy decides what survives when several
    /// artifacts of the trait arrive before a consumer. Returns the number of
    /// payloads submitted.
    pub fn submit_trait(&self, trait_path: &str, gateway: &mut RegistryGateway) -> usize {
        let mut submitted = 0;
        for artifact in self.artifacts.iter().filter(|a| a.trait_path == trait_path) {
            debug!(
                "Submitting {} for {}",
                artifact.path.display(),
                artifact.trait_path
            );
            gateway.submit(artifact.registry.clone());
            submitted += 1;
        }
        submitted
    }
}

/// Loads implementor artifacts from a directory tree.
pub struct ArtifactLoader {
    root: PathBuf,
}

impl ArtifactLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact paths under the root, sorted for a stable load order.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(IndexError::Io {
                message: format!("Artifact directory not found: {}", self.root.display()),
                path: Some(self.root.clone()),
                source: None,
            });
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| ArtifactFormat::detect(p).is_ok())
            .collect();
        paths.sort();

        debug!(
            "Discovered {} artifacts under {}",
            paths.len(),
            self.root.display()
        );
        Ok(paths)
    }

    /// Trait path of an artifact, from its location under the root.
    pub fn trait_path(&self, path: &Path) -> String {
        trait_path_for(&self.root, path)
    }

    /// Load every artifact under the root.
    ///
    /// Broken artifacts are skipped and listed in the report rather than
    /// failing the whole load.
    pub fn load_all(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for path in self.discover()? {
            match Self::load_file(&path) {
                Ok(registry) => {
                    let trait_path = self.trait_path(&path);
                    debug!(
                        "Loaded {} libraries for {} from {}",
                        registry.len(),
                        trait_path,
                        path.display()
                    );
                    report.artifacts.push(TraitArtifact {
                        trait_path,
                        path,
                        registry,
                    });
                }
                Err(e) => {
                    warn!("Failed to load artifact {}: {}", path.display(), e);
                    report.failures.push(LoadFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Loaded {} artifacts ({} failed) covering {} traits",
            report.files_loaded(),
            report.failures.len(),
            report.traits().len()
        );
        Ok(report)
    }

    /// Load a single artifact, picking the codec from its extension.
    pub fn load_file(path: &Path) -> Result<Registry> {
        let format = ArtifactFormat::detect(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| IndexError::Io {
            message: format!("Failed to read artifact: {}", e),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;
        format.decode(&content)
    }
}

/// `core/fmt/trait.Debug.js` under `root` becomes `core::fmt::Debug`.
pub fn trait_path_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut segments: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = stem
        .strip_prefix(ArtifactConfig::TRAIT_FILE_PREFIX)
        .unwrap_or(&stem);
    segments.push(name.to_string());

    segments.join(ArtifactConfig::TRAIT_PATH_SEPARATOR)
}

/// Write `registry` to `path` atomically: temp file in the same directory, then rename.
pub fn write_artifact(path: &Path, registry: &Registry, format: ArtifactFormat) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        std::fs::create_dir_all(&parent).map_err(|e| IndexError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.clone()),
            source: Some(e),
        })?;
    }

    let content = format.encode(registry)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| IndexError::Io {
        message: format!("Failed to create temp file in {}", parent.display()),
        path: Some(parent.clone()),
        source: Some(e),
    })?;
    temp.write_all(content.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| IndexError::Io {
            message: format!("Failed to write temp file for {}", path.display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        })?;
    temp.persist(path).map_err(|e| IndexError::Io {
        message: format!("Failed to move artifact into place at {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Wrote {} artifact to {}", format, path.display());
    Ok(())
}
