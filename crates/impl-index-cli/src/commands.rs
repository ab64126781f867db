//! Subcommand implementations.

use anyhow::{Context, Result};
use impl_index::{
    write_artifact, ArtifactFormat, ArtifactLoader, GatewayConfig, LoadReport, PendingPolicy,
    Registry, RegistryGateway,
};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Gateway settings from an optional config file; `--merge-pending` overrides the file.
pub fn gateway_config(path: Option<&Path>, merge_pending: bool) -> Result<GatewayConfig> {
    let config = match path {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("Failed to load gateway config {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    if merge_pending {
        return Ok(config.with_pending_policy(PendingPolicy::MergeByLibrary));
    }
    Ok(config)
}

fn load_roots(dirs: &[PathBuf]) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    for dir in dirs {
        let loaded = ArtifactLoader::new(dir)
            .load_all()
            .with_context(|| format!("Failed to load artifacts from {}", dir.display()))?;
        report.extend(loaded);
    }
    for failure in &report.failures {
        warn!("Skipped {}: {}", failure.path.display(), failure.error);
    }
    Ok(report)
}

/// Load one or more documentation roots and, per trait, run the artifacts
/// through a gateway before installing a consumer. Prints what each trait's
/// consumer receives.
pub fn inspect(
    dirs: &[PathBuf],
    json: bool,
    config: &GatewayConfig,
    out: &mut impl Write,
) -> Result<()> {
    let report = load_roots(dirs)?;

    let mut delivered: Vec<(&str, Registry)> = Vec::new();
    for trait_path in report.traits() {
        let mut gateway = RegistryGateway::with_config(config.clone());
        let submitted = report.submit_trait(trait_path, &mut gateway);
        debug!("Submitted {} payloads for {}", submitted, trait_path);

        // The CLI is the index consumer; it keeps whatever the gateway hands over.
        let received: Rc<RefCell<Vec<Registry>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        gateway.install_consumer(move |registry: Registry| sink.borrow_mut().push(registry));

        for registry in received.take() {
            delivered.push((trait_path, registry));
        }
    }

    if json {
        let mut object = serde_json::Map::new();
        for (trait_path, registry) in &delivered {
            object.insert(trait_path.to_string(), serde_json::to_value(registry)?);
        }
        writeln!(out, "{}", serde_json::to_string_pretty(&object)?)?;
    } else {
        write_summary(&delivered, out)?;
    }

    info!(
        "Inspected {} artifacts across {} traits, {} failed",
        report.files_loaded(),
        delivered.len(),
        report.failures.len()
    );
    Ok(())
}

fn write_summary(delivered: &[(&str, Registry)], out: &mut impl Write) -> Result<()> {
    for (trait_path, registry) in delivered {
        writeln!(out, "{}", trait_path)?;
        for (library, set) in registry.iter() {
            writeln!(
                out,
                "\t{}\t{} records\t{} synthetic",
                library,
                set.len(),
                set.synthetic_count()
            )?;
        }
    }
    writeln!(
        out,
        "total\t{} traits\t{} records",
        delivered.len(),
        delivered
            .iter()
            .map(|(_, registry)| registry.total_records())
            .sum::<usize>()
    )?;
    Ok(())
}

/// Convert one artifact to `format`, writing to `output` or to `out`.
pub fn render(
    input: &Path,
    output: Option<&Path>,
    format: ArtifactFormat,
    out: &mut impl Write,
) -> Result<()> {
    let registry = ArtifactLoader::load_file(input)
        .with_context(|| format!("Failed to load artifact {}", input.display()))?;

    match output {
        Some(path) => {
            write_artifact(path, &registry, format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Rendered {} as {} to {}", input.display(), format, path.display());
        }
        None => {
            out.write_all(format.encode(&registry)?.as_bytes())?;
        }
    }
    Ok(())
}

/// Print every record, across all traits, whose subject types include `type_path`.
pub fn find(dir: &Path, type_path: &str, out: &mut impl Write) -> Result<()> {
    let report = load_roots(&[dir.to_path_buf()])?;

    let matches = report.records_for_type(type_path);
    for found in &matches {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            found.trait_path,
            found.library,
            if found.record.is_synthetic() { "synthetic" } else { "explicit" },
            found.record.description()
        )?;
    }

    if matches.is_empty() {
        info!("No implementations recorded for {}", type_path);
    }
    Ok(())
}
