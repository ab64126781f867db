//! Codec for generated implementor artifacts.
//!
//! The documentation generator writes one artifact per trait. In script form
//! it is a self-registering snippet:
//!
//! ```text
//! (function() {var implementors = {};
//! implementors["libA"] = [{"text":"impl Debug for Foo","synthetic":false,"types":["libA::Foo"]}];
//! if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()
//! ```
//!
//! The script hands its table to the UI hook if the hook exists and parks it
//! in a global slot otherwise, the same handoff [`crate::RegistryGateway`]
//! performs in-process. The JSON form is the bare serialized [`Registry`].

use crate::config::ArtifactConfig;
use crate::error::{IndexError, Result};
use crate::model::{validate_library_name, LibraryImplementorSet, Registry};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// On-disk representation of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Self-registering script, as emitted by the documentation generator.
    Script,
    /// Plain JSON object of library name to records.
    Json,
}

impl ArtifactFormat {
    /// Pick the format from a file extension.
    pub fn detect(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ArtifactConfig::SCRIPT_EXTENSION) => Ok(Self::Script),
            Some(ArtifactConfig::JSON_EXTENSION) => Ok(Self::Json),
            _ => Err(IndexError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Script => ArtifactConfig::SCRIPT_EXTENSION,
            Self::Json => ArtifactConfig::JSON_EXTENSION,
        }
    }

    pub fn encode(&self, registry: &Registry) -> Result<String> {
        match self {
            Self::Script => render_artifact(registry),
            Self::Json => Ok(serde_json::to_string_pretty(registry)?),
        }
    }

    pub fn decode(&self, content: &str) -> Result<Registry> {
        match self {
            Self::Script => parse_artifact(content),
            Self::Json => serde_json::from_str(content).map_err(|e| IndexError::Json {
                message: format!("Failed to parse registry JSON: {}", e),
                source: Some(e),
            }),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "script" | "js" => Ok(Self::Script),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown artifact format: {}", other)),
        }
    }
}

/// Render a registry as a self-registering script artifact.
pub fn render_artifact(registry: &Registry) -> Result<String> {
    let mut out = String::with_capacity(256 + registry.total_records() * 256);
    out.push_str(ArtifactConfig::SCRIPT_PROLOGUE);
    out.push('\n');

    for (library, set) in registry.iter() {
        out.push_str(ArtifactConfig::TABLE_NAME);
        out.push('[');
        out.push_str(&serde_json::to_string(library)?);
        out.push_str("] = ");
        out.push_str(&serde_json::to_string(set)?);
        out.push_str(";\n");
    }

    out.push_str(ArtifactConfig::SCRIPT_EPILOGUE);
    out.push('\n');
    Ok(out)
}

/// Parse a script artifact back into a registry.
///
/// Library order follows the file. A library assigned twice keeps the later
/// assignment.
pub fn parse_artifact(content: &str) -> Result<Registry> {
    let mut registry = Registry::default();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || is_wrapper_line(line) {
            continue;
        }

        let (library, set) = parse_assignment(line).map_err(|message| IndexError::ArtifactParse {
            line: line_no,
            message,
        })?;
        registry.insert(library, set);
    }

    Ok(registry)
}

fn is_wrapper_line(line: &str) -> bool {
    line == ArtifactConfig::SCRIPT_PROLOGUE
        || line == ArtifactConfig::SCRIPT_EPILOGUE
        || is_handoff_line(line)
}

/// The closing handoff with different spacing: it calls the hook or fills the pending slot.
fn is_handoff_line(line: &str) -> bool {
    line.starts_with("if")
        && line.contains(ArtifactConfig::CONSUMER_HOOK)
        && line.contains(ArtifactConfig::PENDING_SLOT)
}

/// Parse `implementors["<lib>"] = [...];`.
fn parse_assignment(line: &str) -> std::result::Result<(String, LibraryImplementorSet), String> {
    let rest = line
        .strip_prefix(ArtifactConfig::TABLE_NAME)
        .and_then(|r| r.trim_start().strip_prefix('['))
        .ok_or_else(|| format!("expected `{}[...] = ...`", ArtifactConfig::TABLE_NAME))?;

    let mut keys = serde_json::Deserializer::from_str(rest).into_iter::<String>();
    let library = match keys.next() {
        Some(Ok(library)) => library,
        Some(Err(e)) => return Err(format!("invalid library name: {}", e)),
        None => return Err("missing library name".to_string()),
    };
    validate_library_name(&library).map_err(|e| e.to_string())?;

    let rest = rest[keys.byte_offset()..]
        .trim_start()
        .strip_prefix(']')
        .and_then(|r| r.trim_start().strip_prefix('='))
        .ok_or_else(|| format!("expected `] =` after library {:?}", library))?;

    let body = rest.trim();
    let body = body.strip_suffix(';').unwrap_or(body);
    let set: LibraryImplementorSet = serde_json::from_str(body)
        .map_err(|e| format!("invalid records for library {:?}: {}", library, e))?;

    Ok((library, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImplementorRecord;

    const GENERATED: &str = r#"(function() {var implementors = {};
implementors["nodle_parachain"] = [{"text":"impl <a class=\"trait\" href=\"https://doc.rust-lang.org/1.61.0/core/fmt/trait.Debug.html\" title=\"trait core::fmt::Debug\">Debug</a> for <a class=\"struct\" href=\"nodle_parachain/chain_spec/struct.Extensions.html\" title=\"struct nodle_parachain::chain_spec::Extensions\">Extensions</a>","synthetic":false,"types":["nodle_parachain::chain_spec::Extensions"]},{"text":"impl Debug for Subcommand","synthetic":false,"types":["nodle_parachain::cli::Subcommand"]}];
implementors["pallet_staking"] = [{"text":"impl&lt;T&gt; Debug for Validator&lt;T&gt;","synthetic":false,"types":["pallet_staking::types::Validator"]}];
if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()"#;

    fn sample() -> Registry {
        Registry::builder()
            .record(
                "libA",
                ImplementorRecord::new("impl Debug for <a href=\"x\">Foo</a>", false, ["libA::Foo"])
                    .unwrap(),
            )
            .record(
                "lib \"quoted\"",
                ImplementorRecord::new("impl Send for Bar", true, ["q::Bar", "q::T"]).unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_generated_artifact() {
        let registry = parse_artifact(GENERATED).unwrap();
        let names: Vec<_> = registry.libraries().collect();
        assert_eq!(names, ["nodle_parachain", "pallet_staking"]);

        let nodle = registry.get("nodle_parachain").unwrap();
        assert_eq!(nodle.len(), 2);
        assert!(nodle.records()[0].description().contains("title=\"trait core::fmt::Debug\""));
        assert_eq!(
            nodle.records()[1].subject_type_identifiers(),
            ["nodle_parachain::cli::Subcommand"]
        );
    }

    #[test]
    fn test_render_shape() {
        let rendered = render_artifact(&sample()).unwrap();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ArtifactConfig::SCRIPT_PROLOGUE);
        assert!(lines[1].starts_with(r#"implementors["libA"] = [{"text":"#));
        assert!(lines[2].starts_with(r#"implementors["lib \"quoted\""] = "#));
        assert_eq!(lines[3], ArtifactConfig::SCRIPT_EPILOGUE);
    }

    #[test]
    fn test_render_then_parse_is_identity() {
        let registry = sample();
        let parsed = parse_artifact(&render_artifact(&registry).unwrap()).unwrap();
        assert_eq!(parsed, registry);
    }

    #[test]
    fn test_render_empty_registry() {
        let rendered = render_artifact(&Registry::default()).unwrap();
        assert_eq!(rendered.lines().count(), 2);
        assert!(parse_artifact(&rendered).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_assignment_last_wins() {
        let content = r#"implementors["a"] = [{"text":"old","synthetic":false,"types":["a::Old"]}];
implementors["b"] = [{"text":"b","synthetic":false,"types":["b::B"]}];
implementors["a"] = [{"text":"new","synthetic":false,"types":["a::New"]}];"#;
        let registry = parse_artifact(content).unwrap();
        let names: Vec<_> = registry.libraries().collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(registry.get("a").unwrap().records()[0].description(), "new");
    }

    #[test]
    fn test_parse_reports_line_of_garbage() {
        let content = format!("{}\nvar x = 1;\n", ArtifactConfig::SCRIPT_PROLOGUE);
        match parse_artifact(&content) {
            Err(IndexError::ArtifactParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_empty_types() {
        let content = r#"implementors["a"] = [{"text":"x","synthetic":false,"types":[]}];"#;
        let err = parse_artifact(content).unwrap_err();
        assert!(err.to_string().contains("subject type"));
    }

    #[test]
    fn test_parse_rejects_blank_library() {
        let content = r#"implementors[""] = [];"#;
        assert!(matches!(
            parse_artifact(content),
            Err(IndexError::ArtifactParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_accepts_respaced_handoff() {
        let content = r#"(function() {var implementors = {};
implementors["a"] = [{"text":"x","synthetic":false,"types":["a::X"]}];
if(window.register_implementors){ window.register_implementors(implementors); }else{ window.pending_implementors = implementors; }})()"#;
        let registry = parse_artifact(content).unwrap();
        assert_eq!(registry.total_records(), 1);
    }

    #[test]
    fn test_parse_rejects_foreign_wrapper_lines() {
        let hook_only = "if (window.register_implementors) {window.register_implementors(implementors);}";
        assert!(matches!(
            parse_artifact(hook_only),
            Err(IndexError::ArtifactParse { line: 1, .. })
        ));

        let other_iife = "(function() {var other = {};";
        assert!(parse_artifact(other_iife).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_bracket() {
        let content = r#"implementors["a" = [];"#;
        assert!(parse_artifact(content).is_err());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ArtifactFormat::detect(Path::new("core/fmt/trait.Debug.js")).unwrap(),
            ArtifactFormat::Script
        );
        assert_eq!(
            ArtifactFormat::detect(Path::new("index.json")).unwrap(),
            ArtifactFormat::Json
        );
        assert!(matches!(
            ArtifactFormat::detect(Path::new("README.md")),
            Err(IndexError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JS".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Script);
        assert_eq!("json".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Json);
        assert!("yaml".parse::<ArtifactFormat>().is_err());
        assert_eq!(ArtifactFormat::Script.to_string(), "script");
    }

    #[test]
    fn test_json_format_keeps_order() {
        let registry = sample();
        let encoded = ArtifactFormat::Json.encode(&registry).unwrap();
        let decoded = ArtifactFormat::Json.decode(&encoded).unwrap();
        let names: Vec<_> = decoded.libraries().collect();
        assert_eq!(names, ["libA", "lib \"quoted\""]);
    }
}
