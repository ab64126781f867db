//! Data model of a generated implementor index.
//!
//! A [`Registry`] maps library names to the ordered implementor records the
//! documentation generator found for one trait. Records are validated on
//! construction and on decode, so a record without subject types never exists.

use crate::error::{IndexError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// One documented trait implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct ImplementorRecord {
    #[serde(rename = "text")]
    description: String,
    #[serde(rename = "synthetic")]
    is_synthetic: bool,
    #[serde(rename = "types")]
    subject_type_identifiers: Vec<String>,
}

/// Unchecked wire form, validated into [`ImplementorRecord`].
#[derive(Deserialize)]
struct RecordWire {
    text: String,
    synthetic: bool,
    types: Vec<String>,
}

impl TryFrom<RecordWire> for ImplementorRecord {
    type Error = IndexError;

    fn try_from(wire: RecordWire) -> Result<Self> {
        ImplementorRecord::new(wire.text, wire.synthetic, wire.types)
    }
}

impl ImplementorRecord {
    /// Create a record.
    ///
    /// Fails with [`IndexError::StructuralViolation`] when no subject type is
    /// given or when one of the type paths is blank. The description is
    /// opaque markup and is not inspected.
    pub fn new<I, S>(
        description: impl Into<String>,
        is_synthetic: bool,
        subject_type_identifiers: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let subject_type_identifiers: Vec<String> = subject_type_identifiers
            .into_iter()
            .map(Into::into)
            .collect();

        if subject_type_identifiers.is_empty() {
            return Err(IndexError::structural(
                "types",
                "an implementor record needs at least one subject type",
            ));
        }
        if let Some(pos) = subject_type_identifiers
            .iter()
            .position(|t| t.trim().is_empty())
        {
            return Err(IndexError::structural(
                "types",
                format!("subject type at index {} is blank", pos),
            ));
        }

        Ok(Self {
            description: description.into(),
            is_synthetic,
            subject_type_identifiers,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the implementation was synthesized (auto trait) rather than written.
    pub fn is_synthetic(&self) -> bool {
        self.is_synthetic
    }

    pub fn subject_type_identifiers(&self) -> &[String] {
        &self.subject_type_identifiers
    }

    /// Whether any subject type of this record is exactly `type_path`.
    pub fn applies_to(&self, type_path: &str) -> bool {
        self.subject_type_identifiers.iter().any(|t| t == type_path)
    }
}

/// Ordered implementor records of one library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryImplementorSet(Vec<ImplementorRecord>);

impl LibraryImplementorSet {
    pub fn new(records: Vec<ImplementorRecord>) -> Self {
        Self(records)
    }

    pub fn push(&mut self, record: ImplementorRecord) {
        self.0.push(record);
    }

    pub fn records(&self) -> &[ImplementorRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImplementorRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of synthesized implementations in the set.
    pub fn synthetic_count(&self) -> usize {
        self.0.iter().filter(|r| r.is_synthetic()).count()
    }
}

impl From<Vec<ImplementorRecord>> for LibraryImplementorSet {
    fn from(records: Vec<ImplementorRecord>) -> Self {
        Self(records)
    }
}

impl FromIterator<ImplementorRecord> for LibraryImplementorSet {
    fn from_iter<T: IntoIterator<Item = ImplementorRecord>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LibraryImplementorSet {
    type Item = &'a ImplementorRecord;
    type IntoIter = std::slice::Iter<'a, ImplementorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Mapping from library name to its implementor records.
///
/// Library order follows insertion and is kept through serialization. The
/// public surface is read-only; registries are assembled with
/// [`crate::RegistryBuilder`] or decoded from an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, LibraryImplementorSet>")]
pub struct Registry {
    libraries: IndexMap<String, LibraryImplementorSet>,
}

impl Registry {
    /// Start assembling a registry.
    pub fn builder() -> crate::RegistryBuilder {
        crate::RegistryBuilder::new()
    }

    pub fn get(&self, library: &str) -> Option<&LibraryImplementorSet> {
        self.libraries.get(library)
    }

    pub fn contains(&self, library: &str) -> bool {
        self.libraries.contains_key(library)
    }

    /// Library names in insertion order.
    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LibraryImplementorSet)> {
        self.libraries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Record count across all libraries.
    pub fn total_records(&self) -> usize {
        self.libraries.values().map(LibraryImplementorSet::len).sum()
    }

    /// Every record naming `type_path` as a subject type, with its library.
    pub fn records_for_type<'a>(
        &'a self,
        type_path: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ImplementorRecord)> + 'a {
        self.iter().flat_map(move |(library, set)| {
            set.iter()
                .filter(move |record| record.applies_to(type_path))
                .map(move |record| (library, record))
        })
    }

    /// Replace or add the set for `library`. An existing key keeps its position.
    pub(crate) fn insert(
        &mut self,
        library: String,
        set: LibraryImplementorSet,
    ) -> Option<LibraryImplementorSet> {
        self.libraries.insert(library, set)
    }

    pub(crate) fn entry_mut(&mut self, library: String) -> &mut LibraryImplementorSet {
        self.libraries.entry(library).or_default()
    }

    /// Fold `other` into `self`, newest set wins per library.
    pub(crate) fn absorb(&mut self, other: Registry) {
        for (library, set) in other.libraries {
            self.libraries.insert(library, set);
        }
    }
}

impl TryFrom<IndexMap<String, LibraryImplementorSet>> for Registry {
    type Error = IndexError;

    fn try_from(libraries: IndexMap<String, LibraryImplementorSet>) -> Result<Self> {
        validate_library_name_all(libraries.keys())?;
        Ok(Self { libraries })
    }
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.libraries.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = (&'a String, &'a LibraryImplementorSet);
    type IntoIter = indexmap::map::Iter<'a, String, LibraryImplementorSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.libraries.iter()
    }
}

/// Library names are the registry key and must not be blank.
pub(crate) fn validate_library_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(IndexError::structural(
            "library",
            "library name must not be blank",
        ));
    }
    Ok(())
}

fn validate_library_name_all<'a>(mut names: impl Iterator<Item = &'a String>) -> Result<()> {
    names.try_for_each(|name| validate_library_name(name))
}
