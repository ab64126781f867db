//! Producer-side assembly of registry payloads.

use crate::error::Result;
use crate::gateway::RegistryGateway;
use crate::model::{validate_library_name, ImplementorRecord, LibraryImplementorSet, Registry};
use tracing::debug;

/// Builder for a complete registry snapshot.
///
/// A producer assembles every library it knows about and then submits the
/// snapshot once. Setting a library twice keeps the newer set.
///
/// # Example
///
/// ```
/// use impl_index::{ImplementorRecord, RegistryBuilder};
///
/// let registry = RegistryBuilder::new()
///     .record("libA", ImplementorRecord::new("impl Debug for Foo", false, ["libA::Foo"])?)
///     .record("libA", ImplementorRecord::new("impl Send for Foo", true, ["libA::Foo"])?)
///     .build()?;
///
/// assert_eq!(registry.get("libA").unwrap().len(), 2);
/// # Ok::<(), impl_index::IndexError>(())
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full record list for `library`, replacing any earlier one.
    pub fn library(
        mut self,
        library: impl Into<String>,
        set: impl Into<LibraryImplementorSet>,
    ) -> Self {
        self.registry.insert(library.into(), set.into());
        self
    }

    /// Append one record to `library`, creating the library if needed.
    pub fn record(mut self, library: impl Into<String>, record: ImplementorRecord) -> Self {
        self.registry.entry_mut(library.into()).push(record);
        self
    }

    /// Fold a whole registry in; its libraries replace same-named ones.
    pub fn merge(mut self, other: Registry) -> Self {
        self.registry.absorb(other);
        self
    }

    /// Finish the snapshot.
    ///
    /// Fails with a structural violation if any library name is blank.
    pub fn build(self) -> Result<Registry> {
        for library in self.registry.libraries() {
            validate_library_name(library)?;
        }
        Ok(self.registry)
    }

    /// Build the snapshot and hand it to `gateway`.
    ///
    /// Consumes the builder, so one builder submits at most once.
    pub fn submit_to(self, gateway: &mut RegistryGateway) -> Result<()> {
        let registry = self.build()?;
        debug!(
            "Submitting snapshot with {} libraries and {} records",
            registry.len(),
            registry.total_records()
        );
        gateway.submit(registry);
        Ok(())
    }
}
