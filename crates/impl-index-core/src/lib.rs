//! Implementor Index - load-order independent registry for generated trait
//! implementor tables.
//!
//! A documentation generator emits one artifact per trait listing, per
//! library, every type implementing it. Those artifacts and the UI index that
//! consumes them may come up in either order. This crate provides:
//!
//! - the data model ([`Registry`], [`LibraryImplementorSet`], [`ImplementorRecord`]),
//!   validated on construction and on decode;
//! - the [`RegistryGateway`], which buffers payloads until an [`IndexConsumer`]
//!   is installed and forwards them directly afterwards;
//! - the producer-side [`RegistryBuilder`];
//! - a codec and loader for the generated artifact files.
//!
//! # Example
//!
//! ```rust
//! use impl_index::{ImplementorRecord, Registry, RegistryBuilder, RegistryGateway};
//!
//! let mut gateway = RegistryGateway::new();
//!
//! // The artifact arrives first...
//! RegistryBuilder::new()
//!     .record("libA", ImplementorRecord::new("impl Debug for Foo", false, ["libA::Foo"])?)
//!     .submit_to(&mut gateway)?;
//!
//! // ...and the UI installs its hook afterwards.
//! gateway.install_consumer(|registry: Registry| {
//!     assert_eq!(registry.total_records(), 1);
//! });
//! # Ok::<(), impl_index::IndexError>(())
//! ```

pub mod artifact;
pub mod builder;
pub mod config;
pub mod error;
pub mod gateway;
pub mod loader;
pub mod model;

// Re-export commonly used types
pub use artifact::{parse_artifact, render_artifact, ArtifactFormat};
pub use builder::RegistryBuilder;
pub use config::{ArtifactConfig, GatewayConfig, PendingPolicy};
pub use error::{IndexError, Result};
pub use gateway::{GatewayStats, IndexConsumer, RegistryGateway};
pub use loader::{
    trait_path_for, write_artifact, ArtifactLoader, LoadFailure, LoadReport, TraitArtifact,
    TypeMatch,
};
pub use model::{ImplementorRecord, LibraryImplementorSet, Registry};
