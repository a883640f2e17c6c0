//! Artifact store
//!
//! Persists the fitted transformer and classifier as bincode envelopes
//! carrying magic bytes, a format version, run metadata and a SHA-256 of
//! the payload. Both halves of a pair share the run id of the training run
//! that produced them.

mod envelope;
mod store;

pub use envelope::{ArtifactEnvelope, ArtifactKind, ArtifactMetadata, ARTIFACT_MAGIC, FORMAT_VERSION};
pub use store::{ArtifactStore, ModelArtifacts, CLASSIFIER_FILE, TRANSFORMER_FILE};
