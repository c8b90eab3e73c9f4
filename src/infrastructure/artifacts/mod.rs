//! Artifact files on disk

pub mod writer;

pub use writer::{snapshot_stem, ArtifactError, ArtifactWriter, WriteReport};
