//! Testprep Library
//!
//! Acquires the browsers, drivers and server archives an integration test
//! run needs: resolves "latest of X" locators to URLs, downloads with digest
//! verification, extracts archives and renames what they produce.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`artifact`] - Descriptors, locators and content digests
//! - [`resolver`] - Locator resolution (static, release listing, object store)
//! - [`download`] - Streaming download worker with integrity checks
//! - [`postprocess`] - Archive extraction and post-extraction renames
//! - [`orchestrator`] - Two-phase, fail-fast run over a descriptor set

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artifact;
pub mod download;
pub mod orchestrator;
pub mod postprocess;
pub mod resolver;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use artifact::{
    ArtifactDescriptor, DescriptorError, DescriptorSet, DigestAlgorithm, ExpectedDigest, Locator,
    RenamePair,
};
pub use download::{DownloadError, FetchOutcome, HttpClient};
pub use orchestrator::{
    AcquireError, ArtifactFailure, ArtifactReport, ArtifactStatus, Orchestrator,
    OrchestratorError, RunPlan, RunReport, default_descriptors,
};
pub use postprocess::{ArchiveKind, CommandExtractor, Extractor, PostprocessError};
pub use resolver::{
    ResolveError, ResolvedUrl, Resolver, ResolverEndpoints, ResolverRegistry,
    build_default_resolver_registry,
};
