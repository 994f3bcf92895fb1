//! Trait definitions for the fetcher module.

use async_trait::async_trait;

use super::error::FetchError;
use super::types::{FetchRequest, FetchedArtifact};

/// Resolves a query to a local audio file.
///
/// Implementations must be safe to call from many workers at once: each
/// call owns its own output path and process state.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Searches, downloads and transcodes one song.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchedArtifact, FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}
