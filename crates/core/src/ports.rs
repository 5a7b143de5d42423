//! Port interfaces for remote document access
//!
//! These traits define the boundaries between the access-layer logic
//! and the HTTP implementations in `docbridge-infra`.

use async_trait::async_trait;
use bytes::Bytes;
use docbridge_domain::{BearerCredential, DriveItem, OperationResult, RemoteSiteConfig, Result};

/// Source of bearer credentials for the remote document API
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Acquire a fresh credential
    ///
    /// Implementations must not cache: every call performs a new exchange.
    async fn acquire(&self) -> Result<BearerCredential>;
}

/// Read-only view of the remote document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the raw bytes of the file at `path`, relative to the document
    /// library
    async fn get_file_content(&self, path: &str) -> OperationResult<Bytes>;

    /// List the entries of `folder_path`; the empty string lists the library
    /// root
    async fn list_files(&self, folder_path: &str) -> OperationResult<Vec<DriveItem>>;

    /// Site this store is bound to
    fn site(&self) -> &RemoteSiteConfig;
}
