//! Domain types and models

pub mod credential;
pub mod diagnostics;
pub mod drive;
pub mod site;

pub use credential::BearerCredential;
pub use diagnostics::{DiagnosticReport, ErrorDetails, FileAccessReport, FileDetails};
pub use drive::{Drive, DriveItem, FileFacet, FolderFacet, ItemReference};
pub use site::SiteId;
