//! # reposync-templates
//!
//! The desired state of the fleet: three template collections loaded from a
//! local tree, the managed path set, and repository-name substitution.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reposync_templates::{Collection, DirTemplateSource, TemplateSource};
//!
//! fn list(root: &str) {
//!     if let Ok(set) = DirTemplateSource::new(root).load() {
//!         for file in set.files(Collection::Always) {
//!             println!("{}: {} bytes", file.relative_path, file.content.len());
//!         }
//!     }
//! }
//! ```

pub mod error;
pub mod managed;
pub mod placeholder;
pub mod source;

pub use error::TemplateError;
pub use managed::ManagedPathSet;
pub use placeholder::{substitute_repo_name, REPO_NAME_TOKEN};
pub use source::{
    Collection, DirTemplateSource, TemplateFile, TemplateSet, TemplateSetBuilder, TemplateSource,
    DEFAULT_TEMPLATE_ROOT,
};
