//! Template and stylesheet resources
//!
//! Every component loads a markup/stylesheet pair laid out as
//! `<prefix>/components/<id>/<id>.html` and `<prefix>/components/<id>/<id>.css`,
//! where `<id>` is the lowercased template identifier. Where the bytes come
//! from is a [`ResourceFetcher`]: a static HTTP server, a local directory,
//! or an in-memory table.

mod file;
mod http;
mod memory;

pub use file::FileFetcher;
pub use http::HttpFetcher;
pub use memory::MemoryFetcher;

use futures::future::BoxFuture;
use std::fmt;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Template identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Rejected template identifier
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid template identifier {raw:?}: {reason}")]
pub struct InvalidTemplateId {
    pub raw: String,
    pub reason: &'static str,
}

/// Key locating a component's markup and stylesheet.
/// Always stored in its lowercased form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(raw: &str) -> Result<Self, InvalidTemplateId> {
        let id = raw.trim().to_lowercase();
        let invalid = |reason| InvalidTemplateId {
            raw: raw.to_string(),
            reason,
        };

        if id.is_empty() {
            return Err(invalid("empty"));
        }
        if id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
            return Err(invalid("must be a single path segment"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        Ok(Self(id))
    }

    /// Derive the identifier from a Rust type name ("app::views::VikiHeader" -> "vikiheader")
    pub fn from_type_name<T: ?Sized>() -> Result<Self, InvalidTemplateId> {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::new(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource layout
// ─────────────────────────────────────────────────────────────────────────────

/// Derives resource paths from template identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePaths {
    prefix: String,
}

impl ResourcePaths {
    /// `prefix` is the application-root-relative location of `components/`.
    /// An empty prefix yields bare relative paths.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn component_file(&self, id: &TemplateId, ext: &str) -> String {
        let id = id.as_str();
        if self.prefix.is_empty() {
            format!("components/{id}/{id}.{ext}")
        } else {
            format!("{}/components/{id}/{id}.{ext}", self.prefix)
        }
    }

    pub fn markup(&self, id: &TemplateId) -> String {
        self.component_file(id, "html")
    }

    pub fn stylesheet(&self, id: &TemplateId) -> String {
        self.component_file(id, "css")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fetching
// ─────────────────────────────────────────────────────────────────────────────

/// Why a resource could not be retrieved
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("{path}: not found")]
    NotFound { path: String },

    #[error("{path}: HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("{path}: transport error: {message}")]
    Transport { path: String, message: String },

    /// The resource answered but its body could not be read
    #[error("{path}: failed to read body: {message}")]
    Body { path: String, message: String },
}

impl FetchError {
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::Status { path, .. }
            | Self::Transport { path, .. }
            | Self::Body { path, .. } => path,
        }
    }
}

/// Source of template and stylesheet bodies
///
/// Futures are `'static` so a build can outlive the borrow of its fetcher.
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>>;

    /// Short description for logs ("http://localhost:8080", "./ui", ...)
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_lowercased() {
        let id = TemplateId::new("VikiHeader").unwrap();
        assert_eq!(id.as_str(), "vikiheader");
        let paths = ResourcePaths::default();
        assert_eq!(paths.markup(&id), "components/vikiheader/vikiheader.html");
        assert_eq!(paths.stylesheet(&id), "components/vikiheader/vikiheader.css");
    }

    #[test]
    fn test_template_id_rejects_bad_input() {
        assert!(TemplateId::new("").is_err());
        assert!(TemplateId::new("   ").is_err());
        assert!(TemplateId::new("../etc").is_err());
        assert!(TemplateId::new("a/b").is_err());
        assert!(TemplateId::new("viki footer").is_err());
    }

    #[test]
    fn test_template_id_from_type_name() {
        struct VikiHeader;
        let id = TemplateId::from_type_name::<VikiHeader>().unwrap();
        assert_eq!(id.as_str(), "vikiheader");
    }

    #[test]
    fn test_prefix_applied() {
        let id = TemplateId::new("viki-footer").unwrap();
        let paths = ResourcePaths::new("/app/");
        assert_eq!(paths.prefix(), "/app");
        assert_eq!(paths.markup(&id), "/app/components/viki-footer/viki-footer.html");
    }
}
