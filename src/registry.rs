use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

const REGISTRY_CAPACITY: usize = 16;

/// Returns true for codes that may be registered or resolved.
pub fn is_valid_status(code: u16) -> bool {
    (100..1000).contains(&code)
}

/// Maps status codes to the template used to render them.
///
/// Built once at startup and then shared by reference; lookups need no
/// synchronization.
#[derive(Debug, Clone)]
pub struct ErrorPageRegistry {
    pages: Option<HashMap<u16, PathBuf>>,
    fallback: PathBuf,
}

impl ErrorPageRegistry {
    pub fn new(fallback: impl Into<PathBuf>) -> Self {
        Self {
            pages: None,
            fallback: fallback.into(),
        }
    }

    /// Associates `path` with `code`.
    ///
    /// The backing map is created on the first call and kept for the
    /// lifetime of the registry; later calls add to it. Registering the same
    /// code twice replaces the earlier path.
    pub fn register(&mut self, code: u16, path: impl Into<PathBuf>) -> Result<()> {
        debug_assert!(is_valid_status(code), "status code {} out of range", code);

        let pages = self
            .pages
            .get_or_insert_with(|| HashMap::with_capacity(REGISTRY_CAPACITY));
        pages.try_reserve(1)?;

        let path = path.into();
        debug!(code, path = %path.display(), "registered error page");
        pages.insert(code, path);
        Ok(())
    }

    /// Returns the template for `code`, or the fallback when none is registered.
    pub fn resolve(&self, code: u16) -> &Path {
        debug_assert!(is_valid_status(code), "status code {} out of range", code);

        self.pages
            .as_ref()
            .and_then(|pages| pages.get(&code))
            .map(PathBuf::as_path)
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.pages.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
