//! Process-wide mapper
//!
//! Some callers want a single registry without threading a handle around.
//! The global instance is never created implicitly: install one at startup.

use crate::registry::ObjectMapper;
use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<ObjectMapper> = OnceCell::new();

/// Install the process-wide mapper
///
/// # Errors
/// Returns `mapper` back when one is already installed.
pub fn install(mapper: ObjectMapper) -> Result<&'static ObjectMapper, ObjectMapper> {
    GLOBAL.try_insert(mapper).map_err(|(_, rejected)| rejected)
}

/// Installed process-wide mapper
#[inline]
#[must_use]
pub fn get() -> Option<&'static ObjectMapper> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use omap_types::TypeCatalog;
    use std::sync::Arc;

    #[test]
    fn installs_once() {
        let first = ObjectMapper::new(Arc::new(TypeCatalog::new()));
        let installed = install(first).unwrap();
        assert!(std::ptr::eq(installed, get().unwrap()));

        let second = ObjectMapper::new(Arc::new(TypeCatalog::new()));
        assert!(install(second).is_err());
    }
}
