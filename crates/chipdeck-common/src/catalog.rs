//! Localized message catalog, injected as an explicit context object.
//!
//! The catalog is constructed once, shared read-only via `Arc`, and passed
//! to whoever produces human-readable text (registry, engine, plugins).
//! Reloading is explicit: the owner calls [`TextCatalog::reload`] after a
//! language change; there is no implicit cross-instance sharing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// Key → localized string lookup with identity fallback.
#[derive(Debug, Default)]
pub struct TextCatalog {
    entries: RwLock<HashMap<String, String>>,
    source: RwLock<Option<PathBuf>>,
}

impl TextCatalog {
    /// Load a catalog from a JSON object file (`{"key": "text", ...}`).
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let catalog = TextCatalog::default();
        catalog.load_file(path.as_ref())?;
        *catalog.source.write() = Some(path.as_ref().to_path_buf());
        Ok(catalog)
    }

    /// Look up `key`, falling back to the key itself when absent.
    pub fn text(&self, key: &str) -> String {
        self.entries
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Re-read the backing file. No-op for catalogs built without one.
    pub fn reload(&self) -> std::io::Result<()> {
        let source = (*self.source.read()).clone();
        match source {
            Some(path) => self.load_file(&path),
            None => Ok(()),
        }
    }

    /// Replace the entries from a JSON object string.
    pub fn load_json(&self, json: &str) -> serde_json::Result<()> {
        let map: HashMap<String, String> = serde_json::from_str(json)?;
        *self.entries.write() = map;
        Ok(())
    }

    fn load_file(&self, path: &Path) -> std::io::Result<()> {
        let json = std::fs::read_to_string(path)?;
        self.load_json(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_identity() {
        let catalog = TextCatalog::default();
        assert_eq!(catalog.text("error.no-plugin"), "error.no-plugin");
    }

    #[test]
    fn loaded_entries_win() {
        let catalog = TextCatalog::default();
        catalog
            .load_json(r#"{"error.no-plugin": "No player for this file type"}"#)
            .unwrap();
        assert_eq!(catalog.text("error.no-plugin"), "No player for this file type");
        assert_eq!(catalog.text("other"), "other");
    }

    #[test]
    fn reload_without_source_is_a_no_op() {
        let catalog = TextCatalog::default();
        catalog.reload().unwrap();
    }
}
