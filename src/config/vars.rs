//! Variable store: the rendering context for config templates.
//!
//! Built from the vars subtree before any config file is read. Variable
//! files are parsed as-is; they are never rendered and cannot reference
//! each other.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::config::collector::collect_config_files;
use crate::config::error::ConfigError;
use crate::config::loader::load_file;
use crate::config::tree::ConfigTree;

/// Read-only variables resolved from the vars directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    tree: ConfigTree,
    files: usize,
}

impl VariableStore {
    /// Load every variable file under `dir`, in collector order.
    ///
    /// A missing directory yields an empty store.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let files = collect_config_files(dir, None)?;
        let mut tree = ConfigTree::new();
        for file in &files {
            load_file(file, &mut tree, None)?;
        }

        tracing::debug!(dir = %dir.display(), files = files.len(), "Variables loaded");
        Ok(Self {
            tree,
            files: files.len(),
        })
    }

    /// Number of files that contributed to the store.
    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Variable at a dotted key path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.tree.get(path)
    }

    /// Flat snapshot keyed by dotted path.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.tree.flatten()
    }

    /// The nested tree handed to templates as their root context.
    pub fn context(&self) -> &Value {
        self.tree.as_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = VariableStore::load(&tmp.path().join("_vars")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.file_count(), 0);
        assert_eq!(store.context(), &json!({}));
    }

    #[test]
    fn test_later_files_override_and_merge() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("a.yaml"), "region: us-east\ndb:\n  host: a\n").unwrap();
        fs::write(dir.join("b.json"), r#"{"db": {"port": 5432}}"#).unwrap();
        fs::create_dir_all(dir.join("env")).unwrap();
        fs::write(dir.join("env/prod.toml"), "region = \"eu-west\"\n").unwrap();

        let store = VariableStore::load(dir).unwrap();
        assert_eq!(store.file_count(), 3);
        assert_eq!(store.get("region"), Some(&json!("eu-west")));
        assert_eq!(store.get("db.host"), Some(&json!("a")));
        assert_eq!(store.get("db.port"), Some(&json!(5432)));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get("db.port"), Some(&json!(5432)));
    }

    #[test]
    fn test_template_syntax_stays_verbatim() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.yaml"), "greeting: \"{{ .name }}\"\n").unwrap();

        let store = VariableStore::load(tmp.path()).unwrap();
        assert_eq!(store.get("greeting"), Some(&json!("{{ .name }}")));
    }
}
