//! Config directory watcher for reload-on-change.
//!
//! A root that doesn't exist yet loads as an empty config, so the watcher
//! falls back to its nearest existing ancestor and reloads once it appears.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::collector::is_config_file;
use crate::config::loader::Loader;
use crate::config::schema::Config;

/// Watches a config root and reloads it whenever a config file changes.
pub struct ConfigWatcher {
    loader: Loader,
    update_tx: mpsc::UnboundedSender<Config>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// `loader` is used as a template: every reload clones it into a fresh
    /// loader. Returns the watcher and a receiver for reloaded configs.
    pub fn new(loader: Loader) -> (Self, mpsc::UnboundedReceiver<Config>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self { loader, update_tx }, update_rx)
    }

    /// Start watching in a background thread. Dropping the returned
    /// watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let loader = self.loader.clone();
        let root = std::path::absolute(self.loader.root()).map_err(notify::Error::io)?;
        let watch_path = watch_target(&root);
        let trigger_root = root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !is_reload_trigger(&event, &trigger_root) {
                        return;
                    }
                    tracing::info!(paths = ?event.paths, "Config change detected, reloading...");
                    match loader.clone().load() {
                        Ok(config) => {
                            let _ = tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "Failed to reload config. Keeping current configuration."
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        if watch_path != root {
            tracing::warn!(
                root = %root.display(),
                watching = %watch_path.display(),
                "Config root does not exist, watching nearest existing parent"
            );
        }
        watcher.watch(&watch_path, RecursiveMode::Recursive)?;

        tracing::info!(root = %root.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn watch_target(root: &Path) -> PathBuf {
    root.ancestors()
        .find(|dir| dir.exists())
        .unwrap_or(root)
        .to_path_buf()
}

/// A change under `root` to a config file, to a directory, or to the root itself.
fn is_reload_trigger(event: &Event, root: &Path) -> bool {
    let kind = &event.kind;
    if !(kind.is_create() || kind.is_modify() || kind.is_remove()) {
        return false;
    }
    // Removing or renaming a directory drops every config file beneath it.
    let dir_event = matches!(
        kind,
        EventKind::Create(CreateKind::Folder)
            | EventKind::Remove(RemoveKind::Folder)
            | EventKind::Modify(ModifyKind::Name(_))
    );
    event
        .paths
        .iter()
        .filter(|p| p.starts_with(root))
        .any(|p| is_config_file(p) || p == root || (dir_event && p.extension().is_none()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, RenameMode};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reload_trigger_filters_events() {
        let root = Path::new("/srv/config");

        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/srv/config/app.yaml".into());
        assert!(is_reload_trigger(&event, root));

        let event = Event::new(EventKind::Create(CreateKind::File)).add_path("/srv/config/notes.txt".into());
        assert!(!is_reload_trigger(&event, root));

        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path("/srv/config/app.yaml".into());
        assert!(!is_reload_trigger(&event, root));
    }

    #[test]
    fn test_directory_changes_trigger_reload() {
        let root = Path::new("/srv/config");

        let event = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path("/srv/config/services".into());
        assert!(is_reload_trigger(&event, root));

        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path("/srv/config/services".into());
        assert!(is_reload_trigger(&event, root));

        let event = Event::new(EventKind::Create(CreateKind::Folder)).add_path("/srv/config".into());
        assert!(is_reload_trigger(&event, root));
    }

    #[test]
    fn test_changes_outside_root_are_ignored() {
        let root = Path::new("/srv/config");

        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/srv/other/app.yaml".into());
        assert!(!is_reload_trigger(&event, root));

        let event = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path("/srv/cache".into());
        assert!(!is_reload_trigger(&event, root));
    }

    #[test]
    fn test_missing_root_watches_existing_parent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("config/nested");
        assert_eq!(watch_target(&root), tmp.path());
        assert_eq!(watch_target(tmp.path()), tmp.path());
    }

    #[tokio::test]
    async fn test_reloads_on_change() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("app.yaml"), "version: 1\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(Loader::new(tmp.path()));
        let _watcher = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(tmp.path().join("app.yaml"), "version: 2\n").unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match updates.recv().await {
                    Some(config) if config.version == 2 => return Some(config),
                    Some(_) => continue,
                    None => return None,
                }
            }
        })
        .await
        .expect("timed out waiting for reload")
        .expect("watcher channel closed");

        assert_eq!(reloaded.version, 2);
    }

    #[tokio::test]
    async fn test_reloads_when_missing_root_appears() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("config");

        let (watcher, mut updates) = ConfigWatcher::new(Loader::new(&root));
        let _watcher = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::create_dir(&root).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        fs::write(root.join("app.yaml"), "version: 3\n").unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match updates.recv().await {
                    Some(config) if config.version == 3 => return Some(config),
                    Some(_) => continue,
                    None => return None,
                }
            }
        })
        .await
        .expect("timed out waiting for reload")
        .expect("watcher channel closed");

        assert_eq!(reloaded.version, 3);
    }
}
