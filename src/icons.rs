//! Icon loading and caching
//!
//! Icon extraction is expensive and icons never change once loaded, so
//! loaded icons are memoized in an `IconCache` shared by every dialog in the
//! process. Entries are only ever added.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{DialogError, Result};

/// Renderable icon image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    /// File the icon came from (`None` for the built-in fallback)
    pub source: Option<PathBuf>,
    /// Encoded image data
    pub data: Arc<[u8]>,
}

impl Icon {
    pub fn new(source: PathBuf, data: Vec<u8>) -> Self {
        Self {
            source: Some(source),
            data: data.into(),
        }
    }

    /// Built-in icon used when loading fails
    pub fn fallback() -> Self {
        Self {
            source: None,
            data: Arc::from(Vec::new()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source.is_none()
    }
}

/// Turns a file path into an icon
pub trait IconLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Icon>;
}

/// Reads the icon file as-is
#[derive(Debug, Default, Clone, Copy)]
pub struct FileIconLoader;

impl IconLoader for FileIconLoader {
    fn load(&self, path: &Path) -> Result<Icon> {
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(DialogError::InvalidIcon {
                path: path.to_path_buf(),
            });
        }
        Ok(Icon::new(path.to_path_buf(), data))
    }
}

type IconMap = RwLock<HashMap<PathBuf, Arc<Icon>>>;

/// Process-wide icon caches: dialog icons by path, application icons by
/// executable path.
#[derive(Debug, Default)]
pub struct IconCache {
    icons: IconMap,
    app_icons: IconMap,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dialog/banner icon for `path`
    pub fn icon(&self, path: &Path, loader: &dyn IconLoader) -> Arc<Icon> {
        Self::lookup(&self.icons, path, loader)
    }

    /// Application icon for the executable at `path`
    pub fn app_icon(&self, path: &Path, loader: &dyn IconLoader) -> Arc<Icon> {
        Self::lookup(&self.app_icons, path, loader)
    }

    pub fn len(&self) -> usize {
        self.icons.read().len() + self.app_icons.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(map: &IconMap, path: &Path, loader: &dyn IconLoader) -> Arc<Icon> {
        if let Some(icon) = map.read().get(path) {
            return icon.clone();
        }

        // Load outside the lock; if two dialogs race, the first insert wins
        match loader.load(path) {
            Ok(icon) => {
                debug!("Cached icon {}", path.display());
                map.write()
                    .entry(path.to_path_buf())
                    .or_insert_with(|| Arc::new(icon))
                    .clone()
            }
            Err(e) => {
                warn!("Failed to load icon {}: {}, using fallback", path.display(), e);
                map.write()
                    .entry(path.to_path_buf())
                    .or_insert_with(|| Arc::new(Icon::fallback()))
                    .clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        fail: bool,
    }

    impl IconLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<Icon> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DialogError::InvalidIcon {
                    path: path.to_path_buf(),
                });
            }
            Ok(Icon::new(path.to_path_buf(), vec![1, 2, 3]))
        }
    }

    #[test]
    fn test_icons_are_memoized() {
        let cache = IconCache::new();
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let a = cache.icon(Path::new("/opt/app/app.ico"), &loader);
        let b = cache.icon(Path::new("/opt/app/app.ico"), &loader);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        // Separate cache for executables
        cache.app_icon(Path::new("/opt/app/app.ico"), &loader);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failure_caches_fallback() {
        let cache = IconCache::new();
        let loader = CountingLoader {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let icon = cache.app_icon(Path::new("/usr/bin/missing"), &loader);
        assert!(icon.is_fallback());
        let again = cache.app_icon(Path::new("/usr/bin/missing"), &loader);
        assert!(Arc::ptr_eq(&icon, &again));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_file_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.ico");
        std::fs::write(&path, [0u8, 0, 1, 0]).unwrap();
        let icon = FileIconLoader.load(&path).unwrap();
        assert_eq!(icon.data.len(), 4);

        let empty = dir.path().join("empty.ico");
        std::fs::write(&empty, b"").unwrap();
        assert!(FileIconLoader.load(&empty).is_err());
        assert!(FileIconLoader.load(&dir.path().join("nope.ico")).is_err());
    }
}
