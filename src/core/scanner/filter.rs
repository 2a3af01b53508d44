//! Entry filtering logic for the scanner.

use std::path::{Path, PathBuf};

/// Decides which directory entries the walk descends into or yields
pub struct EntryFilter {
    /// Whether to include hidden files and directories
    include_hidden: bool,
    /// Subtree never walked (typically the destination root)
    excluded: Option<PathBuf>,
}

impl EntryFilter {
    /// Create a filter that accepts everything
    pub fn new() -> Self {
        Self {
            include_hidden: true,
            excluded: None,
        }
    }

    /// Include hidden entries (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Skip a whole subtree
    pub fn with_excluded(mut self, excluded: Option<PathBuf>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Check if an entry should be visited. `root` itself is always visited.
    pub fn should_visit(&self, path: &Path, root: &Path) -> bool {
        if path == root {
            return true;
        }

        if let Some(ref excluded) = self.excluded {
            if path.starts_with(excluded) {
                return false;
            }
        }

        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return false;
                }
            }
        }

        true
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_everything_by_default() {
        let filter = EntryFilter::new();
        let root = Path::new("/photos");
        assert!(filter.should_visit(Path::new("/photos/.hidden.jpg"), root));
        assert!(filter.should_visit(Path::new("/photos/doc.pdf"), root));
    }

    #[test]
    fn filter_can_exclude_hidden() {
        let filter = EntryFilter::new().with_hidden(false);
        let root = Path::new("/photos");
        assert!(!filter.should_visit(Path::new("/photos/.hidden.jpg"), root));
        assert!(!filter.should_visit(Path::new("/photos/.thumbnails"), root));
        assert!(filter.should_visit(Path::new("/photos/visible.jpg"), root));
    }

    #[test]
    fn filter_skips_excluded_subtree() {
        let filter = EntryFilter::new().with_excluded(Some(PathBuf::from("/photos/sorted")));
        let root = Path::new("/photos");
        assert!(!filter.should_visit(Path::new("/photos/sorted"), root));
        assert!(!filter.should_visit(Path::new("/photos/sorted/2024/a.jpg"), root));
        assert!(filter.should_visit(Path::new("/photos/sorted-not/a.jpg"), root));
    }

    #[test]
    fn root_is_always_visited() {
        let filter = EntryFilter::new().with_hidden(false);
        let root = Path::new("/photos/.archive");
        assert!(filter.should_visit(root, root));
    }
}
