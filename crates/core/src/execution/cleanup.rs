//! Glob-based recursive file deletion
//!
//! Models the jar cleanup step: every file under a base directory whose
//! relative path matches a glob is removed. A missing base directory is
//! zero matches, not an error.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use tracing::{debug, info};

use crate::types::{ShipyardError, ShipyardResult};

/// Compiled delete rule
#[derive(Debug, Clone)]
pub struct DeleteMatching {
    base_dir: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
}

impl DeleteMatching {
    pub fn new(base_dir: impl Into<PathBuf>, pattern: &str) -> ShipyardResult<Self> {
        let glob = Glob::new(pattern).map_err(|e| ShipyardError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base_dir: base_dir.into(),
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Rebase a relative base directory onto `base`.
    pub fn resolved_against(&self, base: &Path) -> Self {
        Self {
            base_dir: base.join(&self.base_dir),
            pattern: self.pattern.clone(),
            matcher: self.matcher.clone(),
        }
    }

    /// Delete every matching file and return how many were removed.
    pub fn execute(&self) -> ShipyardResult<usize> {
        if !self.base_dir.is_dir() {
            debug!(
                base_dir = %self.base_dir.display(),
                "Delete root does not exist, nothing to remove"
            );
            return Ok(0);
        }

        let mut deleted = 0;
        let mut queue = VecDeque::new();
        queue.push_back(self.base_dir.clone());

        while let Some(current_dir) = queue.pop_front() {
            let entries = std::fs::read_dir(&current_dir).map_err(|cause| {
                ShipyardError::DeleteFailed {
                    path: current_dir.clone(),
                    cause,
                }
            })?;

            for entry in entries {
                let entry = entry.map_err(|cause| ShipyardError::DeleteFailed {
                    path: current_dir.clone(),
                    cause,
                })?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|cause| ShipyardError::DeleteFailed {
                    path: path.clone(),
                    cause,
                })?;

                if file_type.is_dir() {
                    queue.push_back(path);
                    continue;
                }

                let relative_path = path.strip_prefix(&self.base_dir).unwrap_or(&path);
                if !self.matcher.is_match(relative_path) {
                    continue;
                }

                std::fs::remove_file(&path).map_err(|cause| ShipyardError::DeleteFailed {
                    path: path.clone(),
                    cause,
                })?;
                debug!(path = %path.display(), "Deleted file");
                deleted += 1;
            }
        }

        info!(
            base_dir = %self.base_dir.display(),
            pattern = %self.pattern,
            deleted,
            "Removed matching files"
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_base_dir_is_zero_matches() {
        let temp_dir = tempfile::tempdir().unwrap();
        let rule = DeleteMatching::new(temp_dir.path().join("src/main/docker"), "*.jar").unwrap();

        assert_eq!(rule.execute().unwrap(), 0);
    }

    #[test]
    fn test_deletes_matching_files_recursively() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("src/main/docker");
        std::fs::create_dir_all(root.join("libs/nested")).unwrap();
        std::fs::write(root.join("app.jar"), "jar").unwrap();
        std::fs::write(root.join("libs/dep.jar"), "jar").unwrap();
        std::fs::write(root.join("libs/nested/other.jar"), "jar").unwrap();
        std::fs::write(root.join("Dockerfile"), "FROM scratch").unwrap();
        std::fs::write(root.join("libs/readme.txt"), "keep").unwrap();

        let rule = DeleteMatching::new(&root, "*.jar").unwrap();
        assert_eq!(rule.execute().unwrap(), 3);

        assert!(!root.join("app.jar").exists());
        assert!(!root.join("libs/nested/other.jar").exists());
        assert!(root.join("Dockerfile").exists());
        assert!(root.join("libs/readme.txt").exists());

        // Second pass finds nothing left to remove
        assert_eq!(rule.execute().unwrap(), 0);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = DeleteMatching::new("/tmp", "[unclosed").unwrap_err();
        assert!(matches!(err, ShipyardError::InvalidPattern { .. }));
    }
}
