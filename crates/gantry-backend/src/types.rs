//! Directory listing types.

use serde::{Deserialize, Serialize};

/// A read-only projection of one remote directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Entry name (not the full path).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes.
    pub size: u64,
}

impl FileInfo {
    /// Create a file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let file = FileInfo::file("report.txt", 1024);
        assert_eq!(file.name, "report.txt");
        assert!(!file.is_dir);
        assert_eq!(file.size, 1024);

        let dir = FileInfo::directory("uploads");
        assert!(dir.is_dir);
        assert_eq!(dir.size, 0);
    }
}
