//! Virtual file system abstraction for the MIRAGE_OS terminal core.
//!
//! The terminal never touches a real disk. The hosting application supplies
//! an implementation of [`Vfs`]; the core only calls it through the command
//! `Context`. [`MemoryVfs`] is the in-memory implementation used by tests
//! and ephemeral sessions.

mod memory;

pub use memory::MemoryVfs;
use mirage_types::error::Result;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry returned by [`Vfs::readdir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsEntry {
    /// Entry name without the directory prefix.
    pub name: String,
    pub kind: EntryKind,
    /// Content size in bytes (0 for directories).
    pub size: u64,
}

/// Filesystem capability consumed by the terminal core.
pub trait Vfs {
    /// Read a file as UTF-8 text.
    fn read(&self, path: &str) -> Result<String>;

    /// Create or replace a file, creating no intermediate directories.
    fn write(&mut self, path: &str, text: &str) -> Result<()>;

    /// List the direct children of a directory.
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>>;

    /// Whether a file or directory exists at the path.
    fn exists(&self, path: &str) -> bool;
}

/// Resolve a possibly-relative path against the current working directory,
/// collapsing `.` and `..` components.
pub fn resolve_path(cwd: &str, input: &str) -> String {
    let raw = if input.starts_with('/') {
        input.to_string()
    } else if cwd == "/" {
        format!("/{input}")
    } else {
        format!("{cwd}/{input}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}
