//! In-memory VFS implementation.
//!
//! The entire tree lives in a `BTreeMap<String, Node>` keyed by normalized
//! absolute paths, so directory listings come out sorted for free. Intended
//! for unit tests and ephemeral terminal sessions.

use std::borrow::Cow;
use std::collections::BTreeMap;

use mirage_types::error::{MirageError, Result};

use crate::{EntryKind, Vfs, VfsEntry};

#[derive(Debug, Clone)]
enum Node {
    File(String),
    Dir,
}

/// A fully in-memory virtual file system.
#[derive(Debug)]
pub struct MemoryVfs {
    nodes: BTreeMap<String, Node>,
}

impl MemoryVfs {
    /// Create a new in-memory VFS with only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self { nodes }
    }

    /// Create a directory, creating parents as needed. Existing directories
    /// are left alone.
    pub fn mkdir(&mut self, path: &str) {
        let path = normalize(path).into_owned();
        if self.nodes.contains_key(&path) {
            return;
        }
        let par = parent(&path).to_string();
        if par != path {
            self.mkdir(&par);
        }
        self.nodes.insert(path, Node::Dir);
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether a path is already in normal form (starts with `/`, no `//`,
/// no trailing `/` unless root).
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root). Returns the input unchanged when already normal.
fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let prefixed = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };
    let mut result = String::with_capacity(prefixed.len());
    let mut prev_slash = false;
    for ch in prefixed.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}

/// Return the parent of a normalized path.
fn parent(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "/",
    }
}

impl Vfs for MemoryVfs {
    fn read(&self, path: &str) -> Result<String> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File(text)) => Ok(text.clone()),
            Some(Node::Dir) => Err(MirageError::Vfs(format!("is a directory: {path}"))),
            None => Err(MirageError::Vfs(format!("no such file: {path}"))),
        }
    }

    fn write(&mut self, path: &str, text: &str) -> Result<()> {
        let path = normalize(path);
        let par = parent(&path);
        if !self.nodes.contains_key(par) {
            return Err(MirageError::Vfs(format!(
                "parent directory does not exist: {par}"
            )));
        }
        self.nodes
            .insert(path.into_owned(), Node::File(text.to_string()));
        Ok(())
    }

    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir) => {},
            Some(Node::File(_)) => {
                return Err(MirageError::Vfs(format!("not a directory: {path}")));
            },
            None => {
                return Err(MirageError::Vfs(format!("no such directory: {path}")));
            },
        }

        let prefix = if path.as_ref() == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };

        // BTreeMap iteration is sorted by key; range-scan from the prefix and
        // stop once past it. Direct children have no further `/` in the rest.
        let mut entries = Vec::new();
        for (key, node) in self.nodes.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                entries.push(VfsEntry {
                    name: rest.to_string(),
                    kind: match node {
                        Node::Dir => EntryKind::Directory,
                        Node::File(_) => EntryKind::File,
                    },
                    size: match node {
                        Node::File(text) => text.len() as u64,
                        Node::Dir => 0,
                    },
                });
            }
        }
        Ok(entries)
    }

    fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(normalize(path).as_ref())
    }
}
