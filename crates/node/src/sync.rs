//! Account directory replication.
//!
//! Each node keeps an accounts directory that is pushed, in full, to every
//! peer it connects to. Paths on the wire are relative to that directory and
//! always use `/` as separator.

use crate::peer::{Peer, PeerError, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// One entry of an account directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEntry {
    Directory(String),
    File(String),
}

/// The accounts directory of a node.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    root: PathBuf,
}

impl AccountDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory. Parents always come before their contents.
    ///
    /// A missing root is treated as empty.
    pub fn entries(&self) -> io::Result<Vec<AccountEntry>> {
        let mut entries = Vec::new();
        if self.root.is_dir() {
            walk(&self.root, "", &mut entries)?;
        }
        Ok(entries)
    }

    /// Send every directory and file to `remote`.
    pub fn push_to(&self, remote: &dyn Peer) -> Result<()> {
        for entry in self.entries()? {
            match entry {
                AccountEntry::Directory(path) => remote.create_directory(&path)?,
                AccountEntry::File(path) => {
                    let content = fs::read(self.root.join(&path))?;
                    remote.receive_file(&path, &content)?;
                }
            }
        }
        Ok(())
    }

    /// Map a wire path onto the local filesystem.
    ///
    /// Only plain relative paths are accepted: absolute paths and `..`
    /// components would escape the accounts directory.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        let mut depth = 0;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(PeerError::InvalidPath(path.to_string()));
                }
            }
        }

        if depth == 0 {
            return Err(PeerError::InvalidPath(path.to_string()));
        }
        Ok(resolved)
    }

    pub fn create_directory(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.resolve(path)?)?;
        Ok(())
    }

    /// Write a file, creating missing parent directories.
    pub fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)?;
        Ok(())
    }
}

fn walk(dir: &Path, prefix: &str, entries: &mut Vec<AccountEntry>) -> io::Result<()> {
    let mut children: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let name = child.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = child.file_type()?;
        if file_type.is_dir() {
            entries.push(AccountEntry::Directory(relative.clone()));
            walk(&child.path(), &relative, entries)?;
        } else if file_type.is_file() {
            entries.push(AccountEntry::File(relative));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> (tempfile::TempDir, AccountDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let accounts = AccountDirectory::new(dir.path());
        accounts.write_file("alice/profile.json", b"{}").unwrap();
        accounts.write_file("alice/keys/main.pub", b"key").unwrap();
        accounts.write_file("readme.txt", b"hi").unwrap();
        accounts.create_directory("empty").unwrap();
        (dir, accounts)
    }

    #[test]
    fn test_entries_walk_in_order() {
        let (_dir, accounts) = populated();

        assert_eq!(
            accounts.entries().unwrap(),
            vec![
                AccountEntry::Directory("alice".into()),
                AccountEntry::Directory("alice/keys".into()),
                AccountEntry::File("alice/keys/main.pub".into()),
                AccountEntry::File("alice/profile.json".into()),
                AccountEntry::Directory("empty".into()),
                AccountEntry::File("readme.txt".into()),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = AccountDirectory::new(dir.path().join("absent"));
        assert!(accounts.entries().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let accounts = AccountDirectory::new("/srv/accounts");

        for bad in ["../etc/passwd", "a/../../b", "/etc/passwd", "", "."] {
            assert!(
                matches!(accounts.resolve(bad), Err(PeerError::InvalidPath(_))),
                "{bad:?} should be rejected"
            );
        }

        assert_eq!(
            accounts.resolve("./alice/x").unwrap(),
            PathBuf::from("/srv/accounts/alice/x")
        );
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = AccountDirectory::new(dir.path());

        accounts.write_file("deep/nested/file.bin", &[1, 2, 3]).unwrap();
        assert_eq!(
            fs::read(dir.path().join("deep/nested/file.bin")).unwrap(),
            vec![1, 2, 3]
        );
    }
}
