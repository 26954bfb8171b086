//! Vault file operations and file tree listing

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::error::VaultError;
use super::sandbox::Sandbox;

pub type Result<T> = std::result::Result<T, VaultError>;

/// Kind of entry in the file tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Represents a file or folder in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    /// Virtual path with forward slashes, relative to the vault root
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Always present for folders, absent for files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn file(name: String, path: String) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::File,
            children: None,
        }
    }

    pub fn folder(name: String, path: String, children: Vec<FileNode>) -> Self {
        Self {
            name,
            path,
            kind: NodeKind::Folder,
            children: Some(children),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Find a node by virtual path anywhere in a listing
    pub fn find<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
        for node in nodes {
            if node.path == path {
                return Some(node);
            }
            if let Some(children) = &node.children {
                if let Some(found) = Self::find(children, path) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// A markdown vault: a directory tree bounded by a [`Sandbox`].
///
/// Holds no state besides its configuration, so clones are independent
/// handles onto the same directory.
#[derive(Debug, Clone)]
pub struct Vault {
    sandbox: Sandbox,
    sort_entries: bool,
}

impl Vault {
    /// Open a vault rooted at `root`. The directory does not need to exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            sandbox: Sandbox::new(root)?,
            sort_entries: true,
        })
    }

    /// Sort listed entries by file name (folders and files interleaved)
    pub fn with_sorting(mut self, sort_entries: bool) -> Self {
        self.sort_entries = sort_entries;
        self
    }

    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// List the whole vault
    pub fn list(&self) -> Result<Vec<FileNode>> {
        self.list_tree("")
    }

    /// Recursively list the folder at `dir`. A missing folder has no entries.
    pub fn list_tree(&self, dir: &str) -> Result<Vec<FileNode>> {
        let absolute = self.sandbox.resolve(dir)?;
        if !exists(&absolute) {
            return Ok(Vec::new());
        }

        let virtual_dir = self.virtual_path(&absolute);
        let nodes = self.build_tree(&absolute, &virtual_dir)?;
        tracing::debug!("Listed {} entries under {:?}", nodes.len(), virtual_dir);
        Ok(nodes)
    }

    fn build_tree(&self, dir: &Path, virtual_dir: &str) -> Result<Vec<FileNode>> {
        let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1);
        if self.sort_entries {
            walker = walker.sort_by_file_name();
        }

        let mut nodes = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                VaultError::io(
                    format!("Failed to list folder: {}", dir.display()),
                    io::Error::from(e),
                )
            })?;

            let name = entry.file_name().to_string_lossy().into_owned();
            let path = join_virtual(virtual_dir, &name);

            // Symlinks are not followed; they show up as files
            let node = if entry.file_type().is_dir() {
                let children = self.build_tree(entry.path(), &path)?;
                FileNode::folder(name, path, children)
            } else {
                FileNode::file(name, path)
            };
            nodes.push(node);
        }

        Ok(nodes)
    }

    /// Read a whole file as UTF-8 text
    pub fn read(&self, path: &str) -> Result<String> {
        let absolute = self.sandbox.resolve(path)?;
        if !exists(&absolute) {
            return Err(VaultError::NotFound(path.to_string()));
        }

        fs::read_to_string(&absolute).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VaultError::NotFound(path.to_string()),
            _ => VaultError::io(format!("Failed to read file: {path}"), e),
        })
    }

    /// Overwrite a file, creating it if absent. Parent folders are not created.
    pub fn write(&self, path: &str, content: &str) -> Result<()> {
        let absolute = self.sandbox.resolve(path)?;
        fs::write(&absolute, content)
            .map_err(|e| VaultError::io(format!("Failed to write file: {path}"), e))?;
        tracing::info!("Saved {} ({} bytes)", path, content.len());
        Ok(())
    }

    /// Create an empty file or a folder at `path`
    pub fn create(&self, path: &str, kind: NodeKind) -> Result<()> {
        let absolute = self.sandbox.resolve(path)?;
        if exists(&absolute) {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }

        let already_exists = |e: io::Error, what: &str| match e.kind() {
            io::ErrorKind::AlreadyExists => VaultError::AlreadyExists(path.to_string()),
            _ => VaultError::io(format!("Failed to create {what}: {path}"), e),
        };

        match kind {
            NodeKind::Folder => {
                if let Some(parent) = absolute.parent() {
                    fs::create_dir_all(parent).map_err(|e| already_exists(e, "folder"))?;
                }
                // The final component uses an exclusive create so racing creators see AlreadyExists
                fs::create_dir(&absolute).map_err(|e| already_exists(e, "folder"))?;
            }
            NodeKind::File => {
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&absolute)
                    .map_err(|e| already_exists(e, "file"))?;
            }
        }

        tracing::info!("Created {:?} {}", kind, path);
        Ok(())
    }

    /// Delete a file, or a folder with everything inside it
    pub fn delete(&self, path: &str) -> Result<()> {
        let absolute = self.sandbox.resolve(path)?;
        if self.sandbox.is_root(&absolute) {
            return Err(VaultError::BadRequest(
                "Cannot delete the vault root".to_string(),
            ));
        }

        let metadata = match fs::symlink_metadata(&absolute) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NotFound(path.to_string()));
            }
            Err(e) => return Err(VaultError::io(format!("Failed to inspect: {path}"), e)),
        };

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&absolute)
        } else {
            fs::remove_file(&absolute)
        };
        removed.map_err(|e| VaultError::io(format!("Failed to delete: {path}"), e))?;

        tracing::info!("Deleted {}", path);
        Ok(())
    }

    /// Rename or move an item. Never overwrites; missing destination parents are created.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let from = self.sandbox.resolve(old_path)?;
        let to = self.sandbox.resolve(new_path)?;

        if self.sandbox.is_root(&from) {
            return Err(VaultError::BadRequest(
                "Cannot move the vault root".to_string(),
            ));
        }
        if !exists(&from) {
            return Err(VaultError::NotFound(old_path.to_string()));
        }
        if exists(&to) {
            return Err(VaultError::AlreadyExists(new_path.to_string()));
        }
        if to.starts_with(&from) {
            return Err(VaultError::BadRequest(format!(
                "Cannot move {old_path} into itself"
            )));
        }

        if let Some(parent) = to.parent() {
            if !exists(parent) {
                fs::create_dir_all(parent).map_err(|e| {
                    VaultError::io(format!("Failed to create folder for: {new_path}"), e)
                })?;
            }
        }

        fs::rename(&from, &to).map_err(|e| {
            VaultError::io(format!("Failed to move {old_path} to {new_path}"), e)
        })?;

        tracing::info!("Moved {} -> {}", old_path, new_path);
        Ok(())
    }

    /// Move an item into `folder`, keeping its name. Returns the new virtual path.
    pub fn move_into(&self, source: &str, folder: &str) -> Result<String> {
        let from = self.sandbox.resolve(source)?;
        let name = from
            .file_name()
            .ok_or_else(|| VaultError::BadRequest("Cannot move the vault root".to_string()))?;

        let target = self.sandbox.resolve(folder)?.join(name);
        let destination = self.virtual_path(&target);

        self.rename(source, &destination)?;
        Ok(destination)
    }

    /// Store a client-supplied document under `folder` (the root by default).
    ///
    /// Only the last segment of `file_name` is used. An existing file with the
    /// same name is overwritten. Returns the new virtual path.
    pub fn import(&self, file_name: &str, content: &str, folder: Option<&str>) -> Result<String> {
        let name = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if name.is_empty() || name == "." || name == ".." {
            return Err(VaultError::BadRequest(format!(
                "Invalid file name: {file_name:?}"
            )));
        }

        let target = self.sandbox.resolve(folder.unwrap_or_default())?.join(name);
        let destination = self.virtual_path(&target);

        self.write(&destination, content)?;
        tracing::info!("Imported {} as {}", file_name, destination);
        Ok(destination)
    }

    fn virtual_path(&self, absolute: &Path) -> String {
        self.sandbox.to_virtual(absolute).unwrap_or_default()
    }
}

/// Existence check that does not follow symlinks
fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn join_virtual(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
