//! Path resolution and containment for the vault root
//!
//! Every operation goes through [`Sandbox::resolve`] before touching storage.
//! Virtual paths are joined onto the root and lexically normalized; only the
//! normalized absolute form is compared against the root, component by
//! component, so `/vault/notes` never admits `/vault/notesx`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::error::VaultError;

/// Containment boundary for all vault operations
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`.
    ///
    /// Relative roots are taken from the current directory. An existing root
    /// is canonicalized so symlinked parents of the root compare correctly.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        let absolute = if root.is_absolute() {
            root
        } else {
            let cwd = std::env::current_dir()
                .map_err(|e| VaultError::io("Failed to read current directory", e))?;
            cwd.join(root)
        };

        let mut root = normalize(&absolute);
        if root.exists() {
            root = fs::canonicalize(&root).map_err(|e| {
                VaultError::io(format!("Failed to canonicalize root {}", root.display()), e)
            })?;
        }

        tracing::debug!("Sandbox root: {}", root.display());
        Ok(Self { root })
    }

    /// The canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a virtual path to an absolute location inside the root.
    ///
    /// Both `/` and `\` separate segments. An empty path is the root itself.
    pub fn resolve(&self, virtual_path: &str) -> Result<PathBuf, VaultError> {
        let unified = virtual_path.replace('\\', "/");
        let candidate = normalize(&self.root.join(unified));

        if !self.contains(&candidate) {
            tracing::warn!("Rejected path outside vault root: {:?}", virtual_path);
            return Err(VaultError::AccessDenied(virtual_path.to_string()));
        }

        Ok(candidate)
    }

    /// Whether a normalized absolute path is the root or nested under it
    pub fn contains(&self, candidate: &Path) -> bool {
        // Path::starts_with compares whole components, never raw bytes
        candidate.starts_with(&self.root)
    }

    /// Whether `candidate` is the root itself
    pub fn is_root(&self, candidate: &Path) -> bool {
        candidate == self.root
    }

    /// Convert a contained absolute path back to its forward-slash virtual form
    pub fn to_virtual(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(segments.join("/"))
    }
}

/// Lexically normalize a path: drop `.`, apply `..`, collapse separators.
///
/// Does not touch the filesystem, so it works for targets that do not exist
/// yet. `..` at the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
