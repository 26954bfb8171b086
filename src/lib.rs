//! MdVault - sandboxed markdown vault service
//!
//! Maps a slash-delimited virtual path space onto one directory tree and
//! serves list, read, write, create, delete, move and import operations to
//! an editor front end.

pub mod api;
pub mod app;
pub mod core;

pub use crate::api::{Body, Envelope, Request, Response};
pub use crate::app::VaultApp;
pub use crate::core::config::AppConfig;
pub use crate::core::error::{ErrorKind, VaultError};
pub use crate::core::file_system::{FileNode, NodeKind, Vault};
pub use crate::core::sandbox::Sandbox;
