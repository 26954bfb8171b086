//! Core functionality: path containment, vault file operations, errors and configuration

pub mod config;
pub mod error;
pub mod file_system;
pub mod sandbox;
