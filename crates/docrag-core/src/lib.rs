//! docrag-core - Core types and traits for the document QA system
//!
//! This crate provides the foundational types, collaborator traits, and
//! error handling used throughout the docrag workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RagError, Result};
pub use traits::*;
pub use types::*;
