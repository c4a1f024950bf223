//! Utility functions and data structures.
//!
//! This module provides shared utilities used throughout pfx:
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory, config file and index file naming
//! - [`hash`] - The 32-bit token hash stored in the word index
//! - [`progress`] - Progress spinner (no-op without the `progress` feature)
//! - [`tokenizer`] - Entry component splitting (camelCase, snake_case, paths)
//!
//! ## Key Functions
//!
//! ```
//! use pfx::utils::{split_components, token_hash};
//!
//! // Ordered search components of an entry
//! let components = split_components("Scripts/PlayerController.ext");
//! assert_eq!(components, ["playercontroller", "player", "controller", "ext", "scripts"]);
//!
//! // Case-insensitive token hash
//! assert_eq!(token_hash("Play"), token_hash("play"));
//! ```

pub mod app_data;
pub mod hash;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use hash::*;
pub use tokenizer::*;
