//! # pfx - Prefix-Hash Inverted Index
//!
//! pfx indexes large collections of named entries (file paths, catalogued
//! records) into a prefix-based inverted index supporting fast prefix lookup,
//! relevance scoring, incremental maintenance and boolean queries.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Entry store, word index, builder, codec and incremental updates
//! - [`query`] - Query parsing and evaluation (AND / OR / NOT)
//! - [`engine`] - The [`PrefixIndex`](engine::PrefixIndex) coordinator and its lifecycle
//! - [`source`] - Where entries come from ([`IndexSource`](source::IndexSource))
//! - [`output`] - Result formatting for the command line
//! - [`utils`] - Token hash, component splitting, app data and config
//!
//! ## Quick Start
//!
//! ```no_run
//! use pfx::engine::PrefixIndex;
//! use pfx::index::{IndexConfig, Root};
//! use pfx::source::FsSource;
//!
//! let source = FsSource::new(&[], None).unwrap();
//! let index = PrefixIndex::new(vec![Root::bare("/path/to/project")], source, IndexConfig::default());
//!
//! // Build on the background worker and wait for it
//! index.build();
//! index.wait();
//!
//! for hit in index.search("player ctrl -test") {
//!     println!("{} ({})", hit.entry, hit.score);
//! }
//! ```
//!
//! ## How lookups work
//!
//! Every entry is split into ordered components ("PlayerController.ext" gives
//! `playercontroller`, `player`, `controller`, `ext`). Each component
//! contributes all of its prefixes between the configured minimum and maximum
//! length, stored as `(hash, length, entry, score)` in one array sorted by
//! `(length, hash)`. A query token is a binary search away from its matches.

pub mod engine;
pub mod index;
pub mod output;
pub mod query;
pub mod source;
pub mod utils;
