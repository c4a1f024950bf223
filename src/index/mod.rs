//! Index data structures, building, persistence and incremental maintenance.

pub mod build;
pub mod entries;
pub mod reader;
pub mod stats;
pub mod types;
pub mod update;
pub mod words;
pub mod writer;

pub use build::build_snapshot;
pub use entries::EntryStore;
pub use reader::{decode_snapshot, load_snapshot};
pub use stats::IndexStats;
pub use types::*;
pub use update::{ChangeBatch, MovedEntry, UpdateSummary, apply_changes};
pub use words::WordIndex;
pub use writer::{encode_snapshot, save_snapshot};
