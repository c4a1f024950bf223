use crate::index::entries::EntryStore;
use crate::index::types::{EntryIndex, IndexSnapshot, WordIndexEntry};
use crate::index::words::WordIndex;
use crate::index::writer::FORMAT_VERSION;
use anyhow::{Context, Result, bail, ensure};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Decode a snapshot produced by [`encode_snapshot`](crate::index::writer::encode_snapshot).
///
/// Fails on a version mismatch and on any structural inconsistency:
/// truncation, bad counts, invalid UTF-8, dangling entry references, unsorted
/// words or trailing bytes.
pub fn decode_snapshot(bytes: &[u8]) -> Result<IndexSnapshot> {
    let mut data = bytes;
    let mut buf4 = [0u8; 4];

    data.read_exact(&mut buf4).context("missing version")?;
    let version = i32::from_le_bytes(buf4);
    if version != FORMAT_VERSION {
        bail!(
            "version mismatch: found {:#010x}, expected {:#010x}",
            version,
            FORMAT_VERSION
        );
    }

    let base_path = read_string(&mut data).context("bad base path")?;

    // Each entry takes at least its 4-byte length
    let entry_count = read_count(&mut data, 4).context("bad entry count")?;
    let mut entries = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let entry = read_string(&mut data).with_context(|| format!("bad entry {}", i))?;
        entries.push(entry);
    }

    let word_count = read_count(&mut data, WordIndexEntry::SIZE).context("bad word count")?;
    let mut words = Vec::with_capacity(word_count);
    for i in 0..word_count {
        data.read_exact(&mut buf4)?;
        let key = i32::from_le_bytes(buf4);

        data.read_exact(&mut buf4)?;
        let length = i32::from_le_bytes(buf4);

        data.read_exact(&mut buf4)?;
        let entry_index = i32::from_le_bytes(buf4);

        data.read_exact(&mut buf4)?;
        let score = i32::from_le_bytes(buf4);

        ensure!(length > 0, "word {} has length {}", i, length);
        ensure!(
            entry_index >= 0 && (entry_index as usize) < entry_count,
            "word {} references entry {} of {}",
            i,
            entry_index,
            entry_count
        );

        words.push(WordIndexEntry::new(
            key,
            length as u32,
            entry_index as EntryIndex,
            score,
        ));
    }

    ensure!(data.is_empty(), "{} trailing bytes", data.len());

    let words = WordIndex::from_sorted(words);
    ensure!(words.is_sorted(), "words are not sorted");

    let entries = EntryStore::from_slots(entries, &words.referenced_entries());
    Ok(IndexSnapshot::new(base_path, entries, words))
}

/// Load a persisted snapshot as a warm-start cache.
///
/// Returns `None` when there is no usable cache. A file that fails to decode,
/// or whose recorded identity differs (other roots or prefix bounds, see
/// [`snapshot_identity`](crate::index::build::snapshot_identity)), is deleted so
/// the next save starts clean.
pub fn load_snapshot(path: &Path, expected_identity: &str) -> Option<IndexSnapshot> {
    if !path.exists() {
        tracing::debug!("no index cache at {}", path.display());
        return None;
    }

    match read_snapshot_file(path) {
        Ok(snapshot) if snapshot.base_path == expected_identity => {
            tracing::debug!(
                "loaded index cache {} ({} entries, {} words)",
                path.display(),
                snapshot.entries.len(),
                snapshot.words.len()
            );
            Some(snapshot)
        }
        Ok(snapshot) => {
            tracing::warn!(
                "discarding index cache {}: built for {:?}, expected {:?}",
                path.display(),
                snapshot.base_path,
                expected_identity
            );
            discard(path);
            None
        }
        Err(err) => {
            tracing::warn!("discarding index cache {}: {:#}", path.display(), err);
            discard(path);
            None
        }
    }
}

fn read_snapshot_file(path: &Path) -> Result<IndexSnapshot> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let len = file.metadata()?.len();
    ensure!(len > 0, "empty file");

    // SAFETY: the mapping is read-only and dropped before this function returns
    let mmap = unsafe { Mmap::map(&file)? };
    decode_snapshot(&mmap)
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        tracing::debug!("could not remove {}: {}", path.display(), err);
    }
}

fn read_count(data: &mut &[u8], min_item_size: usize) -> Result<usize> {
    let mut buf4 = [0u8; 4];
    data.read_exact(&mut buf4)?;
    let count = i32::from_le_bytes(buf4);
    ensure!(count >= 0, "negative count {}", count);

    let count = count as usize;
    ensure!(
        count.saturating_mul(min_item_size) <= data.len(),
        "count {} exceeds remaining {} bytes",
        count,
        data.len()
    );
    Ok(count)
}

fn read_string(data: &mut &[u8]) -> Result<String> {
    let len = read_count(data, 1)?;
    let (bytes, rest) = data.split_at(len);
    let value = std::str::from_utf8(bytes)
        .context("invalid utf-8")?
        .to_string();
    *data = rest;
    Ok(value)
}
