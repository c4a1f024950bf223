use crate::index::types::IndexSnapshot;
use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

/// Magic in the upper bytes of the version field ("PFX")
pub const FORMAT_MAGIC: i32 = 0x5046_5800;

/// Layout revision, bump on any change to the snapshot layout
pub const FORMAT_REVISION: i32 = 1;

/// Version field written at the start of every snapshot
pub const FORMAT_VERSION: i32 = FORMAT_MAGIC | FORMAT_REVISION;

/// Encode a snapshot in the versioned little-endian layout:
///
/// ```text
/// version:i32 basePath:str entryCount:i32 entries:str* wordCount:i32
/// words:{key:i32 length:i32 entryIndex:i32 score:i32}*
/// str = len:i32 utf8-bytes
/// ```
pub fn encode_snapshot<W: Write>(snapshot: &IndexSnapshot, out: &mut W) -> Result<()> {
    out.write_all(&FORMAT_VERSION.to_le_bytes())?;
    write_string(out, &snapshot.base_path)?;

    out.write_all(&count_to_i32(snapshot.entries.len())?.to_le_bytes())?;
    for entry in snapshot.entries.iter() {
        write_string(out, entry)?;
    }

    out.write_all(&count_to_i32(snapshot.words.len())?.to_le_bytes())?;
    for word in snapshot.words.iter() {
        out.write_all(&word.key.to_le_bytes())?;
        out.write_all(&(word.length as i32).to_le_bytes())?;
        out.write_all(&(word.entry_index as i32).to_le_bytes())?;
        out.write_all(&word.score.to_le_bytes())?;
    }

    Ok(())
}

/// Encode a snapshot into a byte buffer
pub fn encode_to_vec(snapshot: &IndexSnapshot) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(16 + snapshot.words.len() * 16 + snapshot.entries.len() * 32);
    encode_snapshot(snapshot, &mut buf)?;
    Ok(buf)
}

/// Persist a snapshot to `target`, going through `temp`.
///
/// Sequence: drop a stale temp, write the temp, drop the old target, rename
/// temp to target. The caller decides what to do with an error; the engine
/// only logs it.
pub fn save_snapshot(snapshot: &IndexSnapshot, target: &Path, temp: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create index directory {}", parent.display()))?;
    }

    remove_if_exists(temp)
        .with_context(|| format!("Failed to remove stale temp file {}", temp.display()))?;

    {
        let file = File::create(temp)
            .with_context(|| format!("Failed to create {}", temp.display()))?;
        let mut out = BufWriter::new(file);
        encode_snapshot(snapshot, &mut out)
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        out.flush()?;
    }

    remove_if_exists(target)
        .with_context(|| format!("Failed to remove previous index {}", target.display()))?;
    fs::rename(temp, target).with_context(|| {
        format!("Failed to rename {} to {}", temp.display(), target.display())
    })?;

    Ok(())
}

fn write_string<W: Write>(out: &mut W, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    out.write_all(&count_to_i32(bytes.len())?.to_le_bytes())?;
    out.write_all(bytes)?;
    Ok(())
}

fn count_to_i32(count: usize) -> Result<i32> {
    if count > i32::MAX as usize {
        bail!("count {} does not fit the index format", count);
    }
    Ok(count as i32)
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
