//! Output formatting for search results

use crate::index::types::SearchHit;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print hits one per line: directory, highlighted file name, dimmed score
pub fn print_hits(hits: &[SearchHit], color: bool, show_scores: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for hit in hits {
        write_hit(&mut stdout, hit, show_scores)?;
    }
    stdout.flush()
}

/// Write a single hit
pub fn write_hit<W: WriteColor>(out: &mut W, hit: &SearchHit, show_score: bool) -> io::Result<()> {
    let (dir, name) = match hit.entry.rfind('/') {
        Some(pos) => hit.entry.split_at(pos + 1),
        None => ("", hit.entry.as_str()),
    };

    if !dir.is_empty() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)))?;
        write!(out, "{}", dir)?;
        out.reset()?;
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    write!(out, "{}", name)?;
    out.reset()?;

    if show_score {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(out, "  {}", hit.score)?;
        out.reset()?;
    }

    writeln!(out)
}

/// Print hits as a JSON array
pub fn print_hits_json(hits: &[SearchHit]) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, hits)?;
    writeln!(lock)?;
    Ok(())
}
