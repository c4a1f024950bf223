use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pfx::engine::{IndexState, PrefixIndex};
use pfx::index::stats::{format_size, show_stats};
use pfx::index::{ChangeBatch, IndexConfig, MovedEntry, Root};
use pfx::output::{print_hits, print_hits_json};
use pfx::query::SearchOptions;
use pfx::source::FsSource;
use pfx::utils::progress::Spinner;
use pfx::utils::{AppConfig, list_index_files, remove_index};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pfx")]
#[command(about = "Prefix-hash inverted index over file paths")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for index files
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,
}

#[derive(Args)]
struct RootArgs {
    /// Root to index, as PATH or PATH=PREFIX (repeatable, earlier roots rank higher)
    #[arg(short, long = "root", value_name = "PATH[=PREFIX]", default_value = ".")]
    roots: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or rebuild the index
    Index {
        /// Roots to index, as PATH or PATH=PREFIX
        #[arg(value_name = "PATH[=PREFIX]", default_value = ".")]
        roots: Vec<String>,

        /// Ignore the cached index and rebuild
        #[arg(short, long)]
        force: bool,
    },
    /// Search the index
    Search {
        /// Query: terms are ANDed, `a | b` ORs, `!term` excludes (`-term` after `--`)
        #[arg(required = true)]
        query: Vec<String>,

        #[command(flatten)]
        roots: RootArgs,

        /// Only match words scoring below this
        #[arg(long)]
        max_score: Option<i32>,

        /// Maximum results (0 = unlimited)
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Show scores next to results
        #[arg(short, long)]
        scores: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Apply entry changes without a full rebuild
    Update {
        #[command(flatten)]
        roots: RootArgs,

        /// Created or modified entries
        #[arg(long, value_name = "ENTRY")]
        updated: Vec<String>,

        /// Deleted entries
        #[arg(long, value_name = "ENTRY")]
        removed: Vec<String>,

        /// Moved entries
        #[arg(long, value_name = "FROM=TO", value_parser = parse_moved)]
        moved: Vec<MovedEntry>,
    },
    /// Show index statistics
    Stats {
        #[command(flatten)]
        roots: RootArgs,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
    /// List all index files
    List,
    /// Remove the index for a set of roots
    Remove {
        #[command(flatten)]
        roots: RootArgs,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(dir) = cli.index_dir {
        config.index_dir = Some(dir);
    }

    match cli.command {
        Commands::Index { roots, force } => {
            let roots = parse_roots(&roots)?;
            let started = Instant::now();
            let mut index = open_index(&roots, &config)?;
            if force {
                index = index.without_warm_start();
            }
            wait_for_index(&index, "Indexing")?;

            let stats = index.stats();
            println!(
                "Indexed {} entries ({} words) in {:.2?}",
                stats.live_entries,
                stats.words,
                started.elapsed()
            );
            if let Some(path) = index.index_path() {
                println!("Index: {} ({})", path.display(), format_size(stats.encoded_bytes));
            }
        }
        Commands::Search {
            query,
            roots,
            max_score,
            limit,
            json,
            scores,
            no_color,
        } => {
            let roots = parse_roots(&roots.roots)?;
            let index = open_index(&roots, &config)?;
            wait_for_index(&index, "Loading index")?;

            let options = SearchOptions {
                max_score: max_score.unwrap_or(SearchOptions::default().max_score),
                limit,
            };
            let hits = index.search_with(&query.join(" "), options);
            if json {
                print_hits_json(&hits)?;
            } else {
                print_hits(&hits, !no_color, scores)?;
            }
        }
        Commands::Update {
            roots,
            updated,
            removed,
            moved,
        } => {
            let roots = parse_roots(&roots.roots)?;
            let index = open_index(&roots, &config)?;
            wait_for_index(&index, "Loading index")?;

            let summary = index.incremental_update(&ChangeBatch {
                updated,
                removed,
                moved,
            });
            println!("Added {} entries, removed {}", summary.added, summary.removed);
        }
        Commands::Stats { roots, json } => {
            let roots = parse_roots(&roots.roots)?;
            let index = open_index(&roots, &config)?;
            wait_for_index(&index, "Loading index")?;

            let stats = index.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                show_stats(&stats, index.index_path().as_deref());
            }
        }
        Commands::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                let path = match &cli.config {
                    Some(path) => {
                        config.save_to(path)?;
                        path.clone()
                    }
                    None => config.save()?,
                };
                println!("Wrote {}", path.display());
            }
        }
        Commands::List => {
            let dir = config.resolve_index_dir()?;
            let files = list_index_files(&dir)?;
            if files.is_empty() {
                println!("No index files found.");
            }
            for file in files {
                let size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
                println!("  {} ({})", file.display(), format_size(size));
            }
        }
        Commands::Remove { roots } => {
            let roots = parse_roots(&roots.roots)?;
            let dir = config.resolve_index_dir()?;
            let base = pfx::index::build::snapshot_base_path(&roots);
            if remove_index(&dir, &base)? {
                println!("Removed index for: {}", base);
            } else {
                println!("No index for: {}", base);
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("PFX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_index(roots: &[Root], config: &AppConfig) -> Result<PrefixIndex<FsSource>> {
    let index_dir = config.resolve_index_dir()?;
    let index_config: IndexConfig = config.index.clone();
    let source = FsSource::new(&index_config.skip_globs, Some(index_dir))?;
    Ok(PrefixIndex::new(roots.to_vec(), source, index_config))
}

/// Build (or warm-load) the index, showing a spinner until it settles
fn wait_for_index(index: &PrefixIndex<FsSource>, message: &'static str) -> Result<()> {
    index.build();

    let spinner = Spinner::start(message);

    let state = loop {
        let state = index.wait_timeout(Duration::from_millis(200));
        if !state.is_building() {
            break state;
        }
    };
    spinner.finish();

    if state != IndexState::Ready {
        bail!("index is {}", state);
    }
    Ok(())
}

fn parse_roots(args: &[String]) -> Result<Vec<Root>> {
    args.iter().map(|arg| parse_root(arg)).collect()
}

fn parse_root(arg: &str) -> Result<Root> {
    let (path, prefix) = match arg.rsplit_once('=') {
        Some((path, prefix)) => (path, prefix),
        None => (arg, ""),
    };
    let path = Path::new(path)
        .canonicalize()
        .with_context(|| format!("Root does not exist: {}", path))?;
    if !path.is_dir() {
        bail!("Root is not a directory: {}", path.display());
    }
    Ok(Root::new(path.to_string_lossy(), prefix))
}

fn parse_moved(arg: &str) -> std::result::Result<MovedEntry, String> {
    match arg.split_once('=') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok(MovedEntry::new(from, to)),
        _ => Err(format!("expected FROM=TO, got '{}'", arg)),
    }
}
