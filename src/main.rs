//! codectx - Snapshot a source tree into one text artifact and rebuild it.
//!
//! Usage:
//!   codectx snapshot -s DIR -o FILE   Write a snapshot artifact
//!   codectx restore -i FILE -d DIR    Rebuild files from an artifact
//!   codectx list [-s DIR]             Show which files a snapshot would include
//!   codectx ignores                   Show the default ignore rules
//!   codectx --help                    Show help

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use codectx_core::{ArtifactFormat, DEFAULT_IGNORE_PATTERNS, IgnoreRules, RuleKind, SnapshotConfig};
use codectx_format::produce;
use codectx_ops::restore;
use codectx_scan::TreeWalker;

#[derive(Parser)]
#[command(
    name = "codectx",
    version,
    about = "Snapshot a source tree into one text artifact and rebuild it",
    long_about = "codectx flattens a directory into a single text file listing every \
                  included path followed by its contents, and can rebuild the \
                  directory from that file.\n\n\
                  Files matching the ignore rules are left out; binary files are \
                  replaced by a placeholder line."
)]
struct Cli {
    /// Also write log output to this file
    #[arg(long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a snapshot artifact of a directory
    Snapshot {
        /// Directory to snapshot (defaults to the config file's root, then ".")
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Artifact file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Artifact layout (defaults to the config file's format, then legacy)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Rebuild files from a snapshot artifact
    Restore {
        /// Artifact file to read
        #[arg(short, long)]
        input: PathBuf,

        /// Destination directory
        #[arg(short = 'd', long)]
        output_dir: PathBuf,

        /// Output format for the report
        #[arg(long, default_value = "text")]
        report: OutputFormat,
    },

    /// List the files a snapshot would include
    List {
        /// Directory to enumerate (defaults to the config file's root, then ".")
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Print the default ignore rules
    Ignores,
}

/// Ignore and include options shared by `snapshot` and `list`.
#[derive(Args)]
struct RuleArgs {
    /// Add an ignore pattern (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Remove a pattern from the ignore rules (repeatable)
    #[arg(long = "unignore", value_name = "PATTERN")]
    unignore: Vec<String>,

    /// Read additional ignore patterns from a file, one per line
    #[arg(long, value_name = "FILE")]
    ignore_file: Option<PathBuf>,

    /// Start from an empty rule set instead of the defaults
    #[arg(long)]
    no_default_ignores: bool,

    /// Only include files matching this pattern (repeatable)
    #[arg(long = "only", value_name = "PATTERN")]
    only: Vec<String>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Worker threads for traversal and content loading (0 = all cores, 1 = serial)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Version 1 layout, compatible with existing artifacts
    Legacy,
    /// Version 2 layout with length-prefixed content blocks
    Framed,
}

impl From<FormatArg> for ArtifactFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Legacy => ArtifactFormat::Legacy,
            FormatArg::Framed => ArtifactFormat::Framed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log.as_deref())?;

    match cli.command {
        Command::Snapshot {
            source,
            output,
            format,
            rules,
        } => run_snapshot(source, &output, format, &rules),
        Command::Restore {
            input,
            output_dir,
            report,
        } => run_restore(&input, &output_dir, report),
        Command::List {
            source,
            format,
            rules,
        } => run_list(source, format, &rules),
        Command::Ignores => {
            run_ignores();
            Ok(())
        }
    }
}

/// Install the stderr subscriber plus an optional plain-text file layer.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Build the effective config: config file (or defaults), then CLI flags.
fn build_config(source: Option<PathBuf>, args: &RuleArgs) -> Result<SnapshotConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = SnapshotConfig::from_toml_file(path)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            if let Some(source) = source {
                config.root = source;
            }
            config
        }
        None => SnapshotConfig::new(source.unwrap_or_else(|| PathBuf::from("."))),
    };

    if args.no_default_ignores {
        config.ignore = IgnoreRules::empty();
    }
    if let Some(path) = &args.ignore_file {
        config
            .ignore
            .load_file(path)
            .with_context(|| format!("Cannot read ignore file {}", path.display()))?;
    }
    for pattern in &args.ignore {
        config.ignore.add(pattern.as_str());
    }
    for pattern in &args.unignore {
        config.ignore.remove(pattern);
    }
    config.include_patterns.extend(args.only.iter().cloned());
    if args.follow_symlinks {
        config.follow_symlinks = true;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }

    Ok(config)
}

fn run_snapshot(
    source: Option<PathBuf>,
    output: &Path,
    format: Option<FormatArg>,
    rules: &RuleArgs,
) -> Result<()> {
    let mut config = build_config(source, rules)?;
    if let Some(format) = format {
        config.format = format.into();
    }

    let summary = produce(&config, output).context("Snapshot failed")?;

    for warning in &summary.warnings {
        warn!("skipped {warning}");
    }

    let stats = &summary.write.stats;
    eprintln!(
        "Wrote {} files ({} text, {} binary, {} unreadable) to {} [{}]",
        summary.files,
        stats.text_files,
        stats.binary_files,
        stats.unreadable_files,
        output.display(),
        format_size(summary.write.bytes_written)
    );
    if !summary.warnings.is_empty() {
        eprintln!("{} paths skipped during enumeration", summary.warnings.len());
    }

    Ok(())
}

fn run_restore(input: &Path, output_dir: &Path, format: OutputFormat) -> Result<()> {
    let report = restore(input, output_dir)
        .with_context(|| format!("Cannot restore {}", input.display()))?;

    match format {
        OutputFormat::Text => {
            println!(
                "Restored {} files ({}) into {}",
                report.succeeded,
                format_size(report.bytes_written),
                output_dir.display()
            );
            for error in &report.errors {
                println!("  failed: {error}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if !report.is_complete() {
        bail!(
            "{} of {} files could not be restored",
            report.failed,
            report.failed + report.succeeded
        );
    }
    Ok(())
}

fn run_list(source: Option<PathBuf>, format: OutputFormat, rules: &RuleArgs) -> Result<()> {
    let config = build_config(source, rules)?;
    let walker = TreeWalker::new(&config).context("Cannot enumerate source")?;
    let (paths, warnings) = walker.collect();

    for warning in &warnings {
        warn!("skipped {warning}");
    }

    match format {
        OutputFormat::Text => {
            for path in &paths {
                println!("{path}");
            }
            eprintln!("{} files", paths.len());
        }
        OutputFormat::Json => {
            let names: Vec<String> = paths.iter().map(ToString::to_string).collect();
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
    }

    Ok(())
}

fn run_ignores() {
    for pattern in DEFAULT_IGNORE_PATTERNS {
        println!("{:<4}  {pattern}", RuleKind::of(pattern));
    }
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rule_args(argv: &[&str]) -> (Option<PathBuf>, RuleArgs) {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::List { source, rules, .. } | Command::Snapshot { source, rules, .. } => {
                (source, rules)
            }
            _ => panic!("expected a command with rule arguments"),
        }
    }

    fn config_file(temp: &TempDir) -> String {
        let path = temp.path().join("codectx.toml");
        fs::write(&path, "root = \"/from/config\"\nthreads = 2\n").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_list_and_snapshot_resolve_root_alike() {
        let temp = TempDir::new().unwrap();
        let config = config_file(&temp);

        let (source, rules) = rule_args(&["codectx", "list", "--config", &config]);
        let listed = build_config(source, &rules).unwrap();

        let (source, rules) =
            rule_args(&["codectx", "snapshot", "-o", "out.txt", "--config", &config]);
        let snapshotted = build_config(source, &rules).unwrap();

        assert_eq!(listed.root, PathBuf::from("/from/config"));
        assert_eq!(snapshotted.root, listed.root);
        assert_eq!(listed.threads, 2);
    }

    #[test]
    fn test_source_flag_overrides_config_root() {
        let temp = TempDir::new().unwrap();
        let config = config_file(&temp);

        let (source, rules) =
            rule_args(&["codectx", "list", "-s", "/elsewhere", "--config", &config, "-j", "4"]);
        let resolved = build_config(source, &rules).unwrap();

        assert_eq!(resolved.root, PathBuf::from("/elsewhere"));
        assert_eq!(resolved.threads, 4);
    }

    #[test]
    fn test_list_defaults_to_current_directory() {
        let (source, rules) = rule_args(&["codectx", "list", "--ignore", "*.o"]);
        let resolved = build_config(source, &rules).unwrap();

        assert_eq!(resolved.root, PathBuf::from("."));
        assert!(resolved.ignore.contains("*.o"));
        assert!(resolved.ignore.contains("build/"));
    }
}
