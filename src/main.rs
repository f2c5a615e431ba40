//! wheremyspace - find out where your disk space went.
//!
//! Usage:
//!   wms scan [PATH]        Scan and show the size tree
//!   wms largest [PATH]     List the largest files and directories
//!   wms types [PATH]       Break down space by file type
//!   wms age [PATH]         Analyze file ages
//!   wms export [PATH]      Export scan to JSON
//!   wms targets            List suggested scan roots
//!   wms --help             Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wheremyspace_analyze::{
    AgeAnalyzer, AgeConfig, ItemFilter, TypeBreakdown, format_age, items_at_least, largest_items,
};
use wheremyspace_core::PathRules;
use wheremyspace_scan::{
    LogLevel, ScanConfig, ScanEvent, ScanNode, ScanReport, start_scan, suggest_targets,
};

#[derive(Parser)]
#[command(
    name = "wms",
    version,
    about = "Find out where your disk space went",
    long_about = "wheremyspace scans a directory tree, aggregates sizes bottom-up and \
                  shows what takes the most room. Unreadable entries are reported and \
                  skipped, OS-internal directories are never opened."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command that scans.
#[derive(Args, Clone)]
struct ScanArgs {
    /// Path to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Maximum children kept per directory
    #[arg(long, default_value = "100")]
    max_children: usize,

    /// Worker threads (0 = one per CPU)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Do not open directories deeper than this
    #[arg(long, default_value = "512")]
    max_depth: u32,

    /// JSON file with extra protected / elevated path rules
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Do not show progress and warnings while scanning
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show the size tree
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Number of top entries to show per directory
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// List the largest files and directories
    Largest {
        #[command(flatten)]
        scan: ScanArgs,

        /// Number of items to show
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Which items to list
        #[arg(short, long, default_value = "all")]
        kind: KindArg,

        /// Only files at least this large (e.g., "100MB"); lists all of them
        #[arg(short, long)]
        min_size: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Break down space by file type
    Types {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Analyze file ages
    Age {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show stale directories older than this (e.g., "1y", "6m", "30d")
        #[arg(short, long, default_value = "1y")]
        stale: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export scan results to JSON
    Export {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List suggested scan roots (drives, volumes, home)
    Targets {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    All,
    Files,
    Dirs,
}

impl From<KindArg> for ItemFilter {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::All => ItemFilter::All,
            KindArg::Files => ItemFilter::Files,
            KindArg::Dirs => ItemFilter::Directories,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { scan, depth, top } => {
            let report = run_scan(&scan).await?;
            print_summary(&report, depth, top);
        }
        Command::Largest {
            scan,
            top,
            kind,
            min_size,
            format,
        } => {
            let min_bytes = min_size.as_deref().map(parse_size).transpose()?;
            let report = run_scan(&scan).await?;
            print_largest(&report, top, kind.into(), min_bytes, format)?;
        }
        Command::Types { scan, format } => {
            let report = run_scan(&scan).await?;
            print_types(&report, format)?;
        }
        Command::Age {
            scan,
            stale,
            format,
        } => {
            let stale_duration = parse_duration(&stale)?;
            let report = run_scan(&scan).await?;
            print_age(&report, &stale, stale_duration, format)?;
        }
        Command::Export { scan, output } => {
            let report = run_scan(&scan).await?;
            run_export(&report, output)?;
        }
        Command::Targets { format } => {
            print_targets(format)?;
        }
    }

    Ok(())
}

/// Build the scan configuration from command-line options.
fn scan_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut builder = ScanConfig::builder();
    builder
        .root(&args.path)
        .max_children(args.max_children)
        .threads(args.threads)
        .follow_symlinks(args.follow_symlinks)
        .max_depth(args.max_depth);

    if let Some(file) = &args.rules {
        let rules = load_rules(file)?;
        builder
            .extra_protected(rules.protected)
            .extra_elevated(rules.elevated);
    }

    builder.build().context("Invalid scan configuration")
}

fn load_rules(file: &Path) -> Result<PathRules> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read rules file {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid rules file {}", file.display()))
}

/// Run a scan, streaming progress and warnings to stderr. Ctrl-C cancels.
async fn run_scan(args: &ScanArgs) -> Result<Arc<ScanReport>> {
    let config = scan_config(args)?;
    let mut handle = start_scan(config);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => show_event(&event, args.quiet),
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                eprintln!("\nCancelling...");
                handle.cancel();
            }
        }
    }

    handle.join().await.context("Scan failed")
}

fn show_event(event: &ScanEvent, quiet: bool) {
    match event {
        ScanEvent::Start { root } if !quiet => {
            eprintln!("Scanning {}...", root.display());
        }
        ScanEvent::Progress(progress) if !quiet => {
            let path = progress.current_path.display().to_string();
            eprint!(
                "\r\x1b[2K {:>5.1}%  {} items  {:.0}/s  {}",
                progress.percent,
                progress.processed_count,
                progress.scan_rate_per_second,
                truncate(&path, 50)
            );
            if progress.percent >= 100.0 {
                eprintln!();
            }
        }
        ScanEvent::Log(log) => match log.level {
            LogLevel::Warning | LogLevel::Error if !quiet => {
                eprintln!("\r\x1b[2K {}", log.message);
            }
            _ => debug!(level = ?log.level, "{}", log.message),
        },
        _ => {}
    }
}

/// Print the scan summary and size tree.
fn print_summary(report: &ScanReport, max_depth: u32, top_n: usize) {
    let stats = &report.stats;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        report.root_path.display(),
        format_size(stats.total_size)
    );
    println!(
        " {} files, {} directories",
        stats.total_files, stats.total_directories
    );
    println!(
        " Scanned in {:.2}s",
        Duration::from_millis(stats.duration_ms).as_secs_f64()
    );
    if stats.is_partial() {
        println!(
            " {} errors, {} directories skipped; sizes are a lower bound",
            stats.error_count, stats.ignored_directory_count
        );
        if stats.elevated_privilege_required_count > 0 {
            println!(
                " {} locations may need administrator rights",
                stats.elevated_privilege_required_count
            );
        }
    }
    println!("{}", "─".repeat(60));
    println!();

    print_node(&report.root, 0, max_depth, top_n, report.root.size);
}

/// Print a node and its children.
fn print_node(node: &ScanNode, depth: u32, max_depth: u32, top_n: usize, root_size: u64) {
    let indent = "  ".repeat(depth as usize);
    let ratio = if root_size > 0 {
        node.size as f64 / root_size as f64 * 100.0
    } else {
        0.0
    };

    let name = if depth == 0 {
        node.path.display().to_string()
    } else {
        node.name.to_string()
    };
    let dir_marker = if node.is_dir() { "/" } else { "" };

    println!(
        "{}{}{:<40} {:>10} {:>5.1}% {}",
        indent,
        if node.is_dir() { "▼ " } else { "  " },
        truncate(&format!("{name}{dir_marker}"), 40),
        format_size(node.size),
        ratio,
        make_bar(ratio / 100.0, 10)
    );

    if node.is_dir() && depth < max_depth {
        for child in node.children.iter().take(top_n) {
            print_node(child, depth + 1, max_depth, top_n, root_size);
        }

        let remaining = node.children.len().saturating_sub(top_n) as u64 + node.pruned_children;
        if remaining > 0 {
            let indent = "  ".repeat((depth + 1) as usize);
            println!("{indent}  ... and {remaining} more");
        }
    }
}

fn print_largest(
    report: &ScanReport,
    top_n: usize,
    filter: ItemFilter,
    min_size: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let items = match min_size {
        Some(min) => items_at_least(report, min),
        None => largest_items(report, top_n, filter),
    };

    match format {
        OutputFormat::Text => {
            println!();
            for item in &items {
                println!(
                    " {:>10}  {}{}",
                    format_size(item.size),
                    item.path.display(),
                    if item.is_dir() { "/" } else { "" }
                );
            }
            println!();
            println!(" {} items", items.len());
        }
        OutputFormat::Json => {
            let items: Vec<_> = items
                .iter()
                .map(|n| json!({ "path": n.path, "kind": n.kind, "size": n.size }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }
    Ok(())
}

fn print_types(report: &ScanReport, format: OutputFormat) -> Result<()> {
    let breakdown = TypeBreakdown::from_report(report);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Space by File Type");
            println!("{}", "─".repeat(70));
            println!();
            for stats in &breakdown.categories {
                let percent = breakdown.percent(stats.category);
                println!(
                    "   {:<14} {:>10} {:>8} files {:>5.1}% {}",
                    stats.category,
                    format_size(stats.total_size),
                    stats.file_count,
                    percent,
                    make_bar(percent / 100.0, 20)
                );
            }
            if breakdown.uncategorized_size > 0 {
                println!(
                    "   {:<14} {:>10} (small files not kept in the tree)",
                    "Unlisted",
                    format_size(breakdown.uncategorized_size)
                );
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
    }
    Ok(())
}

fn print_age(
    report: &ScanReport,
    stale_label: &str,
    stale_threshold: Duration,
    format: OutputFormat,
) -> Result<()> {
    let age_config = AgeConfig::builder()
        .stale_threshold(stale_threshold)
        .build()
        .context("Invalid age configuration")?;
    let ages = AgeAnalyzer::with_config(age_config).analyze(report);

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Age Distribution Report");
            println!("{}", "─".repeat(70));
            println!();

            println!(" Age Distribution:");
            let max_size = ages
                .buckets
                .iter()
                .map(|b| b.total_size)
                .max()
                .unwrap_or(1)
                .max(1);
            for bucket in &ages.buckets {
                let bar_len = ((bucket.total_size as f64 / max_size as f64) * 30.0) as usize;
                println!(
                    "   {:<12} {:>10} {:>8} files  {}",
                    bucket.name,
                    format_size(bucket.total_size),
                    bucket.file_count,
                    "█".repeat(bar_len)
                );
            }
            println!();

            if !ages.oldest_files.is_empty() {
                println!(" Oldest Files:");
                for file in ages.oldest_files.iter().take(10) {
                    println!(
                        "   {} ({}, {} old)",
                        file.path.display(),
                        format_size(file.size),
                        format_age(file.age)
                    );
                }
                println!();
            }

            if ages.has_stale_directories() {
                println!(" Stale Directories (no changes in {stale_label}):");
                println!(" Total stale: {}", format_size(ages.total_stale_size()));
                println!();
                for dir in &ages.stale_directories {
                    println!(
                        "   {} ({}, {} ago)",
                        dir.path.display(),
                        format_size(dir.size),
                        format_age(dir.newest_file_age)
                    );
                }
            } else {
                println!(" No stale directories found.");
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ages)?);
        }
    }
    Ok(())
}

/// Export scan results to JSON.
fn run_export(report: &ScanReport, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

fn print_targets(format: OutputFormat) -> Result<()> {
    let targets = suggest_targets();

    match format {
        OutputFormat::Text => {
            for target in &targets {
                println!(
                    " {:<8} {:<20} {}",
                    format!("{:?}", target.kind).to_lowercase(),
                    truncate(&target.label, 20),
                    target.path.display()
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&targets)?);
        }
    }
    Ok(())
}

/// Create a simple bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let split = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        "T" | "TB" => 1024 * 1024 * 1024 * 1024,
        other => return Err(eyre!("Unknown size unit: {other}")),
    };
    let num: f64 = num
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;

    Ok((num * multiplier as f64) as u64)
}

/// Parse a duration string (e.g., "1y", "6m", "30d", "1w"). Bare numbers
/// are days.
fn parse_duration(s: &str) -> Result<Duration> {
    const DAY: f64 = 24.0 * 60.0 * 60.0;

    let s = s.trim().to_lowercase();
    let (num, multiplier) = match s.chars().last() {
        Some('y') => (&s[..s.len() - 1], 365.0 * DAY),
        Some('m') => (&s[..s.len() - 1], 30.0 * DAY),
        Some('w') => (&s[..s.len() - 1], 7.0 * DAY),
        Some('d') => (&s[..s.len() - 1], DAY),
        Some('h') => (&s[..s.len() - 1], 60.0 * 60.0),
        _ => (s.as_str(), DAY),
    };
    let num: f64 = num
        .parse()
        .with_context(|| format!("Invalid duration: {s}"))?;

    Duration::try_from_secs_f64(num * multiplier)
        .map_err(|e| eyre!("Invalid duration {s}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheremyspace_core::PathRule;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5m").unwrap(), 1536 * 1024);
        assert_eq!(parse_size(" 2 GB ").unwrap(), 2 * 1024 * 1024 * 1024);
        assert!(parse_size("3 parsecs").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(2 * 86400));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(7 * 86400));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3 * 86400));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-1d").is_err());
        assert!(parse_duration("nan").is_err());
        assert!(parse_duration("inf").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_rules_file_keeps_rule_kinds() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("rules.json");
        std::fs::write(
            &file,
            r#"{"protected": [{"prefix": "cache"}, {"name": "node_modules"}],
                "elevated": [{"name": "/srv/keys"}]}"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from(["wms", "scan", "/data", "--rules", file.to_str().unwrap()])
            .unwrap();
        let Command::Scan { scan, .. } = cli.command else {
            panic!("expected scan command");
        };
        let config = scan_config(&scan).unwrap();

        assert_eq!(
            config.extra_protected,
            vec![
                PathRule::Prefix("cache".into()),
                PathRule::Name("node_modules".into())
            ]
        );
        assert_eq!(config.extra_elevated, vec![PathRule::Name("/srv/keys".into())]);
    }
}
