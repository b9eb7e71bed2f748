//! fmtcheck - Verify that files really are what they claim to be
//!
//! This tool looks up the file format belonging to a file's extension and
//! checks the file content against that format's signature or structure.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fmtcheck_core::{
    CheckConfig, CheckOutcome, CheckReport, Checker, FormatRegistry, ValidationMode,
    FAVOUR_ACCURACY, FAVOUR_SPEED,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Verify that files really are what their extension claims
#[derive(Parser, Debug)]
#[command(name = "fmtcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check files against the format their extension claims
    Check(CheckArgs),
    /// List the formats whose signature matches a file's content
    Sniff {
        /// Path to the file to inspect
        #[arg(short, long)]
        file: PathBuf,

        /// Which validation to try first
        #[arg(long, value_enum, default_value = "speed")]
        favour: Favour,
    },
    /// List all known formats
    Formats,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input: InputMode,

    /// Which validation to try first
    #[arg(long, value_enum, default_value = "speed")]
    favour: Favour,

    /// Maximum number of bytes to read per file (0 = whole file)
    #[arg(long, default_value = "0")]
    max_bytes: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "report")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single file to check
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of files to check recursively
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Validation priority
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Favour {
    /// Leading bytes first, full parse as fallback
    Speed,
    /// Full parse first, leading bytes as fallback
    Accuracy,
}

impl Favour {
    fn modes(self) -> [ValidationMode; 2] {
        match self {
            Favour::Speed => FAVOUR_SPEED,
            Favour::Accuracy => FAVOUR_ACCURACY,
        }
    }
}

/// Output format for check results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per file with verdict and format
    Report,
    /// Only the paths of mismatching files (for scripting)
    Mismatches,
}

/// Tallies verdicts across a run
#[derive(Debug, Default)]
struct CheckStats {
    matched: usize,
    mismatched: usize,
    unchecked: usize,
    unknown: usize,
    failed: usize,
}

impl CheckStats {
    fn record(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::Matched => self.matched += 1,
            CheckOutcome::Mismatched => self.mismatched += 1,
            CheckOutcome::NoValidator => self.unchecked += 1,
            CheckOutcome::UnknownFormat => self.unknown += 1,
        }
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} ok, {} mismatched, {} unchecked, {} unknown, {} unreadable",
            self.matched, self.mismatched, self.unchecked, self.unknown, self.failed
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    // The registry lives for the whole run and is shared by reference
    let registry = FormatRegistry::with_builtin_formats();
    debug!("{} formats registered", registry.len());

    match &cli.command {
        Command::Check(args) => {
            let stats = run_check(&registry, args)?;
            stats.print_summary();
            if stats.mismatched > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Sniff { file, favour } => run_sniff(&registry, file, *favour),
        Command::Formats => {
            print_formats(&registry);
            Ok(())
        }
    }
}

/// Dispatch a check run based on input mode
fn run_check(registry: &FormatRegistry, args: &CheckArgs) -> Result<CheckStats> {
    let config = CheckConfig::new()
        .modes(args.favour.modes())
        .max_bytes(args.max_bytes);
    let checker = Checker::with_config(registry, config);

    if let Some(ref file) = args.input.file {
        check_single_file(&checker, args, file)
    } else if let Some(ref directory) = args.input.directory {
        check_directory(&checker, args, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Check a single file
fn check_single_file(
    checker: &Checker<'_>,
    args: &CheckArgs,
    file: &Path,
) -> Result<CheckStats> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let report = checker
        .check_file(file)
        .with_context(|| format!("Failed to check file: {}", file.display()))?;

    let mut stats = CheckStats::default();
    stats.record(report.outcome);
    print_report(args.format, file, &report);
    Ok(stats)
}

/// Check a directory of files recursively
fn check_directory(
    checker: &Checker<'_>,
    args: &CheckArgs,
    directory: &Path,
) -> Result<CheckStats> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Checking directory: {}", directory.display());

    let mut stats = CheckStats::default();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || is_hidden(path) {
            continue;
        }

        trace!("Checking {}", path.display());
        match checker.check_file(path) {
            Ok(report) => {
                stats.record(report.outcome);
                print_report(args.format, path, &report);
            }
            Err(e) => {
                // Log error but continue with other files
                warn!("Error checking {}: {}", path.display(), e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn print_report(format: OutputFormat, path: &Path, report: &CheckReport) {
    match format {
        OutputFormat::Report => println!("{}", format_report_line(path, report)),
        OutputFormat::Mismatches => {
            if report.is_mismatch() {
                println!("{}", path.display());
            }
        }
    }
}

fn format_report_line(path: &Path, report: &CheckReport) -> String {
    let format = report
        .format
        .as_ref()
        .map(|f| f.short_name().to_owned())
        .unwrap_or_else(|| "-".to_owned());
    let mode = report.mode.map(|m| m.id()).unwrap_or("-");
    format!(
        "{:<9} {:<6} {:<13} {}",
        report.outcome.label(),
        format,
        mode,
        path.display()
    )
}

/// Print every format whose validator accepts the file content
fn run_sniff(registry: &FormatRegistry, file: &Path, favour: Favour) -> Result<()> {
    let data = fs::read(file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;
    trace!("Read {} bytes from {}", data.len(), file.display());

    let checker = Checker::with_config(registry, CheckConfig::new().modes(favour.modes()));
    let found = checker.sniff(&data);

    if found.is_empty() {
        warn!("No known signature matches {}", file.display());
    }
    for format in found {
        println!("{}", format);
    }
    Ok(())
}

fn print_formats(registry: &FormatRegistry) {
    for format in registry.descriptors().values() {
        let extensions: Vec<_> = format.file_extensions().iter().map(String::as_str).collect();
        let mime_types: Vec<_> = format.mime_types().iter().map(String::as_str).collect();
        let modes: Vec<_> = format.validation_modes().map(ValidationMode::id).collect();
        println!(
            "{:<6} {:<30} ext: {:<10} mime: {} [{}]",
            format.short_name(),
            format.name(),
            extensions.join(","),
            mime_types.join(","),
            modes.join(",")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn check_args(directory: &Path) -> CheckArgs {
        CheckArgs {
            input: InputMode {
                file: None,
                directory: Some(directory.to_path_buf()),
            },
            favour: Favour::Speed,
            max_bytes: 0,
            format: OutputFormat::Mismatches,
        }
    }

    #[test]
    fn test_check_directory_stats() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.pdf", b"%PDF-1.6");
        write(temp_dir.path(), "b.png", b"%PDF-1.6");
        write(temp_dir.path(), "c.csv", b"x,y");
        write(temp_dir.path(), "d.bin", b"\0\0");
        write(temp_dir.path(), ".hidden.pdf", b"garbage");

        let registry = FormatRegistry::with_builtin_formats();
        let stats = run_check(&registry, &check_args(temp_dir.path())).unwrap();

        assert_eq!(stats.matched, 1);
        assert_eq!(stats.mismatched, 1);
        assert_eq!(stats.unchecked, 1);
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_check_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let registry = FormatRegistry::with_builtin_formats();
        let args = check_args(&temp_dir.path().join("nope"));
        assert!(run_check(&registry, &args).is_err());
    }

    #[test]
    fn test_favour_modes() {
        assert_eq!(Favour::Speed.modes()[0], ValidationMode::LeadingBytes);
        assert_eq!(Favour::Accuracy.modes()[0], ValidationMode::FullParse);
    }

    #[test]
    fn test_format_report_line() {
        let registry = FormatRegistry::with_builtin_formats();
        let report = Checker::new(&registry).check_bytes("gif", b"GIF87a");
        let line = format_report_line(Path::new("x.gif"), &report);
        assert!(line.starts_with("ok"));
        assert!(line.contains("GIF"));
        assert!(line.contains("leading-bytes"));
        assert!(line.ends_with("x.gif"));

        let report = Checker::new(&registry).check_bytes("zzz", b"");
        let line = format_report_line(Path::new("x.zzz"), &report);
        assert!(line.starts_with("unknown"));
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/tmp/.git")));
        assert!(!is_hidden(Path::new("/tmp/file.pdf")));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
