use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "plistpng")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recover PNG images embedded in binary property-list files")]
#[command(
    long_about = "plistpng walks every album folder under the input directory, decodes each \
                  property-list file, finds the PNG images stored inside it and collects them \
                  into one flat folder per album."
)]
#[command(before_help = "🖼️  plistpng - Property List Image Recovery")]
#[command(after_help = "EXAMPLES:\n  \
    plistpng\n  \
    plistpng photos --album recovered --verbose\n  \
    plistpng input --no-rename --max-size 64MB\n  \
    plistpng --config my-config.toml --output-format json\n  \
    plistpng --generate-config --config plistpng.toml")]
pub struct Cli {
    /// Directory holding one sub-folder per album (default: input)
    pub input: Option<PathBuf>,

    /// Directory receiving one folder of recovered images per album
    #[arg(short, long, help = "Album output directory (default: album)")]
    pub album: Option<PathBuf>,

    /// Scratch directory for intermediate files
    #[arg(short, long, help = "Scratch directory, emptied after each album (default: output)")]
    pub scratch: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Keep source file names instead of renaming them to <album>_<n>
    #[arg(long)]
    pub no_rename: bool,

    /// Maximum source file size
    #[arg(
        long,
        value_parser = parse_size_string,
        help = "Maximum source file size; plain numbers are MB (e.g., 64, 512KB, 1GB)"
    )]
    pub max_size: Option<u64>,

    /// Regex patterns of file names to leave alone
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Write recovery_report.json into the album directory
    #[arg(long)]
    pub report: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Show the albums, sources and renames without changing anything")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_input_dir(self.input.clone())
            .with_album_dir(self.album.clone())
            .with_scratch_dir(self.scratch.clone())
            .with_rename_sources(self.no_rename.then_some(false))
            .with_max_file_size(self.max_size)
            .with_exclude_patterns(self.exclude.clone())
            .with_generate_report(self.report.then_some(true))
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            // Albums are reported at level 1, so that is the default.
            self.verbose.saturating_add(1)
        }
    }
}

/// Parses a size with an optional unit. A bare number is taken as MB.
pub fn parse_size_string(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (number_str, multiplier) = if s.ends_with("kb") || s.ends_with('k') {
        (s.trim_end_matches("kb").trim_end_matches('k'), 1024)
    } else if s.ends_with("mb") || s.ends_with('m') {
        (s.trim_end_matches("mb").trim_end_matches('m'), 1024 * 1024)
    } else if s.ends_with("gb") || s.ends_with('g') {
        (
            s.trim_end_matches("gb").trim_end_matches('g'),
            1024 * 1024 * 1024,
        )
    } else if s.ends_with('b') {
        (s.trim_end_matches('b'), 1)
    } else {
        (s.as_str(), 1024 * 1024)
    };

    let number: f64 = number_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number format: {}", number_str))?;

    if number < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let bytes = (number * multiplier as f64) as u64;
    if bytes == 0 {
        return Err("Size must be greater than zero".to_string());
    }

    Ok(bytes)
}
