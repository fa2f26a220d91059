pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, OutputConfig, PathsConfig, RecoveryConfig};
pub use error::{PlistPngError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    AlbumCollector, AlbumReport, Cleaner, ConfigSnapshot, ExtractionProgress, OutputManager,
    RecoveryReport, SourceExtractor, SourceOutcome,
};
pub use scanner::{Album, AlbumScanner, RenamePlan, Renamer, SourceFile, SourceFilter};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use ui::ProgressAwareOutput;

/// Main library interface: recovers the PNG images embedded in every album
/// folder under the configured input root.
pub struct PlistPng {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

/// What a run would do to one album, computed without touching any file.
#[derive(Debug, Clone)]
pub struct AlbumPlan {
    pub album: Album,
    pub sources: Vec<SourceFile>,
    pub renames: Vec<RenamePlan>,
    pub oversized: usize,
}

impl PlistPng {
    /// Create a new PlistPng instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        config.validate()?;
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create a new PlistPng instance for testing (no signal handler conflicts)
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(false);
        let shutdown = GracefulShutdown::new_for_test();

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create PlistPng instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Runs every album through rename, extraction, collection and cleanup.
    ///
    /// A Ctrl+C stops after the current file; the albums finished so far are
    /// returned with `cancelled` set.
    pub fn recover_images(&self) -> Result<RecoveryReport> {
        let start_time = Instant::now();
        let started_at = chrono::Utc::now();
        self.shutdown.check_shutdown()?;

        self.output_formatter
            .start_operation("Starting image recovery");

        let scanner = AlbumScanner::new(&self.config.recovery);
        let albums = self.scan_albums(&scanner)?;
        self.output_formatter
            .info(&format!("Found {} album folder(s)", albums.len()));

        let output_manager = OutputManager::new(
            self.config.paths.scratch_dir.clone(),
            self.config.paths.album_dir.clone(),
        )?;

        let results = self.process_albums(&albums, &scanner, &output_manager);
        self.progress_manager.clear();

        let mut report = RecoveryReport::new(&self.config);
        report.started_at = started_at;

        let mut failure = None;
        for result in results {
            match result {
                Ok(album_report) => report.albums.push(album_report),
                Err(PlistPngError::Cancelled) => report.cancelled = true,
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        match output_manager.finish() {
            Ok(true) => self.output_formatter.debug(&format!(
                "Removed scratch directory {}",
                output_manager.scratch_root().display()
            )),
            Ok(false) => {}
            Err(e) => self.output_formatter.warning(&format!(
                "Could not remove scratch directory {}: {}",
                output_manager.scratch_root().display(),
                e
            )),
        }

        if let Some(e) = failure {
            return Err(e);
        }

        report.duration = start_time.elapsed();

        if self.config.output.generate_report {
            let path = output_manager.save_report_json(&report)?;
            self.output_formatter
                .success(&format!("Report written to {}", path.display()));
        }

        self.output_formatter.print_recovery_summary(&report);

        Ok(report)
    }

    /// Album folders under the input root, minus the scratch and album roots
    /// when those happen to live inside it.
    fn scan_albums(&self, scanner: &AlbumScanner) -> Result<Vec<Album>> {
        let spinner = self.progress_manager.create_spinner("Scanning album folders");
        let albums = scanner.scan_albums(&self.config.paths.input_dir);
        spinner.finish_and_clear();

        let albums: Vec<Album> = albums?
            .into_iter()
            .filter(|album| !self.is_output_root(&album.path))
            .collect();

        if albums.is_empty() {
            return Err(PlistPngError::NoAlbumsFound {
                input_dir: self.config.paths.input_dir.display().to_string(),
            });
        }

        Ok(albums)
    }

    fn is_output_root(&self, path: &Path) -> bool {
        let Ok(candidate) = fs::canonicalize(path) else {
            return false;
        };

        [&self.config.paths.scratch_dir, &self.config.paths.album_dir]
            .into_iter()
            .filter_map(|root| fs::canonicalize(root).ok())
            .any(|root| root == candidate)
    }

    #[cfg(not(feature = "parallel"))]
    fn process_albums(
        &self,
        albums: &[Album],
        scanner: &AlbumScanner,
        output_manager: &OutputManager,
    ) -> Vec<Result<AlbumReport>> {
        let mut results = Vec::with_capacity(albums.len());
        for album in albums {
            let result = self.process_album(album, scanner, output_manager);
            let stop = result.is_err();
            results.push(result);
            if stop {
                break;
            }
        }
        results
    }

    #[cfg(feature = "parallel")]
    fn process_albums(
        &self,
        albums: &[Album],
        scanner: &AlbumScanner,
        output_manager: &OutputManager,
    ) -> Vec<Result<AlbumReport>> {
        use rayon::prelude::*;

        albums
            .par_iter()
            .map(|album| self.process_album(album, scanner, output_manager))
            .collect()
    }

    /// Rename, extract, collect, then clean up; cleanup runs even when an
    /// earlier step failed.
    pub fn process_album(
        &self,
        album: &Album,
        scanner: &AlbumScanner,
        output_manager: &OutputManager,
    ) -> Result<AlbumReport> {
        let start_time = Instant::now();
        self.shutdown.check_shutdown()?;

        let out = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));
        out.info(&format!("Processing album {}", album.name));

        let album_dir = output_manager.album_dir(&album.name);
        let mut report = AlbumReport::new(&album.name, album_dir.clone());

        let mut sources = scanner.scan_sources(album)?;
        out.debug(scanner.get_statistics(&sources).display_summary().trim_end());

        if self.config.recovery.rename_sources {
            let (renamed, moved) = Renamer::new(&album.name).rename_sources(&album.path, sources)?;
            for plan in &moved {
                out.debug(&format!(
                    "Renamed {} -> {}",
                    plan.from.display(),
                    plan.to.display()
                ));
            }
            report.renamed = moved.len();
            sources = renamed;
        }
        report.files_scanned = sources.len();

        let scratch = output_manager.create_album_scratch(&album.name)?;
        let mut copies = Vec::with_capacity(sources.len());
        let recovered = self.recover_album(
            &sources,
            scanner,
            scratch.path(),
            &mut copies,
            &mut report,
            &out,
        );
        let cleaned = self.clean_album(album, &copies, scratch, &out);
        recovered?;
        cleaned?;

        report.duration = start_time.elapsed();
        out.suspend_and_print(|f| f.album_finished(&report));

        Ok(report)
    }

    fn recover_album(
        &self,
        sources: &[SourceFile],
        scanner: &AlbumScanner,
        scratch_root: &Path,
        copies: &mut Vec<PathBuf>,
        report: &mut AlbumReport,
        out: &ProgressAwareOutput<'_>,
    ) -> Result<()> {
        let extractor = SourceExtractor::new(self.config.recovery.copy_extension.clone())?;
        let total_bytes = sources.iter().map(|s| s.size).sum();
        let mut progress = ExtractionProgress::new(sources.len(), total_bytes);

        let file_progress = self
            .progress_manager
            .create_file_progress(&report.name, sources.len() as u64);

        for source in sources {
            if let Err(e) = self.shutdown.check_shutdown() {
                file_progress.abandon_with_message("Cancelled");
                return Err(e);
            }

            let recovered =
                self.recover_source(&extractor, scanner, source, scratch_root, copies, report, out);
            let images = match recovered {
                Ok(images) => images,
                Err(e @ PlistPngError::FileTooLarge { .. }) => {
                    let message = format!("Skipping {}: {}", source.filename, e.user_message());
                    out.warning(&message);
                    report.files_skipped += 1;
                    report.errors.push(message);
                    0
                }
                Err(e) => {
                    file_progress.abandon_with_message(format!("Failed on {}", source.filename));
                    return Err(e);
                }
            };

            progress.update_file(source.filename.clone(), source.size, images);
            ui::progress::update_file_progress(&file_progress, &progress);
        }

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Recovered {} image(s)", progress.images_recovered),
            progress.elapsed(),
        );

        report.bytes_processed = progress.bytes_processed;

        let album_dir = report.album_path.clone();
        let collector = AlbumCollector::new();
        collector.prepare_album(&album_dir)?;
        let collected = collector.collect(scratch_root, &album_dir)?;
        for image in &collected {
            out.debug(&format!("Collected {}", image.display()));
        }
        report.images_collected = collected.len();

        Ok(())
    }

    /// Returns the number of images recovered from `source`.
    fn recover_source(
        &self,
        extractor: &SourceExtractor,
        scanner: &AlbumScanner,
        source: &SourceFile,
        scratch_root: &Path,
        copies: &mut Vec<PathBuf>,
        report: &mut AlbumReport,
        out: &ProgressAwareOutput<'_>,
    ) -> Result<usize> {
        scanner.check_size(source)?;

        match extractor.extract(source, scratch_root, copies)? {
            SourceOutcome::Skipped { reason } => {
                out.warning(&reason);
                report.files_skipped += 1;
                report.errors.push(reason);
                Ok(0)
            }
            SourceOutcome::Extracted(extraction) => {
                report.fragments_found += extraction.fragments.len();
                report.fragments_discarded += extraction.discarded.len();
                report.images_recovered += extraction.images.len();

                for reason in extraction.discarded {
                    out.warning(&reason);
                    report.errors.push(reason);
                }
                for image in &extraction.images {
                    out.debug(&format!("Saved {}", image.display()));
                }

                Ok(extraction.images.len())
            }
        }
    }

    fn clean_album(
        &self,
        album: &Album,
        copies: &[PathBuf],
        scratch: TempDir,
        out: &ProgressAwareOutput<'_>,
    ) -> Result<()> {
        let removed = Cleaner::remove_plist_copies(copies);
        let scratch_path = scratch.path().to_path_buf();
        let closed = scratch.close();

        let removed = removed?;
        out.debug(&format!(
            "Removed {} decode cop{} from {}",
            removed.len(),
            if removed.len() == 1 { "y" } else { "ies" },
            album.path.display()
        ));

        closed?;
        out.debug(&format!("Removed {}", scratch_path.display()));

        Ok(())
    }

    /// Lists albums, sources and planned renames without changing anything.
    pub fn dry_run_plan(&self) -> Result<Vec<AlbumPlan>> {
        let scanner = AlbumScanner::new(&self.config.recovery);

        self.scan_albums(&scanner)?
            .into_iter()
            .map(|album| {
                let sources = scanner.scan_sources(&album)?;
                let renames = if self.config.recovery.rename_sources {
                    Renamer::new(&album.name)
                        .plan(&sources)
                        .into_iter()
                        .filter(|plan| !plan.is_noop())
                        .collect()
                } else {
                    Vec::new()
                };
                let oversized = scanner.get_statistics(&sources).oversized_files;

                Ok(AlbumPlan {
                    album,
                    sources,
                    renames,
                    oversized,
                })
            })
            .collect()
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Check if shutdown has been requested
    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Request graceful shutdown
    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &PlistPngError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "plistpng {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
