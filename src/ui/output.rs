use crate::error::{format_bytes, PlistPngError, UserFriendlyError};
use crate::extractor::{AlbumReport, RecoveryReport};
use console::{style, Emoji};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");
static FRAME: Emoji = Emoji("🖼️  ", "# ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => console::colors_enabled() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &PlistPngError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// One line per finished album, shown at the default verbosity.
    pub fn album_finished(&self, album: &AlbumReport) {
        if !self.should_show_message(1) {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                let counts = format!(
                    "{} image(s) from {} file(s)",
                    album.images_collected, album.files_scanned
                );
                if self.use_colors {
                    println!(
                        "{}{} {} {}",
                        FRAME,
                        style(&album.name).bold(),
                        style(counts).green(),
                        style(format!("-> {}", album.album_path.display())).dim()
                    );
                } else {
                    println!(
                        "# {} {} -> {}",
                        album.name,
                        counts,
                        album.album_path.display()
                    );
                }
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "album",
                    "name": album.name,
                    "album_path": album.album_path,
                    "files_scanned": album.files_scanned,
                    "files_skipped": album.files_skipped,
                    "images_collected": album.images_collected,
                    "duration_ms": album.duration.as_millis(),
                }));
            }
            OutputMode::Plain => println!(
                "ALBUM: {} files={} skipped={} images={}",
                album.name, album.files_scanned, album.files_skipped, album.images_collected
            ),
        }
    }

    // Summary and reporting
    pub fn print_recovery_summary(&self, report: &RecoveryReport) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(report),
            OutputMode::Json => self.print_json_summary(report),
            OutputMode::Plain => self.print_plain_summary(report),
        }
    }

    pub fn print_recovery_report(&self, report: &RecoveryReport) {
        match self.mode {
            OutputMode::Human => self.print_human_report(report),
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_summary(&self, report: &RecoveryReport) {
        println!();
        self.print_separator();

        let headline = if report.cancelled {
            "Recovery stopped before all albums were processed"
        } else {
            "Image recovery completed!"
        };
        if self.use_colors {
            println!("{} {}", style(headline).green().bold(), CHECKMARK);
        } else {
            println!("✓ {}", headline);
        }

        println!();
        println!(
            "  Albums:           {}",
            self.highlight(report.albums.len().to_string())
        );
        println!(
            "  Files scanned:    {}",
            self.highlight(report.total_files_scanned().to_string())
        );
        println!(
            "  Images collected: {}",
            self.highlight(report.total_images_collected().to_string())
        );
        println!(
            "  Bytes processed:  {}",
            self.highlight(format_bytes(report.total_bytes_processed()))
        );
        println!(
            "  Time taken:       {}",
            self.highlight(format_duration(report.duration))
        );

        let skipped = report.total_files_skipped();
        if skipped > 0 {
            println!("  Files skipped:    {}", skipped);
        }

        self.print_separator();
    }

    fn print_json_summary(&self, report: &RecoveryReport) {
        let summary = serde_json::json!({
            "type": "summary",
            "albums": report.albums.len(),
            "files_scanned": report.total_files_scanned(),
            "files_skipped": report.total_files_skipped(),
            "images_recovered": report.total_images_recovered(),
            "images_collected": report.total_images_collected(),
            "bytes_processed": report.total_bytes_processed(),
            "duration_ms": report.duration.as_millis(),
            "cancelled": report.cancelled,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_plain_summary(&self, report: &RecoveryReport) {
        if report.cancelled {
            println!("CANCELLED: Image recovery");
        } else {
            println!("COMPLETED: Image recovery");
        }
        println!("Albums: {}", report.albums.len());
        println!("Files scanned: {}", report.total_files_scanned());
        println!("Images collected: {}", report.total_images_collected());
        println!("Duration: {:?}", report.duration);
        let skipped = report.total_files_skipped();
        if skipped > 0 {
            println!("Files skipped: {}", skipped);
        }
    }

    fn print_human_report(&self, report: &RecoveryReport) {
        self.print_header("Recovery Report");

        println!(
            "Started at: {}",
            report.started_at.format("%Y-%m-%d %H:%M UTC")
        );
        println!("Input: {}", report.config_used.input_dir.display());
        println!("Albums: {}", report.config_used.album_dir.display());
        println!();

        for album in &report.albums {
            println!(
                "  {}: {} image(s), {} fragment(s), {} skipped",
                album.name, album.images_collected, album.fragments_found, album.files_skipped
            );
        }

        let errors: Vec<_> = report.errors().collect();
        if !errors.is_empty() {
            println!();
            println!("Issues encountered:");
            for error in errors {
                println!("  - {}", error);
            }
        }
    }

    fn print_plain_report(&self, report: &RecoveryReport) {
        println!("REPORT: Image recovery");
        for album in &report.albums {
            println!(
                "{}: images={} fragments={} skipped={}",
                album.name, album.images_collected, album.fragments_found, album.files_skipped
            );
        }
        println!("Errors: {}", report.errors().count());
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Routes messages through the progress bars so lines are not torn.
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: Option<&'a crate::ui::ProgressManager>,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(
        formatter: &'a OutputFormatter,
        progress_manager: Option<&'a crate::ui::ProgressManager>,
    ) -> Self {
        Self {
            formatter,
            progress_manager,
        }
    }

    pub fn suspend_and_print<F>(&self, f: F)
    where
        F: FnOnce(&OutputFormatter),
    {
        if let Some(pm) = self.progress_manager {
            pm.suspend(|| f(self.formatter));
        } else {
            f(self.formatter);
        }
    }

    pub fn success(&self, message: &str) {
        self.suspend_and_print(|f| f.success(message));
    }

    pub fn error(&self, message: &str) {
        self.suspend_and_print(|f| f.error(message));
    }

    pub fn warning(&self, message: &str) {
        self.suspend_and_print(|f| f.warning(message));
    }

    pub fn info(&self, message: &str) {
        self.suspend_and_print(|f| f.info(message));
    }

    pub fn debug(&self, message: &str) {
        self.suspend_and_print(|f| f.debug(message));
    }
}
