use clap::Parser;
use plistpng::{
    AlbumPlan, Cli, OutputFormatter, OutputMode, PlistPng, PlistPngError, UserFriendlyError,
};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match PlistPng::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&app);
    }

    match app.recover_images() {
        Ok(report) => {
            let formatter = app.output_formatter();
            if !formatter.is_quiet() {
                formatter.print_recovery_report(&report);
            }

            if report.cancelled {
                formatter.warning("Stopped early; albums not listed above were left untouched");
                130
            } else {
                0
            }
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &PlistPngError) -> i32 {
    match error {
        PlistPngError::Cancelled => 130, // Interrupted (SIGINT)
        PlistPngError::InvalidPath { .. } => 2,
        PlistPngError::Config { .. } => 3,
        PlistPngError::NoAlbumsFound { .. } => 6,
        PlistPngError::Permission { .. } => 7,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "plistpng.toml".to_string());

    match PlistPng::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  plistpng --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(app: &PlistPng) -> i32 {
    let formatter = app.output_formatter();

    formatter.info("DRY RUN MODE - No files will be renamed, copied or written");
    formatter.print_separator();

    let config = app.config();
    formatter.info("Configuration that would be used:");
    println!("  Input directory: {}", config.paths.input_dir.display());
    println!("  Scratch directory: {}", config.paths.scratch_dir.display());
    println!("  Album directory: {}", config.paths.album_dir.display());
    println!("  Copy extension: .{}", config.recovery.copy_extension);
    println!("  Rename sources: {}", config.recovery.rename_sources);
    println!("  Max file size: {} bytes", config.recovery.max_file_size);
    if !config.recovery.exclude_patterns.is_empty() {
        println!(
            "  Exclude patterns: {}",
            config.recovery.exclude_patterns.join(", ")
        );
    }
    formatter.print_separator();

    let plans = match app.dry_run_plan() {
        Ok(plans) => plans,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    formatter.info("Recovery plan:");
    for plan in &plans {
        print_album_plan(plan, &config.paths.album_dir);
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the recovery");

    0
}

fn print_album_plan(plan: &AlbumPlan, album_root: &std::path::Path) {
    println!(
        "  {} -> {} ({} source file(s))",
        plan.album.path.display(),
        album_root.join(&plan.album.name).display(),
        plan.sources.len()
    );

    for rename in &plan.renames {
        let from = rename.from.file_name().unwrap_or_default().to_string_lossy();
        let to = rename.to.file_name().unwrap_or_default().to_string_lossy();
        println!("    rename {} -> {}", from, to);
    }

    if plan.oversized > 0 {
        println!("    {} file(s) over the size limit would be skipped", plan.oversized);
    }
}

fn print_startup_error(error: &PlistPngError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use plistpng::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "plistpng",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[recovery]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }

    #[test]
    fn test_dry_run_mode() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input");
        fs::create_dir_all(input.join("Trip")).unwrap();
        fs::write(input.join("Trip").join("photo.plist"), b"data").unwrap();

        let mut config = Config::default();
        config.paths.input_dir = input.clone();
        config.paths.album_dir = temp_dir.path().join("album");
        config.paths.scratch_dir = temp_dir.path().join("output");

        let app = PlistPng::new_for_test(config, OutputMode::Plain, 0, true);
        assert_eq!(handle_dry_run(&app), 0);
        assert!(input.join("Trip").join("photo.plist").exists());
        assert!(!temp_dir.path().join("album").exists());
    }

    #[test]
    fn test_dry_run_without_albums() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.input_dir = temp_dir.path().to_path_buf();
        config.paths.album_dir = temp_dir.path().join("album");

        let app = PlistPng::new_for_test(config, OutputMode::Plain, 0, true);
        assert_eq!(handle_dry_run(&app), 6);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&PlistPngError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&PlistPngError::InvalidPath {
                path: "missing".to_string()
            }),
            2
        );
        assert_eq!(
            exit_code_for(&PlistPngError::Config {
                message: "bad".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&PlistPngError::NoAlbumsFound {
                input_dir: "input".to_string()
            }),
            6
        );
        assert_eq!(
            exit_code_for(&PlistPngError::MalformedFragment {
                reason: "x".to_string()
            }),
            1
        );
    }
}
