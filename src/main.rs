use clap::Parser;
use codeexport::{
    exit_code_for, exit_code_for_report, Cli, CodeExport, ExportError,
    OutputFormatter, OutputMode, UserFriendlyError,
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

    let app = match CodeExport::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&cli, &e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&app);
    }

    match app.run_export() {
        Ok(report) => {
            app.output_formatter().print_export_report(&report);
            exit_code_for_report(&report)
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli.generated_config_path();

    match CodeExport::generate_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nTo use this configuration:");
            println!(
                "  codeexport <source-dir> --config {}",
                config_path.display()
            );
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            exit_code_for(&e)
        }
    }
}

fn handle_dry_run(app: &CodeExport) -> i32 {
    let formatter = app.output_formatter();
    let config = app.config();
    let plan = app.plan_export();

    if formatter.mode() == OutputMode::Json {
        let files: Vec<String> = plan.files.iter().map(|f| f.display_path()).collect();
        let warnings: Vec<String> = plan.warnings.iter().map(|w| w.to_string()).collect();
        let output = serde_json::json!({
            "dry_run": true,
            "source_dir": config.source_dir.display().to_string(),
            "output_path": app.output_path().display().to_string(),
            "word_limit": config.word_limit,
            "files": files,
            "warnings": warnings,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        );
        return if warnings.is_empty() { 0 } else { 2 };
    }

    formatter.print_header("Dry run: no files will be written");
    formatter.print_configuration(config);
    formatter.print_separator();

    for file in &plan.files {
        println!("  {}", file.display_path());
    }

    formatter.print_separator();
    for warning in &plan.warnings {
        formatter.warning(&warning.to_string());
    }
    formatter.success(&format!(
        "{} files would be exported to {}",
        plan.files.len(),
        app.output_path().display()
    ));
    formatter.info("Run without --dry-run to perform the export");

    if plan.warnings.is_empty() {
        0
    } else {
        2
    }
}

fn print_startup_error(cli: &Cli, error: &ExportError) {
    let formatter = OutputFormatter::new(OutputMode::from(&cli.output_format), 0, false);
    formatter.print_user_friendly_error(error);
}
