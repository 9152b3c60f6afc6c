//! lintstream CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lintstream::cli::{CacheOperation, CheckArgs, Cli, Commands, OutputFormat};
use lintstream::{
    cache, BasePreset, EngineCommand, ExternalEngine, LintStreamError, LintTask, TaskConfig,
    TaskOutcome,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Initialize tracing (logs to stderr).
///
/// RUST_LOG wins when set; --verbose raises the default filter to debug.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "lintstream=debug"
    } else {
        "lintstream=warn"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> lintstream::Result<String> {
    match &cli.command {
        Commands::Check(args) => run_check(cli, args),
        Commands::Cache(args) => match args.operation {
            CacheOperation::Status => run_cache_status(cli),
            CacheOperation::Clear => run_cache_clear(cli),
        },
    }
}

/// Run the lint task
fn run_check(cli: &Cli, args: &CheckArgs) -> lintstream::Result<String> {
    let root = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
    let root = root.canonicalize().unwrap_or(root);

    let mut config = load_config(&root, args)?;
    apply_cli_overrides(&mut config, args)?;

    if config.patterns.is_empty() {
        return Err(LintStreamError::ConfigError {
            message: "no source patterns configured (use --pattern or the config file)"
                .to_string(),
        });
    }

    let command = config
        .engine
        .clone()
        .ok_or_else(|| LintStreamError::ConfigError {
            message: "no analysis engine configured (use --engine or the config file)".to_string(),
        })?;
    let engine = ExternalEngine::new(command, &root)?;

    let mut task = LintTask::new(&args.task_name, &root, config, Box::new(engine));
    if args.no_cache {
        task = task.without_cache();
    }

    let outcome = task.run()?;
    let output = render_check(cli.format, &root, &args.task_name, &task, &outcome);

    if args.deny && outcome.summary.violation_count > 0 {
        print!("{}", output);
        return Err(LintStreamError::ViolationsDenied {
            count: outcome.summary.violation_count,
        });
    }

    Ok(output)
}

/// Load the task config file: --config wins, then .lintstream.json under the
/// root, then defaults
fn load_config(root: &std::path::Path, args: &CheckArgs) -> lintstream::Result<TaskConfig> {
    if let Some(path) = &args.config {
        return TaskConfig::load(path);
    }

    let default_path = root.join(".lintstream.json");
    if default_path.exists() {
        return TaskConfig::load(&default_path);
    }

    Ok(TaskConfig::default())
}

/// Merge CLI flags on top of the loaded config (flags win)
fn apply_cli_overrides(config: &mut TaskConfig, args: &CheckArgs) -> lintstream::Result<()> {
    if !args.patterns.is_empty() {
        config.patterns = args.patterns.clone();
    }

    config.rule_dirs.extend(args.rule_dirs.iter().cloned());

    if let Some(preset) = &args.preset {
        config.base = preset
            .parse::<BasePreset>()
            .map_err(|_| LintStreamError::ConfigError {
                message: format!(
                    "unknown preset {:?} (expected none, recommended, or strict)",
                    preset
                ),
            })?;
    }

    if args.warn {
        config.display_warnings = true;
    }
    if args.reset {
        config.reset = true;
    }

    if let Some(program) = &args.engine {
        let mut command = config
            .engine
            .take()
            .unwrap_or_else(|| EngineCommand::new(program.clone(), Vec::new()));
        command.program = program.clone();
        if !args.engine_args.is_empty() {
            command.args = args.engine_args.clone();
        }
        config.engine = Some(command);
    } else if !args.engine_args.is_empty() {
        if let Some(command) = &mut config.engine {
            command.args = args.engine_args.clone();
        }
    }

    Ok(())
}

/// Render the check report
fn render_check(
    format: OutputFormat,
    root: &std::path::Path,
    task_name: &str,
    task: &LintTask,
    outcome: &TaskOutcome,
) -> String {
    let summary = &outcome.summary;
    let success = summary.violation_count == 0 && task.log().error_count() == 0;

    match format {
        OutputFormat::Json => {
            let json_value = serde_json::json!({
                "_type": "lint_check",
                "root": root.to_string_lossy(),
                "task": task_name,
                "success": success,
                "summary": summary,
                "errors": task.log().error_count(),
                "warnings": task.log().warning_count(),
                "entries": task.log().entries(),
            });
            serde_json::to_string_pretty(&json_value).unwrap_or_default()
        }
        OutputFormat::Text => {
            let mut output = String::new();
            let status = if success { "PASS" } else { "FAIL" };

            output.push_str("═══════════════════════════════════════════\n");
            output.push_str(&format!("  LINT CHECK: {}\n", status));
            output.push_str("═══════════════════════════════════════════\n\n");
            output.push_str(&format!("root: {}\n", root.display()));
            output.push_str(&format!(
                "files: matched {} | analyzed {} | cached {} | dropped {}\n",
                summary.files_matched,
                summary.files_analyzed,
                summary.files_skipped,
                summary.files_dropped
            ));
            output.push_str(&format!(
                "violations: {} ({} errors, {} warnings) | duration: {}ms\n",
                summary.violation_count,
                task.log().error_count(),
                task.log().warning_count(),
                summary.duration_ms
            ));

            if !task.log().entries().is_empty() {
                output.push_str("\n───────────────────────────────────────────\n");
                output.push_str("  ISSUES\n");
                output.push_str("───────────────────────────────────────────\n");
                output.push_str(&task.log().render_text());
            }

            output
        }
    }
}

/// Show cache stores and entry counts
fn run_cache_status(cli: &Cli) -> lintstream::Result<String> {
    let base = cache::cache_base_dir();
    let stores = cache::list_stores(&base);

    match cli.format {
        OutputFormat::Json => {
            let json_value = serde_json::json!({
                "_type": "cache_status",
                "base": base.to_string_lossy(),
                "stores": stores.iter().map(|(scope, path, entries)| serde_json::json!({
                    "scope": scope,
                    "path": path.to_string_lossy(),
                    "entries": entries,
                })).collect::<Vec<_>>(),
            });
            Ok(serde_json::to_string_pretty(&json_value).unwrap_or_default())
        }
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(&format!("cache base: {}\n", base.display()));

            if stores.is_empty() {
                output.push_str("no cache stores\n");
            } else {
                for (scope, _, entries) in &stores {
                    output.push_str(&format!("  {} ({} entries)\n", scope, entries));
                }
            }

            Ok(output)
        }
    }
}

/// Remove all cache stores
fn run_cache_clear(cli: &Cli) -> lintstream::Result<String> {
    let base = cache::cache_base_dir();
    let removed = cache::clear_all(&base)?;

    match cli.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "_type": "cache_clear",
            "removed": removed,
        }))
        .unwrap_or_default()),
        OutputFormat::Text => Ok(format!("Removed {} cache store(s)\n", removed)),
    }
}
