use crate::app_error::AppError;
use crate::config::{self, Config, DEFAULT_PATH};
use crate::output;
use crate::path::{self, Environment};
use crate::replay;
use crate::version;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator, generate};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(
    name = "mirakle",
    version = version::VALUE,
    about = "Helpers for builds offloaded to a remote machine",
    styles = clap_styles()
)]
struct Cli {
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rewrite a local path for the remote-sync shell
    Translate(TranslateArgs),
    /// Render a millisecond count the way build timings are printed
    Duration(DurationArgs),
    /// Check the config and the start parameters it declares
    Validate(ValidateArgs),
    /// Replay recorded build events and print task timings
    Replay(ReplayArgs),
    Version,
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct TranslateArgs {
    path: String,
    #[arg(long, value_enum)]
    env: Option<Environment>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DurationArgs {
    ms: u64,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long = "require-services")]
    require_services: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    events: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long = "watch")]
    watch: Vec<String>,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn clap_styles() -> Styles {
    Styles::plain()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Cyan.on_default())
        .context(AnsiColor::White.on_default())
        .context_value(AnsiColor::Cyan.on_default())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    output::configure(cli.no_color);
    init_logging(cli.verbose);

    match cli.command {
        Commands::Translate(args) => run_translate(args),
        Commands::Duration(args) => {
            println!("{}", output::pretty_time(args.ms));
            Ok(())
        }
        Commands::Validate(args) => run_validate(args),
        Commands::Replay(args) => run_replay(args),
        Commands::Version => {
            println!("{}", version::VALUE);
            Ok(())
        }
        Commands::Completion(args) => run_completion(args),
    }
}

fn run_translate(args: TranslateArgs) -> Result<(), AppError> {
    let env = match args.env {
        Some(env) => env,
        None => {
            let config_path = args
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
            maybe_load_config(&config_path, args.config.is_some())?
                .map(|cfg| cfg.remote.environment)
                .unwrap_or_default()
        }
    };

    debug!(%env, "translating path");
    println!("{}", path::translate(&args.path, env));
    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<(), AppError> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
    let cfg = maybe_load_config(&config_path, args.config.is_some())?.unwrap_or_default();

    cfg.start_parameters.assert_supported()?;
    let context = cfg.host_context().map_err(AppError::usage)?;

    let events = replay::load(&args.events).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            AppError::usage(format!(
                "events file {} not found",
                output::command(&args.events.display().to_string())
            ))
        } else {
            AppError::usage(format!(
                "load events {}: {err}",
                output::command(&args.events.display().to_string())
            ))
        }
    })?;

    let mut stdout = io::stdout().lock();
    let summary = replay::run(
        &events,
        &args.watch,
        context.build_finished_hook(),
        &mut stdout,
    )
    .map_err(|e| AppError::internal(format!("write output: {e}")))?;

    if !summary.finished {
        eprintln!(
            "{} no build_finished event; timings were not reported",
            output::warning("warn")
        );
    }

    match summary.failure {
        Some(failure) => Err(AppError::runtime(format!("recorded build failed: {failure}"))),
        None => Ok(()),
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Issue<'a> {
        field: &'a str,
        message: &'a str,
    }

    #[derive(Serialize)]
    struct ValidateOutput<'a> {
        valid: bool,
        config: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        issues: Option<Vec<Issue<'a>>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
    }

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
    let config_path_text = config_path.display().to_string();

    let emit = |output: &ValidateOutput<'_>| -> Result<(), AppError> {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, output)
            .map_err(|e| AppError::internal(format!("encode validate json: {e}")))?;
        writeln!(stdout).map_err(|e| AppError::internal(format!("write output: {e}")))
    };

    let cfg = match config::parse(&config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            if args.json {
                emit(&ValidateOutput {
                    valid: false,
                    config: &config_path_text,
                    issues: None,
                    error: Some(&err),
                })?;
            }
            return Err(AppError::usage(err));
        }
    };

    if let Err(err) = config::validate(&cfg) {
        if args.json {
            let issues: Vec<Issue<'_>> = err
                .issues
                .iter()
                .map(|issue| Issue {
                    field: &issue.field,
                    message: &issue.message,
                })
                .collect();
            emit(&ValidateOutput {
                valid: false,
                config: &config_path_text,
                issues: Some(issues),
                error: Some(&err.to_string()),
            })?;
        }
        return Err(AppError::usage(err.to_string()));
    }

    if let Err(err) = check_runnable(&cfg, args.require_services) {
        if args.json {
            emit(&ValidateOutput {
                valid: false,
                config: &config_path_text,
                issues: None,
                error: Some(&err.to_string()),
            })?;
        }
        return Err(err);
    }

    if args.json {
        emit(&ValidateOutput {
            valid: true,
            config: &config_path_text,
            issues: None,
            error: None,
        })?;
    } else {
        println!(
            "{} {}",
            output::success("valid"),
            output::command(&config_path_text)
        );
    }

    Ok(())
}

fn check_runnable(cfg: &Config, require_services: bool) -> Result<(), AppError> {
    cfg.start_parameters.assert_supported()?;

    if require_services {
        let context = cfg.host_context().map_err(AppError::usage)?;
        let services = context.services()?;
        debug!(
            services = ?services.names().collect::<Vec<_>>(),
            "host service registry available"
        );
    }

    Ok(())
}

fn maybe_load_config(path: &Path, explicit: bool) -> Result<Option<Config>, AppError> {
    if !path.exists() {
        if explicit {
            return Err(AppError::usage(format!(
                "config file {} not found",
                output::command(&path.display().to_string())
            )));
        }
        return Ok(None);
    }

    config::load(path).map(Some).map_err(|err| {
        if err.starts_with("read config:") {
            AppError::internal(err)
        } else {
            AppError::usage(err)
        }
    })
}

fn run_completion(args: CompletionArgs) -> Result<(), AppError> {
    let mut cmd = Cli::command();
    let mut stdout = io::stdout().lock();

    match args.shell {
        Shell::Bash => generate_completion(clap_complete::shells::Bash, &mut cmd, &mut stdout),
        Shell::Zsh => generate_completion(clap_complete::shells::Zsh, &mut cmd, &mut stdout),
        Shell::Fish => generate_completion(clap_complete::shells::Fish, &mut cmd, &mut stdout),
        Shell::Powershell => {
            generate_completion(clap_complete::shells::PowerShell, &mut cmd, &mut stdout)
        }
    }
    .map_err(|e| AppError::internal(format!("generate completion: {e}")))
}

fn generate_completion<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    writer: &mut impl Write,
) -> Result<(), io::Error> {
    generate(generator, cmd, "mirakle", writer);
    writer.flush()
}
