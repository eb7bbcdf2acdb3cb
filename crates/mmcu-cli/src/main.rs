//! CLI for mm-channel-users - export the members of every public channel in a
//! Mattermost team as CSV or JSON.

use std::env;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use env_logger::fmt::WriteStyle;
use log::{LevelFilter, debug, error, info};
use mmcu_core::paths::write_default_config;
use mmcu_core::{
    APP_NAME, AppConfig, AppPaths, Connection, ExportError, ExportRequest, MattermostClient,
    OutputFormat, OutputTarget, Pagination, Scheme, generate_schema, run_export,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Repository URL for schema $id.
const REPO_URL: &str = "https://github.com/byteowlz/mm-channel-users";

/// Long flags that may also be spelled with a single dash (`-url`, `-includebots`).
const LONG_FLAGS: &[&str] = &[
    "url",
    "port",
    "scheme",
    "token",
    "team",
    "type",
    "file",
    "includebots",
    "debug",
    "version",
    "quiet",
    "config",
    "help",
];

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The logger may not be up yet if config loading failed.
            let _ = env_logger::Builder::new()
                .filter_level(LevelFilter::Error)
                .try_init();
            error!("{err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn try_main() -> Result<()> {
    let cli = match Cli::try_parse_from(normalize_args(env::args_os())) {
        Ok(cli) => cli,
        Err(err) => return handle_parse_error(&err),
    };

    if cli.export.version {
        println!("{APP_NAME} - Version: {VERSION}");
        return Ok(());
    }

    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("resolved paths: {}", ctx.paths);

    match cli.command {
        Some(Command::Config { command }) => handle_config(&ctx, command),
        Some(Command::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => handle_export(&ctx, &cli.export),
    }
}

/// Exit code for a failed run: the stage code for export failures, 1 otherwise.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ExportError>()
        .map_or(1, ExportError::exit_code)
}

/// Rewrite Go-style single-dash long flags (`-team x`, `-type=json`) to
/// their double-dash form. Everything after a bare `--` is left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            let Some(flag) = text.strip_prefix('-').filter(|f| !f.starts_with('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

fn handle_parse_error(err: &clap::Error) -> Result<()> {
    use clap::error::ErrorKind;

    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            err.print().context("printing help")?;
            Ok(())
        }
        _ => {
            let _ = err.print();
            Err(anyhow!("invalid command line"))
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "mm-channel-users",
    author,
    about = "Export the members of every public channel in a Mattermost team as CSV or JSON",
    long_about = "This utility generates a CSV or JSON file listing all users in all public \
                  channels within a team. The token must belong to an administrator account.",
    disable_version_flag = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(flatten)]
    export: ExportArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Options shared by the export and every subcommand.
#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Enable debug output.
    #[arg(
        long,
        env = "MM_DEBUG",
        global = true,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    debug: bool,
    /// Disable ANSI colors in log output.
    #[arg(long = "no-color", global = true)]
    no_color: bool,
}

/// Export parameters.
#[derive(Debug, Clone, Default, Args)]
struct ExportArgs {
    /// Host name of the Mattermost instance (without the HTTP scheme).
    #[arg(long, env = "MM_URL", value_name = "HOST")]
    url: Option<String>,
    /// TCP port used by Mattermost. [default: 8065]
    #[arg(long, env = "MM_PORT")]
    port: Option<u16>,
    /// HTTP scheme to use (http/https). [default: http]
    #[arg(long, env = "MM_SCHEME")]
    scheme: Option<Scheme>,
    /// Auth token used to connect to Mattermost.
    #[arg(long, env = "MM_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Name of the Mattermost team.
    #[arg(long)]
    team: Option<String>,
    /// Type of export file to produce (CSV/JSON). [default: CSV]
    #[arg(long = "type", value_name = "TYPE")]
    format: Option<OutputFormat>,
    /// Output file. Omit to write to standard output.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Add bot accounts to the output, where present.
    #[arg(long = "includebots")]
    include_bots: bool,
    /// Show version information and exit.
    #[arg(long)]
    version: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect and manage configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration (token redacted).
    Show,
    /// Print the resolved config file path.
    Path,
    /// Print the JSON schema.
    Schema,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },
}

// ─── Runtime ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.as_deref())?;
        let config = AppConfig::load_from_path(&paths.config_file)
            .with_context(|| format!("loading config from {}", paths.config_file.display()))?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        // RUST_LOG wins unless a verbosity flag was given.
        if self.common.quiet || self.common.debug || env::var_os("RUST_LOG").is_none() {
            builder.filter_level(self.effective_log_level());
        }

        let force_color = env::var_os("FORCE_COLOR").is_some();
        let disable_color = self.common.no_color
            || env::var_os("NO_COLOR").is_some()
            || (!force_color && !io::stderr().is_terminal());

        if disable_color {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        builder.try_init().or_else(|err| {
            eprintln!("logger already initialized: {err}");
            Ok(())
        })
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.quiet {
            LevelFilter::Error
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            self.config.logging.level.into()
        }
    }
}

/// Everything an export run needs, after flags, env and config are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExportSettings {
    connection: Connection,
    request: ExportRequest,
}

impl ExportSettings {
    /// Merge flags (and their `MM_*` env fallbacks) over the config file.
    /// On failure returns one message per missing or invalid parameter.
    fn resolve(args: &ExportArgs, config: &AppConfig) -> std::result::Result<Self, Vec<String>> {
        fn non_empty(value: Option<&str>) -> Option<String> {
            value
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        }

        let url = non_empty(args.url.as_deref())
            .or_else(|| non_empty(config.connection.url.as_deref()));
        let token = non_empty(args.token.as_deref())
            .or_else(|| non_empty(config.connection.token.as_deref()));
        let team = non_empty(args.team.as_deref());

        let mut problems = Vec::new();
        if url.is_none() {
            problems.push(
                "the Mattermost URL must be supplied either on the command line or via the MM_URL environment variable"
                    .to_string(),
            );
        }
        if token.is_none() {
            problems.push(
                "the Mattermost auth token must be supplied either on the command line or via the MM_TOKEN environment variable"
                    .to_string(),
            );
        }
        if team.is_none() {
            problems.push("a Mattermost team name is required to use this utility".to_string());
        }

        let (Some(host), Some(token), Some(team)) = (url, token, team) else {
            return Err(problems);
        };

        Ok(Self {
            connection: Connection {
                host,
                port: args.port.unwrap_or(config.connection.port),
                scheme: args.scheme.unwrap_or(config.connection.scheme),
                token,
            },
            request: ExportRequest {
                team,
                include_bots: args.include_bots || config.export.include_bots,
                format: args.format.unwrap_or(config.export.format),
                target: OutputTarget::from_path(args.file.clone()),
                pagination: Pagination::from(config.pagination),
            },
        })
    }
}

// ─── Handlers ────────────────────────────────────────────────────────

fn handle_export(ctx: &RuntimeContext, args: &ExportArgs) -> Result<()> {
    let settings = ExportSettings::resolve(args, &ctx.config).map_err(|problems| {
        for problem in &problems {
            error!("{problem}");
        }
        eprintln!("{}", Cli::command().render_usage());
        anyhow!("missing required parameters")
    })?;

    debug!("parameters: {settings:#?}");
    debug!("full target for Mattermost: {}", settings.connection.base_url());

    let client = MattermostClient::new(&settings.connection)?;
    info!("processing started - version {VERSION}");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let summary = rt.block_on(run_export(&client, &settings.request))?;

    info!(
        "processing complete: {} record(s) from {} public channel(s) written to {}",
        summary.records, summary.channels, settings.request.target
    );
    Ok(())
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let mut shown = ctx.config.clone();
            if shown.connection.token.is_some() {
                shown.connection.token = Some("[REDACTED]".to_string());
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&shown).context("serializing config to JSON")?
            );
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths.config_file.display());
            Ok(())
        }
        ConfigCommand::Schema => {
            println!("{}", generate_schema(APP_NAME, REPO_URL)?);
            Ok(())
        }
        ConfigCommand::Init { force } => {
            if ctx.paths.config_file.exists() && !force {
                return Err(anyhow!(
                    "config already exists at {} (use --force to overwrite)",
                    ctx.paths.config_file.display()
                ));
            }
            write_default_config(&ctx.paths.config_file)?;
            info!("wrote default config to {}", ctx.paths.config_file.display());
            Ok(())
        }
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
}
