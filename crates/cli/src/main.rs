mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;

use cichecker_core::config::Config;
use cichecker_core::network::DEFAULT_TIMEOUT;
use cichecker_core::{
    check_blocked, check_connect, check_exists, check_integrity, check_registry_value,
    CheckResponse, IntegrityOptions, LogObserver, ProbeOptions, Protocol, RegistryOptions,
    Severity, SystemRegistry,
};

use crate::logging::style;

#[derive(Parser, Debug)]
#[command(
    name = "cichecker",
    version,
    about = "Nagios/NCPA plugin checks for files, network reachability and registry values"
)]
struct Cli {
    /// TOML config file (defaults to $CICHECKER_CONFIG, then ./cichecker.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// -v for info, -vv for debug logging on stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, global = true)]
    output_format: Option<OutputFormat>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// File and directory checks
    File {
        #[command(subcommand)]
        cmd: FileCommands,
    },
    /// Reachability checks
    Network {
        #[command(subcommand)]
        cmd: NetworkCommands,
    },
    /// Windows registry checks
    Registry {
        #[command(subcommand)]
        cmd: RegistryCommands,
    },
}

#[derive(Subcommand, Debug)]
enum FileCommands {
    /// Check that a critical file or directory exists
    Exists { path: PathBuf },
    /// Verify a file or directory matches an expected SHA1 hash
    Integrity {
        target: PathBuf,
        expected_hash: String,
        /// Recurse into a directory target. Large trees can be slow
        #[arg(short, long)]
        recurse: bool,
    },
    /// Print the SHA1 hash of a file or directory for later comparison
    Hash {
        target: PathBuf,
        #[arg(short, long)]
        recurse: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NetworkCommands {
    /// Check that this host can connect to the endpoint
    Connect(ProbeArgs),
    /// Check that this host can NOT connect to the endpoint
    Block(ProbeArgs),
}

#[derive(Args, Debug)]
struct ProbeArgs {
    dest_host: String,
    dest_port: u16,

    #[arg(long, ignore_case = true)]
    protocol: Option<ProtocolArg>,

    /// Seconds to wait before giving up on the connection
    #[arg(long)]
    timeout: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum RegistryCommands {
    /// Compare a registry value against an expected value
    Check {
        /// e.g. HKEY_CURRENT_USER\Environment\Path
        full_registry_key: String,
        expected_value: String,
        /// Compare the SHA1 of the value instead of the value itself
        #[arg(long)]
        hash: bool,
    },
    /// Print a registry value as this tool sees it
    Retrieve {
        full_registry_key: String,
        #[arg(long)]
        hash: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Ncpa,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProtocolArg {
    Tcp,
    Udp,
}

impl From<ProtocolArg> for Protocol {
    fn from(p: ProtocolArg) -> Self {
        match p {
            ProtocolArg::Tcp => Protocol::Tcp,
            ProtocolArg::Udp => Protocol::Udp,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // usage errors are UNKNOWN to the poller; --help/--version are not errors
            return if e.use_stderr() {
                ExitCode::from(Severity::Unknown.exit_code())
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let cfg = load_config(cli.config.as_deref());
    let _ = logging::init(resolve_level(cli.verbose, cfg.log_level.as_deref()));
    let format = resolve_output_format(cli.output_format, cfg.output_format.as_deref());

    match run(cli.cmd, &cfg) {
        Ok(response) => emit(&response, format),
        Err(e) => {
            println!("{}: {:#}", Severity::Unknown, e);
            ExitCode::from(Severity::Unknown.exit_code())
        }
    }
}

fn warn(message: std::fmt::Arguments<'_>) {
    let s = style();
    eprintln!("{}{}warning:{} {}", s.bold, s.yellow, s.reset, message);
}

fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(p) => Some(Config::load(p)),
        None => Config::discover(),
    };
    match loaded {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn(format_args!("failed to load config: {:#}", e));
            Config::default()
        }
        None => Config::default(),
    }
}

fn resolve_level(verbose: u8, configured: Option<&str>) -> LevelFilter {
    match verbose {
        0 => match configured.map(str::parse::<LevelFilter>) {
            Some(Ok(level)) => level,
            Some(Err(_)) => {
                warn(format_args!(
                    "unknown log_level {:?}, using warn",
                    configured.unwrap_or_default()
                ));
                LevelFilter::Warn
            }
            None => LevelFilter::Warn,
        },
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn resolve_output_format(flag: Option<OutputFormat>, configured: Option<&str>) -> OutputFormat {
    use clap::ValueEnum;

    flag.or_else(|| configured.and_then(|c| OutputFormat::from_str(c, true).ok()))
        .unwrap_or(OutputFormat::Ncpa)
}

fn probe_options(args: &ProbeArgs, cfg: &Config) -> anyhow::Result<ProbeOptions> {
    let timeout = match args.timeout.or(cfg.timeout_secs) {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid timeout {secs}"))?,
        None => DEFAULT_TIMEOUT,
    };
    Ok(ProbeOptions {
        protocol: args
            .protocol
            .map(Protocol::from)
            .or(cfg.protocol)
            .unwrap_or_default(),
        timeout,
    })
}

fn run(cmd: Commands, cfg: &Config) -> anyhow::Result<CheckResponse> {
    let observer = LogObserver;
    let recurse_default = cfg.recurse.unwrap_or(false);

    let response = match cmd {
        Commands::File { cmd } => match cmd {
            FileCommands::Exists { path } => check_exists(&path, &observer),
            FileCommands::Integrity {
                target,
                expected_hash,
                recurse,
            } => check_integrity(
                &target,
                &IntegrityOptions::verify(expected_hash).recursive(recurse || recurse_default),
                &observer,
            ),
            FileCommands::Hash { target, recurse } => check_integrity(
                &target,
                &IntegrityOptions::generate().recursive(recurse || recurse_default),
                &observer,
            ),
        },
        Commands::Network { cmd } => match cmd {
            NetworkCommands::Connect(args) => {
                let opts = probe_options(&args, cfg)?;
                check_connect(&args.dest_host, args.dest_port, &opts, &observer)
            }
            NetworkCommands::Block(args) => {
                let opts = probe_options(&args, cfg)?;
                check_blocked(&args.dest_host, args.dest_port, &opts, &observer)
            }
        },
        Commands::Registry { cmd } => {
            let (key, opts) = match cmd {
                RegistryCommands::Check {
                    full_registry_key,
                    expected_value,
                    hash,
                } => (
                    full_registry_key,
                    RegistryOptions {
                        expected_value: Some(expected_value),
                        retrieve_only: false,
                        compare_hash: hash,
                    },
                ),
                RegistryCommands::Retrieve {
                    full_registry_key,
                    hash,
                } => (
                    full_registry_key,
                    RegistryOptions {
                        expected_value: None,
                        retrieve_only: true,
                        compare_hash: hash,
                    },
                ),
            };
            check_registry_value(&key, &opts, &SystemRegistry, &observer)
        }
    };

    Ok(response)
}

fn emit(response: &CheckResponse, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Ncpa => println!("{}", response.render()),
        OutputFormat::Json => match serde_json::to_string(response) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                println!("{}: serialize response: {}", Severity::Unknown, e);
                return ExitCode::from(Severity::Unknown.exit_code());
            }
        },
    }
    ExitCode::from(response.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_overrides_configured_level() {
        assert_eq!(resolve_level(0, None), LevelFilter::Warn);
        assert_eq!(resolve_level(0, Some("debug")), LevelFilter::Debug);
        assert_eq!(resolve_level(1, Some("error")), LevelFilter::Info);
        assert_eq!(resolve_level(3, None), LevelFilter::Debug);
    }

    #[test]
    fn bad_configured_level_falls_back_to_warn() {
        assert_eq!(resolve_level(0, Some("loud")), LevelFilter::Warn);
    }

    #[test]
    fn output_format_flag_beats_config() {
        assert_eq!(
            resolve_output_format(Some(OutputFormat::Ncpa), Some("json")),
            OutputFormat::Ncpa
        );
        assert_eq!(resolve_output_format(None, Some("JSON")), OutputFormat::Json);
        assert_eq!(resolve_output_format(None, Some("xml")), OutputFormat::Ncpa);
    }

    #[test]
    fn probe_options_layer_cli_over_config() {
        let cfg = Config {
            timeout_secs: Some(2.0),
            protocol: Some(Protocol::Udp),
            ..Config::default()
        };
        let args = ProbeArgs {
            dest_host: "h".to_string(),
            dest_port: 1,
            protocol: Some(ProtocolArg::Tcp),
            timeout: None,
        };
        let opts = probe_options(&args, &cfg).unwrap();
        assert_eq!(opts.protocol, Protocol::Tcp);
        assert_eq!(opts.timeout, Duration::from_secs(2));
    }

    #[test]
    fn negative_timeout_is_an_error() {
        let args = ProbeArgs {
            dest_host: "h".to_string(),
            dest_port: 1,
            protocol: None,
            timeout: Some(-1.0),
        };
        assert!(probe_options(&args, &Config::default()).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
