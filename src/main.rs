//! rli - interactive command session demo
//!
//! Registers a few commands, one of which hands the terminal to a child
//! process, and runs the session until `exit`, `^D`, or a confirmed `^C`.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{debug, error, info, warn};

use rli::config::loader::ConfigLoader;
use rli::error::Result;
use rli::{Command, ReadlineEditor, Session, SessionConfig};

/// Shell loop run by the `test` command
const TICK_SCRIPT: &str =
    r#"i=0; while [ "$i" -lt "${1:-10}" ]; do i=$((i+1)); echo "tick $i"; sleep 1; done"#;

/// Command line options
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Skip loading and saving the history file
    no_history: bool,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        app_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("Missing config file path".into());
                    }
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--no-history" => {
                    app_args.no_history = true;
                }
                "--help" | "-?" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("{} v{}", rli::NAME, rli::VERSION);
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    return Err(format!("Unknown option: {}", arg).into());
                }
                _ => {
                    warn!("Ignoring positional argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("rli - interactive command session with foreground process delegation");
    println!();
    println!("USAGE:");
    println!("    rli [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -d, --debug            Enable debug logging");
    println!("        --no-history       Do not load or save the history file");
    println!("    -?, --help             Print this help message");
    println!("    -v, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    rli looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. $RLI_CONFIG");
    println!("    3. $XDG_CONFIG_HOME/rli/config.toml");
    println!("    4. ~/.config/rli/config.toml");
    println!("    5. ~/.rli/config.toml");
    println!("    6. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    RLI_CONFIG     Path to configuration file");
    println!("    RLI_DEBUG      Enable debug logging (1 or true)");
    println!("    RUST_LOG       Set logging level (error, warn, info, debug, trace)");
}

fn init_logging(args: &AppArgs) {
    let debug_env = env::var("RLI_DEBUG").map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"));
    let log_level = if args.debug || debug_env { "debug" } else { "warn" };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(args: &AppArgs) -> SessionConfig {
    let loaded = match &args.config_path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };

    match loaded {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            SessionConfig::default()
        }
    }
}

fn demo_commands() -> Vec<Command> {
    vec![
        Command::new(
            "test",
            "Run a terminable shell loop as a foreground process.",
            |ctx, args| {
                let mut shell_args = vec!["-c".to_string(), TICK_SCRIPT.to_string(), "sh".to_string()];
                shell_args.extend(args.iter().take(1).cloned());
                ctx.spawn("sh", shell_args)?;
                Ok(())
            },
        )
        .with_args(["[<count>]"]),
        Command::new(
            "run",
            "Run <program> in the foreground.",
            |ctx, args| {
                let Some((program, rest)) = args.split_first() else {
                    anyhow::bail!("usage: run <program> [<arg>...]");
                };
                ctx.spawn(program, rest.iter().cloned())?;
                Ok(())
            },
        )
        .with_args(["<program>", "[<arg>...]"]),
        Command::new(
            "echo",
            "Write <string> to the standard output.",
            |ctx, args| {
                ctx.print(&args.join(" "));
                Ok(())
            },
        )
        .with_args(["<string>"]),
        Command::new("exit", "Terminate rli.", |ctx, _args| {
            ctx.close();
            Ok(())
        }),
    ]
}

fn history_path(args: &AppArgs, config: &SessionConfig) -> Option<PathBuf> {
    if args.no_history {
        return None;
    }
    config
        .history_file
        .clone()
        .or_else(ConfigLoader::default_history_path)
}

async fn run(args: AppArgs) -> Result<()> {
    let config = load_configuration(&args);
    let history_file = history_path(&args, &config);

    let mut session = Session::new(config)?;
    session.register_commands(demo_commands())?;
    session.on_line(|ctx, line| {
        ctx.print(&format!("Thank you for your input: {}", line));
        Ok(())
    });

    if let Some(path) = &history_file {
        match session.history_mut().load(path) {
            Ok(count) => debug!("Restored {} history entries", count),
            Err(e) => warn!("Failed to load history from {}: {}", path.display(), e),
        }
    }

    let result = session.run(ReadlineEditor::new()?).await;

    if let Some(path) = &history_file {
        if let Err(e) = session.history().save(path) {
            warn!("Failed to save history to {}: {}", path.display(), e);
        }
    }

    result
}

#[tokio::main]
async fn main() {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("{}", e);
        print_help();
        process::exit(2);
    });

    init_logging(&args);
    info!("Starting {} v{}", rli::NAME, rli::VERSION);

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("rli: {}", e);
        process::exit(1);
    }
}
