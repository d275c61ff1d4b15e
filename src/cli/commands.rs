use crate::config::load_route_table;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::router::Router;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line interface for trierouter
///
/// Compiles TOML route tables and answers questions about them.
#[derive(Parser)]
#[command(name = "trierouter")]
#[command(about = "Check, inspect and query URL pattern route tables", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Compile every pattern in a route table and report errors
    Check {
        /// Path to the TOML route table
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Match a request path and show the handlers and params it resolves to
    Match {
        /// Path to the TOML route table
        #[arg(short, long)]
        routes: PathBuf,

        /// HTTP method to look up handlers for
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, e.g. /api/v1/users/42
        path: String,
    },
    /// Print the compiled tree: one line per terminal node
    Tree {
        /// Path to the TOML route table
        #[arg(short, long)]
        routes: PathBuf,
    },
}

fn load_router(routes: &Path) -> Result<Router<Arc<str>>> {
    let table = load_route_table(routes)?;
    Ok(table.build_router()?)
}

/// Execute a command and return its report
///
/// # Errors
///
/// Route table loading, validation or pattern compilation failures.
pub fn run_command(command: &Commands) -> Result<String> {
    let mut out = String::new();
    match command {
        Commands::Check { routes } => {
            let router = load_router(routes)?;
            writeln!(
                out,
                "ok: {} routes compiled into {} nodes",
                router.registered_patterns().len(),
                router.tree().len()
            )?;
        }
        Commands::Match {
            routes,
            method,
            path,
        } => {
            let router = load_router(routes)?;
            let method = method.trim().to_ascii_uppercase();
            let Some(m) = router.route(path) else {
                writeln!(out, "no match: {}", path)?;
                return Ok(out);
            };
            let Some(node) = router.node(m.node) else {
                writeln!(out, "no match: {}", path)?;
                return Ok(out);
            };

            writeln!(out, "{} {} -> {}", method, path, router.tree().path_of(m.node))?;
            writeln!(out, "allow: {}", node.methods().join(","))?;
            let handlers: Vec<&str> = node.handlers(&method).iter().map(|h| h.as_ref()).collect();
            if handlers.is_empty() {
                writeln!(out, "handlers: (none for {})", method)?;
            } else {
                writeln!(out, "handlers: {}", handlers.join(", "))?;
            }
            for (name, value) in &m.path_params {
                writeln!(out, "param {}={}", name, value)?;
            }
        }
        Commands::Tree { routes } => {
            let router = load_router(routes)?;
            out.push_str(&router.dump_routes());
        }
    }
    Ok(out)
}

/// Run the CLI: set up logging, execute the command, print its report
///
/// # Errors
///
/// Logging setup failures and anything [`run_command`] returns.
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config.log_level = "debug".to_string();
    }
    init_logging_with_config(&log_config)?;

    let report = run_command(&cli.command)?;
    print!("{}", report);
    Ok(())
}
