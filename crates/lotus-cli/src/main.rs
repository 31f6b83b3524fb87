use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod runtime;

#[derive(Parser, Debug)]
#[command(name = "lotus", version, about = "Lotus - a safe SQL gateway")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate a config, compiling all patterns, without executing anything.
    Check {
        /// Path to configuration file (YAML or TOML).
        #[arg(long, short, default_value = "lotus.yaml")]
        config: PathBuf,
    },

    /// Bind, validate, and run a statement against a configured backend.
    Query {
        /// Path to configuration file.
        #[arg(long, short, default_value = "lotus.yaml")]
        config: PathBuf,

        /// Backend name to run against.
        #[arg(long)]
        repo: String,

        /// SQL to run. If omitted, read from stdin.
        #[arg(long)]
        sql: Option<String>,

        /// Variable binding in "name=value" form; may be repeated.
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Comma-separated search path to apply for this call.
        #[arg(long)]
        search_path: Option<String>,

        /// Output format for the result set.
        #[arg(long, value_enum, default_value = "table")]
        format: commands::query::OutputFormat,
    },

    /// Introspect and print the schema visible under a backend's rules.
    Schema {
        /// Path to configuration file.
        #[arg(long, short, default_value = "lotus.yaml")]
        config: PathBuf,

        /// Backend name to introspect.
        #[arg(long)]
        repo: String,

        /// Restrict output to a single table.
        #[arg(long)]
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Write to stderr so stdout stays clean for `query`'s machine-readable output.
    let filter = std::env::var("LOTUS_LOG").or_else(|_| std::env::var("RUST_LOG")).unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_ansi(false).with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check { config } => commands::check::run(&config)?,
        Command::Query { config, repo, sql, vars, search_path, format } => {
            commands::query::run(config, repo, sql, vars, search_path, format).await?
        }
        Command::Schema { config, repo, table } => commands::schema::run(config, repo, table).await?,
    }

    Ok(())
}
