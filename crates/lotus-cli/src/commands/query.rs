//! `lotus query` — bind, validate, and run a statement against a backend.

use crate::runtime::build_runner;
use anyhow::{bail, Context, Result};
use lotus_core::QuerySpec;
use lotus_runtime::RunOptions;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Jsonl,
    Csv,
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config_path: PathBuf,
    repo: String,
    sql: Option<String>,
    vars: Vec<String>,
    search_path: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let statement = match sql {
        Some(sql) => sql,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read SQL from stdin")?;
            buf
        }
    };
    if statement.trim().is_empty() {
        bail!("no SQL provided: pass --sql or pipe a statement on stdin");
    }

    let inputs = parse_vars(&vars)?;
    let query = QuerySpec {
        statement,
        variables: Vec::new(),
        data_repo: repo.clone(),
        search_path,
    };

    let (_config, runner) = build_runner(&config_path).await?;
    let result = runner.run(&repo, &query, &inputs, &RunOptions::default()).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.to_json())?),
        OutputFormat::Jsonl => println!("{}", result.to_jsonl()),
        OutputFormat::Csv => print!("{}", result.to_csv()),
        OutputFormat::Table => print_table(&result),
    }
    Ok(())
}

fn parse_vars(vars: &[String]) -> Result<HashMap<String, serde_json::Value>> {
    let mut inputs = HashMap::new();
    for raw in vars {
        let (name, value) = raw
            .split_once('=')
            .with_context(|| format!("--var must be in 'name=value' form, got '{raw}'"))?;
        inputs.insert(name.to_string(), serde_json::Value::String(value.to_string()));
    }
    Ok(inputs)
}

fn print_table(result: &lotus_core::QueryResult) {
    println!("{}", result.columns.join(" | "));
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| if v.is_null() { "NULL".to_string() } else { v.as_display_string() }).collect();
        println!("{}", cells.join(" | "));
    }
    println!("({} row(s) in {}ms)", result.num_rows, result.duration_ms);
}
