//! `lotus schema` — introspect and print the schema visible to `repo`'s
//! configured rules, filtering out anything the visibility engine (C2)
//! would deny before a query ever touched the database.

use crate::runtime::build_runner;
use anyhow::{Context, Result};
use lotus_policy::VisibilityEngine;
use std::path::PathBuf;

pub async fn run(config_path: PathBuf, repo: String, table: Option<String>) -> Result<()> {
    let config = crate::runtime::load_config(&config_path)?;
    let pools = crate::runtime::connect_pools(&config).await?;
    let pool = pools.get(&repo).with_context(|| format!("unknown backend '{repo}'"))?;
    let backend = config.backend(&repo).with_context(|| format!("unknown backend '{repo}'"))?;

    let default_bundle = lotus_config::RuleBundle::default();
    let bundle = config.rule_bundle(&repo).unwrap_or(&default_bundle);
    let column_index = config.column_index(&repo);
    let engine = VisibilityEngine::new(backend.dialect, bundle, column_index);

    let schemas: Vec<String> = lotus_schema::list_schemas(pool)
        .await?
        .into_iter()
        .filter(|s| engine.allowed_schema(s))
        .collect();

    for schema in &schemas {
        let tables = lotus_schema::list_tables(pool, Some(schema)).await?;
        for (table_schema, table_name) in tables {
            if let Some(filter) = &table {
                if &table_name != filter {
                    continue;
                }
            }
            if !engine.is_table_visible(&table_schema, &table_name) {
                continue;
            }
            println!("{table_schema}.{table_name}");
            let columns = lotus_schema::get_table_schema(pool, &table_schema, &table_name).await?;
            for column in columns {
                if !engine.column_visible_in_schema(&table_schema, &table_name, &column.name) {
                    continue;
                }
                println!("  {} {:?}", column.name, column.var_type);
            }
        }
    }
    Ok(())
}
