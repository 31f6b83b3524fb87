//! `lotus check` — load and validate a config without executing anything.

use crate::runtime::load_config;
use anyhow::Result;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    println!("config OK: {} backend(s), default = {}", config.raw.backends.len(), config.raw.default_backend);
    for name in config.raw.backends.keys() {
        println!("  backend {name}: rule bundle = {}", if config.rule_bundle(name).is_some() { "present" } else { "none (falls back to default)" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn accepts_a_minimal_valid_config() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "default_backend: main\nbackends:\n  main:\n    name: main\n    dialect: postgres\n    connection_url: postgres://localhost/app\n"
        )
        .unwrap();
        assert!(run(file.path()).is_ok());
    }

    #[test]
    fn rejects_a_missing_default_backend() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "default_backend: ghost\nbackends: {{}}\n").unwrap();
        assert!(run(file.path()).is_err());
    }
}
