//! Config file loading and `key.path=value` overrides.

use std::{fs, path::Path};

use babylon_config::Config;
use toml::value::{Table, Value};

use crate::{args::*, errors::*};

/// Loads the config file and applies env overrides, then CLI overrides.
pub(crate) fn get_config(args: &Args) -> Result<Config, InitError> {
    let mut override_strs = EnvArgs::from_env().get_overrides()?;
    override_strs.extend_from_slice(&args.get_all_overrides()?);

    let config_toml = load_config_from_path(&args.config)?;
    build_config(config_toml, &override_strs)
}

fn load_config_from_path(path: &Path) -> Result<Value, InitError> {
    let config_str = fs::read_to_string(path).map_err(|source| InitError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&config_str)?)
}

pub(crate) fn build_config(mut config_toml: Value, overrides: &[String]) -> Result<Config, InitError> {
    let overrides = overrides
        .iter()
        .map(|o| parse_override(o))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let table = config_toml
        .as_table_mut()
        .ok_or(ConfigError::TraverseNonTableAt {
            key: "<root>".to_string(),
            path: "".to_string(),
        })?;

    for (path, val) in overrides {
        apply_override(&path, val, table)?;
    }

    Ok(config_toml.try_into::<Config>()?)
}

/// Splits `a.b.c=value` into its key path and a typed value.
fn parse_override(s: &str) -> Result<(String, Value), ConfigError> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(s.to_string()))?;
    let path = path.trim();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidOverride(s.to_string()));
    }
    Ok((path.to_string(), parse_value(raw.trim())))
}

fn parse_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        Value::Boolean(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::String(raw.to_string())
    }
}

/// Sets `path` in `table`, creating intermediate tables as needed.
fn apply_override(path: &str, value: Value, table: &mut Table) -> Result<(), ConfigError> {
    let mut keys = path.split('.').peekable();
    let mut cur = table;
    while let Some(key) = keys.next() {
        if keys.peek().is_none() {
            cur.insert(key.to_string(), value);
            return Ok(());
        }
        cur = cur
            .entry(key.to_string())
            .or_insert_with(|| Value::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| ConfigError::TraverseNonTableAt {
                key: key.to_string(),
                path: path.to_string(),
            })?;
    }
    Ok(())
}
