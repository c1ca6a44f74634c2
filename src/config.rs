use crate::storage::resolve_data_path;
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT", DEFAULT_PORT),
            data_path: resolve_data_path(),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|err| {
            warn!("invalid {key} value {value:?}: {err}, using default");
            default
        }),
        Err(_) => default,
    }
}
