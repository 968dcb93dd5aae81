#![deny(clippy::mem_forget)]
use ::log::LevelFilter;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "https://auth.acme-dns.io";

pub struct Config {
    pub server_url: String,
    pub storage_path: PathBuf,
    pub allow_from: Vec<String>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn parse() -> Result<Self> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("ACMEDNS_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let storage_path = match lookup("ACMEDNS_STORAGE_PATH") {
            Some(path) => PathBuf::from(path),
            None => {
                let home_dir = lookup("HOME")
                    .context("neither ACMEDNS_STORAGE_PATH nor HOME is set")?;
                PathBuf::from(home_dir)
                    .join(".config")
                    .join("acmedns")
                    .join("accounts.json")
            }
        };
        let allow_from = lookup("ACMEDNS_ALLOW_FROM")
            .map(|ranges| {
                ranges
                    .split(',')
                    .map(str::trim)
                    .filter(|range| !range.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let log_level = match lookup("ACMEDNS_LOG_LEVEL")
            .unwrap_or_else(|| "WARN".to_string())
            .as_str()
        {
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => LevelFilter::Info,
        };
        Ok(Config {
            server_url,
            storage_path,
            allow_from,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup_in(&[("HOME", "/home/certs")])).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(
            config.storage_path,
            PathBuf::from("/home/certs/.config/acmedns/accounts.json")
        );
        assert!(config.allow_from.is_empty());
        assert_eq!(config.log_level, LevelFilter::Warn);
    }

    #[test]
    fn explicit_values() {
        let config = Config::from_lookup(lookup_in(&[
            ("ACMEDNS_URL", "http://127.0.0.1:8053"),
            ("ACMEDNS_STORAGE_PATH", "/var/lib/acmedns.json"),
            ("ACMEDNS_ALLOW_FROM", "192.0.2.0/24, 2001:db8::/32,,"),
            ("ACMEDNS_LOG_LEVEL", "DEBUG"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:8053");
        assert_eq!(config.storage_path, PathBuf::from("/var/lib/acmedns.json"));
        assert_eq!(config.allow_from, vec!["192.0.2.0/24", "2001:db8::/32"]);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = Config::from_lookup(lookup_in(&[
            ("ACMEDNS_STORAGE_PATH", "accounts.json"),
            ("ACMEDNS_LOG_LEVEL", "verbose"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn storage_path_needs_home_or_explicit_path() {
        assert!(Config::from_lookup(lookup_in(&[])).is_err());
    }
}
