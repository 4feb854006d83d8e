use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub hash_memory_kib: Option<u32>,
    pub hash_iterations: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("INKPAD_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("INKPAD_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = match lookup("INKPAD_PORT") {
            Some(raw) => raw.parse().with_context(|| format!("INKPAD_PORT={raw}"))?,
            None => 8080,
        };

        Ok(Self {
            jwt_secret,
            db_path: lookup("INKPAD_DB_PATH")
                .unwrap_or_else(|| "inkpad.db".into())
                .into(),
            host: lookup("INKPAD_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            hash_memory_kib: parse_optional(&lookup, "INKPAD_HASH_MEMORY_KIB")?,
            hash_iterations: parse_optional(&lookup, "INKPAD_HASH_ITERATIONS")?,
        })
    }
}

fn parse_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u32>> {
    lookup(key)
        .map(|raw| raw.parse().with_context(|| format!("{key}={raw}")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_secret_is_fatal() {
        assert!(config(&[]).is_err());
        assert!(config(&[("INKPAD_JWT_SECRET", "")]).is_err());
        assert!(config(&[("INKPAD_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("INKPAD_JWT_SECRET", "a-long-random-value")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.db_path, PathBuf::from("inkpad.db"));
        assert_eq!(cfg.hash_memory_kib, None);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(config(&[("INKPAD_JWT_SECRET", "x1y2z3"), ("INKPAD_PORT", "http")]).is_err());
        assert!(
            config(&[("INKPAD_JWT_SECRET", "x1y2z3"), ("INKPAD_HASH_ITERATIONS", "-1")]).is_err()
        );

        let cfg = config(&[("INKPAD_JWT_SECRET", "x1y2z3"), ("INKPAD_HASH_MEMORY_KIB", "65536")])
            .unwrap();
        assert_eq!(cfg.hash_memory_kib, Some(65536));
    }
}
