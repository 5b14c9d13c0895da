use std::{
    collections::{BTreeSet, HashSet},
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, extractor::normalize_domain, Result};

/// Typed configuration, read once at startup and static thereafter.
///
/// Everything comes from environment variables, with an optional `.env`
/// fallback that never overrides values already present in the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub owner_id: i64,

    /// Normalized hostnames exempt from removal action.
    pub allowed_domains: BTreeSet<String>,
    /// Chat ids the bot actively moderates; empty means every chat.
    pub allowed_chat_ids: HashSet<i64>,

    pub db_path: PathBuf,
    pub owner_timeout: Duration,
}

const DEFAULT_ALLOWED_DOMAINS: &str = "julfikar.me";
const DEFAULT_DB_PATH: &str = "bot_data.sqlite3";
const DEFAULT_OWNER_TIMEOUT_MIN: u64 = 5;

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let owner_id = env_i64("OWNER_ID").unwrap_or(0);
        if owner_id == 0 {
            return Err(Error::Config(
                "OWNER_ID environment variable is required and must be a nonzero user id"
                    .to_string(),
            ));
        }

        let allowed_domains = parse_domains(
            env_str("ALLOWED_DOMAINS").unwrap_or_else(|| DEFAULT_ALLOWED_DOMAINS.to_string()),
        );

        let allowed_chat_ids: HashSet<i64> =
            parse_csv_i64(env_str("ALLOWED_CHAT_IDS")).into_iter().collect();

        let db_path =
            PathBuf::from(env_str("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()));

        let timeout_min = env_u64("OWNER_TIMEOUT_MIN").unwrap_or(DEFAULT_OWNER_TIMEOUT_MIN);
        let owner_timeout = Duration::from_secs(timeout_min * 60);

        Ok(Self {
            bot_token,
            owner_id,
            allowed_domains,
            allowed_chat_ids,
            db_path,
            owner_timeout,
        })
    }
}

fn parse_domains(raw: String) -> BTreeSet<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(normalize_domain)
        .collect()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_are_normalized_at_load() {
        let parsed = parse_domains("www.Example.com, Julfikar.ME ,".to_string());
        let expected: BTreeSet<String> =
            ["example.com", "julfikar.me"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn csv_ids_skip_garbage() {
        let ids = parse_csv_i64(Some("-1001, abc, 42,,".to_string()));
        assert_eq!(ids, vec![-1001, 42]);
    }
}
