use crate::constants::*;
use crate::database::is_remote_url;
use crate::error::ConfigError;
use std::collections::HashSet;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub allowed_users: HashSet<i64>,
    pub sync_allow_list: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("database_url", &self.database_url)
            .field(
                "database_auth_token",
                &self.database_auth_token.as_ref().map(|_| "<redacted>"),
            )
            .field("allowed_users", &self.allowed_users)
            .field("sync_allow_list", &self.sync_allow_list)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get(ENV_BOT_TOKEN).ok_or(ConfigError::Missing(ENV_BOT_TOKEN))?;
        let database_url = get(ENV_DATABASE_URL).ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;

        let database_auth_token = get(ENV_DATABASE_AUTH_TOKEN);
        if is_remote_url(&database_url) && database_auth_token.is_none() {
            return Err(ConfigError::MissingAuthToken(ENV_DATABASE_AUTH_TOKEN));
        }

        let raw_allow_list =
            get(ENV_ALLOWED_USER_IDS).ok_or(ConfigError::Missing(ENV_ALLOWED_USER_IDS))?;
        let allowed_users = parse_allow_list(&raw_allow_list)?;

        let sync_allow_list = match get(ENV_SYNC_ALLOW_LIST) {
            None => true,
            Some(value) => parse_flag(ENV_SYNC_ALLOW_LIST, &value)?,
        };

        Ok(Config {
            bot_token,
            database_url,
            database_auth_token,
            allowed_users,
            sync_allow_list,
        })
    }
}

pub fn parse_allow_list(raw: &str) -> Result<HashSet<i64>, ConfigError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ConfigError::InvalidAllowListEntry(s.to_string()))
        })
        .collect::<Result<HashSet<_>, _>>()?;

    if ids.is_empty() {
        return Err(ConfigError::EmptyAllowList);
    }
    Ok(ids)
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
