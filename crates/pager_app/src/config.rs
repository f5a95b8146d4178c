use std::path::PathBuf;

use pager_engine::FetchSettings;
use thiserror::Error;

pub const BASE_URL_ENV: &str = "FEEDPAGER_BASE_URL";
pub const SUBREDDIT_ENV: &str = "FEEDPAGER_SUBREDDIT";
pub const PAGE_SIZE_ENV: &str = "FEEDPAGER_PAGE_SIZE";
pub const DATA_DIR_ENV: &str = "FEEDPAGER_DATA_DIR";

const DEFAULT_DATA_DIR: &str = "./feedpager_data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("FEEDPAGER_PAGE_SIZE must be a positive integer, got {0:?}")]
    PageSize(String),
    #[error("unexpected argument {0:?}; usage: feedpager [subreddit]")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fetch: FetchSettings,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Defaults, overridden by environment, overridden by the positional subreddit.
    pub fn from_sources<A, E>(args: A, env: E) -> Result<Self, ConfigError>
    where
        A: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let mut fetch = FetchSettings::default();
        if let Some(base_url) = env(BASE_URL_ENV) {
            fetch.base_url = base_url;
        }
        if let Some(subreddit) = env(SUBREDDIT_ENV) {
            fetch.subreddit = subreddit;
        }
        if let Some(raw) = env(PAGE_SIZE_ENV) {
            fetch.page_size = match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::PageSize(raw)),
            };
        }
        let data_dir = env(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let mut args = args.into_iter();
        if let Some(subreddit) = args.next() {
            fetch.subreddit = subreddit.trim_start_matches("r/").to_string();
        }
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }

        Ok(Self { fetch, data_dir })
    }
}
