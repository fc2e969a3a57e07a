use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use database_adapter::{DbError, SqliteStore};

lazy_static::lazy_static! {
    pub static ref PROJECT_NAME: String = String::from("Storefront").to_uppercase();
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// Get the data directory for the application
pub fn get_data_dir() -> PathBuf {
    let project_name = PROJECT_NAME.clone().to_lowercase();

    if let Ok(data_dir) = std::env::var(format!("{}_DATA", PROJECT_NAME.clone())) {
        PathBuf::from(data_dir)
    } else if let Ok(data_dir) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(data_dir).join(&project_name)
    } else if let Ok(home_dir) = std::env::var("HOME") {
        PathBuf::from(home_dir)
            .join(".local")
            .join("share")
            .join(&project_name)
    } else {
        // Fallback to current directory if no home directory is found
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&project_name)
    }
}

/// Where the credential slots live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    /// Explicit sqlx URL from `DATABASE_URL`
    Url(String),
    /// `storefront.db` under the data directory
    File(PathBuf),
}

impl Database {
    fn from_env_value(url: Option<String>, data_dir: &Path) -> Self {
        match url.filter(|url| !url.trim().is_empty()) {
            Some(url) => Database::Url(url),
            None => Database::File(data_dir.join("storefront.db")),
        }
    }

    pub async fn open(&self, table: &str) -> Result<SqliteStore, DbError> {
        match self {
            Database::Url(url) => SqliteStore::connect(url, table).await,
            Database::File(path) => SqliteStore::open(path, table).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub database: Database,
    pub latency: Duration,
    pub static_dir: PathBuf,
}

impl Config {
    /// Read settings from the environment (and `.env`), falling back to defaults
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = get_data_dir();

        let addr = match env_var("ADDR") {
            Some(addr) => addr
                .parse()
                .wrap_err_with(|| format!("Invalid {}_ADDR: {addr}", PROJECT_NAME.clone()))?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let latency = match env_var("LATENCY_MS") {
            Some(ms) => Duration::from_millis(ms.parse().map_err(|_| {
                eyre!(
                    "Invalid {}_LATENCY_MS: {ms} is not a number of milliseconds",
                    PROJECT_NAME.clone()
                )
            })?),
            None => Duration::from_millis(300),
        };

        let database = Database::from_env_value(std::env::var("DATABASE_URL").ok(), &data_dir);

        let static_dir = env_var("STATIC").map_or_else(|| PathBuf::from("static"), PathBuf::from);

        Ok(Self {
            addr,
            data_dir,
            database,
            latency,
            static_dir,
        })
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}_{suffix}", PROJECT_NAME.clone()))
        .ok()
        .filter(|value| !value.trim().is_empty())
}
