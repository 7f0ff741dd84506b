use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up inside the data directory when `--config` is absent.
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "warble.db";
const DEFAULT_HASH_COST: u32 = 10;

#[derive(Parser, Debug, Default)]
#[command(name = "warble", about = "Social graph and feed service")]
pub struct Cli {
    /// Config file (defaults to config.toml in the data directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, overriding `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port, overriding `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the database and config (defaults to ~/.warble)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub accounts: AccountsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AccountsConfig {
    /// bcrypt cost used when hashing passwords
    pub hash_cost: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            hash_cost: DEFAULT_HASH_COST,
        }
    }
}

impl Config {
    /// File settings (if any), then CLI flags, then data-dir defaults.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply(cli);
        config
            .database
            .path
            .get_or_insert_with(|| data_dir.join(DATABASE_FILE));

        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match &cli.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".warble"))
                .context("Could not determine home directory"),
        }
    }

    pub fn db_path(&self) -> Option<&PathBuf> {
        self.database.path.as_ref()
    }
}
