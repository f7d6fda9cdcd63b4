use anyhow::{Context, Result, bail};
use casetrack_core::GlobalNotificationSettings;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::state::ensure_casetrack_home;

/// Layout version written by this build.
///
/// - 0: unversioned; policies under `[reminders]`, `timezone` at top level.
/// - 1: `[general]`, `[notifications]`, `[delivery]`.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,

    #[serde(default)]
    pub general: GeneralSection,

    #[serde(default)]
    pub notifications: GlobalNotificationSettings,

    #[serde(default)]
    pub delivery: DeliverySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// IANA zone deciding which calendar day is "today".
    pub timezone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Append to the local JSONL outbox.
    Outbox,
    /// POST each notification to `webhook_url`.
    Webhook,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySection {
    pub transport: Transport,
    pub webhook_url: Option<String>,
    /// Name of the env var holding the webhook bearer token.
    pub webhook_token_env: String,
    pub max_dispatch_per_run: usize,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl Default for DeliverySection {
    fn default() -> Self {
        Self {
            transport: Transport::Outbox,
            webhook_url: None,
            webhook_token_env: "CASETRACK_WEBHOOK_TOKEN".to_string(),
            max_dispatch_per_run: 50,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            general: GeneralSection::default(),
            notifications: GlobalNotificationSettings::default(),
            delivery: DeliverySection::default(),
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.general
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {}", self.general.timezone))
    }

    pub fn webhook_token(&self) -> Option<String> {
        std::env::var(&self.delivery.webhook_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_casetrack_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

/// Parse any known layout version, migrating older ones forward.
pub fn parse_config(s: &str) -> Result<Config> {
    let table: toml::Table = toml::from_str(s).context("config is not valid TOML")?;
    let table = migrate(table)?;
    let cfg: Config = toml::Value::Table(table)
        .try_into()
        .context("config does not match the expected layout")?;
    cfg.timezone()?;
    Ok(cfg)
}

fn migrate(mut table: toml::Table) -> Result<toml::Table> {
    let version = match table.get("version") {
        None => 0,
        Some(toml::Value::Integer(v)) => u32::try_from(*v)
            .map_err(|_| anyhow::anyhow!("config version must be non-negative, got {v}"))?,
        Some(other) => bail!("config version must be an integer, got {other}"),
    };

    if version > CONFIG_VERSION {
        bail!(
            "config version {version} is newer than this build supports ({CONFIG_VERSION}); upgrade casetrack"
        );
    }

    if version == 0 {
        info!("migrating unversioned config to version {CONFIG_VERSION}");

        if let Some(reminders) = table.remove("reminders") {
            if !table.contains_key("notifications") {
                table.insert("notifications".to_string(), reminders);
            }
        }

        if let Some(tz) = table.remove("timezone") {
            let general = table
                .entry("general")
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            if let Some(g) = general.as_table_mut() {
                g.entry("timezone").or_insert(tz);
            }
        }
    }

    table.insert(
        "version".to_string(),
        toml::Value::Integer(i64::from(CONFIG_VERSION)),
    );
    Ok(table)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
