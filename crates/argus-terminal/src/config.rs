use anyhow::{bail, Context, Result};
use argus_client::ArgusConfig;
use dashboard::RunPolicy;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_CHART_HEIGHT: u16 = 18;
const MIN_CHART_HEIGHT: u16 = 6;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ArgusConfig,
    /// Replaces the bundled instrument catalog when set.
    pub catalog_path: Option<PathBuf>,
    pub run_policy: RunPolicy,
    /// Chart panel height in rows, borders excluded.
    pub chart_height: u16,
    pub log_file: PathBuf,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api = ArgusConfig::from_env().context("Invalid Argus backend settings")?;

        let run_policy = match env::var("ARGUS_RUN_POLICY") {
            Ok(raw) => raw.parse().context("ARGUS_RUN_POLICY")?,
            Err(_) => RunPolicy::default(),
        };

        let chart_height = parse_chart_height(
            &env::var("ARGUS_CHART_HEIGHT").unwrap_or_else(|_| DEFAULT_CHART_HEIGHT.to_string()),
        )?;

        let config = Self {
            api,
            catalog_path: env::var("ARGUS_CATALOG_PATH").ok().map(PathBuf::from),
            run_policy,
            chart_height,
            log_file: env::var("ARGUS_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_log_file()),
            json_logs: env::var("RUST_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        Ok(config)
    }
}

fn parse_chart_height(raw: &str) -> Result<u16> {
    let rows: u16 = raw
        .trim()
        .parse()
        .with_context(|| format!("ARGUS_CHART_HEIGHT is not a row count: {}", raw))?;
    if rows < MIN_CHART_HEIGHT {
        bail!("ARGUS_CHART_HEIGHT must be at least {} rows, got {}", MIN_CHART_HEIGHT, rows);
    }
    Ok(rows)
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("argus")
        .join("argus.log")
}
