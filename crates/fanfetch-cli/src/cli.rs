use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use fanfetch::{EndpointConfig, ResultOrder};

#[derive(Clone, Debug, Parser)]
#[command(name = "fanfetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Identifiers appended to the base URL, one request each.
    pub ids: Vec<String>,

    /// File with one identifier per line; blank lines and `#` comments are skipped.
    #[arg(long, value_name = "FILE")]
    pub ids_file: Option<PathBuf>,

    /// TOML endpoint config; flags below override it.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub url: Option<String>,

    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Extra header as `Name: value`; repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    #[arg(short = 'p', long)]
    pub max_parallel: Option<usize>,

    #[arg(short = 'r', long)]
    pub max_retries: Option<u32>,

    #[arg(long, value_name = "MS")]
    pub retry_backoff_ms: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Report concurrent results in completion order instead of input order.
    #[arg(long)]
    pub completion_order: bool,

    #[arg(short, long, value_enum, default_value_t = Mode::Both)]
    pub mode: Mode,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Send a single request with this body instead of dispatching a batch.
    #[arg(short, long)]
    pub data: Option<String>,

    /// Raise log level to debug.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Sequential,
    Concurrent,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Body as text; non-2xx is a failure.
    Text,
    /// Body as JSON; non-2xx is a failure.
    Json,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("header {s:?} is not `Name: value`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header {s:?} has an empty name"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl App {
    /// Config file and environment, then command-line overrides.
    pub fn endpoint_config(&self) -> anyhow::Result<EndpointConfig> {
        let mut config = EndpointConfig::load(self.config.as_deref())?;

        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(method) = &self.method {
            config.method = method.clone();
        }
        config.headers.extend(self.headers.iter().cloned());
        if let Some(n) = self.max_parallel {
            config.max_parallel = n;
        }
        if let Some(n) = self.max_retries {
            config.max_retries = n;
        }
        if let Some(ms) = self.retry_backoff_ms {
            config.retry_backoff_ms = ms;
        }
        if let Some(secs) = self.timeout {
            config.client.timeout_secs = Some(secs);
        }
        if self.completion_order {
            config.order = ResultOrder::Completion;
        }

        if config.base_url.is_empty() {
            bail!("no base URL: pass --url or set base_url in the config file");
        }
        Ok(config)
    }

    pub fn identifiers(&self) -> anyhow::Result<Vec<String>> {
        let mut ids = self.ids.clone();
        if let Some(path) = &self.ids_file {
            ids.extend(read_identifiers(path)?);
        }
        Ok(ids)
    }
}

fn read_identifiers(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading identifiers from {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
