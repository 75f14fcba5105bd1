//! Runtime settings for a Schorle application.
//!
//! Settings come from `Settings::default()` and can be overlaid from the
//! process environment and `.env` files with [`Settings::from_env`].

pub mod env_loader;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub use env_loader::EnvVars;

/// Cookie that carries the session id between the page GET and the WebSocket.
pub const SESSION_COOKIE_NAME: &str = "schorle-session-id";

/// WebSocket endpoint the client runtime connects to.
pub const EVENTS_PATH: &str = "/_schorle/events";

/// Prefix for framework-served static assets.
pub const ASSETS_PREFIX: &str = "/_schorle/";

/// Whether the server runs with development affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningMode {
    Dev,
    #[default]
    Production,
}

impl FromStr for RunningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Production),
            other => Err(format!("unknown running mode '{}'", other)),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: [u8; 4],
    pub port: u16,
    pub mode: RunningMode,
    pub title: String,
    pub lang: String,
    pub theme: String,
    pub cookie_name: String,
    pub events_path: String,
    pub assets_prefix: String,
    /// Directory served under `assets_prefix`; `None` disables static serving.
    pub assets_dir: Option<PathBuf>,
    pub runtime_script: String,
    pub stylesheet: String,
    pub favicon: Option<String>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Collapse duplicate pending renders of the same component.
    pub dedupe_render_queue: bool,
    /// A session whose events socket has not connected by then is evicted.
    pub connect_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: [0, 0, 0, 0],
            port: 8000,
            mode: RunningMode::default(),
            title: "Schorle".to_string(),
            lang: "en".to_string(),
            theme: "dark".to_string(),
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            events_path: EVENTS_PATH.to_string(),
            assets_prefix: ASSETS_PREFIX.to_string(),
            assets_dir: None,
            runtime_script: "/_schorle/assets/bundle.js".to_string(),
            stylesheet: "/_schorle/assets/styles.css".to_string(),
            favicon: Some("/favicon.svg".to_string()),
            log_level: "info".to_string(),
            dedupe_render_queue: false,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Load settings from the environment and `.env` files under `folder`.
    pub fn from_env(folder: &Path) -> Self {
        Self::from_vars(&EnvVars::load(folder))
    }

    /// Overlay defaults with whatever `vars` provides.
    pub fn from_vars(vars: &EnvVars) -> Self {
        let mut settings = Self::default();

        if let Some(host) = vars.get("SCHORLE_HOST") {
            match parse_host(&host) {
                Some(parsed) => settings.host = parsed,
                None => warn!(value = %host, "ignoring invalid SCHORLE_HOST"),
            }
        }
        parse_into(vars, "SCHORLE_PORT", &mut settings.port);
        parse_into(vars, "SCHORLE_MODE", &mut settings.mode);
        parse_into(vars, "SCHORLE_DEDUPE_QUEUE", &mut settings.dedupe_render_queue);

        let mut connect_secs = settings.connect_timeout.as_secs();
        parse_into(vars, "SCHORLE_CONNECT_TIMEOUT", &mut connect_secs);
        settings.connect_timeout = Duration::from_secs(connect_secs);

        if let Some(title) = vars.get("SCHORLE_TITLE") {
            settings.title = title;
        }
        if let Some(lang) = vars.get("SCHORLE_LANG") {
            settings.lang = lang;
        }
        if let Some(theme) = vars.get("SCHORLE_THEME") {
            settings.theme = theme;
        }
        if let Some(dir) = vars.get("SCHORLE_ASSETS_DIR") {
            settings.assets_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = vars.get("SCHORLE_LOG") {
            settings.log_level = level;
        }

        settings
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn is_dev(&self) -> bool {
        self.mode == RunningMode::Dev
    }
}

fn parse_into<T: FromStr>(vars: &EnvVars, key: &str, slot: &mut T) {
    if let Some(raw) = vars.get(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!(key, value = %raw, "ignoring unparseable setting"),
        }
    }
}

fn parse_host(raw: &str) -> Option<[u8; 4]> {
    let octets: Vec<u8> = raw
        .split('.')
        .map(|part| part.parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    octets.try_into().ok()
}
