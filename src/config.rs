//! Global configuration: `~/.agent-deck/config.toml`.
//!
//! Mirrors the teacher's `session::config` load/save pattern: a single TOML
//! file, parsed leniently (every section `#[serde(default)]` so old files
//! round-trip as new sections are added), cached behind a lazy singleton
//! that callers can explicitly invalidate (tests, reconfig paths).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_profile")]
    pub default_profile: String,

    #[serde(default)]
    pub claude: ClaudeConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,

    #[serde(default)]
    pub tools: HashMap<String, ToolConfig>,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub tmux: TmuxConfig,

    #[serde(default)]
    pub worktree: WorktreeConfig,

    #[serde(default)]
    pub global_search: GlobalSearchConfig,

    #[serde(default)]
    pub logs: LogsConfig,

    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub mcp: McpConfig,
}

fn default_profile() -> String {
    crate::DEFAULT_PROFILE.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(default)]
    pub config_dir: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub dangerous_mode: bool,
    #[serde(default)]
    pub allow_dangerous_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub yolo_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub claude: ClaudeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub resume_flag: Option<String>,
    #[serde(default)]
    pub session_id_env: Option<String>,
    #[serde(default)]
    pub session_id_json_path: Option<String>,
    #[serde(default)]
    pub output_format_flag: Option<String>,
    #[serde(default)]
    pub dangerous_flag: Option<String>,
    #[serde(default)]
    pub dangerous_mode: bool,
    #[serde(default)]
    pub busy_patterns: Vec<String>,
    #[serde(default)]
    pub prompt_patterns: Vec<String>,
    #[serde(default)]
    pub detect_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_true")]
    pub show_output: bool,
    #[serde(default)]
    pub show_analytics: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            show_output: true,
            show_analytics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_shown")]
    pub max_shown: usize,
    #[serde(default)]
    pub show_all: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_shown: 5,
            show_all: false,
        }
    }
}

fn default_max_shown() -> usize {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmuxConfig {
    #[serde(default)]
    pub inject_status_line: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorktreeConfig {
    #[serde(default)]
    pub default_location: Option<String>,
    #[serde(default)]
    pub auto_cleanup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSearchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_tier")]
    pub tier: String,
    #[serde(default = "default_memory_limit")]
    pub memory_limit_mb: u64,
    #[serde(default = "default_recent_days")]
    pub recent_days: u64,
    #[serde(default)]
    pub index_rate_limit: Option<u64>,
}

impl Default for GlobalSearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tier: default_tier(),
            memory_limit_mb: default_memory_limit(),
            recent_days: default_recent_days(),
            index_rate_limit: None,
        }
    }
}

fn default_tier() -> String {
    "basic".to_string()
}
fn default_memory_limit() -> u64 {
    256
}
fn default_recent_days() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    #[serde(default = "default_max_lines")]
    pub max_lines: u64,
    #[serde(default = "default_true")]
    pub remove_orphans: bool,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            max_lines: default_max_lines(),
            remove_orphans: true,
        }
    }
}

fn default_max_size_mb() -> u64 {
    30
}
fn default_max_lines() -> u64 {
    100_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub app_token: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub listen_mode: Option<String>,
    #[serde(default)]
    pub allowed_user_ids: Vec<String>,
}

/// MCP server enable/disable policy (§C7). A server on the blacklist is
/// excluded even if it also appears on the whitelist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub whitelist: Option<Vec<String>>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl McpConfig {
    pub fn to_enablement(&self) -> crate::mcp::McpEnablement {
        crate::mcp::McpEnablement {
            whitelist: self.whitelist.clone(),
            blacklist: self.blacklist.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn config_path() -> Result<PathBuf> {
    Ok(crate::session::get_app_dir()?.join("config.toml"))
}

/// Load config from disk, bypassing the cache. Returns `None` if the file
/// does not exist (absent config is not an error, per the error taxonomy).
pub fn load_config() -> Result<Option<Config>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(Some(config))
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let content = toml::to_string_pretty(config)?;
    crate::session::storage::atomic_write(&path, content.as_bytes())?;
    invalidate_cache();
    Ok(())
}

static CACHE: OnceLock<Mutex<Option<Config>>> = OnceLock::new();

fn cache() -> &'static Mutex<Option<Config>> {
    CACHE.get_or_init(|| Mutex::new(None))
}

/// Cached, read-mostly view of the config. Most callers want this instead
/// of `load_config` so a hot status-detection loop doesn't re-parse TOML
/// every tick.
pub fn get_config() -> Config {
    let mut guard = cache().lock().unwrap();
    if let Some(cfg) = guard.as_ref() {
        return cfg.clone();
    }
    let loaded = load_config().ok().flatten().unwrap_or_default();
    *guard = Some(loaded.clone());
    loaded
}

/// Drop the cached config so the next `get_config()` re-reads from disk.
/// Used by tests and by explicit reconfiguration flows.
pub fn invalidate_cache() {
    *cache().lock().unwrap() = None;
}

pub fn get_claude_config_dir() -> Option<PathBuf> {
    let config = get_config();
    config.claude.config_dir.map(expand_tilde)
}

fn expand_tilde(s: String) -> PathBuf {
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(s)
}
