use crate::error::{AppError, AppResult};
use crate::types::*;
use std::{
  env,
  fs,
  path::{Path, PathBuf},
};

pub const CONFIG_FILE_NAME: &str = "bracket-tool.json";

pub fn work_dir() -> PathBuf {
  env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Absolute paths pass through; relative ones are taken from the working directory.
pub fn resolve_work_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw.trim());
  if path.is_absolute() {
    path
  } else {
    work_dir().join(path)
  }
}

pub fn config_path() -> PathBuf {
  match env_default("BRACKET_TOOL_CONFIG") {
    Some(raw) => resolve_work_path(&raw),
    None => work_dir().join(CONFIG_FILE_NAME),
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

fn fill_from_env(field: &mut String, key: &str) {
  if field.trim().is_empty() {
    if let Some(value) = env_default(key) {
      *field = value;
    }
  }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  fill_from_env(&mut config.state_path, "BRACKET_STATE_PATH");
  fill_from_env(&mut config.log_dir, "BRACKET_LOG_DIR");
  fill_from_env(&mut config.log_filter, "BRACKET_LOG");
  fill_from_env(&mut config.serve_addr, "BRACKET_SERVE_ADDR");
  fill_from_env(&mut config.static_dir, "BRACKET_STATIC_DIR");
  config
}

/// A missing file is not an error: defaults plus environment.
pub fn load_config(path: &Path) -> AppResult<AppConfig> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path).map_err(AppError::io(format!("read config {}", path.display())))?;
  let config = serde_json::from_str::<AppConfig>(&data)
    .map_err(AppError::json(format!("parse config {}", path.display())))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config(path: &Path, config: &AppConfig) -> AppResult<()> {
  let payload = serde_json::to_string_pretty(config).map_err(AppError::json("encode config"))?;
  fs::write(path, payload).map_err(AppError::io(format!("write config {}", path.display())))
}

// ── Resolved settings ──────────────────────────────────────────────────

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
  let trimmed = value.trim();
  if trimmed.is_empty() { fallback } else { trimmed }
}

pub fn state_file(config: &AppConfig) -> PathBuf {
  resolve_work_path(or_default(&config.state_path, DEFAULT_STATE_PATH))
}

pub fn log_dir(config: &AppConfig) -> PathBuf {
  resolve_work_path(or_default(&config.log_dir, DEFAULT_LOG_DIR))
}

pub fn log_filter(config: &AppConfig) -> String {
  or_default(&config.log_filter, DEFAULT_LOG_FILTER).to_string()
}

pub fn serve_addr(config: &AppConfig) -> String {
  or_default(&config.serve_addr, DEFAULT_SERVE_ADDR).to_string()
}

pub fn static_dir(config: &AppConfig) -> Option<PathBuf> {
  let trimmed = config.static_dir.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(resolve_work_path(trimmed))
  }
}

// ── .env ───────────────────────────────────────────────────────────────

/// Environment keys this tool reads.
pub const ENV_KEYS: [&str; 6] = [
  "BRACKET_TOOL_CONFIG",
  "BRACKET_STATE_PATH",
  "BRACKET_LOG_DIR",
  "BRACKET_LOG",
  "BRACKET_SERVE_ADDR",
  "BRACKET_STATIC_DIR",
];

/// What `load_env_file` did. Reported once logging is up, since `.env` is read before it.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EnvFileReport {
  pub applied: Vec<String>,
  pub shadowed: Vec<String>,
  pub unknown: Vec<String>,
}

/// Load `KEY=value` pairs from `dir/.env`. Variables already set in the shell win.
pub fn load_env_file(dir: &Path) -> EnvFileReport {
  let mut report = EnvFileReport::default();
  let Ok(contents) = fs::read_to_string(dir.join(".env")) else {
    return report;
  };
  for (key, value) in contents.lines().filter_map(parse_env_line) {
    if key.starts_with("BRACKET_") && !ENV_KEYS.contains(&key.as_str()) {
      report.unknown.push(key.clone());
    }
    if env::var_os(&key).is_some() {
      report.shadowed.push(key);
      continue;
    }
    env::set_var(&key, value);
    report.applied.push(key);
  }
  report
}

pub fn log_env_report(report: &EnvFileReport) {
  if !report.applied.is_empty() {
    tracing::debug!(keys = ?report.applied, ".env applied");
  }
  if !report.shadowed.is_empty() {
    tracing::debug!(keys = ?report.shadowed, ".env keys already set in the shell");
  }
  for key in &report.unknown {
    tracing::warn!("{key} in .env is not a bracket-tool setting (expected one of {})", ENV_KEYS.join(", "));
  }
}

/// `KEY=value`, `export KEY=value`, quoted values, trailing `# comments`.
/// Keys containing whitespace are rejected.
pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let line = line.trim();
  if line.starts_with('#') {
    return None;
  }
  let line = line.strip_prefix("export ").unwrap_or(line);
  let (key, raw_value) = line.split_once('=')?;
  let key = key.trim();
  if key.is_empty() || key.contains(char::is_whitespace) {
    return None;
  }
  let raw_value = raw_value.trim();
  let value = ['"', '\'']
    .into_iter()
    .find_map(|quote| raw_value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)))
    .unwrap_or_else(|| raw_value.split_once(" #").map_or(raw_value, |(v, _)| v).trim_end());
  Some((key.to_string(), value.to_string()))
}

pub fn log_config_warnings(config: &AppConfig) {
  if config.best_of == 0 {
    tracing::warn!("bestOf is 0 in config; matches will use best of 1");
  }
  if config.points.win < config.points.draw || config.points.draw < config.points.loss {
    tracing::warn!(
      win = config.points.win,
      draw = config.points.draw,
      loss = config.points.loss,
      "points config does not rank win >= draw >= loss"
    );
  }
  if let Some(dir) = static_dir(config) {
    if !dir.is_dir() {
      tracing::warn!("static dir {} not found; serve will only answer JSON routes", dir.display());
    }
  }
}
