use std::path::PathBuf;

use serde::Deserialize;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Everything a pipeline run needs to know, passed in at construction.
///
/// Deserialised from `gambit.toml` and `GAMBIT_*` environment variables by
/// the CLI; tests build it directly.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
  /// The account whose games are fetched; also the "me" side of every fact
  /// row.
  pub username:           String,
  /// Root directory of the data lake.
  pub data_root:          PathBuf,
  /// SQLite warehouse file. Publishing is skipped when unset.
  #[serde(default)]
  pub warehouse_path:     Option<PathBuf>,
  #[serde(default = "default_api_base_url")]
  pub api_base_url:       String,
  /// chess.com answers 403 to requests without a browser-like agent.
  #[serde(default = "default_user_agent")]
  pub user_agent:         String,
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
}

fn default_api_base_url() -> String { "https://api.chess.com/pub".to_string() }

fn default_user_agent() -> String {
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like \
   Gecko) Chrome/91.0.4472.124 Safari/537.36"
    .to_string()
}

fn default_fetch_timeout_secs() -> u64 { 30 }

impl PipelineConfig {
  /// A config with every optional setting at its default.
  pub fn new(username: impl Into<String>, data_root: impl Into<PathBuf>) -> Self {
    Self {
      username:           username.into(),
      data_root:          data_root.into(),
      warehouse_path:     None,
      api_base_url:       default_api_base_url(),
      user_agent:         default_user_agent(),
      fetch_timeout_secs: default_fetch_timeout_secs(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn optional_settings_default() {
    let cfg: PipelineConfig = serde_json::from_value(serde_json::json!({
      "username": "Rhythmbear1",
      "data_root": "/tmp/lake",
    }))
    .unwrap();
    assert_eq!(cfg.api_base_url, "https://api.chess.com/pub");
    assert_eq!(cfg.fetch_timeout_secs, 30);
    assert!(cfg.warehouse_path.is_none());
    assert!(cfg.user_agent.starts_with("Mozilla/5.0"));
  }
}
