use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bracket::normalize_links;
use crate::error::{AppError, AppResult};
use crate::types::{Bracket, BuildOptions, Participant, PointsConfig, SeedingMode};

/// Whole-tournament snapshot. Saved and restored verbatim; the engine never sees the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentState {
  pub title: String,
  pub seeding: SeedingMode,
  #[serde(default)]
  pub options: BuildOptions,
  #[serde(default)]
  pub points: PointsConfig,
  pub participants: Vec<Participant>,
  pub bracket: Bracket,
  #[serde(default)]
  pub version: u64,
  pub created_at: DateTime<Utc>,
  pub saved_at: DateTime<Utc>,
}

impl TournamentState {
  pub fn new(
    title: &str,
    seeding: SeedingMode,
    options: BuildOptions,
    points: PointsConfig,
    participants: Vec<Participant>,
    bracket: Bracket,
  ) -> Self {
    let now = Utc::now();
    Self {
      title: title.to_string(),
      seeding,
      options,
      points,
      participants,
      bracket,
      version: 1,
      created_at: now,
      saved_at: now,
    }
  }

  /// Mark a mutation: bump the version and restamp.
  pub fn touch(&mut self) {
    self.version += 1;
    self.saved_at = Utc::now();
  }
}

/// Restore a snapshot and re-run propagation over it, so a hand-edited or
/// stale file comes back consistent.
pub fn load_state(path: &Path) -> AppResult<TournamentState> {
  if !path.is_file() {
    return Err(AppError::MissingState(path.to_path_buf()));
  }
  let data = fs::read_to_string(path).map_err(AppError::io(format!("read state {}", path.display())))?;
  let mut state = serde_json::from_str::<TournamentState>(&data)
    .map_err(AppError::json(format!("parse state {}", path.display())))?;
  normalize_links(&mut state.bracket.matches);
  debug!(path = %path.display(), version = state.version, "loaded tournament state");
  Ok(state)
}

/// Write through a sibling temp file so a crash never leaves half a snapshot.
pub fn save_state(path: &Path, state: &TournamentState) -> AppResult<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(AppError::io(format!("create {}", parent.display())))?;
  }
  let payload = serde_json::to_string_pretty(state).map_err(AppError::json("encode state"))?;
  let tmp = path.with_extension("json.tmp");
  fs::write(&tmp, payload).map_err(AppError::io(format!("write state {}", tmp.display())))?;
  fs::rename(&tmp, path).map_err(AppError::io(format!("replace state {}", path.display())))?;
  debug!(path = %path.display(), version = state.version, "saved tournament state");
  Ok(())
}
