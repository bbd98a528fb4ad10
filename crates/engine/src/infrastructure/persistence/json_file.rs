//! JSON file adapters.
//!
//! Progress lives in `<dir>/<case>__<player>.json`, case documents in
//! `<dir>/<case>.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use casefile_domain::case;
use casefile_domain::{CaseDefinition, CaseId, GameProgress, PlayerId};

use super::file_safe;
use crate::infrastructure::ports::{CaseRepo, ProgressRepo, RepoError};

// =============================================================================
// Progress
// =============================================================================

pub struct JsonFileProgressRepo {
    dir: PathBuf,
}

impl JsonFileProgressRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, case_id: &CaseId, player_id: &PlayerId) -> PathBuf {
        self.dir.join(format!(
            "{}__{}.json",
            file_safe(case_id.as_str()),
            file_safe(player_id.as_str())
        ))
    }
}

#[async_trait]
impl ProgressRepo for JsonFileProgressRepo {
    async fn load(
        &self,
        case_id: &CaseId,
        player_id: &PlayerId,
    ) -> Result<Option<GameProgress>, RepoError> {
        let path = self.path_for(case_id, player_id);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::io("load_progress", e)),
        };
        let progress = GameProgress::from_json(&text).map_err(RepoError::serialization)?;
        tracing::debug!(path = %path.display(), "Loaded saved progress");
        Ok(Some(progress))
    }

    async fn save(&self, progress: &GameProgress) -> Result<(), RepoError> {
        let json = progress.to_json().map_err(RepoError::serialization)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepoError::io("save_progress", e))?;

        // Write then rename so a crash never leaves a truncated snapshot.
        let path = self.path_for(progress.case_id(), progress.player_id());
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RepoError::io("save_progress", e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| RepoError::io("save_progress", e))?;
        Ok(())
    }

    async fn clear(&self, case_id: &CaseId, player_id: &PlayerId) -> Result<(), RepoError> {
        match tokio::fs::remove_file(self.path_for(case_id, player_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepoError::io("clear_progress", e)),
        }
    }
}

// =============================================================================
// Cases
// =============================================================================

pub struct JsonCaseRepo {
    dir: PathBuf,
}

impl JsonCaseRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CaseRepo for JsonCaseRepo {
    async fn load(&self, case_id: &CaseId) -> Result<CaseDefinition, RepoError> {
        let path = self.dir.join(format!("{}.json", file_safe(case_id.as_str())));
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepoError::not_found("Case", case_id))
            }
            Err(e) => return Err(RepoError::io("load_case", e)),
        };

        let definition = case::load_str(&text).map_err(RepoError::invalid_case)?;
        if definition.id() != case_id {
            return Err(RepoError::invalid_case(format!(
                "{} declares id {}",
                path.display(),
                definition.id()
            )));
        }
        Ok(definition)
    }
}
