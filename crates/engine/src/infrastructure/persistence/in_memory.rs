//! In-memory adapters.

use std::sync::Arc;

use async_trait::async_trait;
use casefile_domain::{CaseDefinition, CaseId, GameProgress, PlayerId};
use dashmap::DashMap;

use crate::infrastructure::ports::{CaseRepo, ProgressRepo, RepoError};

/// Keeps serialized snapshots, so loads see exactly what a file store would.
#[derive(Default)]
pub struct InMemoryProgressRepo {
    entries: DashMap<(CaseId, PlayerId), String>,
}

impl InMemoryProgressRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ProgressRepo for InMemoryProgressRepo {
    async fn load(
        &self,
        case_id: &CaseId,
        player_id: &PlayerId,
    ) -> Result<Option<GameProgress>, RepoError> {
        let key = (case_id.clone(), player_id.clone());
        let Some(json) = self.entries.get(&key).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        GameProgress::from_json(&json)
            .map(Some)
            .map_err(RepoError::serialization)
    }

    async fn save(&self, progress: &GameProgress) -> Result<(), RepoError> {
        let json = progress.to_json().map_err(RepoError::serialization)?;
        self.entries.insert(
            (progress.case_id().clone(), progress.player_id().clone()),
            json,
        );
        Ok(())
    }

    async fn clear(&self, case_id: &CaseId, player_id: &PlayerId) -> Result<(), RepoError> {
        self.entries.remove(&(case_id.clone(), player_id.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCaseRepo {
    cases: DashMap<CaseId, Arc<CaseDefinition>>,
}

impl InMemoryCaseRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, case: CaseDefinition) {
        self.cases.insert(case.id().clone(), Arc::new(case));
    }
}

#[async_trait]
impl CaseRepo for InMemoryCaseRepo {
    async fn load(&self, case_id: &CaseId) -> Result<CaseDefinition, RepoError> {
        self.cases
            .get(case_id)
            .map(|entry| CaseDefinition::clone(entry.value()))
            .ok_or_else(|| RepoError::not_found("Case", case_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{sample_case, sample_progress};

    #[tokio::test]
    async fn saved_progress_is_loaded_back() {
        let repo = InMemoryProgressRepo::new();
        let progress = sample_progress();
        repo.save(&progress).await.unwrap();

        let loaded = repo
            .load(progress.case_id(), progress.player_id())
            .await
            .unwrap();
        assert_eq!(loaded, Some(progress.clone()));

        repo.clear(progress.case_id(), progress.player_id())
            .await
            .unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn players_do_not_share_progress() {
        let repo = InMemoryProgressRepo::new();
        let progress = sample_progress();
        repo.save(&progress).await.unwrap();

        let other = repo
            .load(progress.case_id(), &PlayerId::from("someone_else"))
            .await
            .unwrap();
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn case_repo_serves_inserted_cases() {
        let repo = InMemoryCaseRepo::new();
        repo.insert(sample_case());

        assert!(repo.load(&CaseId::from("gallery_heist")).await.is_ok());
        assert!(repo
            .load(&CaseId::from("cold_case"))
            .await
            .unwrap_err()
            .is_not_found());
    }
}
