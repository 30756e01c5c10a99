//! Final score persistence for completed attempts.

use tracing::info;

use super::error::PlayError;
use super::store::PlayStore;
use crate::models::{MatchPlan, NewRanking, Ranking, User};

/// Writes one ranking row per completed attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct RankingWriter;

impl RankingWriter {
    /// Saves the final score of `attempt_uid`. Saving the same attempt twice
    /// returns the row stored the first time.
    pub async fn save<S>(
        &self,
        store: &mut S,
        plan: &MatchPlan,
        user: &User,
        attempt_uid: &str,
        score: f64,
    ) -> Result<Ranking, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let ranking = store
            .insert_ranking(NewRanking {
                match_uid: plan.uid(),
                user_uid: user.uid,
                attempt_uid: attempt_uid.to_string(),
                score,
            })
            .await?;

        info!(
            match_uid = ranking.match_uid,
            user_uid = ranking.user_uid,
            attempt_uid = %ranking.attempt_uid,
            score = ranking.score,
            "Ranking saved"
        );
        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;

    #[tokio::test]
    async fn test_save_is_idempotent_per_attempt() {
        let mut store = MemoryStore::new();
        let m = store.add_match(|_| {});
        let plan = store.load_plan(m).await.unwrap();
        let user = store.add_user(false);

        let writer = RankingWriter;
        let first = writer.save(&mut store, &plan, &user, "a", 1.5).await.unwrap();
        let replay = writer.save(&mut store, &plan, &user, "a", 1.5).await.unwrap();
        assert_eq!(first.uid, replay.uid);
        writer.save(&mut store, &plan, &user, "b", 2.0).await.unwrap();

        let rankings = store.rankings(plan.uid()).await.unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].attempt_uid, "b");
    }
}
