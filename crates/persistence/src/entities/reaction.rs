//! Reaction entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the reactions table.
#[derive(Debug, Clone, FromRow)]
pub struct ReactionEntity {
    pub uid: i64,
    pub match_uid: i64,
    pub question_uid: i64,
    pub game_uid: i64,
    pub user_uid: i64,
    pub answer_uid: Option<i64>,
    pub open_answer_uid: Option<i64>,
    pub create_timestamp: DateTime<Utc>,
    pub answer_time: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub attempt_uid: String,
}

impl From<ReactionEntity> for domain::models::Reaction {
    fn from(entity: ReactionEntity) -> Self {
        Self {
            uid: entity.uid,
            match_uid: entity.match_uid,
            question_uid: entity.question_uid,
            game_uid: entity.game_uid,
            user_uid: entity.user_uid,
            answer_uid: entity.answer_uid,
            open_answer_uid: entity.open_answer_uid,
            create_timestamp: entity.create_timestamp,
            answer_time: entity.answer_time,
            score: entity.score,
            attempt_uid: entity.attempt_uid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_entity_to_domain() {
        let entity = ReactionEntity {
            uid: 10,
            match_uid: 1,
            question_uid: 2,
            game_uid: 3,
            user_uid: 4,
            answer_uid: None,
            open_answer_uid: Some(5),
            create_timestamp: Utc::now(),
            answer_time: Some(Utc::now()),
            score: None,
            attempt_uid: "0123456789abcdef0123456789abcdef".to_string(),
        };
        let reaction: domain::models::Reaction = entity.clone().into();
        assert_eq!(reaction.uid, entity.uid);
        assert_eq!(reaction.open_answer_uid, Some(5));
        assert!(reaction.has_answer());
    }
}
