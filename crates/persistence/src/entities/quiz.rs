//! Match structure entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the matches table.
#[derive(Debug, Clone, FromRow)]
pub struct MatchEntity {
    pub uid: i64,
    pub name: String,
    pub uhash: Option<String>,
    pub code: Option<String>,
    pub password: Option<String>,
    pub is_restricted: bool,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    pub times: i32,
    pub order: bool,
    pub treasure_hunt: bool,
    pub created_at: DateTime<Utc>,
}

impl From<MatchEntity> for domain::models::Match {
    fn from(entity: MatchEntity) -> Self {
        Self {
            uid: entity.uid,
            name: entity.name,
            uhash: entity.uhash,
            code: entity.code,
            password: entity.password,
            is_restricted: entity.is_restricted,
            from_time: entity.from_time,
            to_time: entity.to_time,
            times: entity.times,
            order: entity.order,
            treasure_hunt: entity.treasure_hunt,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the games table.
#[derive(Debug, Clone, FromRow)]
pub struct GameEntity {
    pub uid: i64,
    pub match_uid: i64,
    pub index: i32,
    pub order: bool,
}

impl From<GameEntity> for domain::models::Game {
    fn from(entity: GameEntity) -> Self {
        Self {
            uid: entity.uid,
            match_uid: entity.match_uid,
            index: entity.index,
            order: entity.order,
        }
    }
}

/// Database row mapping for the questions table.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionEntity {
    pub uid: i64,
    pub game_uid: Option<i64>,
    pub text: String,
    pub position: i32,
    pub time: Option<i32>,
    pub boolean: bool,
}

/// Answers are attached separately when a match plan is assembled.
impl From<QuestionEntity> for domain::models::Question {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            uid: entity.uid,
            game_uid: entity.game_uid,
            text: entity.text,
            position: entity.position,
            time: entity.time,
            boolean: entity.boolean,
            answers: Vec::new(),
        }
    }
}

/// Database row mapping for the answers table.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerEntity {
    pub uid: i64,
    pub question_uid: i64,
    pub text: String,
    pub position: i32,
    pub is_correct: bool,
    pub level: Option<i32>,
}

impl From<AnswerEntity> for domain::models::Answer {
    fn from(entity: AnswerEntity) -> Self {
        Self {
            uid: entity.uid,
            question_uid: entity.question_uid,
            text: entity.text,
            position: entity.position,
            is_correct: entity.is_correct,
            level: entity.level,
        }
    }
}

/// Database row mapping for the open_answers table.
#[derive(Debug, Clone, FromRow)]
pub struct OpenAnswerEntity {
    pub uid: i64,
    pub text: String,
}

impl From<OpenAnswerEntity> for domain::models::OpenAnswer {
    fn from(entity: OpenAnswerEntity) -> Self {
        Self {
            uid: entity.uid,
            text: entity.text,
        }
    }
}
