//! Final per-attempt scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Ranking {
    pub uid: i64,
    pub match_uid: i64,
    pub user_uid: i64,
    pub attempt_uid: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRanking {
    pub match_uid: i64,
    pub user_uid: i64,
    pub attempt_uid: String,
    pub score: f64,
}
