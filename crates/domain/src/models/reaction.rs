//! Reactions: a question shown to, and optionally answered by, a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of an attempt identifier.
pub const ATTEMPT_UID_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Reaction {
    pub uid: i64,
    pub match_uid: i64,
    pub question_uid: i64,
    pub game_uid: i64,
    pub user_uid: i64,
    pub answer_uid: Option<i64>,
    pub open_answer_uid: Option<i64>,
    pub create_timestamp: DateTime<Utc>,
    pub answer_time: Option<DateTime<Utc>>,
    /// `None` when answered out of time, answered with free text, or not answered yet.
    pub score: Option<f64>,
    pub attempt_uid: String,
}

impl Reaction {
    /// Whether an answer (fixed or free text) has been stored.
    pub fn has_answer(&self) -> bool {
        self.answer_uid.is_some() || self.open_answer_uid.is_some()
    }

    /// Whether the player replied at all, including replies past the deadline.
    pub fn is_closed(&self) -> bool {
        self.has_answer() || self.answer_time.is_some()
    }
}

/// Data for inserting a reaction at question display time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReaction {
    pub match_uid: i64,
    pub question_uid: i64,
    pub game_uid: i64,
    pub user_uid: i64,
    pub attempt_uid: String,
}

/// Outcome of answering, written onto an open reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub answer_uid: Option<i64>,
    pub open_answer_uid: Option<i64>,
    pub answer_time: DateTime<Utc>,
    pub score: Option<f64>,
}

/// Filter for reaction queries. `user_uid` and `match_uid` are always applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionFilter {
    pub user_uid: i64,
    pub match_uid: i64,
    pub question_uid: Option<i64>,
    pub game_uid: Option<i64>,
    pub attempt_uid: Option<String>,
    /// Only reactions with neither a fixed nor a free-text answer.
    pub pending_only: bool,
}

impl ReactionFilter {
    pub fn new(user_uid: i64, match_uid: i64) -> Self {
        Self {
            user_uid,
            match_uid,
            ..Default::default()
        }
    }

    pub fn attempt(mut self, attempt_uid: impl Into<String>) -> Self {
        self.attempt_uid = Some(attempt_uid.into());
        self
    }

    pub fn question(mut self, question_uid: i64) -> Self {
        self.question_uid = Some(question_uid);
        self
    }

    pub fn game(mut self, game_uid: i64) -> Self {
        self.game_uid = Some(game_uid);
        self
    }

    pub fn pending(mut self) -> Self {
        self.pending_only = true;
        self
    }

    /// In-memory evaluation, matching the SQL the Postgres store issues.
    pub fn matches(&self, reaction: &Reaction) -> bool {
        reaction.user_uid == self.user_uid
            && reaction.match_uid == self.match_uid
            && self.question_uid.map_or(true, |q| reaction.question_uid == q)
            && self.game_uid.map_or(true, |g| reaction.game_uid == g)
            && self
                .attempt_uid
                .as_deref()
                .map_or(true, |a| reaction.attempt_uid == a)
            && (!self.pending_only || !reaction.has_answer())
    }
}

/// Generate a new attempt identifier (32 lowercase hex characters).
pub fn generate_attempt_uid() -> String {
    shared::random::random_hex(ATTEMPT_UID_LEN)
}
