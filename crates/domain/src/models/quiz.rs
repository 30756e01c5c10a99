//! Quiz structure: matches, games, questions and answers.
//!
//! A match owns its games, a game owns its questions and a question owns its
//! answers. Children refer to parents by id only; the play engine works on a
//! fully loaded [`MatchPlan`] read from the store at the start of each request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the public link hash.
pub const UHASH_LEN: usize = 5;
/// Length of the short numeric match code.
pub const MATCH_CODE_LEN: usize = 4;
/// Length of the restricted-match password.
pub const PASSWORD_LEN: usize = 5;

/// Top-level playable unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Match {
    pub uid: i64,
    pub name: String,
    pub uhash: Option<String>,
    pub code: Option<String>,
    pub password: Option<String>,
    pub is_restricted: bool,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    /// Maximum completed attempts per user, 0 means unlimited.
    pub times: i32,
    /// Emit games in index order (true) or shuffled (false).
    pub order: bool,
    pub treasure_hunt: bool,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Whether `now` falls within the match's time window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.from_time.map_or(true, |from| from <= now)
            && self.to_time.map_or(true, |to| now <= to)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Attempts a user may still start given how many they completed.
    ///
    /// Unlimited matches (`times == 0`) always report one more attempt.
    pub fn left_attempts(&self, completed_attempts: usize) -> i32 {
        if self.times == 0 {
            return 1;
        }
        let completed = i32::try_from(completed_attempts).unwrap_or(i32::MAX);
        (self.times - completed).max(0)
    }
}

/// An ordered group of questions within one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Game {
    pub uid: i64,
    pub match_uid: i64,
    pub index: i32,
    /// Emit questions by position (true) or shuffled (false).
    pub order: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Question {
    pub uid: i64,
    /// `None` marks a template question not attached to any game.
    pub game_uid: Option<i64>,
    pub text: String,
    pub position: i32,
    /// Answer deadline in seconds.
    pub time: Option<i32>,
    pub boolean: bool,
    pub answers: Vec<Answer>,
}

impl Question {
    /// Open questions own no predefined answers and accept free text.
    pub fn is_open(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn answer(&self, answer_uid: i64) -> Option<&Answer> {
        self.answers.iter().find(|a| a.uid == answer_uid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Answer {
    pub uid: i64,
    pub question_uid: i64,
    pub text: String,
    pub position: i32,
    pub is_correct: bool,
    /// Difficulty multiplier applied to the time-based score.
    pub level: Option<i32>,
}

/// Free-text payload submitted for an open question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct OpenAnswer {
    pub uid: i64,
    pub text: String,
}

/// A game together with its questions.
#[derive(Debug, Clone, PartialEq)]
pub struct GamePlan {
    pub game: Game,
    pub questions: Vec<Question>,
}

impl GamePlan {
    pub fn question(&self, question_uid: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.uid == question_uid)
    }
}

/// A match with every game, question and answer loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPlan {
    pub info: Match,
    pub games: Vec<GamePlan>,
}

impl MatchPlan {
    pub fn uid(&self) -> i64 {
        self.info.uid
    }

    pub fn question_count(&self) -> usize {
        self.games.iter().map(|g| g.questions.len()).sum()
    }

    pub fn game(&self, game_uid: i64) -> Option<&GamePlan> {
        self.games.iter().find(|g| g.game.uid == game_uid)
    }

    /// Finds a question of this match along with the game that owns it.
    pub fn question(&self, question_uid: i64) -> Option<(&GamePlan, &Question)> {
        self.games
            .iter()
            .find_map(|g| g.question(question_uid).map(|q| (g, q)))
    }
}

/// Generate a random public link hash.
pub fn generate_uhash() -> String {
    shared::random::random_letters(UHASH_LEN)
}

/// Generate a random 4-digit match code.
pub fn generate_match_code() -> String {
    shared::random::random_digits(MATCH_CODE_LEN)
}

/// Generate a random 5-digit password for restricted matches.
pub fn generate_password() -> String {
    shared::random::random_digits(PASSWORD_LEN)
}
