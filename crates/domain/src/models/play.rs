//! Request and response payloads of the play endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::quiz::{Answer, Question};
use super::ranking::Ranking;

/// Path parameters of `POST /play/h/:uhash`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LandParams {
    #[validate(regex(
        path = *shared::validation::UHASH_REGEX,
        message = "Match hash must be 5 letters"
    ))]
    pub uhash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LandResponse {
    pub match_uid: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CodeRequest {
    #[validate(regex(
        path = *shared::validation::MATCH_CODE_REGEX,
        message = "Match code must be 4 digits"
    ))]
    pub match_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeResponse {
    pub match_uid: i64,
    pub user_uid: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SignRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 30, message = "Email must be at most 30 characters"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_token"))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SignResponse {
    pub user_uid: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct StartRequest {
    pub match_uid: i64,

    pub user_uid: Option<i64>,

    #[validate(regex(
        path = *shared::validation::PASSWORD_REGEX,
        message = "Password must be 5 digits"
    ))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StartResponse {
    pub match_uid: i64,
    pub user_uid: i64,
    pub question: QuestionView,
    pub attempt_uid: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_single_answer"))]
pub struct NextRequest {
    pub match_uid: i64,
    pub user_uid: i64,
    pub question_uid: i64,
    pub answer_uid: Option<i64>,

    #[validate(length(min = 1, max = 500, message = "Answer text must be 1-500 characters"))]
    pub answer_text: Option<String>,

    #[validate(regex(
        path = *shared::validation::ATTEMPT_UID_REGEX,
        message = "Attempt uid must be 32 lowercase hex characters"
    ))]
    pub attempt_uid: String,
}

fn validate_single_answer(request: &NextRequest) -> Result<(), ValidationError> {
    if request.answer_uid.is_some() && request.answer_text.is_some() {
        let mut err = ValidationError::new("single_answer");
        err.message = Some("Provide either answer_uid or answer_text, not both".into());
        return Err(err);
    }
    Ok(())
}

/// Reply to `next`: the following question, or `question: null` when the
/// attempt is over (completed or ended by a treasure-hunt miss).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NextResponse {
    pub question: Option<QuestionView>,
    pub match_uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Question as shown to a player; correctness is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct QuestionView {
    pub uid: i64,
    pub game_uid: Option<i64>,
    pub text: String,
    pub position: i32,
    pub time: Option<i32>,
    pub boolean: bool,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct AnswerView {
    pub uid: i64,
    pub text: String,
    pub position: i32,
}

impl From<&Answer> for AnswerView {
    fn from(answer: &Answer) -> Self {
        Self {
            uid: answer.uid,
            text: answer.text.clone(),
            position: answer.position,
        }
    }
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        let mut answers: Vec<AnswerView> = question.answers.iter().map(AnswerView::from).collect();
        answers.sort_by_key(|a| a.position);
        Self {
            uid: question.uid,
            game_uid: question.game_uid,
            text: question.text.clone(),
            position: question.position,
            time: question.time,
            boolean: question.boolean,
            answers,
        }
    }
}

/// One row of a match leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RankingView {
    pub user_uid: i64,
    pub attempt_uid: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Ranking> for RankingView {
    fn from(ranking: Ranking) -> Self {
        Self {
            user_uid: ranking.user_uid,
            attempt_uid: ranking.attempt_uid,
            score: ranking.score,
            created_at: ranking.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RankingsResponse {
    pub match_uid: i64,
    pub data: Vec<RankingView>,
}
