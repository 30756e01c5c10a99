//! Match repository: lookups, plan loading and the match factory.

use chrono::{DateTime, Utc};
use domain::models::quiz::{generate_match_code, generate_password, generate_uhash};
use domain::models::{Answer, Game, GamePlan, Match, MatchPlan, Question};
use domain::services::StoreError;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::entities::{AnswerEntity, GameEntity, MatchEntity, QuestionEntity};
use crate::metrics::QueryTimer;

/// Default number of tries when drawing a unique uhash, code or password.
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 100;

const MATCH_COLUMNS: &str = r#"uid, name, uhash, code, password, is_restricted, from_time,
    to_time, times, "order", treasure_hunt, created_at"#;

/// How players reach a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchAccess {
    /// Public link carrying a 5-letter hash.
    Link,
    /// 4-digit code typed by the player.
    Code,
}

/// Input data for creating a match.
#[derive(Debug, Clone)]
pub struct MatchInput {
    pub name: String,
    pub access: MatchAccess,
    pub is_restricted: bool,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    pub times: i32,
    pub order: bool,
    pub treasure_hunt: bool,
}

impl MatchInput {
    pub fn new(name: impl Into<String>, access: MatchAccess) -> Self {
        Self {
            name: name.into(),
            access,
            is_restricted: false,
            from_time: None,
            to_time: None,
            times: 0,
            order: true,
            treasure_hunt: false,
        }
    }
}

/// Input data for adding a question to a game.
#[derive(Debug, Clone)]
pub struct QuestionInput {
    pub text: String,
    pub position: i32,
    pub time: Option<i32>,
    pub boolean: bool,
}

/// Input data for adding an answer to a question.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub text: String,
    pub position: i32,
    pub is_correct: bool,
    pub level: Option<i32>,
}

/// Repository for match-related database operations.
#[derive(Clone)]
pub struct MatchRepository {
    pool: PgPool,
    max_generation_attempts: u32,
}

impl MatchRepository {
    /// Creates a new MatchRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }

    pub fn with_max_generation_attempts(mut self, attempts: u32) -> Self {
        self.max_generation_attempts = attempts.max(1);
        self
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a match by uid.
    pub async fn find_by_uid(
        conn: &mut PgConnection,
        uid: i64,
    ) -> Result<Option<MatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_match_by_uid");
        let result = sqlx::query_as::<_, MatchEntity>(&format!(
            "SELECT {} FROM matches WHERE uid = $1",
            MATCH_COLUMNS
        ))
        .bind(uid)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Find a match by its link hash.
    pub async fn find_by_uhash(
        conn: &mut PgConnection,
        uhash: &str,
    ) -> Result<Option<MatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_match_by_uhash");
        let result = sqlx::query_as::<_, MatchEntity>(&format!(
            "SELECT {} FROM matches WHERE uhash = $1",
            MATCH_COLUMNS
        ))
        .bind(uhash)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Find the most recently created match with the given code.
    pub async fn find_by_code(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<MatchEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_match_by_code");
        let result = sqlx::query_as::<_, MatchEntity>(&format!(
            "SELECT {} FROM matches WHERE code = $1 ORDER BY created_at DESC, uid DESC LIMIT 1",
            MATCH_COLUMNS
        ))
        .bind(code)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Load games (by index), questions (by position) and answers (by position) of a match.
    pub async fn load_plan(conn: &mut PgConnection, info: Match) -> Result<MatchPlan, sqlx::Error> {
        let timer = QueryTimer::new("load_match_plan");

        let games = sqlx::query_as::<_, GameEntity>(
            r#"
            SELECT uid, match_uid, "index", "order"
            FROM games
            WHERE match_uid = $1
            ORDER BY "index" ASC
            "#,
        )
        .bind(info.uid)
        .fetch_all(&mut *conn)
        .await?;

        let questions = sqlx::query_as::<_, QuestionEntity>(
            r#"
            SELECT q.uid, q.game_uid, q.text, q.position, q."time", q."boolean"
            FROM questions q
            JOIN games g ON g.uid = q.game_uid
            WHERE g.match_uid = $1
            ORDER BY q.game_uid, q.position ASC
            "#,
        )
        .bind(info.uid)
        .fetch_all(&mut *conn)
        .await?;

        let answers = sqlx::query_as::<_, AnswerEntity>(
            r#"
            SELECT a.uid, a.question_uid, a.text, a.position, a.is_correct, a.level
            FROM answers a
            JOIN questions q ON q.uid = a.question_uid
            JOIN games g ON g.uid = q.game_uid
            WHERE g.match_uid = $1
            ORDER BY a.question_uid, a.position ASC
            "#,
        )
        .bind(info.uid)
        .fetch_all(&mut *conn)
        .await?;

        timer.record();
        Ok(assemble_plan(info, games, questions, answers))
    }

    /// Whether any reaction references the match.
    pub async fn is_frozen(conn: &mut PgConnection, match_uid: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("match_is_frozen");
        let frozen: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM reactions WHERE match_uid = $1)")
                .bind(match_uid)
                .fetch_one(conn)
                .await?;
        timer.record();
        Ok(frozen.0)
    }

    /// Creates a match with a fresh uhash or code, and a password when restricted.
    pub async fn create_match(&self, input: MatchInput) -> Result<Match, StoreError> {
        let timer = QueryTimer::new("create_match");
        let mut tx = self.pool.begin().await?;

        let (uhash, code) = match input.access {
            MatchAccess::Link => (Some(self.unique_uhash(&mut tx).await?), None),
            MatchAccess::Code => (None, Some(self.unique_code(&mut tx).await?)),
        };
        let password = if input.is_restricted {
            Some(self.unique_password(&mut tx, uhash.as_deref()).await?)
        } else {
            None
        };

        let entity = sqlx::query_as::<_, MatchEntity>(&format!(
            r#"
            INSERT INTO matches (name, uhash, code, password, is_restricted, from_time,
                                 to_time, times, "order", treasure_hunt)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            MATCH_COLUMNS
        ))
        .bind(&input.name)
        .bind(&uhash)
        .bind(&code)
        .bind(&password)
        .bind(input.is_restricted)
        .bind(input.from_time)
        .bind(input.to_time)
        .bind(input.times)
        .bind(input.order)
        .bind(input.treasure_hunt)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        info!(match_uid = entity.uid, name = %entity.name, "Match created");
        Ok(entity.into())
    }

    /// Adds a game to a match that has no reactions yet.
    pub async fn add_game(&self, match_uid: i64, index: i32, order: bool) -> Result<Game, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_not_frozen(&mut tx, match_uid).await?;

        let timer = QueryTimer::new("insert_game");
        let entity = sqlx::query_as::<_, GameEntity>(
            r#"
            INSERT INTO games (match_uid, "index", "order")
            VALUES ($1, $2, $3)
            RETURNING uid, match_uid, "index", "order"
            "#,
        )
        .bind(match_uid)
        .bind(index)
        .bind(order)
        .fetch_one(&mut *tx)
        .await?;
        timer.record();

        tx.commit().await?;
        Ok(entity.into())
    }

    /// Adds a question to a game whose match has no reactions yet.
    pub async fn add_question(
        &self,
        game_uid: i64,
        input: QuestionInput,
    ) -> Result<Question, StoreError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(i64,)> = sqlx::query_as("SELECT match_uid FROM games WHERE uid = $1")
            .bind(game_uid)
            .fetch_optional(&mut *tx)
            .await?;
        let (match_uid,) = owner.ok_or_else(|| StoreError::NotFound(format!("Game {}", game_uid)))?;
        ensure_not_frozen(&mut tx, match_uid).await?;

        let timer = QueryTimer::new("insert_question");
        let entity = sqlx::query_as::<_, QuestionEntity>(
            r#"
            INSERT INTO questions (game_uid, text, position, "time", "boolean")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING uid, game_uid, text, position, "time", "boolean"
            "#,
        )
        .bind(game_uid)
        .bind(&input.text)
        .bind(input.position)
        .bind(input.time)
        .bind(input.boolean)
        .fetch_one(&mut *tx)
        .await?;
        timer.record();

        tx.commit().await?;
        Ok(entity.into())
    }

    /// Adds an answer to a question whose match has no reactions yet.
    pub async fn add_answer(
        &self,
        question_uid: i64,
        input: AnswerInput,
    ) -> Result<Answer, StoreError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT g.match_uid
            FROM questions q
            JOIN games g ON g.uid = q.game_uid
            WHERE q.uid = $1
            "#,
        )
        .bind(question_uid)
        .fetch_optional(&mut *tx)
        .await?;
        let (match_uid,) =
            owner.ok_or_else(|| StoreError::NotFound(format!("Question {}", question_uid)))?;
        ensure_not_frozen(&mut tx, match_uid).await?;

        let timer = QueryTimer::new("insert_answer");
        let entity = sqlx::query_as::<_, AnswerEntity>(
            r#"
            INSERT INTO answers (question_uid, text, position, is_correct, level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING uid, question_uid, text, position, is_correct, level
            "#,
        )
        .bind(question_uid)
        .bind(&input.text)
        .bind(input.position)
        .bind(input.is_correct)
        .bind(input.level)
        .fetch_one(&mut *tx)
        .await?;
        timer.record();

        tx.commit().await?;
        Ok(entity.into())
    }

    async fn unique_uhash(&self, conn: &mut PgConnection) -> Result<String, StoreError> {
        for _ in 0..self.max_generation_attempts {
            let candidate = generate_uhash();
            let taken: (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM matches WHERE uhash = $1)")
                    .bind(&candidate)
                    .fetch_one(&mut *conn)
                    .await?;
            if !taken.0 {
                return Ok(candidate);
            }
        }
        Err(exhausted("uhash"))
    }

    /// Codes only need to be unique among matches that are currently active.
    async fn unique_code(&self, conn: &mut PgConnection) -> Result<String, StoreError> {
        for _ in 0..self.max_generation_attempts {
            let candidate = generate_match_code();
            let taken: (bool,) = sqlx::query_as(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM matches
                    WHERE code = $1
                      AND (from_time IS NULL OR from_time <= NOW())
                      AND (to_time IS NULL OR to_time >= NOW())
                )
                "#,
            )
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await?;
            if !taken.0 {
                return Ok(candidate);
            }
        }
        Err(exhausted("code"))
    }

    async fn unique_password(
        &self,
        conn: &mut PgConnection,
        uhash: Option<&str>,
    ) -> Result<String, StoreError> {
        for _ in 0..self.max_generation_attempts {
            let candidate = generate_password();
            let taken: (bool,) = sqlx::query_as(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM matches WHERE uhash = $2 AND password = $1
                )
                "#,
            )
            .bind(&candidate)
            .bind(uhash)
            .fetch_one(&mut *conn)
            .await?;
            if !taken.0 {
                return Ok(candidate);
            }
        }
        Err(exhausted("password"))
    }
}

async fn ensure_not_frozen(conn: &mut PgConnection, match_uid: i64) -> Result<(), StoreError> {
    if MatchRepository::is_frozen(conn, match_uid).await? {
        return Err(StoreError::Frozen(match_uid));
    }
    Ok(())
}

fn exhausted(what: &str) -> StoreError {
    StoreError::Backend(format!("Could not generate a unique match {}", what))
}

/// Nests questions under games and answers under questions.
fn assemble_plan(
    info: Match,
    games: Vec<GameEntity>,
    questions: Vec<QuestionEntity>,
    answers: Vec<AnswerEntity>,
) -> MatchPlan {
    let mut questions: Vec<Question> = questions.into_iter().map(Question::from).collect();
    for answer in answers {
        if let Some(question) = questions.iter_mut().find(|q| q.uid == answer.question_uid) {
            question.answers.push(answer.into());
        }
    }

    let games = games
        .into_iter()
        .map(|game| {
            let game = Game::from(game);
            let mut owned: Vec<Question> = questions
                .iter()
                .filter(|q| q.game_uid == Some(game.uid))
                .cloned()
                .collect();
            owned.sort_by_key(|q| q.position);
            GamePlan {
                game,
                questions: owned,
            }
        })
        .collect();

    MatchPlan { info, games }
}
