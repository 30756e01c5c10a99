//! Question and game iteration for one attempt.
//!
//! Both iterators are rebuilt on every request from the ids already shown in
//! the attempt, so they carry no state between requests. Selection is by set
//! membership: ordered containers yield the lowest remaining position/index,
//! unordered ones pick uniformly among the remaining items.

use rand::seq::SliceRandom;

use crate::models::{GamePlan, MatchPlan, Question};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IterationError {
    #[error("Game over")]
    GameOver,

    #[error("Game error: {0}")]
    GameError(String),

    #[error("Match over")]
    MatchOver,

    #[error("Match error: {0}")]
    MatchError(String),
}

fn dedup_preserving_order(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

/// Emits the questions of one game.
#[derive(Debug)]
pub struct QuestionIterator<'a> {
    game: &'a GamePlan,
    displayed_ids: Vec<i64>,
    current: Option<i64>,
}

impl<'a> QuestionIterator<'a> {
    /// `displayed_ids` are the questions of `game` already shown in this attempt, in display order.
    pub fn new(game: &'a GamePlan, displayed_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            game,
            displayed_ids: dedup_preserving_order(displayed_ids),
            current: None,
        }
    }

    pub fn game(&self) -> &'a GamePlan {
        self.game
    }

    pub fn displayed_ids(&self) -> &[i64] {
        &self.displayed_ids
    }

    pub fn current(&self) -> Option<&'a Question> {
        self.current.and_then(|uid| self.game.question(uid))
    }

    /// Picks the next question not yet displayed and marks it as displayed.
    pub fn next_question(&mut self) -> Result<&'a Question, IterationError> {
        let mut remaining: Vec<&'a Question> = self
            .game
            .questions
            .iter()
            .filter(|q| !self.displayed_ids.contains(&q.uid))
            .collect();

        let chosen = if self.game.game.order {
            remaining.sort_by_key(|q| (q.position, q.uid));
            remaining.first().copied()
        } else {
            remaining.shuffle(&mut rand::thread_rng());
            remaining.first().copied()
        };

        let question = chosen.ok_or(IterationError::GameOver)?;
        self.displayed_ids.push(question.uid);
        self.current = Some(question.uid);
        Ok(question)
    }

    /// The question displayed before the latest one.
    pub fn previous_question(&self) -> Result<&'a Question, IterationError> {
        if self.displayed_ids.len() < 2 {
            return Err(IterationError::GameError(
                "No previous question in this game".into(),
            ));
        }
        let uid = self.displayed_ids[self.displayed_ids.len() - 2];
        self.game.question(uid).ok_or_else(|| {
            IterationError::GameError(format!("Question {} is not part of this game", uid))
        })
    }

    pub fn is_last_question(&self) -> bool {
        self.displayed_ids.len() == self.game.questions.len()
    }
}

/// Emits the games of one match.
#[derive(Debug)]
pub struct GameIterator<'a> {
    plan: &'a MatchPlan,
    played_ids: Vec<i64>,
    current: Option<i64>,
}

impl<'a> GameIterator<'a> {
    /// `played_ids` are the games already completed in this attempt.
    pub fn new(plan: &'a MatchPlan, played_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            plan,
            played_ids: dedup_preserving_order(played_ids),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&'a GamePlan> {
        self.current.and_then(|uid| self.plan.game(uid))
    }

    /// Picks the next game not yet played and marks it as played.
    pub fn next_game(&mut self) -> Result<&'a GamePlan, IterationError> {
        let mut remaining: Vec<&'a GamePlan> = self
            .plan
            .games
            .iter()
            .filter(|g| !self.played_ids.contains(&g.game.uid))
            .collect();

        if self.plan.info.order {
            remaining.sort_by_key(|g| (g.game.index, g.game.uid));
        } else {
            remaining.shuffle(&mut rand::thread_rng());
        }

        let game = remaining.first().copied().ok_or(IterationError::MatchOver)?;
        self.played_ids.push(game.game.uid);
        self.current = Some(game.game.uid);
        Ok(game)
    }

    /// Continues a game that was started but not completed in this attempt.
    pub fn resume(&mut self, game_uid: i64) -> Result<&'a GamePlan, IterationError> {
        let game = self.plan.game(game_uid).ok_or_else(|| {
            IterationError::MatchError(format!("Game {} is not part of this match", game_uid))
        })?;
        if !self.played_ids.contains(&game_uid) {
            self.played_ids.push(game_uid);
        }
        self.current = Some(game_uid);
        Ok(game)
    }

    /// The game played before the latest one.
    pub fn previous_game(&self) -> Result<&'a GamePlan, IterationError> {
        if self.played_ids.len() < 2 {
            return Err(IterationError::MatchError(
                "No previous game in this match".into(),
            ));
        }
        let uid = self.played_ids[self.played_ids.len() - 2];
        self.plan.game(uid).ok_or_else(|| {
            IterationError::MatchError(format!("Game {} is not part of this match", uid))
        })
    }

    pub fn is_last_game(&self) -> bool {
        self.played_ids.len() == self.plan.games.len()
    }

    pub fn match_started(&self) -> bool {
        !self.played_ids.is_empty()
    }
}
