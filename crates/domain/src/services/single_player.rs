//! Attempt state machine of a single player.
//!
//! An attempt moves `Idle -> InProgress -> Completed`, or ends early when a
//! treasure-hunt reply is not correct. `start` opens (or resumes) an attempt,
//! `react` closes the current reaction and `forward` displays the next
//! question. `MatchOver` from `forward` is the completion signal.

use chrono::Utc;
use tracing::{debug, info};

use super::error::{PlayError, DUPLICATE_REACTIONS, EXPIRED_MATCH, INVALID_ANSWER, INVALID_ATTEMPT_UID};
use super::iterators::{GameIterator, IterationError, QuestionIterator};
use super::player_status::{games_played, PlayerStatus};
use super::scoring;
use super::store::PlayStore;
use crate::models::reaction::generate_attempt_uid;
use crate::models::{
    AnswerRecord, MatchPlan, NewReaction, OpenAnswer, Question, Reaction, ReactionFilter, User,
};

/// What the player sent for the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// One of the question's predefined answers.
    Choice(i64),
    /// Free text for an open question, already stored.
    Text(OpenAnswer),
    /// No answer at all.
    Silent,
}

/// Outcome of `start`.
#[derive(Debug, Clone)]
pub struct Started<'a> {
    pub question: &'a Question,
    pub attempt_uid: String,
    pub resumed: bool,
}

#[derive(Debug)]
pub struct SinglePlayer<'a> {
    plan: &'a MatchPlan,
    user: &'a User,
    attempt_uid: Option<String>,
    reaction: Option<Reaction>,
}

impl<'a> SinglePlayer<'a> {
    pub fn new(plan: &'a MatchPlan, user: &'a User) -> Self {
        Self {
            plan,
            user,
            attempt_uid: None,
            reaction: None,
        }
    }

    pub fn with_attempt(mut self, attempt_uid: impl Into<String>) -> Self {
        self.attempt_uid = Some(attempt_uid.into());
        self
    }

    /// Continues from a reaction already loaded (and locked) by the caller.
    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.attempt_uid = Some(reaction.attempt_uid.clone());
        self.reaction = Some(reaction);
        self
    }

    pub fn attempt_uid(&self) -> Option<&str> {
        self.attempt_uid.as_deref()
    }

    pub fn reaction(&self) -> Option<&Reaction> {
        self.reaction.as_ref()
    }

    pub fn status(&self) -> PlayerStatus<'a> {
        let status = PlayerStatus::new(self.user, self.plan);
        match &self.attempt_uid {
            Some(attempt_uid) => status.with_attempt(attempt_uid.clone()),
            None => status,
        }
    }

    fn require_attempt(&self) -> Result<String, PlayError> {
        self.attempt_uid
            .clone()
            .ok_or_else(|| PlayError::validate(INVALID_ATTEMPT_UID))
    }

    /// Opens a new attempt, or resumes the latest one if it is still open.
    pub async fn start<S>(&mut self, store: &mut S) -> Result<Started<'a>, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        // Concurrent starts of one player must not both see a free attempt.
        store.lock_user(self.user.uid).await?;
        let status = PlayerStatus::new(self.user, self.plan);

        if status.left_attempts(store).await? == 0 {
            return Err(PlayError::MatchNotPlayable(format!(
                "No attempts left on match {}",
                self.plan.uid()
            )));
        }
        if !self.plan.info.is_active() {
            return Err(PlayError::Match(EXPIRED_MATCH.into()));
        }

        if !status.start_fresh_one(store).await? {
            if let Some(last) = status.last_attempt(store).await? {
                self.attempt_uid = Some(last.attempt_uid.clone());

                if let Some(pending) = last.pending() {
                    let question = self
                        .plan
                        .question(pending.question_uid)
                        .map(|(_, q)| q)
                        .ok_or_else(|| PlayError::not_found("Question"))?;
                    self.reaction = Some(pending.clone());
                    info!(
                        match_uid = self.plan.uid(),
                        user_uid = self.user.uid,
                        attempt_uid = %last.attempt_uid,
                        question_uid = question.uid,
                        "Attempt resumed on pending question"
                    );
                    return Ok(Started {
                        question,
                        attempt_uid: last.attempt_uid,
                        resumed: true,
                    });
                }

                let question = self.forward(store).await.map_err(empty_match)?;
                info!(
                    match_uid = self.plan.uid(),
                    user_uid = self.user.uid,
                    attempt_uid = %last.attempt_uid,
                    question_uid = question.uid,
                    "Attempt resumed"
                );
                return Ok(Started {
                    question,
                    attempt_uid: last.attempt_uid,
                    resumed: true,
                });
            }
        }

        let attempt_uid = generate_attempt_uid();
        self.attempt_uid = Some(attempt_uid.clone());
        self.reaction = None;
        let question = self.forward(store).await.map_err(empty_match)?;

        info!(
            match_uid = self.plan.uid(),
            user_uid = self.user.uid,
            attempt_uid = %attempt_uid,
            question_uid = question.uid,
            "Attempt started"
        );
        Ok(Started {
            question,
            attempt_uid,
            resumed: false,
        })
    }

    /// Records the reply to `question` on the current reaction.
    ///
    /// Returns whether the reply was correct. Replies past the question deadline
    /// are stored without answer or score and are never correct.
    pub async fn react<S>(
        &mut self,
        store: &mut S,
        question: &'a Question,
        reply: Reply,
    ) -> Result<bool, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        if !self.plan.info.is_active() {
            return Err(PlayError::Match(EXPIRED_MATCH.into()));
        }
        let attempt_uid = self.require_attempt()?;

        let reaction = match self.reaction.take() {
            Some(r) if r.question_uid == question.uid => r,
            Some(_) => self.display(store, question, &attempt_uid).await?,
            None => {
                let filter = ReactionFilter::new(self.user.uid, self.plan.uid())
                    .attempt(attempt_uid.clone())
                    .question(question.uid)
                    .pending();
                match store.lock_reaction(&filter).await? {
                    Some(r) => r,
                    None => self.display(store, question, &attempt_uid).await?,
                }
            }
        };

        let now = Utc::now();
        let latency = (now - reaction.create_timestamp).num_milliseconds() as f64 / 1000.0;

        let mut record = AnswerRecord {
            answer_uid: None,
            open_answer_uid: None,
            answer_time: now,
            score: None,
        };
        let mut correct = false;

        if scoring::within_deadline(latency, question.time) {
            match reply {
                Reply::Choice(answer_uid) => {
                    let answer = question
                        .answer(answer_uid)
                        .ok_or_else(|| PlayError::validate(INVALID_ANSWER))?;
                    record.answer_uid = Some(answer.uid);
                    record.score = Some(scoring::score(latency, question.time, answer.level));
                    correct = answer.is_correct;
                }
                Reply::Text(open_answer) => {
                    record.open_answer_uid = Some(open_answer.uid);
                }
                Reply::Silent => {}
            }
        } else {
            debug!(
                question_uid = question.uid,
                latency_secs = latency,
                "Reply past deadline, not recorded"
            );
        }

        let updated = store
            .record_answer(reaction.uid, record)
            .await?
            .ok_or_else(|| PlayError::validate(DUPLICATE_REACTIONS))?;

        info!(
            match_uid = self.plan.uid(),
            user_uid = self.user.uid,
            attempt_uid = %attempt_uid,
            question_uid = question.uid,
            correct,
            score = ?updated.score,
            "Reaction recorded"
        );
        self.reaction = Some(updated);

        if self.plan.info.treasure_hunt && !correct {
            return Err(PlayError::HuntOver);
        }
        Ok(correct)
    }

    /// Displays the next question of the attempt.
    ///
    /// Continues the game of the latest reaction while it has questions left,
    /// then moves through the remaining games. Fails with `MatchOver` once
    /// every question was displayed.
    pub async fn forward<S>(&mut self, store: &mut S) -> Result<&'a Question, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let attempt_uid = self.require_attempt()?;
        let plan = self.plan;
        let status = self.status();
        let reactions = status.all_reactions(store).await?;
        let played = games_played(plan, &reactions);

        let mut games = GameIterator::new(plan, played.iter().copied());
        let mut game = match reactions.last() {
            Some(latest) if !played.contains(&latest.game_uid) => games.resume(latest.game_uid)?,
            _ => games.next_game()?,
        };

        let question = loop {
            let displayed = status.questions_displayed_by_game(store, game.game.uid).await?;
            let mut questions = QuestionIterator::new(game, displayed);
            match questions.next_question() {
                Ok(question) => break question,
                Err(IterationError::GameOver) => game = games.next_game()?,
                Err(other) => return Err(other.into()),
            }
        };

        let reaction = store
            .insert_reaction(NewReaction {
                match_uid: plan.uid(),
                question_uid: question.uid,
                game_uid: game.game.uid,
                user_uid: self.user.uid,
                attempt_uid,
            })
            .await?;
        debug!(
            reaction_uid = reaction.uid,
            question_uid = question.uid,
            game_uid = game.game.uid,
            "Question displayed"
        );
        self.reaction = Some(reaction);
        Ok(question)
    }

    async fn display<S>(
        &mut self,
        store: &mut S,
        question: &Question,
        attempt_uid: &str,
    ) -> Result<Reaction, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let (game, _) = self
            .plan
            .question(question.uid)
            .ok_or_else(|| PlayError::not_found("Question"))?;
        Ok(store
            .insert_reaction(NewReaction {
                match_uid: self.plan.uid(),
                question_uid: question.uid,
                game_uid: game.game.uid,
                user_uid: self.user.uid,
                attempt_uid: attempt_uid.to_string(),
            })
            .await?)
    }
}

/// A match without questions cannot start an attempt.
fn empty_match(err: PlayError) -> PlayError {
    match err {
        PlayError::MatchOver => PlayError::GameOver,
        other => other,
    }
}
