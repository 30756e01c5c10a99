//! Reconstruction of a player's progress from stored reactions.
//!
//! Nothing is cached between requests: every method reads the reactions of
//! `(user, match)` through the store and derives attempts, displayed questions
//! and scores from them.

use std::collections::HashSet;

use super::store::{PlayStore, StoreError};
use crate::models::{MatchPlan, Reaction, ReactionFilter, User};

/// Whether a reaction holds a correct fixed answer of `plan`.
pub fn is_correct(plan: &MatchPlan, reaction: &Reaction) -> bool {
    let Some(answer_uid) = reaction.answer_uid else {
        return false;
    };
    plan.question(reaction.question_uid)
        .and_then(|(_, question)| question.answer(answer_uid))
        .map_or(false, |answer| answer.is_correct)
}

/// The reactions of one attempt, oldest first.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub attempt_uid: String,
    pub reactions: Vec<Reaction>,
}

impl Attempt {
    /// Distinct question ids in display order.
    pub fn displayed_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.reactions
            .iter()
            .map(|r| r.question_uid)
            .filter(|uid| seen.insert(*uid))
            .collect()
    }

    /// Most recent reaction still waiting for a reply.
    pub fn pending(&self) -> Option<&Reaction> {
        self.reactions.iter().rev().find(|r| !r.is_closed())
    }

    /// A treasure-hunt attempt ends on the first reply that is not correct.
    pub fn is_hunt_over(&self, plan: &MatchPlan) -> bool {
        plan.info.treasure_hunt
            && self
                .reactions
                .iter()
                .any(|r| r.is_closed() && !is_correct(plan, r))
    }

    /// Every question of the match was displayed and replied to.
    pub fn is_completed(&self, plan: &MatchPlan) -> bool {
        self.displayed_ids().len() == plan.question_count()
            && self.reactions.iter().all(Reaction::is_closed)
            && !self.is_hunt_over(plan)
    }

    /// No further question will be displayed in this attempt.
    pub fn is_closed(&self, plan: &MatchPlan) -> bool {
        self.is_completed(plan) || self.is_hunt_over(plan)
    }

    /// Sum of stored scores; unscored reactions count as 0.
    pub fn score(&self) -> f64 {
        self.reactions.iter().filter_map(|r| r.score).sum()
    }
}

/// Groups reactions by attempt, ordered by each attempt's first reaction.
pub fn group_attempts(reactions: Vec<Reaction>) -> Vec<Attempt> {
    let mut attempts: Vec<Attempt> = Vec::new();
    for reaction in reactions {
        match attempts
            .iter_mut()
            .find(|a| a.attempt_uid == reaction.attempt_uid)
        {
            Some(attempt) => attempt.reactions.push(reaction),
            None => attempts.push(Attempt {
                attempt_uid: reaction.attempt_uid.clone(),
                reactions: vec![reaction],
            }),
        }
    }
    attempts
}

/// Progress of one user in one match, optionally scoped to an attempt.
#[derive(Debug, Clone)]
pub struct PlayerStatus<'a> {
    user: &'a User,
    plan: &'a MatchPlan,
    current_attempt_uid: Option<String>,
}

impl<'a> PlayerStatus<'a> {
    pub fn new(user: &'a User, plan: &'a MatchPlan) -> Self {
        Self {
            user,
            plan,
            current_attempt_uid: None,
        }
    }

    pub fn with_attempt(mut self, attempt_uid: impl Into<String>) -> Self {
        self.current_attempt_uid = Some(attempt_uid.into());
        self
    }

    pub fn current_attempt_uid(&self) -> Option<&str> {
        self.current_attempt_uid.as_deref()
    }

    fn filter(&self) -> ReactionFilter {
        let filter = ReactionFilter::new(self.user.uid, self.plan.uid());
        match &self.current_attempt_uid {
            Some(attempt_uid) => filter.attempt(attempt_uid.clone()),
            None => filter,
        }
    }

    /// Reactions of this user for this match, scoped to the current attempt when set.
    pub async fn all_reactions<S>(&self, store: &mut S) -> Result<Vec<Reaction>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        store.reactions(&self.filter()).await
    }

    /// Ids of the questions displayed, in display order.
    pub async fn questions_displayed<S>(&self, store: &mut S) -> Result<Vec<i64>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let reactions = self.all_reactions(store).await?;
        Ok(displayed_ids(&reactions, None))
    }

    /// Displayed question ids of one game, in display order.
    pub async fn questions_displayed_by_game<S>(
        &self,
        store: &mut S,
        game_uid: i64,
    ) -> Result<Vec<i64>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let reactions = self.all_reactions(store).await?;
        Ok(displayed_ids(&reactions, Some(game_uid)))
    }

    /// Games whose every question has been displayed.
    pub async fn all_games_played<S>(&self, store: &mut S) -> Result<Vec<i64>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let reactions = self.all_reactions(store).await?;
        Ok(games_played(self.plan, &reactions))
    }

    /// Whether the current attempt replied to every question of the match.
    pub async fn match_completed<S>(&self, store: &mut S) -> Result<bool, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let reactions = self.all_reactions(store).await?;
        Ok(group_attempts(reactions)
            .last()
            .map_or(false, |attempt| attempt.is_completed(self.plan)))
    }

    /// Every attempt of this user on this match, regardless of the current attempt.
    pub async fn attempts<S>(&self, store: &mut S) -> Result<Vec<Attempt>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let filter = ReactionFilter::new(self.user.uid, self.plan.uid());
        Ok(group_attempts(store.reactions(&filter).await?))
    }

    pub async fn completed_attempts<S>(&self, store: &mut S) -> Result<usize, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let attempts = self.attempts(store).await?;
        Ok(attempts
            .iter()
            .filter(|a| a.is_completed(self.plan))
            .count())
    }

    pub async fn left_attempts<S>(&self, store: &mut S) -> Result<i32, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let completed = self.completed_attempts(store).await?;
        Ok(self.plan.info.left_attempts(completed))
    }

    /// Attempt holding the most recent reaction.
    pub async fn last_attempt<S>(&self, store: &mut S) -> Result<Option<Attempt>, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let filter = ReactionFilter::new(self.user.uid, self.plan.uid());
        let reactions = store.reactions(&filter).await?;
        let Some(last_uid) = reactions.last().map(|r| r.attempt_uid.clone()) else {
            return Ok(None);
        };
        Ok(group_attempts(reactions)
            .into_iter()
            .find(|a| a.attempt_uid == last_uid))
    }

    /// True when the user never played this match, or the last attempt is
    /// closed and attempts are left.
    pub async fn start_fresh_one<S>(&self, store: &mut S) -> Result<bool, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let Some(last) = self.last_attempt(store).await? else {
            return Ok(true);
        };
        if !last.is_closed(self.plan) {
            return Ok(false);
        }
        Ok(self.left_attempts(store).await? > 0)
    }

    pub async fn current_score<S>(&self, store: &mut S) -> Result<f64, StoreError>
    where
        S: PlayStore + ?Sized,
    {
        let reactions = self.all_reactions(store).await?;
        Ok(reactions.iter().filter_map(|r| r.score).sum())
    }
}

/// Distinct displayed question ids, optionally restricted to one game.
pub fn displayed_ids(reactions: &[Reaction], game_uid: Option<i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    reactions
        .iter()
        .filter(|r| game_uid.map_or(true, |g| r.game_uid == g))
        .map(|r| r.question_uid)
        .filter(|uid| seen.insert(*uid))
        .collect()
}

/// Games of `plan` whose questions were all displayed in `reactions`.
pub fn games_played(plan: &MatchPlan, reactions: &[Reaction]) -> Vec<i64> {
    plan.games
        .iter()
        .filter(|g| displayed_ids(reactions, Some(g.game.uid)).len() == g.questions.len())
        .map(|g| g.game.uid)
        .collect()
}
