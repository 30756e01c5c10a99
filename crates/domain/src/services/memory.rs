//! In-memory store for engine tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{PlayStore, StoreError};
use crate::models::{
    Answer, AnswerRecord, Game, GamePlan, Match, MatchPlan, NewRanking, NewReaction, NewUser,
    OpenAnswer, Question, Ranking, Reaction, ReactionFilter, User,
};

/// Keeps every table in vectors; ids are allocated from one counter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_uid: i64,
    pub matches: Vec<Match>,
    pub games: Vec<Game>,
    pub questions: Vec<Question>,
    pub users: Vec<User>,
    pub open_answers: Vec<OpenAnswer>,
    pub reactions: Vec<Reaction>,
    pub rankings: Vec<Ranking>,
    /// Users passed to `lock_user`, in call order.
    pub locked_users: Vec<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn uid(&mut self) -> i64 {
        self.next_uid += 1;
        self.next_uid
    }

    pub fn add_match(&mut self, build: impl FnOnce(&mut Match)) -> Match {
        let mut m = Match {
            uid: self.uid(),
            name: format!("Match {}", self.next_uid),
            uhash: Some(crate::models::quiz::generate_uhash()),
            code: None,
            password: None,
            is_restricted: false,
            from_time: None,
            to_time: None,
            times: 0,
            order: true,
            treasure_hunt: false,
            created_at: Utc::now(),
        };
        build(&mut m);
        self.matches.push(m.clone());
        m
    }

    pub fn add_game(&mut self, match_uid: i64, index: i32, order: bool) -> Game {
        let game = Game {
            uid: self.uid(),
            match_uid,
            index,
            order,
        };
        self.games.push(game.clone());
        game
    }

    /// Adds a question; `answers` are `(text, is_correct, level)` triples.
    pub fn add_question(
        &mut self,
        game_uid: i64,
        position: i32,
        time: Option<i32>,
        answers: &[(&str, bool, Option<i32>)],
    ) -> Question {
        let uid = self.uid();
        let answers = answers
            .iter()
            .enumerate()
            .map(|(pos, (text, is_correct, level))| Answer {
                uid: self.uid(),
                question_uid: uid,
                text: text.to_string(),
                position: pos as i32,
                is_correct: *is_correct,
                level: *level,
            })
            .collect();
        let question = Question {
            uid,
            game_uid: Some(game_uid),
            text: format!("Question {}", uid),
            position,
            time,
            boolean: false,
            answers,
        };
        self.questions.push(question.clone());
        question
    }

    pub fn add_user(&mut self, signed: bool) -> User {
        let uid = self.uid();
        let user = User {
            uid,
            email: format!("user{}@example.com", uid),
            email_digest: signed.then(|| format!("{:032x}", uid)),
            token_digest: signed.then(|| format!("{:032x}", uid + 1)),
            created_at: Utc::now(),
        };
        self.users.push(user.clone());
        user
    }

    /// Moves the display time of every pending reaction of `attempt_uid` into the past.
    pub fn age_pending_reactions(&mut self, attempt_uid: &str, seconds: i64) {
        for reaction in self
            .reactions
            .iter_mut()
            .filter(|r| r.attempt_uid == attempt_uid && !r.has_answer())
        {
            reaction.create_timestamp -= chrono::Duration::seconds(seconds);
        }
    }

    fn now_after(&self, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = Utc::now();
        match previous {
            Some(p) if p >= now => p + chrono::Duration::microseconds(1),
            _ => now,
        }
    }
}

#[async_trait]
impl PlayStore for MemoryStore {
    async fn find_match(&mut self, match_uid: i64) -> Result<Option<Match>, StoreError> {
        Ok(self.matches.iter().find(|m| m.uid == match_uid).cloned())
    }

    async fn find_match_by_uhash(&mut self, uhash: &str) -> Result<Option<Match>, StoreError> {
        Ok(self
            .matches
            .iter()
            .find(|m| m.uhash.as_deref() == Some(uhash))
            .cloned())
    }

    async fn find_match_by_code(&mut self, code: &str) -> Result<Option<Match>, StoreError> {
        Ok(self
            .matches
            .iter()
            .filter(|m| m.code.as_deref() == Some(code))
            .max_by_key(|m| (m.created_at, m.uid))
            .cloned())
    }

    async fn load_plan(&mut self, info: Match) -> Result<MatchPlan, StoreError> {
        let mut games: Vec<GamePlan> = self
            .games
            .iter()
            .filter(|g| g.match_uid == info.uid)
            .map(|g| {
                let mut questions: Vec<Question> = self
                    .questions
                    .iter()
                    .filter(|q| q.game_uid == Some(g.uid))
                    .cloned()
                    .collect();
                questions.sort_by_key(|q| q.position);
                GamePlan {
                    game: g.clone(),
                    questions,
                }
            })
            .collect();
        games.sort_by_key(|g| g.game.index);
        Ok(MatchPlan { info, games })
    }

    async fn find_user(&mut self, user_uid: i64) -> Result<Option<User>, StoreError> {
        Ok(self.users.iter().find(|u| u.uid == user_uid).cloned())
    }

    async fn find_user_by_digests(
        &mut self,
        email_digest: &str,
        token_digest: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| {
                u.email_digest.as_deref() == Some(email_digest)
                    && u.token_digest.as_deref() == Some(token_digest)
            })
            .cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let user = User {
            uid: self.uid(),
            email: user.email,
            email_digest: user.email_digest,
            token_digest: user.token_digest,
            created_at: Utc::now(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    async fn lock_user(&mut self, user_uid: i64) -> Result<(), StoreError> {
        if !self.users.iter().any(|u| u.uid == user_uid) {
            return Err(StoreError::NotFound(format!("User {}", user_uid)));
        }
        self.locked_users.push(user_uid);
        Ok(())
    }

    async fn insert_open_answer(&mut self, text: &str) -> Result<OpenAnswer, StoreError> {
        let open_answer = OpenAnswer {
            uid: self.uid(),
            text: text.to_string(),
        };
        self.open_answers.push(open_answer.clone());
        Ok(open_answer)
    }

    async fn reactions(&mut self, filter: &ReactionFilter) -> Result<Vec<Reaction>, StoreError> {
        Ok(self
            .reactions
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn lock_reaction(
        &mut self,
        filter: &ReactionFilter,
    ) -> Result<Option<Reaction>, StoreError> {
        Ok(self
            .reactions
            .iter()
            .filter(|r| filter.matches(r))
            .last()
            .cloned())
    }

    async fn insert_reaction(&mut self, reaction: NewReaction) -> Result<Reaction, StoreError> {
        let previous = self.reactions.last().map(|r| r.create_timestamp);
        let reaction = Reaction {
            uid: self.uid(),
            match_uid: reaction.match_uid,
            question_uid: reaction.question_uid,
            game_uid: reaction.game_uid,
            user_uid: reaction.user_uid,
            answer_uid: None,
            open_answer_uid: None,
            create_timestamp: self.now_after(previous),
            answer_time: None,
            score: None,
            attempt_uid: reaction.attempt_uid,
        };
        self.reactions.push(reaction.clone());
        Ok(reaction)
    }

    async fn record_answer(
        &mut self,
        reaction_uid: i64,
        record: AnswerRecord,
    ) -> Result<Option<Reaction>, StoreError> {
        let Some(reaction) = self.reactions.iter_mut().find(|r| r.uid == reaction_uid) else {
            return Err(StoreError::NotFound(format!("Reaction {}", reaction_uid)));
        };
        if reaction.has_answer() {
            return Ok(None);
        }
        reaction.answer_uid = record.answer_uid;
        reaction.open_answer_uid = record.open_answer_uid;
        reaction.answer_time = Some(record.answer_time);
        reaction.score = record.score;
        Ok(Some(reaction.clone()))
    }

    async fn insert_ranking(&mut self, ranking: NewRanking) -> Result<Ranking, StoreError> {
        if let Some(existing) = self
            .rankings
            .iter()
            .find(|r| r.attempt_uid == ranking.attempt_uid)
        {
            return Ok(existing.clone());
        }
        let ranking = Ranking {
            uid: self.uid(),
            match_uid: ranking.match_uid,
            user_uid: ranking.user_uid,
            attempt_uid: ranking.attempt_uid,
            score: ranking.score,
            created_at: Utc::now(),
        };
        self.rankings.push(ranking.clone());
        Ok(ranking)
    }

    async fn rankings(&mut self, match_uid: i64) -> Result<Vec<Ranking>, StoreError> {
        let mut rankings: Vec<Ranking> = self
            .rankings
            .iter()
            .filter(|r| r.match_uid == match_uid)
            .cloned()
            .collect();
        rankings.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(rankings)
    }
}
