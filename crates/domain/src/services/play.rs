//! Play verbs: validation, engine transitions and ranking on completion.
//!
//! Every method runs against one [`PlayStore`]; the caller owns the
//! transaction and commits only when the method returns `Ok`.

use tracing::info;

use super::error::{PlayError, INVALID_ATTEMPT_UID};
use super::identity::Identity;
use super::player_status::{group_attempts, PlayerStatus};
use super::ranking::RankingWriter;
use super::single_player::SinglePlayer;
use super::store::PlayStore;
use super::validators;
use crate::models::play::{
    CodeRequest, CodeResponse, LandParams, LandResponse, NextRequest, NextResponse, QuestionView,
    RankingView, RankingsResponse, SignRequest, SignResponse, StartRequest, StartResponse,
};
use crate::models::{MatchPlan, Question, ReactionFilter, User};

/// Where an attempt stands after a `next` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    InProgress,
    Completed,
    HuntOver,
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub response: StartResponse,
    pub resumed: bool,
}

#[derive(Debug, Clone)]
pub struct NextOutcome {
    pub response: NextResponse,
    pub state: AttemptState,
    /// `None` when nothing was recorded (free-text replay).
    pub correct: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PlayService {
    identity: Identity,
    rankings: RankingWriter,
}

impl PlayService {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            rankings: RankingWriter,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub async fn land<S>(&self, store: &mut S, params: &LandParams) -> Result<LandResponse, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let info = validators::land(store, &params.uhash).await?;
        Ok(LandResponse {
            match_uid: info.uid,
        })
    }

    /// Code access is anonymous: every call issues a fresh user.
    pub async fn code<S>(&self, store: &mut S, request: &CodeRequest) -> Result<CodeResponse, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let info = validators::code(store, &request.match_code).await?;
        let user = self.identity.anonymous(store).await?;
        Ok(CodeResponse {
            match_uid: info.uid,
            user_uid: user.uid,
        })
    }

    pub async fn sign<S>(&self, store: &mut S, request: &SignRequest) -> Result<SignResponse, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let user = validators::sign(store, &self.identity, &request.email, &request.token).await?;
        Ok(SignResponse { user_uid: user.uid })
    }

    pub async fn start<S>(&self, store: &mut S, request: &StartRequest) -> Result<StartOutcome, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let ctx = validators::start(
            store,
            request.match_uid,
            request.user_uid,
            request.password.as_deref(),
        )
        .await?;

        let user = match ctx.user {
            Some(user) => user,
            None => self.identity.anonymous(store).await?,
        };

        let mut player = SinglePlayer::new(&ctx.plan, &user);
        let started = player.start(store).await?;

        Ok(StartOutcome {
            response: StartResponse {
                match_uid: ctx.plan.uid(),
                user_uid: user.uid,
                question: QuestionView::from(started.question),
                attempt_uid: started.attempt_uid,
            },
            resumed: started.resumed,
        })
    }

    pub async fn next<S>(&self, store: &mut S, request: &NextRequest) -> Result<NextOutcome, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let ctx = validators::next(store, request).await?;
        let plan = &ctx.plan;
        let user = &ctx.user;
        let (_, question) = plan
            .question(ctx.question_uid)
            .ok_or_else(|| PlayError::not_found("Question"))?;

        if ctx.replay {
            return self.replay(store, plan, user, &ctx.reaction.attempt_uid, ctx.reaction.uid).await;
        }

        let mut player = SinglePlayer::new(plan, user).with_reaction(ctx.reaction.clone());
        let correct = match player.react(store, question, ctx.reply.clone()).await {
            Ok(correct) => correct,
            Err(PlayError::HuntOver) => {
                info!(
                    match_uid = plan.uid(),
                    user_uid = user.uid,
                    attempt_uid = %ctx.reaction.attempt_uid,
                    "Treasure hunt over"
                );
                return Ok(hunt_over(plan));
            }
            Err(err) => return Err(err),
        };

        match player.forward(store).await {
            Ok(next) => Ok(in_progress(plan, next, Some(correct))),
            Err(PlayError::MatchOver) => {
                let mut outcome = self
                    .complete(store, plan, user, &ctx.reaction.attempt_uid)
                    .await?;
                outcome.correct = Some(correct);
                Ok(outcome)
            }
            Err(err) => Err(err),
        }
    }

    /// Answers a repeated free-text reply with what the first call returned.
    async fn replay<S>(
        &self,
        store: &mut S,
        plan: &MatchPlan,
        user: &User,
        attempt_uid: &str,
        reaction_uid: i64,
    ) -> Result<NextOutcome, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let filter = ReactionFilter::new(user.uid, plan.uid()).attempt(attempt_uid.to_string());
        let Some(attempt) = group_attempts(store.reactions(&filter).await?).pop() else {
            return Err(PlayError::validate(INVALID_ATTEMPT_UID));
        };

        if attempt.is_hunt_over(plan) {
            return Ok(NextOutcome {
                correct: None,
                ..hunt_over(plan)
            });
        }

        let following = attempt
            .reactions
            .iter()
            .skip_while(|r| r.uid != reaction_uid)
            .nth(1)
            .and_then(|r| plan.question(r.question_uid));
        if let Some((_, next)) = following {
            return Ok(in_progress(plan, next, None));
        }

        let mut player = SinglePlayer::new(plan, user).with_attempt(attempt_uid);
        match player.forward(store).await {
            Ok(next) => Ok(in_progress(plan, next, None)),
            Err(PlayError::MatchOver) => self.complete(store, plan, user, attempt_uid).await,
            Err(err) => Err(err),
        }
    }

    async fn complete<S>(
        &self,
        store: &mut S,
        plan: &MatchPlan,
        user: &User,
        attempt_uid: &str,
    ) -> Result<NextOutcome, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        let score = PlayerStatus::new(user, plan)
            .with_attempt(attempt_uid)
            .current_score(store)
            .await?;
        self.rankings
            .save(store, plan, user, attempt_uid, score)
            .await?;

        info!(
            match_uid = plan.uid(),
            user_uid = user.uid,
            attempt_uid = %attempt_uid,
            score,
            "Attempt completed"
        );
        Ok(NextOutcome {
            response: NextResponse {
                question: None,
                match_uid: Some(plan.uid()),
                score: Some(score),
            },
            state: AttemptState::Completed,
            correct: None,
        })
    }

    /// Leaderboard of a match, best score first.
    pub async fn rankings<S>(&self, store: &mut S, match_uid: i64) -> Result<RankingsResponse, PlayError>
    where
        S: PlayStore + ?Sized,
    {
        if store.find_match(match_uid).await?.is_none() {
            return Err(PlayError::not_found(format!("Match {}", match_uid)));
        }
        let data = store
            .rankings(match_uid)
            .await?
            .into_iter()
            .map(RankingView::from)
            .collect();
        Ok(RankingsResponse { match_uid, data })
    }
}

fn in_progress(plan: &MatchPlan, question: &Question, correct: Option<bool>) -> NextOutcome {
    NextOutcome {
        response: NextResponse {
            question: Some(QuestionView::from(question)),
            match_uid: Some(plan.uid()),
            score: None,
        },
        state: AttemptState::InProgress,
        correct,
    }
}

fn hunt_over(plan: &MatchPlan) -> NextOutcome {
    NextOutcome {
        response: NextResponse {
            question: None,
            match_uid: Some(plan.uid()),
            score: None,
        },
        state: AttemptState::HuntOver,
        correct: Some(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::DEFAULT_EMAIL_DOMAIN;
    use crate::services::memory::MemoryStore;
    use chrono::{Duration, Utc};
    use shared::crypto::{SignedKey, SIGNED_KEY_LEN};

    fn service() -> PlayService {
        PlayService::new(Identity::new(
            SignedKey::new([7u8; SIGNED_KEY_LEN]),
            DEFAULT_EMAIL_DOMAIN,
        ))
    }

    fn next_request(
        start: &StartResponse,
        question: &QuestionView,
        answer_uid: Option<i64>,
        answer_text: Option<&str>,
    ) -> NextRequest {
        NextRequest {
            match_uid: start.match_uid,
            user_uid: start.user_uid,
            question_uid: question.uid,
            answer_uid,
            answer_text: answer_text.map(str::to_string),
            attempt_uid: start.attempt_uid.clone(),
        }
    }

    fn correct_uid(store: &MemoryStore, question_uid: i64) -> i64 {
        store
            .questions
            .iter()
            .find(|q| q.uid == question_uid)
            .and_then(|q| q.answers.iter().find(|a| a.is_correct))
            .map(|a| a.uid)
            .unwrap()
    }

    fn wrong_uid(store: &MemoryStore, question_uid: i64) -> i64 {
        store
            .questions
            .iter()
            .find(|q| q.uid == question_uid)
            .and_then(|q| q.answers.iter().find(|a| !a.is_correct))
            .map(|a| a.uid)
            .unwrap()
    }

    #[tokio::test]
    async fn test_restricted_match_single_attempt() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|m| {
            m.is_restricted = true;
            m.password = Some("12345".into());
            m.times = 1;
        });
        let game = store.add_game(m.uid, 0, true);
        store.add_question(game.uid, 0, Some(30), &[("yes", true, None), ("no", false, None)]);
        store.add_question(game.uid, 1, Some(30), &[("yes", true, None), ("no", false, None)]);
        let user = svc
            .identity()
            .signed(&mut store, "player@example.com", "01012000")
            .await
            .unwrap();

        let start = StartRequest {
            match_uid: m.uid,
            user_uid: Some(user.uid),
            password: Some("12345".into()),
        };
        let started = svc.start(&mut store, &start).await.unwrap().response;
        let q1 = started.question.clone();

        let answer = correct_uid(&store, q1.uid);
        let step = svc
            .next(&mut store, &next_request(&started, &q1, Some(answer), None))
            .await
            .unwrap();
        assert_eq!(step.state, AttemptState::InProgress);
        assert_eq!(step.correct, Some(true));
        let q2 = step.response.question.unwrap();
        assert_ne!(q2.uid, q1.uid);

        let answer = correct_uid(&store, q2.uid);
        let done = svc
            .next(&mut store, &next_request(&started, &q2, Some(answer), None))
            .await
            .unwrap();
        assert_eq!(done.state, AttemptState::Completed);
        assert!(done.response.question.is_none());
        assert!(done.response.score.unwrap() > 0.0);

        let rankings = svc.rankings(&mut store, m.uid).await.unwrap();
        assert_eq!(rankings.data.len(), 1);
        assert_eq!(rankings.data[0].user_uid, user.uid);

        let err = svc.start(&mut store, &start).await.unwrap_err();
        assert!(matches!(err, PlayError::MatchNotPlayable(_)));
    }

    #[tokio::test]
    async fn test_expired_code_match() {
        let svc = service();
        let mut store = MemoryStore::new();
        store.add_match(|m| {
            m.uhash = None;
            m.code = Some("4321".into());
            m.to_time = Some(Utc::now() - Duration::minutes(5));
        });
        let err = svc
            .code(
                &mut store,
                &CodeRequest {
                    match_code: "4321".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlayError::Validate(msg) if msg == "Expired match"));
    }

    #[tokio::test]
    async fn test_code_issues_anonymous_user() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|m| {
            m.uhash = None;
            m.code = Some("4321".into());
        });
        let req = CodeRequest {
            match_code: "4321".into(),
        };
        let first = svc.code(&mut store, &req).await.unwrap();
        let second = svc.code(&mut store, &req).await.unwrap();
        assert_eq!(first.match_uid, m.uid);
        assert_ne!(first.user_uid, second.user_uid);
    }

    #[tokio::test]
    async fn test_open_answer_and_replay() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|_| {});
        let game = store.add_game(m.uid, 0, true);
        store.add_question(game.uid, 0, None, &[]);

        let started = svc
            .start(
                &mut store,
                &StartRequest {
                    match_uid: m.uid,
                    user_uid: None,
                    password: None,
                },
            )
            .await
            .unwrap()
            .response;
        let q = started.question.clone();
        let req = next_request(&started, &q, None, Some("a free answer"));

        let first = svc.next(&mut store, &req).await.unwrap();
        assert_eq!(first.state, AttemptState::Completed);
        assert!(first.response.question.is_none());
        assert_eq!(first.response.score, Some(0.0));
        assert_eq!(store.open_answers.len(), 1);
        assert_eq!(store.reactions[0].score, None);
        assert!(store.reactions[0].open_answer_uid.is_some());

        let replay = svc.next(&mut store, &req).await.unwrap();
        assert!(replay.response.question.is_none());
        assert_eq!(store.open_answers.len(), 1);
        assert_eq!(store.rankings.len(), 1);
        assert_eq!(store.rankings[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_resume_after_disconnect() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|_| {});
        let game = store.add_game(m.uid, 0, true);
        store.add_question(game.uid, 0, Some(30), &[("yes", true, None), ("no", false, None)]);
        store.add_question(game.uid, 1, Some(30), &[("yes", true, None), ("no", false, None)]);

        let started = svc
            .start(
                &mut store,
                &StartRequest {
                    match_uid: m.uid,
                    user_uid: None,
                    password: None,
                },
            )
            .await
            .unwrap()
            .response;
        assert_eq!(store.reactions.len(), 1);

        let q1 = started.question.clone();
        let answer = correct_uid(&store, q1.uid);
        let step = svc
            .next(&mut store, &next_request(&started, &q1, Some(answer), None))
            .await
            .unwrap();
        assert_eq!(step.response.question.unwrap().position, 1);
        assert!(store.reactions[0].answer_uid.is_some());
        assert_eq!(store.reactions.len(), 2);
    }

    #[tokio::test]
    async fn test_treasure_hunt_stops_without_ranking() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|m| m.treasure_hunt = true);
        let game = store.add_game(m.uid, 0, true);
        for pos in 0..3 {
            store.add_question(game.uid, pos, Some(30), &[("yes", true, None), ("no", false, None)]);
        }

        let started = svc
            .start(
                &mut store,
                &StartRequest {
                    match_uid: m.uid,
                    user_uid: None,
                    password: None,
                },
            )
            .await
            .unwrap()
            .response;
        let q1 = started.question.clone();
        let answer = correct_uid(&store, q1.uid);
        let q2 = svc
            .next(&mut store, &next_request(&started, &q1, Some(answer), None))
            .await
            .unwrap()
            .response
            .question
            .unwrap();

        let answer = wrong_uid(&store, q2.uid);
        let over = svc
            .next(&mut store, &next_request(&started, &q2, Some(answer), None))
            .await
            .unwrap();
        assert_eq!(over.state, AttemptState::HuntOver);
        assert!(over.response.question.is_none());
        assert!(store.rankings.is_empty());
    }

    #[tokio::test]
    async fn test_attempt_uid_of_other_user_is_rejected() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|_| {});
        let game = store.add_game(m.uid, 0, true);
        store.add_question(game.uid, 0, Some(30), &[("yes", true, None)]);
        let request = StartRequest {
            match_uid: m.uid,
            user_uid: None,
            password: None,
        };

        let u1 = svc.start(&mut store, &request).await.unwrap().response;
        let u2 = svc.start(&mut store, &request).await.unwrap().response;
        assert_ne!(u1.user_uid, u2.user_uid);

        let mut stolen = next_request(&u1, &u1.question, Some(u1.question.answers[0].uid), None);
        stolen.user_uid = u2.user_uid;
        let err = svc.next(&mut store, &stolen).await.unwrap_err();
        assert!(matches!(err, PlayError::Validate(msg) if msg == "Invalid attempt-uid"));
    }

    #[tokio::test]
    async fn test_duplicate_answer_is_rejected() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|_| {});
        let game = store.add_game(m.uid, 0, true);
        store.add_question(game.uid, 0, Some(30), &[("yes", true, None)]);
        store.add_question(game.uid, 1, Some(30), &[("yes", true, None)]);

        let started = svc
            .start(
                &mut store,
                &StartRequest {
                    match_uid: m.uid,
                    user_uid: None,
                    password: None,
                },
            )
            .await
            .unwrap()
            .response;
        let q1 = started.question.clone();
        let req = next_request(&started, &q1, Some(q1.answers[0].uid), None);
        svc.next(&mut store, &req).await.unwrap();
        let err = svc.next(&mut store, &req).await.unwrap_err();
        assert!(matches!(err, PlayError::Validate(msg) if msg == "Duplicate Reactions"));
    }

    #[tokio::test]
    async fn test_ordered_positions_are_monotone() {
        let svc = service();
        let mut store = MemoryStore::new();
        let m = store.add_match(|_| {});
        let game = store.add_game(m.uid, 0, true);
        for pos in [3, 0, 2, 1] {
            store.add_question(game.uid, pos, None, &[("yes", true, None)]);
        }

        let started = svc
            .start(
                &mut store,
                &StartRequest {
                    match_uid: m.uid,
                    user_uid: None,
                    password: None,
                },
            )
            .await
            .unwrap()
            .response;
        let mut positions = vec![started.question.position];
        let mut question = started.question.clone();
        loop {
            let req = next_request(&started, &question, Some(question.answers[0].uid), None);
            let step = svc.next(&mut store, &req).await.unwrap();
            match step.response.question {
                Some(next) => {
                    positions.push(next.position);
                    question = next;
                }
                None => {
                    assert_eq!(step.state, AttemptState::Completed);
                    break;
                }
            }
        }
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(store.reactions.len(), 4);
        assert_eq!(store.rankings.len(), 1);
    }

    #[tokio::test]
    async fn test_rankings_of_unknown_match() {
        let svc = service();
        let mut store = MemoryStore::new();
        assert!(matches!(
            svc.rankings(&mut store, 77).await,
            Err(PlayError::NotFound(_))
        ));
    }
}
