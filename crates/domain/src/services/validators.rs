//! Logical checks run before each play verb mutates state.
//!
//! Checks run in a fixed order and stop at the first failure. Syntactic
//! constraints (regexes, lengths) are enforced earlier by the request DTOs.

use tracing::debug;

use super::error::{
    PlayError, DUPLICATE_REACTIONS, EXPIRED_MATCH, INVALID_ANSWER, INVALID_ATTEMPT_UID,
    INVALID_REACTION,
};
use super::identity::Identity;
use super::single_player::Reply;
use super::store::PlayStore;
use crate::models::play::NextRequest;
use crate::models::{Match, MatchPlan, Reaction, ReactionFilter, User};

fn ensure_active(info: &Match) -> Result<(), PlayError> {
    if info.is_active() {
        Ok(())
    } else {
        Err(PlayError::validate(EXPIRED_MATCH))
    }
}

async fn active_match<S>(store: &mut S, match_uid: i64) -> Result<Match, PlayError>
where
    S: PlayStore + ?Sized,
{
    let info = store
        .find_match(match_uid)
        .await?
        .ok_or_else(|| PlayError::not_found(format!("Match {}", match_uid)))?;
    ensure_active(&info)?;
    Ok(info)
}

async fn existing_user<S>(store: &mut S, user_uid: i64) -> Result<User, PlayError>
where
    S: PlayStore + ?Sized,
{
    store
        .find_user(user_uid)
        .await?
        .ok_or_else(|| PlayError::not_found(format!("User {}", user_uid)))
}

/// Match reached through its link hash.
pub async fn land<S>(store: &mut S, uhash: &str) -> Result<Match, PlayError>
where
    S: PlayStore + ?Sized,
{
    let info = store
        .find_match_by_uhash(uhash)
        .await?
        .ok_or_else(|| PlayError::not_found("Match"))?;
    ensure_active(&info)?;
    Ok(info)
}

/// Match reached through its numeric code.
pub async fn code<S>(store: &mut S, match_code: &str) -> Result<Match, PlayError>
where
    S: PlayStore + ?Sized,
{
    let info = store
        .find_match_by_code(match_code)
        .await?
        .ok_or_else(|| PlayError::not_found("Match"))?;
    ensure_active(&info)?;
    Ok(info)
}

/// Existing signed user for an (e-mail, token) pair.
pub async fn sign<S>(
    store: &mut S,
    identity: &Identity,
    email: &str,
    token: &str,
) -> Result<User, PlayError>
where
    S: PlayStore + ?Sized,
{
    identity
        .find_signed(store, email, token)
        .await?
        .ok_or_else(|| PlayError::not_found("User"))
}

/// Resolved entities for `start`.
#[derive(Debug, Clone)]
pub struct StartContext {
    pub plan: MatchPlan,
    /// `None` when the caller did not identify; an anonymous user is created later.
    pub user: Option<User>,
}

pub async fn start<S>(
    store: &mut S,
    match_uid: i64,
    user_uid: Option<i64>,
    password: Option<&str>,
) -> Result<StartContext, PlayError>
where
    S: PlayStore + ?Sized,
{
    let info = active_match(store, match_uid).await?;

    if info.is_restricted {
        let Some(password) = password else {
            return Err(PlayError::validate("Password is required"));
        };
        if info.password.as_deref() != Some(password) {
            return Err(PlayError::validate("Invalid password"));
        }
    }

    let user = match user_uid {
        Some(uid) => Some(existing_user(store, uid).await?),
        None => None,
    };

    let signed = user.as_ref().map_or(false, User::is_signed);
    if signed != info.is_restricted {
        return Err(PlayError::validate(if info.is_restricted {
            "Restricted match requires a signed user"
        } else {
            "Signed users can only play restricted matches"
        }));
    }

    let plan = store.load_plan(info).await?;
    Ok(StartContext { plan, user })
}

/// Resolved entities for `next`.
#[derive(Debug, Clone)]
pub struct NextContext {
    pub plan: MatchPlan,
    pub user: User,
    pub question_uid: i64,
    /// The reaction being answered, locked until the transaction ends.
    pub reaction: Reaction,
    pub reply: Reply,
    /// The reaction already holds a free-text answer; nothing will be recorded.
    pub replay: bool,
}

pub async fn next<S>(store: &mut S, request: &NextRequest) -> Result<NextContext, PlayError>
where
    S: PlayStore + ?Sized,
{
    let info = active_match(store, request.match_uid).await?;
    let plan = store.load_plan(info).await?;

    let (_, question) = plan
        .question(request.question_uid)
        .ok_or_else(|| PlayError::validate("Question does not belong to the match"))?;

    if let Some(answer_uid) = request.answer_uid {
        if question.answer(answer_uid).is_none() {
            return Err(PlayError::validate(INVALID_ANSWER));
        }
    }
    if request.answer_text.is_some() && !question.is_open() {
        return Err(PlayError::validate(INVALID_ANSWER));
    }

    let user = existing_user(store, request.user_uid).await?;

    let attempt = ReactionFilter::new(user.uid, plan.uid()).attempt(request.attempt_uid.clone());
    if store.reactions(&attempt).await?.is_empty() {
        return Err(PlayError::validate(INVALID_ATTEMPT_UID));
    }

    let reaction = store
        .lock_reaction(&attempt.question(question.uid))
        .await?
        .ok_or_else(|| PlayError::validate(INVALID_REACTION))?;

    if reaction.is_closed() && reaction.open_answer_uid.is_none() {
        return Err(PlayError::validate(DUPLICATE_REACTIONS));
    }

    let replay = reaction.open_answer_uid.is_some();
    let reply = if replay {
        debug!(reaction_uid = reaction.uid, "Free-text reply already recorded");
        Reply::Silent
    } else if let Some(answer_uid) = request.answer_uid {
        Reply::Choice(answer_uid)
    } else if let Some(text) = &request.answer_text {
        Reply::Text(store.insert_open_answer(text).await?)
    } else {
        Reply::Silent
    };

    let question_uid = question.uid;
    Ok(NextContext {
        plan,
        user,
        question_uid,
        reaction,
        reply,
        replay,
    })
}
