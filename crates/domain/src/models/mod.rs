//! Domain models for Progame.

pub mod play;
pub mod quiz;
pub mod ranking;
pub mod reaction;
pub mod user;

pub use quiz::{Answer, Game, GamePlan, Match, MatchPlan, OpenAnswer, Question};
pub use ranking::{NewRanking, Ranking};
pub use reaction::{AnswerRecord, NewReaction, Reaction, ReactionFilter};
pub use user::{NewUser, User};
