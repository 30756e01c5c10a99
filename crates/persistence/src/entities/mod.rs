//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod quiz;
pub mod ranking;
pub mod reaction;
pub mod user;

pub use quiz::{AnswerEntity, GameEntity, MatchEntity, OpenAnswerEntity, QuestionEntity};
pub use ranking::RankingEntity;
pub use reaction::ReactionEntity;
pub use user::UserEntity;
