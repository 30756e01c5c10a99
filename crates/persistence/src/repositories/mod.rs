//! Repository implementations for database operations.

pub mod matches;
pub mod ranking;
pub mod reaction;
pub mod user;

pub use matches::{AnswerInput, MatchAccess, MatchInput, MatchRepository, QuestionInput};
pub use ranking::RankingRepository;
pub use reaction::ReactionRepository;
pub use user::UserRepository;
