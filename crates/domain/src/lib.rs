//! Domain layer for Progame.
//!
//! This crate contains:
//! - Domain models (Match, Game, Question, Reaction, Ranking, User)
//! - The play engine (iterators, player status, single player, validators)
//! - The storage seam implemented by the persistence crate

pub mod models;
pub mod services;
