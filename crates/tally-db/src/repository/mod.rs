//! # Repository Implementations
//!
//! One repository per aggregate. Read paths run against the pool; write
//! helpers that must participate in a caller's transaction are generic over
//! `sqlx::Executor`, so the same function works with `&SqlitePool` or
//! `&mut SqliteConnection` inside a transaction.

pub mod movement;
pub mod policy;
pub mod product;
pub mod sale;
