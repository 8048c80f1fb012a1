//! # Murmur
//!
//! A minimal social-feed engine. Users follow each other, publish and like
//! posts, and request ranked feeds of the posts they have not seen yet.
//!
//! The engine consumes one textual [`command::Command`] per line and answers
//! with transcript lines; see [`transcript::run`] for the file-driven entry
//! point.
//!
//! ## Example
//! ```rust
//! use murmur_cli::command::Command;
//! use murmur_cli::engine::FeedEngine;
//!
//! let mut engine = FeedEngine::new();
//! for line in ["create_user user1", "create_user user2", "follow_user user1 user2"] {
//!     let cmd = Command::parse(line).unwrap().unwrap();
//!     engine.execute(&cmd).unwrap();
//! }
//! assert!(engine.user("user1").unwrap().is_following("user2"));
//! ```

pub mod command;
pub mod engine;
pub mod error;
pub mod model;
pub mod transcript;
