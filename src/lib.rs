//! Client library for a hosted blogging backend - posts, images, accounts
//!
//! Wraps one remote project (document collection, file bucket, account API)
//! behind typed service seams and composes the multi-step publish flows that
//! keep post documents and their image assets consistent with each other.

pub mod app;
pub mod auth;
pub mod backend;
pub mod content;
pub mod error;
pub mod form;
pub mod lifecycle;
pub mod models;
pub mod slug;

pub use error::{Error, Result};
