//! Resource recommendations for a mental-health support platform.
//!
//! The [`recommender`] module is a self-contained user-based collaborative
//! filtering engine over a snapshot of ratings. The rest of the crate wraps it
//! in an axum service that turns user behavior into ratings, resolves ids to
//! resources and falls back to popular resources on cold start.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod recommender;
pub mod services;
