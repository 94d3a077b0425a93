//! Core utilities and shared types
//!
//! - `error`: classified failures and their exit statuses
//! - `prompt`: the decision-point collaborator
//! - `settings`: environment configuration

pub mod error;
pub mod prompt;
pub mod settings;
