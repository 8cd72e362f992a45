//! Webhook request handlers

pub mod health;
pub mod orders;
