//! Core domain types and logic.

pub mod calendar;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod na_clean;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod quote;
pub mod report;
pub mod retry;
pub mod security;
