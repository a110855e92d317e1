//! cefnav: closed-end fund price/NAV collection and cleaning.
//!
//! Hexagonal layout: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command dispatch in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
