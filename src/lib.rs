//! Soft Startup — a guided wizard for raising a disagreement gently.

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod wizard;
