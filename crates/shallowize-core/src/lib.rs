//! Shallowize Core Library
//!
//! Finds git checkouts under a directory and replaces their full history
//! with a depth-1 history, skipping any checkout holding unsaved work.

pub mod compact;
pub mod config;
pub mod error;
pub mod format;
pub mod git;
pub mod locate;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod size;

#[cfg(test)]
mod testutil;
