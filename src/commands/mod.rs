//! CLI commands for shallowize

pub mod compact;
pub mod dispatch;
pub mod list;
pub mod output;
