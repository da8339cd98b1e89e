//! One module per CLI command.

pub mod completions;
pub mod discovery;
pub mod kv;
pub mod ls;
pub mod search;
pub mod update;
pub mod update_all;
