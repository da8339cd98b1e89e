pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod search;
pub mod sync;
