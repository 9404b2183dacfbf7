pub mod cli;
pub mod devto;
pub mod load_config;
pub mod ollama;

pub use cli::{run, Cli, Commands};
