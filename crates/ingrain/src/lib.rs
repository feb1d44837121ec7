//! Terminal front end for ingrain review sessions.
//!
//! Reviews a directory of markdown notes: the note seen least recently is
//! quizzed first, and answering a quiz records the review in the data file.
//!
//! # Configuration
//!
//! - `--config FILE` (`.toml`, `.json` or `.yaml`)
//! - `INGRAIN_LLM_PROVIDER`, `INGRAIN_LLM_MODEL`, `INGRAIN_DATA_PATH`,
//!   `INGRAIN_VAULT_DIR`
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`
//!
//! Without a key the session still runs and shows the configuration error in
//! place of each quiz.

pub mod commands;
pub mod vault;

pub use commands::{render, Command};
pub use vault::{RescanSummary, VaultDirectory};
