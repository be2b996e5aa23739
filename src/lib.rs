pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::gemini::GeminiClient;
pub use app::server::{build_router, AppState};
pub use config::{toml_config::TomlConfig, CliConfig};
pub use core::identify::{RecognitionEngine, MAX_RETRIES};
pub use domain::model::CandidateMatch;
pub use utils::error::{PokedexError, Result};
