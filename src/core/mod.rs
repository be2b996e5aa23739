pub mod identify;

pub use crate::domain::model::{CandidateMatch, ImageUpload};
pub use crate::domain::ports::{RecognitionClient, RecognitionConfig};
pub use crate::utils::error::Result;
