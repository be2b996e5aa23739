use serde::{Deserialize, Serialize};

/// Value the model places in both fields when the picture matches nothing.
/// It satisfies the non-empty check, so it flows back to the client as a
/// normal success; the client is the one that renders it as a miss.
pub const NO_MATCH_SENTINEL: &str = "undefined";

/// One possible identification as returned by the model. `dex_number` stays
/// a string on the wire (the schema asks the model for digits in a string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub name: String,
    #[serde(rename = "dexNumber")]
    pub dex_number: String,
}

/// A picture as received from the capture client, alive for one request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}
