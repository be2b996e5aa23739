use crate::core::{CandidateMatch, ImageUpload, RecognitionClient};
use crate::utils::error::{PokedexError, Result};
use std::time::Duration;

/// Upper bound on upload + generate round trips for one request.
pub const MAX_RETRIES: u32 = 3;

/// Drives the recognition client until it produces a usable candidate list
/// or the attempt budget runs out. A failed upload, a failed generate call
/// and an unparseable reply all consume exactly one attempt.
pub struct RecognitionEngine<C: RecognitionClient> {
    client: C,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<C: RecognitionClient> RecognitionEngine<C> {
    pub fn new(client: C) -> Self {
        Self::with_retry_policy(client, MAX_RETRIES, Duration::ZERO)
    }

    pub fn with_retry_policy(client: C, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub async fn identify(&self, image: &ImageUpload) -> Result<Vec<CandidateMatch>> {
        let mut attempts = 0;
        while attempts < self.max_attempts {
            if attempts > 0 && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
            attempts += 1;

            match self.client.identify(image).await {
                Ok(raw) => match parse_candidates(&raw) {
                    Ok(candidates) => {
                        if let Some(first) = candidates.first() {
                            tracing::info!("Found: {} - {}", first.dex_number, first.name);
                        }
                        return Ok(candidates);
                    }
                    Err(e) => {
                        tracing::warn!("Attempt {}: invalid response format: {}", attempts, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Attempt {}: recognition call failed: {}", attempts, e);
                }
            }
        }

        Err(PokedexError::AttemptsExhaustedError { attempts })
    }
}

/// A reply is usable iff it parses as a JSON array of candidates with at
/// least one element whose name and dexNumber are both non-empty. Only the
/// first element is gated; the rest ride along unchanged. The "undefined"
/// sentinel pair is non-empty and therefore passes.
fn parse_candidates(raw: &str) -> Result<Vec<CandidateMatch>> {
    let candidates: Vec<CandidateMatch> = serde_json::from_str(raw)?;
    match candidates.first() {
        Some(first) if !first.name.is_empty() && !first.dex_number.is_empty() => Ok(candidates),
        Some(_) => Err(PokedexError::MalformedResponseError {
            reason: "first candidate has empty fields".to_string(),
        }),
        None => Err(PokedexError::MalformedResponseError {
            reason: "candidate array is empty".to_string(),
        }),
    }
}
