use crate::domain::model::ImageUpload;
use crate::utils::error::Result;
use async_trait::async_trait;

/// One full round trip against the recognition provider: hand over the
/// picture, get back whatever raw text the model produced. Callers decide
/// whether that text is usable.
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    async fn identify(&self, image: &ImageUpload) -> Result<String>;
}

pub trait RecognitionConfig: Send + Sync {
    fn endpoint(&self) -> &str;
    fn model(&self) -> &str;
    fn api_key(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn retry_attempts(&self) -> u32;
    fn retry_delay_seconds(&self) -> u64;
}
