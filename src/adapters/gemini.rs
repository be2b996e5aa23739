use crate::domain::model::ImageUpload;
use crate::domain::ports::{RecognitionClient, RecognitionConfig};
use crate::utils::error::{PokedexError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Instruction sent with every picture. The schema below pins the reply to a
/// JSON candidate array, so the text here only steers the content.
const IDENTIFY_PROMPT: &str = "Please identify what Pokémon this image most resembles. \
    Take into consideration it's shape, it's color & it's looks. Look for pokémons across \
    all generations until now. The image may be a drawing, toy, real animal, mythical \
    creature, or object that shares it's looks or characteristics with a Pokémon. Return \
    only the official pokémon name (in lowercase) and its official pokédex number \
    like(9, 25 or 813). If multiple Pokémon are possible matches, list only the closest \
    match. If it matches no pokemon return {dexNumber:'undefined', name:'undefined'} No \
    explanations or additional text.";

/// Talks to the Gemini REST API: one raw file upload, then one generateContent
/// call referencing the uploaded file.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug)]
struct UploadedFile {
    uri: String,
    mime_type: String,
}

impl GeminiClient {
    pub fn new(config: &impl RecognitionConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            api_key: config.api_key().to_string(),
            timeout: Duration::from_secs(config.timeout_seconds()),
        }
    }

    /// 上傳圖片，取得檔案參照 URI
    async fn upload_file(&self, image: &ImageUpload) -> Result<UploadedFile> {
        let url = format!("{}/upload/v1beta/files", self.endpoint);

        tracing::debug!("Uploading {} bytes to {}", image.bytes.len(), url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, &image.mime_type)
            .body(image.bytes.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PokedexError::ProviderError {
                status: response.status().as_u16(),
                context: "file upload".to_string(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let uri = body["file"]["uri"]
            .as_str()
            .ok_or_else(|| PokedexError::MalformedResponseError {
                reason: "upload reply has no file.uri".to_string(),
            })?
            .to_string();
        // 伺服器回傳的 MIME 為準，缺少時沿用客戶端宣告的類型
        let mime_type = body["file"]["mimeType"]
            .as_str()
            .unwrap_or(&image.mime_type)
            .to_string();

        tracing::debug!("Upload accepted as {} ({})", uri, mime_type);
        Ok(UploadedFile { uri, mime_type })
    }

    /// Asks the model about the uploaded file. Returns the raw text part of
    /// the first candidate, or the empty string when the reply has none.
    async fn generate_content(&self, file: &UploadedFile) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);

        let request_body = serde_json::json!({
            "contents": [{
                "parts": [
                    {"fileData": {"mimeType": file.mime_type, "fileUri": file.uri}},
                    {"text": IDENTIFY_PROMPT}
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": {
                                "type": "STRING",
                                "description": "Name of the pokemon (in lowercase)",
                                "nullable": false
                            },
                            "dexNumber": {
                                "type": "STRING",
                                "description": "Pokedex number (in number)",
                                "nullable": false
                            }
                        },
                        "required": ["name", "dexNumber"]
                    }
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .timeout(self.timeout)
            .send()
            .await?;

        tracing::debug!("Generate response status: {}", response.status());

        if !response.status().is_success() {
            return Err(PokedexError::ProviderError {
                status: response.status().as_u16(),
                context: "content generation".to_string(),
            });
        }

        let reply: serde_json::Value = response.json().await?;
        let text = reply["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(text)
    }
}

#[async_trait]
impl RecognitionClient for GeminiClient {
    async fn identify(&self, image: &ImageUpload) -> Result<String> {
        let uploaded = self.upload_file(image).await?;
        self.generate_content(&uploaded).await
    }
}
