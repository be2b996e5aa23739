use crate::adapters::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::config::CliConfig;
use crate::core::identify::MAX_RETRIES;
use crate::domain::ports::RecognitionConfig;
use crate::utils::error::{PokedexError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted when no config file is given.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerConfig>,
    pub recognition: RecognitionSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionSettings {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: String,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PokedexError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PokedexError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 沒有配置檔時的最小啟動路徑，只需要 GEMINI_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var(API_KEY_ENV).map_err(|_| PokedexError::MissingConfigError {
                field: format!("recognition.api_key ({})", API_KEY_ENV),
            })?;

        Ok(Self {
            server: None,
            recognition: RecognitionSettings {
                endpoint: None,
                model: None,
                api_key,
                timeout_seconds: None,
                retry_attempts: None,
                retry_delay_seconds: None,
            },
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("recognition.endpoint", self.endpoint())?;
        crate::utils::validation::validate_non_empty_string(
            "recognition.api_key",
            self.api_key(),
        )?;

        // 未設定的環境變數會原樣保留成 ${VAR}，在這裡擋下
        if self.recognition.api_key.contains("${") {
            return Err(PokedexError::InvalidConfigValueError {
                field: "recognition.api_key".to_string(),
                value: self.recognition.api_key.clone(),
                reason: "environment variable was not substituted".to_string(),
            });
        }

        crate::utils::validation::validate_positive_number(
            "recognition.retry_attempts",
            self.retry_attempts() as usize,
            1,
        )?;
        crate::utils::validation::validate_positive_number(
            "recognition.timeout_seconds",
            self.timeout_seconds() as usize,
            1,
        )?;
        crate::utils::validation::validate_range("server.port", self.port(), 1, u16::MAX)?;
        crate::utils::validation::validate_positive_number(
            "server.max_upload_mb",
            self.max_upload_mb(),
            1,
        )?;

        Ok(())
    }

    /// 套用命令列覆寫 (host/port)
    pub fn apply_cli_overrides(&mut self, cli: &CliConfig) {
        if cli.host.is_none() && cli.port.is_none() {
            return;
        }
        let server = self.server.get_or_insert_with(ServerConfig::default);
        if let Some(host) = &cli.host {
            server.host = Some(host.clone());
        }
        if let Some(port) = cli.port {
            server.port = Some(port);
        }
    }

    /// 取得綁定位址
    pub fn host(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.host.as_deref())
            .unwrap_or("127.0.0.1")
    }

    /// 取得監聽埠
    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(3000)
    }

    pub fn max_upload_mb(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.max_upload_mb)
            .unwrap_or(10)
    }

    /// 上傳大小上限 (bytes)
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb() * 1024 * 1024
    }
}

impl RecognitionConfig for TomlConfig {
    fn endpoint(&self) -> &str {
        self.recognition
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    fn model(&self) -> &str {
        self.recognition.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn api_key(&self) -> &str {
        &self.recognition.api_key
    }

    fn timeout_seconds(&self) -> u64 {
        self.recognition.timeout_seconds.unwrap_or(30)
    }

    fn retry_attempts(&self) -> u32 {
        self.recognition.retry_attempts.unwrap_or(MAX_RETRIES)
    }

    fn retry_delay_seconds(&self) -> u64 {
        self.recognition.retry_delay_seconds.unwrap_or(0)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
