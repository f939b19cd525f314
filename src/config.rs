use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "HerbHeal";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-attempt timeout for every outbound model call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Attempts per outbound call, first attempt included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Language that needs no translation.
pub const DEFAULT_LANGUAGE: &str = "en";

const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_PERPLEXITY_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
const DEFAULT_PERPLEXITY_MODEL: &str = "llama-3.1-sonar-large-128k-online";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "herbheal=debug,info"
    } else {
        "herbheal=info,warn"
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid endpoint URL: '{0}'")]
    InvalidEndpoint(String),

    #[error("Remote endpoints must use https: '{0}'")]
    InsecureEndpoint(String),
}

/// Vision model service (herb identification).
#[derive(Debug, Clone)]
pub struct VisionServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

/// Language model service (remedy generation and translation).
#[derive(Debug, Clone)]
pub struct LanguageServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

/// Everything the stages need to reach the model services.
///
/// Built once by the caller and handed to each stage; nothing here is global.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub vision: VisionServiceConfig,
    pub language: LanguageServiceConfig,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl AiConfig {
    /// Config with default endpoints and models for the given API keys.
    pub fn new(gemini_api_key: &str, perplexity_api_key: &str) -> Self {
        Self {
            vision: VisionServiceConfig {
                endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
                api_key: gemini_api_key.to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
            },
            language: LanguageServiceConfig {
                endpoint: DEFAULT_PERPLEXITY_ENDPOINT.to_string(),
                api_key: perplexity_api_key.to_string(),
                model: DEFAULT_PERPLEXITY_MODEL.to_string(),
            },
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Load from `HERBHEAL_*` environment variables.
    ///
    /// API keys are required; endpoints and model names fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_key = lookup("HERBHEAL_GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("HERBHEAL_GEMINI_API_KEY"))?;
        let perplexity_key = lookup("HERBHEAL_PERPLEXITY_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("HERBHEAL_PERPLEXITY_API_KEY"))?;

        let mut config = Self::new(&gemini_key, &perplexity_key);
        if let Some(endpoint) = lookup("HERBHEAL_GEMINI_ENDPOINT") {
            config.vision.endpoint = endpoint;
        }
        if let Some(model) = lookup("HERBHEAL_GEMINI_MODEL") {
            config.vision.model = model;
        }
        if let Some(endpoint) = lookup("HERBHEAL_PERPLEXITY_ENDPOINT") {
            config.language.endpoint = endpoint;
        }
        if let Some(model) = lookup("HERBHEAL_PERPLEXITY_MODEL") {
            config.language.model = model;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject malformed endpoints and plain-http remote hosts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.vision.endpoint)?;
        validate_endpoint(&self.language.endpoint)
    }
}

/// API keys travel in headers, so only loopback hosts may use plain http.
pub fn validate_endpoint(url: &str) -> Result<(), ConfigError> {
    if url.strip_prefix("https://").is_some_and(|rest| !rest.is_empty()) {
        return Ok(());
    }

    let after_scheme = url
        .strip_prefix("http://")
        .ok_or_else(|| ConfigError::InvalidEndpoint(url.to_string()))?;

    let host = if after_scheme.starts_with('[') {
        // IPv6: [::1]:port
        after_scheme
            .find(']')
            .map(|i| &after_scheme[..=i])
            .ok_or_else(|| ConfigError::InvalidEndpoint(url.to_string()))?
    } else {
        after_scheme
            .split([':', '/'])
            .next()
            .unwrap_or("")
    };

    match host {
        "" => Err(ConfigError::InvalidEndpoint(url.to_string())),
        "localhost" | "127.0.0.1" | "[::1]" => Ok(()),
        _ => Err(ConfigError::InsecureEndpoint(url.to_string())),
    }
}
