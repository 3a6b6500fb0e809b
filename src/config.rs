use std::env;
use std::path::PathBuf;

/// Which text-generation backend composes the final reply.
/// All three remote providers speak the OpenAI chat-completions shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    None,
    OpenAi,
    Groq,
    Ollama,
}

impl LlmProvider {
    pub fn from_env() -> Self {
        match env::var("LLM_PROVIDER")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "openai" => Self::OpenAi,
            "groq" => Self::Groq,
            "ollama" => Self::Ollama,
            _ => Self::None,
        }
    }

    /// Default chat-completions base URL for the provider.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::None => "",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4.1-mini",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Ollama => "llama3.1:8b-instruct",
            Self::None => "",
        }
    }
}

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Path to the bi-encoder ONNX model used for query/document embeddings.
    pub embedder_model_path: PathBuf,
    /// Path to the embedder tokenizer JSON.
    pub embedder_tokenizer_path: PathBuf,
    pub max_sequence_length: usize,
    pub shutdown_timeout_secs: u64,
    /// Optional override for the embedder session pool size. If None, uses
    /// available parallelism.
    pub pool_size: Option<usize>,
    /// How many documents the router retrieves before aggregating per
    /// function. Large enough to span several functions.
    pub k_docs: usize,
    /// Optional JSON file overriding the built-in function catalog.
    pub catalog_path: Option<PathBuf>,
    /// Path to the embeddings cache file. Pre-computed document embeddings
    /// are stored here so restarts skip the embedding pass.
    pub embeddings_cache_path: PathBuf,
    /// Functions whose plans get a `buscar_producto` step prepended.
    /// Deliberately configuration-driven rather than a graph edge.
    pub prepend_product_lookup: Vec<String>,
    pub llm_provider: LlmProvider,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let llm_provider = LlmProvider::from_env();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            embedder_model_path: PathBuf::from(
                env::var("EMBEDDER_MODEL_PATH")
                    .unwrap_or_else(|_| "./models/bi-encoder/model_int8.onnx".to_string()),
            ),
            embedder_tokenizer_path: PathBuf::from(
                env::var("EMBEDDER_TOKENIZER_PATH")
                    .unwrap_or_else(|_| "./models/bi-encoder/tokenizer.json".to_string()),
            ),
            max_sequence_length: env::var("MAX_SEQ_LENGTH")
                .unwrap_or_else(|_| "512".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            pool_size: env::var("POOL_SIZE").ok().and_then(|s| s.parse().ok()),
            k_docs: env::var("K_DOCS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()?,
            catalog_path: env::var("CATALOG_PATH").ok().map(PathBuf::from),
            embeddings_cache_path: PathBuf::from(
                env::var("EMBEDDINGS_CACHE_PATH")
                    .unwrap_or_else(|_| ".miga/embeddings.bin".to_string()),
            ),
            prepend_product_lookup: env::var("PREPEND_PRODUCT_LOOKUP")
                .unwrap_or_else(|_| "consultar_precio_promos,crear_pedido".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            llm_provider,
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| llm_provider.default_base_url().to_string()),
            llm_api_key: env::var("LLM_API_KEY").ok(),
            llm_model: env::var("LLM_MODEL")
                .unwrap_or_else(|_| llm_provider.default_model().to_string()),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
        })
    }
}
