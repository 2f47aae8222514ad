//! Error types for the legalmind pipeline.

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur while ingesting, retrieving or answering.
#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Document not found.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    /// Failed to load content from source.
    #[error("Failed to load content from {uri}: {reason}")]
    LoadFailed { uri: String, reason: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Embedding capability error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Vector search error.
    #[error("Vector search error: {message}")]
    VectorSearch { message: String },

    /// Reranking capability error.
    #[error("Rerank error: {message}")]
    Rerank { message: String },

    /// Text generation capability error.
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// Remote provider returned an error response.
    #[error("Provider {provider} returned {status}: {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    /// Chunking error.
    #[error("Chunking error: {message}")]
    Chunking { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl RagError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a vector search error.
    pub fn vector_search(message: impl Into<String>) -> Self {
        Self::VectorSearch {
            message: message.into(),
        }
    }

    /// Create a rerank error.
    pub fn rerank(message: impl Into<String>) -> Self {
        Self::Rerank {
            message: message.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a provider error from a non-success HTTP response.
    pub fn provider(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a chunking error.
    pub fn chunking(message: impl Into<String>) -> Self {
        Self::Chunking {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a caller may retry the request that produced this error.
    ///
    /// Capability failures (embedding, search, rerank, generation, remote
    /// providers) are transient; argument, configuration and data errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding { .. }
            | Self::VectorSearch { .. }
            | Self::Rerank { .. }
            | Self::Generation { .. }
            | Self::Database { .. } => true,
            Self::Provider { status, .. } => *status == 429 || *status >= 500 || *status == 0,
            _ => false,
        }
    }

    /// Get a stable error code for responses and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::VectorSearch { .. } => "VECTOR_SEARCH_ERROR",
            Self::Rerank { .. } => "RERANK_ERROR",
            Self::Generation { .. } => "GENERATION_ERROR",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::Chunking { .. } => "CHUNKING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }
}
