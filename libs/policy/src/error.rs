/// Errors raised while loading, saving or evaluating policy documents
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Failed to read a document from disk
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to write a document to disk
    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),

    /// The document is not valid TOML for its type
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    /// The document could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    /// A login rule's pattern does not compile; reported when the rule is first used
    #[error("invalid login pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
