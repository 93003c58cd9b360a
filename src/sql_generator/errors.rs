use thiserror::Error;

/// Failures raised while lowering a parsed query to SQL.
///
/// Groups the resolution, parameter, unsupported-construct and translation
/// error kinds; every variant aborts compilation before any SQL escapes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationError {
    // resolution
    #[error("Variable '{0}' is not bound by any MATCH, CREATE, MERGE or YIELD")]
    UnboundVariable(String),

    // parameters
    #[error("Parameter '${0}' was referenced but not provided")]
    MissingParameter(String),
    #[error("Parameter '${name}' must be {expected}, got {found}")]
    ParameterType {
        name: String,
        expected: &'static str,
        found: String,
    },

    // supported-subset boundary
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Unknown procedure '{0}' (supported: ivg.vector.search)")]
    UnknownProcedure(String),
    #[error(
        "Variable-length relationship must be a fixed hop count of at most {max} (e.g. *2); got {found}"
    )]
    VariableLengthRange { max: u32, found: String },

    // procedure-call translation
    #[error("ivg.vector.search requires at least 4 arguments (label, property, target, limit), got {0}")]
    ProcedureArity(usize),
    #[error("Unknown similarity '{0}' (expected 'cosine' or 'dot_product')")]
    UnknownSimilarity(String),
    #[error("Option 'embedding_config' is required when the search target is a text string")]
    MissingEmbeddingConfig,
    #[error("Invalid {what}: {detail}")]
    InvalidArgument { what: &'static str, detail: String },
}
