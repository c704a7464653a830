use thiserror::Error;

/// A convenience `Result` alias using [`ConductorError`].
pub type ConductorResult<T> = Result<T, ConductorError>;

/// Top-level error type for the Conductor workspace.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum ConductorError {
    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the task/agent orchestrator.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// An error raised by a worker agent while handling a task.
    #[error("Worker error: {0}")]
    Worker(String),

    /// An error from the performance monitor or one of its metric sources.
    #[error("Monitor error: {0}")]
    Monitor(String),

    /// An error from the persistent memory store.
    #[error("Memory error: {0}")]
    Memory(String),

    /// An error in the stdio tool server.
    #[error("MCP error: {0}")]
    Mcp(String),

    /// A caller-supplied argument is out of range or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An error reported by the SQLite backend of the memory store.
    #[error("Database error: {0}")]
    Database(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
