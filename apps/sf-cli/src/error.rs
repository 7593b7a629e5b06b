use sf_project::ProjectError;
use sf_routing::RoutingError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Logging setup failed: {0}")]
    Tracing(#[from] tracing_subscriber::filter::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
