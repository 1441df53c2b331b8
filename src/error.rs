use thiserror::Error;

use crate::dsl::BboxError;
use crate::elements::ElementKind;

/// Failures surfaced by a query request.
///
/// Parse, validation and not-found errors are raised while planning, before
/// the first document fragment exists. Storage errors may also arrive while
/// the document is being streamed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Parse(String),

    #[error(transparent)]
    Validation(#[from] BboxError),

    #[error("{kind} {ids} not found.")]
    NotFound { kind: ElementKind, ids: String },

    #[error("Storage: {0:#}")]
    Storage(#[source] anyhow::Error),
}

impl QueryError {
    pub fn parse(message: impl Into<String>) -> Self {
        QueryError::Parse(message.into())
    }

    /// HTTP status a routing layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            QueryError::Parse(_) | QueryError::Validation(_) => 400,
            QueryError::NotFound { .. } => 404,
            QueryError::Storage(_) => 500,
        }
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        QueryError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_http_status() {
        assert_eq!(QueryError::parse("bad").status(), 400);
        assert_eq!(QueryError::Validation(BboxError::LeftGreaterThanRight).status(), 400);
        let missing = QueryError::NotFound {
            kind: ElementKind::Node,
            ids: "1,2".into(),
        };
        assert_eq!(missing.status(), 404);
        assert_eq!(missing.to_string(), "Node 1,2 not found.");
        assert_eq!(QueryError::from(anyhow::anyhow!("boom")).status(), 500);
    }
}
