use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single entry of a GraphQL response's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extensions: Value,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: Value::Null,
        }
    }

    pub fn with_extensions(mut self, extensions: Value) -> Self {
        self.extensions = extensions;
        self
    }
}

/// Transport and GraphQL errors of one operation, combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedError {
    pub network_error: Option<String>,
    pub graphql_errors: Vec<GraphqlError>,
    /// HTTP status of the response, when one was received.
    pub response_status: Option<u16>,
}

impl CombinedError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            network_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn graphql(errors: Vec<GraphqlError>) -> Self {
        Self {
            graphql_errors: errors,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.response_status = Some(status);
        self
    }

    pub fn message(&self) -> String {
        if let Some(network) = &self.network_error {
            return format!("[Network] {}", network);
        }

        self.graphql_errors
            .iter()
            .map(|e| format!("[GraphQL] {}", e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the backend rejected the session.
    ///
    /// Checks the HTTP status, the combined message, and each GraphQL
    /// error's message and `extensions.response`.
    pub fn is_unauthorized(&self) -> bool {
        self.response_status == Some(401)
            || is_unauthorized_like(&self.message())
            || self.graphql_errors.iter().any(|error| {
                is_unauthorized_response(error.extensions.get("response"))
                    || is_unauthorized_like(&error.message)
            })
    }
}

impl fmt::Display for CombinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CombinedError {}

fn is_unauthorized_response(response: Option<&Value>) -> bool {
    let Some(response) = response else {
        return false;
    };
    ["status", "statusCode"]
        .iter()
        .any(|key| response.get(key).and_then(Value::as_u64) == Some(401))
}

fn is_unauthorized_like(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("unauthenticated") || lower.contains("unauthorized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_prefers_network_error() {
        let mut error = CombinedError::graphql(vec![GraphqlError::new("boom")]);
        assert_eq!(error.message(), "[GraphQL] boom");

        error.network_error = Some("No Content".to_string());
        assert_eq!(error.message(), "[Network] No Content");
    }

    #[test]
    fn test_message_joins_graphql_errors() {
        let error = CombinedError::graphql(vec![GraphqlError::new("first"), GraphqlError::new("second")]);
        assert_eq!(error.to_string(), "[GraphQL] first\n[GraphQL] second");
    }

    #[test]
    fn test_unauthorized_by_status() {
        let error = CombinedError::network("Request failed").with_status(401);
        assert!(error.is_unauthorized());

        let error = CombinedError::network("Request failed").with_status(403);
        assert!(!error.is_unauthorized());
    }

    #[test]
    fn test_unauthorized_by_message() {
        assert!(CombinedError::network("401 Unauthorized").is_unauthorized());
        assert!(CombinedError::graphql(vec![GraphqlError::new("User is UNAUTHENTICATED")]).is_unauthorized());
        assert!(!CombinedError::network("Forbidden").is_unauthorized());
    }

    #[test]
    fn test_unauthorized_by_extensions() {
        let by_status = GraphqlError::new("Request failed")
            .with_extensions(json!({ "response": { "status": 401 } }));
        let by_status_code = GraphqlError::new("Request failed")
            .with_extensions(json!({ "response": { "statusCode": 401 } }));
        let other = GraphqlError::new("Request failed")
            .with_extensions(json!({ "response": { "status": 500 }, "code": "INTERNAL" }));

        assert!(CombinedError::graphql(vec![by_status]).is_unauthorized());
        assert!(CombinedError::graphql(vec![by_status_code]).is_unauthorized());
        assert!(!CombinedError::graphql(vec![other]).is_unauthorized());
    }

    #[test]
    fn test_graphql_error_deserializes_without_extensions() {
        let error: GraphqlError =
            serde_json::from_value(json!({ "message": "Not found", "path": ["account"] })).unwrap();

        assert_eq!(error.message, "Not found");
        assert!(error.extensions.is_null());
        assert!(!CombinedError::graphql(vec![error]).is_unauthorized());
    }
}
