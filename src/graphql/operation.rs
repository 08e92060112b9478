use super::error::CombinedError;
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

/// A GraphQL document plus its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub query: String,
    pub variables: Map<String, Value>,
    pub operation_name: Option<String>,
}

impl Operation {
    pub fn query(document: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, document.into())
    }

    pub fn mutation(document: impl Into<String>) -> Self {
        Self::new(OperationKind::Mutation, document.into())
    }

    /// Builds an operation, detecting mutations from the document text.
    pub fn parse(document: impl Into<String>) -> Self {
        let document = document.into();
        let kind = operation_header(&document)
            .map(|header| header.kind)
            .unwrap_or(OperationKind::Query);
        Self::new(kind, document)
    }

    fn new(kind: OperationKind, query: String) -> Self {
        let operation_name = operation_header(&query).and_then(|header| header.name);
        Self {
            kind,
            query,
            variables: Map::new(),
            operation_name,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        self.operation_name.as_deref().unwrap_or("anonymous")
    }

    /// Identity used to deduplicate in-flight requests.
    pub fn key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.query.hash(&mut hasher);
        // serde_json maps are ordered, so equal variables serialize equally
        Value::Object(self.variables.clone()).to_string().hash(&mut hasher);
        hasher.finish()
    }
}

struct OperationHeader {
    kind: OperationKind,
    name: Option<String>,
}

/// Reads the keyword and name of the first operation definition.
///
/// Comments, string literals, variable definitions, and fragment
/// definitions are skipped. A bare selection set is an anonymous query.
fn operation_header(document: &str) -> Option<OperationHeader> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut braces = 0usize;
    let mut parens = 0usize;
    let mut chars = document.chars();

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                // Comment runs to the end of the line
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                flush(&mut current, &mut tokens);
            }
            '"' => {
                flush(&mut current, &mut tokens);
                let mut escaped = false;
                for c in chars.by_ref() {
                    match c {
                        '\\' if !escaped => escaped = true,
                        '"' if !escaped => break,
                        _ => escaped = false,
                    }
                }
            }
            '(' => {
                flush(&mut current, &mut tokens);
                parens += 1;
            }
            ')' => parens = parens.saturating_sub(1),
            '{' if parens == 0 => {
                flush(&mut current, &mut tokens);
                if braces == 0 {
                    if let Some(header) = header_from_tokens(&tokens) {
                        return Some(header);
                    }
                    tokens.clear();
                }
                braces += 1;
            }
            '}' if parens == 0 => braces = braces.saturating_sub(1),
            c if braces == 0 && parens == 0 => {
                if c.is_whitespace() || c == ',' {
                    flush(&mut current, &mut tokens);
                } else {
                    current.push(c);
                }
            }
            _ => {}
        }
    }

    None
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// `None` for definitions that are not operations, such as fragments.
fn header_from_tokens(tokens: &[String]) -> Option<OperationHeader> {
    let kind = match tokens.first().map(String::as_str) {
        None | Some("query") | Some("subscription") => OperationKind::Query,
        Some("mutation") => OperationKind::Mutation,
        Some(_) => return None,
    };
    let name = tokens
        .get(1)
        .filter(|name| name.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .cloned();
    Some(OperationHeader { kind, name })
}

/// Outcome of one operation: data, an error, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationResult {
    pub data: Option<Value>,
    pub error: Option<CombinedError>,
}

impl OperationResult {
    pub fn from_error(error: CombinedError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }
}

/// Extracts the data of a result, raising its error or an empty body as
/// an error value.
pub fn parse_operation_result(result: OperationResult) -> Result<Value, CombinedError> {
    if let Some(error) = result.error {
        return Err(error);
    }

    result
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| CombinedError::network("No Content"))
}
