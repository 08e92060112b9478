use super::cache::{CacheConfig, MergeMode};
use super::endpoint::{join_url, partner_path, UNAUTHENTICATED_PATH};
use super::error::{CombinedError, GraphqlError};
use super::handler::ErrorHandler;
use super::operation::{parse_operation_result, Operation, OperationKind, OperationResult};
use crate::config::GraphqlConfig;
use futures::future::{BoxFuture, FutureExt, WeakShared};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying a per-request identifier, for correlating backend logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

type PendingResult = BoxFuture<'static, OperationResult>;
type InFlight = Arc<Mutex<HashMap<u64, InFlightEntry>>>;

/// A request other callers can join. Only a weak handle is kept so the
/// request is dropped once nobody awaits it.
struct InFlightEntry {
    generation: u64,
    pending: WeakShared<PendingResult>,
}

/// Removes its registry entry on drop, unless a newer request replaced it.
struct EntryGuard {
    registry: InFlight,
    key: u64,
    generation: u64,
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        if registry
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            registry.remove(&self.key);
        }
    }
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

pub struct ClientOptions {
    pub url: String,
    /// Share one request between identical in-flight queries.
    pub dedup: bool,
    pub timeout: Duration,
}

struct Transport {
    http: reqwest::Client,
    url: String,
    handler: Arc<ErrorHandler>,
}

/// GraphQL over HTTP, network-only: every operation hits the network.
///
/// Cookies set by the backend are kept and sent back on every request.
pub struct GraphqlClient {
    transport: Arc<Transport>,
    dedup: bool,
    in_flight: InFlight,
    next_generation: AtomicU64,
    cache: CacheConfig,
}

impl GraphqlClient {
    pub fn new(
        options: ClientOptions,
        handler: Arc<ErrorHandler>,
        cache: CacheConfig,
    ) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            transport: Arc::new(Transport {
                http,
                url: options.url,
                handler,
            }),
            dedup: options.dedup,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            cache,
        })
    }

    /// Client for the partner API of the configured project.
    pub fn partner(
        config: &GraphqlConfig,
        handler: Arc<ErrorHandler>,
        cache: CacheConfig,
    ) -> reqwest::Result<Self> {
        let project = config.project();
        let options = ClientOptions {
            url: join_url(&config.base_url, &partner_path(project.as_ref())),
            dedup: true,
            timeout: Duration::from_secs(config.timeout_secs),
        };
        Self::new(options, handler, cache)
    }

    /// Client for operations that don't need a session.
    pub fn unauthenticated(
        config: &GraphqlConfig,
        handler: Arc<ErrorHandler>,
    ) -> reqwest::Result<Self> {
        let options = ClientOptions {
            url: join_url(&config.base_url, UNAUTHENTICATED_PATH),
            dedup: false,
            timeout: Duration::from_secs(config.timeout_secs),
        };
        Self::new(options, handler, CacheConfig::default())
    }

    pub fn url(&self) -> &str {
        &self.transport.url
    }

    /// Runs an operation. Failures are passed to the error handler and
    /// returned on the result.
    pub async fn execute(&self, operation: &Operation) -> OperationResult {
        if !self.dedup || operation.kind == OperationKind::Mutation {
            return self.transport.send(operation.clone()).await;
        }

        let key = operation.key();
        let pending = {
            let mut in_flight = lock(&self.in_flight);
            let joined = in_flight
                .get(&key)
                .and_then(|entry| entry.pending.upgrade());
            match joined {
                Some(pending) => {
                    debug!(operation = operation.name(), "Joining in-flight request");
                    pending
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let guard = EntryGuard {
                        registry: Arc::clone(&self.in_flight),
                        key,
                        generation,
                    };
                    let transport = Arc::clone(&self.transport);
                    let operation = operation.clone();
                    let pending = async move {
                        // Dropped on completion, or when every awaiter gives up
                        let _guard = guard;
                        transport.send(operation).await
                    }
                    .boxed()
                    .shared();
                    if let Some(weak) = pending.downgrade() {
                        in_flight.insert(
                            key,
                            InFlightEntry {
                                generation,
                                pending: weak,
                            },
                        );
                    }
                    pending
                }
            }
        };

        pending.await
    }

    /// Runs an operation and returns its data, or its error.
    pub async fn fetch(&self, operation: &Operation) -> Result<Value, CombinedError> {
        parse_operation_result(self.execute(operation).await)
    }

    /// Fetches every page of the relay connection at `path`, merging pages
    /// with the field's configured strategy.
    ///
    /// Fields without a pagination rule are returned as a single page.
    pub async fn query_all_pages(
        &self,
        operation: &Operation,
        path: &[&str],
    ) -> Result<Value, CombinedError> {
        let mut data = self.fetch(operation).await?;
        let Some((field, parents)) = path.split_last() else {
            return Ok(data);
        };

        let mode = parent_typename(&data, parents)
            .and_then(|typename| self.cache.pagination(&typename, field));
        let Some(mode) = mode else {
            warn!(path = %path.join("."), "Field is not relay-paginated, returning first page");
            return Ok(data);
        };

        let cursor_variable = match mode {
            MergeMode::Inwards => "after",
            MergeMode::Outwards => "before",
        };
        let connection_pointer = pointer(path);
        let mut page = operation.clone();
        let mut pages = 1;

        loop {
            let Some(connection) = data.pointer(&connection_pointer) else {
                break;
            };
            let Some(cursor) = next_cursor(connection, mode) else {
                break;
            };
            if page.variables.get(cursor_variable).and_then(Value::as_str) == Some(cursor.as_str()) {
                warn!(cursor = %cursor, "Cursor did not advance, stopping");
                break;
            }

            page = page.with_variable(cursor_variable, Value::String(cursor));
            let next = self.fetch(&page).await?;
            let Some(incoming) = next.pointer(&connection_pointer) else {
                break;
            };

            let merged = self.cache.merge_connection(mode, connection, incoming);
            if let Some(slot) = data.pointer_mut(&connection_pointer) {
                *slot = merged;
            }
            pages += 1;
        }

        debug!(path = %path.join("."), pages, "Fetched all pages");
        Ok(data)
    }
}

impl Transport {
    async fn send(&self, operation: Operation) -> OperationResult {
        let request_id = Uuid::new_v4().to_string();
        debug!(
            operation = operation.name(),
            request_id = %request_id,
            url = %self.url,
            "Sending operation"
        );

        let body = json!({
            "query": operation.query,
            "variables": operation.variables,
            "operationName": operation.operation_name,
        });

        let result = match self
            .http
            .post(&self.url)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => read_response(response).await,
            Err(e) => OperationResult::from_error(CombinedError::network(e.to_string())),
        };

        if let Some(error) = &result.error {
            self.handler.on_error(error, &operation, &request_id);
        }

        result
    }
}

async fn read_response(response: reqwest::Response) -> OperationResult {
    let status = response.status();

    match response.json::<GraphqlResponse>().await {
        Ok(body) => {
            let data = body.data.filter(|data| !data.is_null());
            let error = if !body.errors.is_empty() {
                Some(CombinedError::graphql(body.errors).with_status(status.as_u16()))
            } else if !status.is_success() {
                Some(CombinedError::network(status_text(status)).with_status(status.as_u16()))
            } else {
                None
            };
            OperationResult { data, error }
        }
        Err(e) => {
            let message = if status.is_success() {
                e.to_string()
            } else {
                status_text(status)
            };
            OperationResult::from_error(CombinedError::network(message).with_status(status.as_u16()))
        }
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn pointer(path: &[&str]) -> String {
    path.iter()
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Type of the object holding the paginated field; the root is `Query`.
fn parent_typename(data: &Value, parents: &[&str]) -> Option<String> {
    if parents.is_empty() {
        return Some("Query".to_string());
    }
    data.pointer(&pointer(parents))?
        .get("__typename")?
        .as_str()
        .map(str::to_string)
}

fn next_cursor(connection: &Value, mode: MergeMode) -> Option<String> {
    let page_info = connection.get("pageInfo")?;
    let (has_more, cursor) = match mode {
        MergeMode::Inwards => ("hasNextPage", "endCursor"),
        MergeMode::Outwards => ("hasPreviousPage", "startCursor"),
    };
    if page_info.get(has_more)?.as_bool()? {
        page_info.get(cursor)?.as_str().map(str::to_string)
    } else {
        None
    }
}
