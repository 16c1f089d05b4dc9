//! UoM MCP Server
//!
//! Line-delimited JSON-RPC over stdio. Logs go to stderr.
//!
//! Tools:
//! - load_units: Load or refresh the unit catalog
//! - catalog_status: Loading state, last error, counts
//! - resolve_unit: Look up a unit by id, symbol, name or alternate name
//! - search_units: Filter active units by text, category and type
//! - group_units: Search results grouped by category
//! - convert: Convert a quantity between two units
//! - to_base: Convert a quantity into its category's base unit
//! - compatible_units: Units a given unit can be converted into
//!
//! Resources:
//! - uom://catalog/status - Catalog status
//! - uom://catalog/issues - Data-quality issues of the current snapshot

mod tools;

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uom_engine::{CatalogConfig, CatalogSource, JsonFileSource, StaticSource, UnitCatalog};

const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "uom";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server settings read from the environment
#[derive(Debug, Clone)]
struct ServerConfig {
    /// UOM_DATA_PATH: JSON catalog file; built-in catalog when unset
    data_path: Option<PathBuf>,
    /// UOM_STRICT: reject feeds with data-quality issues
    strict: bool,
}

impl ServerConfig {
    fn from_env() -> Self {
        let data_path = env::var("UOM_DATA_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let strict = env::var("UOM_STRICT")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self { data_path, strict }
    }

    fn source(&self) -> Arc<dyn CatalogSource> {
        match &self.data_path {
            Some(path) => Arc::new(JsonFileSource::new(path.clone())),
            None => Arc::new(StaticSource::seeded()),
        }
    }

    fn build_catalog(&self, source: Arc<dyn CatalogSource>) -> UnitCatalog {
        UnitCatalog::new(source, CatalogConfig { strict: self.strict })
    }
}

fn init_logging() {
    // stdout carries protocol traffic
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

// MCP Protocol types
#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<JsonValue>,
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize)]
pub(crate) struct McpError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
}

impl McpError {
    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        McpError { code: -32602, message: message.into(), data: None }
    }

    fn method_not_found(method: &str) -> Self {
        McpError { code: -32601, message: format!("Method not found: {}", method), data: None }
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = ServerConfig::from_env();
    let source = config.source();

    info!(version = SERVER_VERSION, protocol = PROTOCOL_VERSION, "UoM MCP server started");
    info!(
        source = %source.describe(),
        strict = config.strict,
        "Catalog configured"
    );
    let catalog = config.build_catalog(source);

    // A failed first load is not fatal: tools report DATA_UNAVAILABLE until a reload succeeds
    match catalog.load().await {
        Ok(snapshot) => info!(units = snapshot.units().len(), "Initial catalog load complete"),
        Err(err) => warn!(error = %err, "Initial catalog load failed"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Server ready, waiting for requests...");

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Client disconnected (EOF)");
                break;
            }
            Err(e) => {
                error!(error = %e, "Error reading input");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(bytes = line.len(), "Received request");

        let request: McpRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Error parsing request");
                let response = McpResponse {
                    jsonrpc: "2.0".to_string(),
                    id: None,
                    result: None,
                    error: Some(McpError {
                        code: -32700,
                        message: format!("Parse error: {}", e),
                        data: None,
                    }),
                };
                if write_response(&response).is_err() {
                    break;
                }
                continue;
            }
        };

        debug!(method = %request.method, "Processing");
        let response = handle_request(&catalog, &request).await;

        // Notifications (no id) get no response
        if request.id.is_none() {
            debug!(method = %request.method, "Notification processed");
            continue;
        }

        if let Err(e) = write_response(&response) {
            error!(error = %e, "Error writing response");
            break;
        }
    }

    info!("Server shutting down");
}

fn write_response(response: &McpResponse) -> io::Result<()> {
    let text = serde_json::to_string(response).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    stdout.flush()
}

async fn handle_request(catalog: &UnitCatalog, request: &McpRequest) -> McpResponse {
    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(&request.params),
        "initialized" | "notifications/initialized" => Ok(json!({})),
        "ping" => Ok(json!({})),

        // Tools
        "tools/list" => Ok(tools::list()),
        "tools/call" => tools::call(catalog, &request.params).await,

        // Resources
        "resources/list" => Ok(handle_resources_list()),
        "resources/read" => handle_resources_read(catalog, &request.params),

        _ => Err(McpError::method_not_found(&request.method)),
    };

    match result {
        Ok(r) => McpResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id.clone(),
            result: Some(r),
            error: None,
        },
        Err(e) => McpResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id.clone(),
            result: None,
            error: Some(e),
        },
    }
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params.as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Use client's protocol version for compatibility
    let client_protocol = params.as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    info!(client = client_info, protocol = client_protocol, "Client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Unit-of-measure catalog, search and conversion"
        },
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false }
        },
        "instructions": "Resolve units with 'resolve_unit' or 'search_units' before converting. Conversion is only possible between units of the same category. Errors carry a kind, a message, suggestions and a retryable flag; only retry when retryable is true."
    }))
}

fn handle_resources_list() -> JsonValue {
    json!({
        "resources": [
            {
                "uri": "uom://catalog/status",
                "name": "catalog-status",
                "description": "Loading state, last error and counts of the unit catalog",
                "mimeType": "application/json"
            },
            {
                "uri": "uom://catalog/issues",
                "name": "catalog-issues",
                "description": "Data-quality issues found in the current catalog snapshot",
                "mimeType": "application/json"
            }
        ]
    })
}

fn handle_resources_read(catalog: &UnitCatalog, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let uri = params.as_ref()
        .and_then(|p| p.get("uri"))
        .and_then(|u| u.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing uri parameter"))?;

    let body = match uri {
        "uom://catalog/status" => serde_json::to_string_pretty(&catalog.status()),
        "uom://catalog/issues" => serde_json::to_string_pretty(catalog.snapshot().issues()),
        _ => return Err(McpError::invalid_params(format!("Unknown resource: {}", uri))),
    }
    .map_err(|e| McpError { code: -32603, message: e.to_string(), data: None })?;

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": body
        }]
    }))
}
