//! Tool definitions and handlers

use serde_json::{json, Value as JsonValue};
use uom_core::{ClassifiedError, Unit, UnitId, UnitType};
use uom_engine::{ConversionResult, Converter, UnitCatalog};
use crate::McpError;

pub(crate) fn list() -> JsonValue {
    json!({
        "tools": [
            {
                "name": "load_units",
                "description": "Load the unit catalog from its data source. Concurrent loads share one fetch; set refresh to force a new fetch.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "refresh": {
                            "type": "boolean",
                            "description": "Fetch even if a load is already in flight",
                            "default": false
                        }
                    }
                }
            },
            {
                "name": "catalog_status",
                "description": "Report whether the catalog is loading, the last load error and unit counts.",
                "inputSchema": { "type": "object", "properties": {} }
            },
            {
                "name": "resolve_unit",
                "description": "Look up a unit by numeric id, or by symbol, name or alternate name (case-insensitive).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "description": "Unit id" },
                        "reference": { "type": "string", "description": "Id, symbol, name or alternate name" }
                    }
                }
            },
            {
                "name": "search_units",
                "description": "Active units whose name, symbol or alternate names contain the query.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Substring to match (empty = all)" },
                        "category": { "type": "string", "description": "Exact category name, e.g. \"Weight\"" },
                        "unit_type": {
                            "type": "string",
                            "description": "Restrict to one classification",
                            "enum": ["SI", "International", "Desi", "Textile", "English", "Other"]
                        }
                    }
                }
            },
            {
                "name": "group_units",
                "description": "Search results grouped by category, in display order.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" },
                        "category": { "type": "string" }
                    }
                }
            },
            {
                "name": "convert",
                "description": "Convert a quantity between two units of the same category.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "number", "description": "Quantity to convert" },
                        "from": { "type": "integer", "description": "Source unit id" },
                        "to": { "type": "integer", "description": "Target unit id" }
                    },
                    "required": ["value"]
                }
            },
            {
                "name": "to_base",
                "description": "Convert a quantity into the base unit of its category.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "number" },
                        "unit": { "type": "integer", "description": "Unit id" }
                    },
                    "required": ["value", "unit"]
                }
            },
            {
                "name": "compatible_units",
                "description": "Active units the given unit can be converted into.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "unit": { "type": "integer", "description": "Unit id" }
                    },
                    "required": ["unit"]
                }
            }
        ]
    })
}

pub(crate) async fn call(catalog: &UnitCatalog, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let params = params.as_ref().ok_or_else(|| McpError::invalid_params("Missing params"))?;

    let name = params.get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    match name {
        "load_units" => tool_load_units(catalog, &args).await,
        "catalog_status" => Ok(tool_catalog_status(catalog)),
        "resolve_unit" => tool_resolve_unit(catalog, &args),
        "search_units" => tool_search_units(catalog, &args),
        "group_units" => Ok(tool_group_units(catalog, &args)),
        "convert" => tool_convert(catalog, &args),
        "to_base" => tool_to_base(catalog, &args),
        "compatible_units" => tool_compatible_units(catalog, &args),
        _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
    }
}

// ============ load / status ============

async fn tool_load_units(catalog: &UnitCatalog, args: &JsonValue) -> Result<JsonValue, McpError> {
    let refresh = args.get("refresh").and_then(|v| v.as_bool()).unwrap_or(false);
    let outcome = if refresh { catalog.refresh().await } else { catalog.load().await };

    Ok(match outcome {
        Ok(snapshot) => {
            let text = format!(
                "Loaded {} units in {} categories (version {}, {} data issues)",
                snapshot.units().len(),
                snapshot.categories().len(),
                snapshot.version(),
                snapshot.issues().len()
            );
            json!({
                "content": [{ "type": "text", "text": text }],
                "status": catalog.status()
            })
        }
        Err(err) => error_result(&err),
    })
}

fn tool_catalog_status(catalog: &UnitCatalog) -> JsonValue {
    let status = catalog.status();
    let text = if status.is_loading {
        "Catalog is loading".to_string()
    } else if let Some(ref err) = status.last_error {
        format!("Last load failed: {}", err.user_message())
    } else if status.loaded {
        format!("Catalog loaded: {} units", status.unit_count)
    } else {
        "Catalog not loaded".to_string()
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "status": status
    })
}

// ============ resolve / search ============

fn tool_resolve_unit(catalog: &UnitCatalog, args: &JsonValue) -> Result<JsonValue, McpError> {
    let resolved = if let Some(id) = args.get("id").and_then(|v| v.as_u64()) {
        catalog.by_id(UnitId(id))
    } else if let Some(reference) = args.get("reference").and_then(|v| v.as_str()) {
        catalog.resolve(reference)
    } else {
        return Err(McpError::invalid_params("Provide 'id' or 'reference'"));
    };

    Ok(match resolved {
        Ok(unit) => json!({
            "content": [{ "type": "text", "text": describe_unit(catalog, &unit) }],
            "unit": unit
        }),
        Err(err) => error_result(&err),
    })
}

fn tool_search_units(catalog: &UnitCatalog, args: &JsonValue) -> Result<JsonValue, McpError> {
    let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
    let category = args.get("category").and_then(|v| v.as_str());

    let unit_type = match args.get("unit_type") {
        None | Some(JsonValue::Null) => None,
        Some(tag) => {
            let tag = tag.as_str().ok_or_else(|| McpError::invalid_params("unit_type must be a string"))?;
            let unit_type = UnitType::from_tag(tag)
                .ok_or_else(|| McpError::invalid_params(format!("Unknown unit_type: {}", tag)))?;
            Some(unit_type)
        }
    };

    let mut units = catalog.search(query, category);
    if let Some(unit_type) = unit_type {
        units.retain(|u| u.unit_type == unit_type);
    }

    let lines: Vec<String> = units.iter().map(|u| format!("- {} [{}]", u.label(), u.id)).collect();
    let text = if lines.is_empty() {
        "No matching units".to_string()
    } else {
        lines.join("\n")
    };

    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "units": units
    }))
}

fn tool_group_units(catalog: &UnitCatalog, args: &JsonValue) -> JsonValue {
    let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
    let category = args.get("category").and_then(|v| v.as_str());
    let groups = catalog.grouped(query, category);

    let mut text = String::new();
    for (name, units) in &groups {
        text.push_str(&format!("## {}\n", name));
        for unit in units {
            text.push_str(&format!("- {} [{}]\n", unit.label(), unit.id));
        }
    }

    let data: Vec<JsonValue> = groups
        .iter()
        .map(|(name, units)| json!({ "category": name, "units": units }))
        .collect();

    json!({
        "content": [{ "type": "text", "text": text }],
        "groups": data
    })
}

// ============ conversion ============

fn tool_convert(catalog: &UnitCatalog, args: &JsonValue) -> Result<JsonValue, McpError> {
    let value = number_arg(args, "value")?;
    let from = optional_unit_arg(args, "from")?;
    let to = optional_unit_arg(args, "to")?;
    Ok(conversion_result(catalog.convert_selection(value, from, to)))
}

fn tool_to_base(catalog: &UnitCatalog, args: &JsonValue) -> Result<JsonValue, McpError> {
    let value = number_arg(args, "value")?;
    let unit = unit_arg(args, "unit")?;
    let snapshot = catalog.snapshot();
    Ok(conversion_result(Converter::new(&snapshot).to_base(value, unit)))
}

fn tool_compatible_units(catalog: &UnitCatalog, args: &JsonValue) -> Result<JsonValue, McpError> {
    let unit = unit_arg(args, "unit")?;
    let snapshot = catalog.snapshot();
    Ok(match Converter::new(&snapshot).compatible_units(unit) {
        Ok(units) => {
            let symbols: Vec<&str> = units.iter().map(|u| u.symbol.as_str()).collect();
            json!({
                "content": [{ "type": "text", "text": symbols.join(", ") }],
                "units": units
            })
        }
        Err(err) => error_result(&err),
    })
}

fn conversion_result(outcome: Result<ConversionResult, ClassifiedError>) -> JsonValue {
    match outcome {
        Ok(conversion) => {
            let mut text = conversion.formula.clone().unwrap_or_default();
            if conversion.is_identity() {
                text.push_str("\nSource and target are the same unit; nothing to convert.");
            }
            json!({
                "content": [{ "type": "text", "text": text }],
                "conversion": conversion,
                "display": conversion.display_result()
            })
        }
        Err(err) => error_result(&err),
    }
}

// ============ helpers ============

fn number_arg(args: &JsonValue, name: &str) -> Result<f64, McpError> {
    match args.get(name) {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .ok_or_else(|| McpError::invalid_params(format!("'{}' is out of range", name))),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| McpError::invalid_params(format!("'{}' must be a number", name))),
        Some(_) => Err(McpError::invalid_params(format!("'{}' must be a number", name))),
        None => Err(McpError::invalid_params(format!("Missing {} argument", name))),
    }
}

fn unit_arg(args: &JsonValue, name: &str) -> Result<UnitId, McpError> {
    args.get(name)
        .and_then(|v| v.as_u64())
        .map(UnitId)
        .ok_or_else(|| McpError::invalid_params(format!("Missing {} argument", name)))
}

/// Absent or null means "not selected"; anything else must be a unit id
fn optional_unit_arg(args: &JsonValue, name: &str) -> Result<Option<UnitId>, McpError> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|id| Some(UnitId(id)))
            .ok_or_else(|| McpError::invalid_params(format!("'{}' must be a unit id", name))),
    }
}

fn describe_unit(catalog: &UnitCatalog, unit: &Unit) -> String {
    let snapshot = catalog.snapshot();
    let category = snapshot.category_name(unit.category_id).unwrap_or("unknown");
    let mut text = format!("{} in {} ({})", unit.label(), category, unit.unit_type);
    if let Some(ref region) = unit.region {
        text.push_str(&format!(", {}", region));
    }
    if !unit.is_active {
        text.push_str(", inactive");
    }
    text
}

/// Tool-level failure: the classified error travels as data
fn error_result(err: &ClassifiedError) -> JsonValue {
    let mut text = err.user_message().to_string();
    for suggestion in err.suggestions() {
        text.push_str(&format!("\n- {}", suggestion));
    }
    if err.is_retryable() {
        text.push_str("\n(retry available)");
    }
    json!({
        "content": [{ "type": "text", "text": text }],
        "error": err,
        "isError": true
    })
}
