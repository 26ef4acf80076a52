use std::collections::HashSet;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::dataset::{DEFAULT_IMPORTANCE, Layer, RawDataset, RawEdge, RawEntity, RawMemoryNode};
use super::error::FetchError;

#[derive(Debug, Deserialize)]
struct NodePayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default, alias = "rawText", alias = "raw")]
    raw_text: Option<String>,
    #[serde(default, alias = "extractionSummary")]
    extraction_summary: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EdgePayload {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default, alias = "linkType")]
    link_type: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn unit_interval(value: Option<f64>, default: f32) -> Option<f32> {
    match value {
        None => Some(default),
        Some(value) if value.is_finite() => Some(value.clamp(0.0, 1.0) as f32),
        Some(_) => None,
    }
}

fn narrow_node(payload: NodePayload) -> Result<RawMemoryNode, String> {
    let id = non_empty(payload.id).ok_or("missing id")?;
    let layer = payload
        .layer
        .as_deref()
        .and_then(Layer::parse)
        .ok_or_else(|| format!("memory {id} has unknown layer {:?}", payload.layer))?;
    let importance = unit_interval(payload.importance, DEFAULT_IMPORTANCE)
        .ok_or_else(|| format!("memory {id} has non-finite importance"))?;

    Ok(RawMemoryNode {
        id,
        layer,
        raw_text: payload.raw_text.unwrap_or_default(),
        extraction_summary: non_empty(payload.extraction_summary),
        importance,
        source: payload.source.unwrap_or_default(),
        created_at: payload.created_at,
    })
}

fn narrow_edge(payload: EdgePayload) -> Result<RawEdge, String> {
    let source = non_empty(payload.source).ok_or("edge without source")?;
    let target = non_empty(payload.target).ok_or("edge without target")?;
    let link_type = payload.link_type.unwrap_or_default();
    let confidence = unit_interval(payload.confidence, 0.0)
        .ok_or_else(|| format!("edge {source} -> {target} has non-finite confidence"))?;

    Ok(RawEdge {
        source,
        target,
        link_type,
        confidence,
    })
}

fn records<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Parses a `{ nodes, edges, entities }` document into the strict raw types.
///
/// Individual malformed records are skipped with a warning; only a document
/// that is not JSON or carries no `nodes` array fails as a whole.
pub(super) fn parse_graph_payload(raw: &str) -> Result<RawDataset, FetchError> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|error| FetchError::Parse(format!("invalid JSON: {error}")))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| FetchError::Parse("expected a JSON object at the top level".to_owned()))?;
    if !object.get("nodes").is_some_and(Value::is_array) {
        return Err(FetchError::Parse("missing `nodes` array".to_owned()));
    }

    let mut dataset = RawDataset::default();
    let mut seen_ids = HashSet::new();
    for value in records(object, "nodes") {
        let node = NodePayload::deserialize(value)
            .map_err(|error| error.to_string())
            .and_then(narrow_node);
        match node {
            Ok(node) if seen_ids.insert(node.id.clone()) => dataset.nodes.push(node),
            Ok(node) => warn!("skipping duplicate memory id {}", node.id),
            Err(reason) => warn!("skipping memory record: {reason}"),
        }
    }

    for value in records(object, "edges") {
        let edge = EdgePayload::deserialize(value)
            .map_err(|error| error.to_string())
            .and_then(narrow_edge);
        match edge {
            Ok(edge) => dataset.edges.push(edge),
            Err(reason) => warn!("skipping edge record: {reason}"),
        }
    }

    for value in records(object, "entities") {
        match EntityPayload::deserialize(value) {
            Ok(EntityPayload { name, id }) => match non_empty(name) {
                Some(name) => dataset.entities.push(RawEntity {
                    name,
                    id: non_empty(id),
                }),
                None => warn!("skipping entity record without a name"),
            },
            Err(error) => warn!("skipping entity record: {error}"),
        }
    }

    Ok(dataset)
}
