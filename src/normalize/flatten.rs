//! Recursive flattening of payload trees
//!
//! The free functions work from payload shape alone. [`Normalizer`] walks the
//! same trees guided by an interface's mappings and coerces every value with
//! the wire type its endpoint declares.

use super::tree::Tree;
use super::types::{AggregateSample, PropertyMap, Sample};
use crate::coerce::{coerce_generic, coerce_json, parse_rfc3339, WireType, WireValue};
use crate::error::{Error, Result};
use crate::interface::{join_path, EndpointPattern, InterfaceSchema};
use crate::types::{JsonValue, Timestamp};
use std::collections::BTreeMap;
use tracing::trace;

const VALUE: &str = "value";
const TIMESTAMP: &str = "timestamp";
const RECEPTION_TIMESTAMP: &str = "reception_timestamp";

// ============================================================================
// Shape-driven flattening
// ============================================================================

/// Flatten a properties tree into path-addressed values
///
/// Every nested map extends the path; everything else is a value. `null`
/// leaves are unset properties and are skipped.
pub fn flatten_properties(tree: &Tree, prefix: &str) -> Result<PropertyMap> {
    let mut out = PropertyMap::new();
    collect_properties(tree, prefix, None, &mut out)?;
    Ok(out)
}

/// Flatten a datastream tree into the sample found at each path
///
/// A node whose `value` child is a leaf is a sample record. Other nodes are
/// descended into; non-map children and empty branches are ignored.
pub fn flatten_datastream(tree: &Tree, prefix: &str) -> Result<BTreeMap<String, Sample>> {
    let mut out = BTreeMap::new();
    collect_samples(tree, prefix, None, &mut out)?;
    Ok(out)
}

/// Build an aggregate from one object aggregated record
///
/// Siblings are copied in received order; nested sibling maps are joined
/// with `/`.
pub fn build_aggregate(record: &Tree, path: &str) -> Result<AggregateSample> {
    aggregate_record(record, path, None)
}

/// Parse one individual sample record located at `path`
pub fn parse_sample(record: &Tree, path: &str) -> Result<Sample> {
    sample_record(record, path, None)
}

// ============================================================================
// Schema-driven flattening
// ============================================================================

/// Flattens payloads of one interface using its declared mappings
///
/// Recursion stops at nodes whose path matches a declared endpoint, and the
/// values found there are coerced to the endpoint's wire type. Paths outside
/// every mapping fall back to the shape-driven rules.
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: InterfaceSchema,
    endpoints: Endpoints,
}

impl Normalizer {
    pub fn new(schema: InterfaceSchema) -> Self {
        let endpoints = Endpoints::compile(&schema);
        Self { schema, endpoints }
    }

    pub fn schema(&self) -> &InterfaceSchema {
        &self.schema
    }

    /// Wire type of the endpoint a concrete path addresses
    pub fn wire_type_for(&self, path: &str) -> Option<WireType> {
        self.endpoints.wire_type(path)
    }

    /// Typed properties below `prefix`
    pub fn properties(&self, tree: &Tree, prefix: &str) -> Result<PropertyMap> {
        let mut out = PropertyMap::new();
        collect_properties(tree, prefix, Some(&self.endpoints), &mut out)?;
        Ok(out)
    }

    /// Typed samples below `prefix`, one per endpoint
    pub fn datastream(&self, tree: &Tree, prefix: &str) -> Result<BTreeMap<String, Sample>> {
        let mut out = BTreeMap::new();
        collect_samples(tree, prefix, Some(&self.endpoints), &mut out)?;
        Ok(out)
    }

    /// One sample record for the endpoint at `path`
    pub fn sample(&self, record: &Tree, path: &str) -> Result<Sample> {
        sample_record(record, path, Some(&self.endpoints))
    }

    /// One object aggregated record for the object at `path`
    pub fn aggregate(&self, record: &Tree, path: &str) -> Result<AggregateSample> {
        aggregate_record(record, path, Some(&self.endpoints))
    }
}

/// Endpoint patterns of one interface, compiled once, with their wire types
#[derive(Debug, Clone)]
struct Endpoints(Vec<(EndpointPattern, WireType)>);

impl Endpoints {
    fn compile(schema: &InterfaceSchema) -> Self {
        Self(
            schema
                .mappings
                .iter()
                .map(|m| (m.pattern(), m.wire_type))
                .collect(),
        )
    }

    fn wire_type(&self, path: &str) -> Option<WireType> {
        self.0
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, wire_type)| *wire_type)
    }
}

fn declared_type(endpoints: Option<&Endpoints>, path: &str) -> Option<WireType> {
    endpoints.and_then(|e| e.wire_type(path))
}

// ============================================================================
// Recursion
// ============================================================================

fn collect_properties(
    tree: &Tree,
    path: &str,
    endpoints: Option<&Endpoints>,
    out: &mut PropertyMap,
) -> Result<()> {
    let declared = declared_type(endpoints, path);

    match tree {
        Tree::Node(children) if declared.is_none() => {
            for (key, child) in children {
                collect_properties(child, &join_path(path, key), endpoints, out)?;
            }
            Ok(())
        }
        Tree::Node(_) => Err(Error::decode(format!(
            "Expected a value at '{path}', found a nested object"
        ))),
        Tree::Leaf(JsonValue::Null) => Ok(()),
        leaf => {
            let value = leaf_value(leaf, path, declared)?;
            out.insert(path.to_string(), value);
            Ok(())
        }
    }
}

fn collect_samples(
    tree: &Tree,
    path: &str,
    endpoints: Option<&Endpoints>,
    out: &mut BTreeMap<String, Sample>,
) -> Result<()> {
    let Tree::Node(children) = tree else {
        return Ok(());
    };

    let declared = declared_type(endpoints, path).is_some();
    if declared || is_sample_record(tree) {
        trace!("Sample record at {path}");
        out.insert(path.to_string(), sample_record(tree, path, endpoints)?);
        return Ok(());
    }

    for (key, child) in children.iter().filter(|(_, child)| child.is_node()) {
        collect_samples(child, &join_path(path, key), endpoints, out)?;
    }
    Ok(())
}

fn is_sample_record(node: &Tree) -> bool {
    node.get(VALUE).is_some_and(|value| !value.is_node())
}

fn sample_record(record: &Tree, path: &str, endpoints: Option<&Endpoints>) -> Result<Sample> {
    let wire_type = declared_type(endpoints, path);

    let value = match record.get(VALUE) {
        None | Some(Tree::Leaf(JsonValue::Null)) => {
            return Err(Error::missing_field(path, VALUE))
        }
        Some(Tree::Node(_)) => {
            return Err(Error::decode(format!(
                "Sample value at '{path}' is a nested object"
            )))
        }
        Some(leaf) => leaf_value(leaf, path, wire_type)?,
    };

    let timestamp = required_timestamp(record, path, TIMESTAMP)?;
    let reception_timestamp = match record.get(RECEPTION_TIMESTAMP) {
        Some(field) => timestamp_field(field, path, RECEPTION_TIMESTAMP)?,
        None => timestamp,
    };

    Ok(Sample {
        value,
        timestamp,
        reception_timestamp,
    })
}

fn aggregate_record(
    record: &Tree,
    path: &str,
    endpoints: Option<&Endpoints>,
) -> Result<AggregateSample> {
    if !record.is_node() {
        return Err(Error::decode(format!(
            "Expected an object aggregated record at '{path}'"
        )));
    }

    let timestamp = required_timestamp(record, path, TIMESTAMP)?;
    let mut aggregate = AggregateSample::new(timestamp);

    for (key, child) in record.children() {
        if key == TIMESTAMP || key == RECEPTION_TIMESTAMP {
            continue;
        }
        collect_siblings(child, path, key, endpoints, &mut aggregate.values)?;
    }

    Ok(aggregate)
}

fn collect_siblings(
    tree: &Tree,
    path: &str,
    key: &str,
    endpoints: Option<&Endpoints>,
    out: &mut Vec<(String, WireValue)>,
) -> Result<()> {
    match tree {
        Tree::Node(children) => {
            for (child_key, child) in children {
                collect_siblings(child, path, &format!("{key}/{child_key}"), endpoints, out)?;
            }
            Ok(())
        }
        // A sibling missing from this record
        Tree::Leaf(JsonValue::Null) => Ok(()),
        leaf => {
            let full_path = join_path(path, key);
            let wire_type = declared_type(endpoints, &full_path);
            out.push((key.to_string(), leaf_value(leaf, &full_path, wire_type)?));
            Ok(())
        }
    }
}

// ============================================================================
// Leaves
// ============================================================================

fn leaf_value(leaf: &Tree, path: &str, wire_type: Option<WireType>) -> Result<WireValue> {
    let coerced = match (leaf, wire_type) {
        (Tree::Instant(ts), None | Some(WireType::DateTime)) => return Ok(WireValue::DateTime(*ts)),
        (Tree::Instant(ts), Some(wire_type)) => Err(Error::coercion(
            wire_type,
            ts.to_rfc3339(),
            "an instant is only valid for datetime",
        )),
        (Tree::Leaf(value), Some(wire_type)) => coerce_json(value, wire_type),
        (Tree::Leaf(value), None) => coerce_generic(value),
        (Tree::Node(_), _) => Err(Error::decode(format!(
            "Expected a value at '{path}', found a nested object"
        ))),
    };

    coerced.map_err(|e| match e {
        Error::Coercion {
            wire_type,
            value,
            message,
        } => Error::Coercion {
            wire_type,
            value,
            message: format!("{message} (at '{path}')"),
        },
        other => other,
    })
}

fn required_timestamp(record: &Tree, path: &str, field: &str) -> Result<Timestamp> {
    let value = record
        .get(field)
        .ok_or_else(|| Error::missing_field(path, field))?;
    timestamp_field(value, path, field)
}

fn timestamp_field(value: &Tree, path: &str, field: &str) -> Result<Timestamp> {
    match value {
        Tree::Instant(ts) => Ok(*ts),
        Tree::Leaf(JsonValue::String(raw)) => {
            parse_rfc3339(raw).ok_or_else(|| Error::malformed_timestamp(path, field, raw.as_str()))
        }
        other => Err(Error::malformed_timestamp(
            path,
            field,
            other.to_json().to_string(),
        )),
    }
}
