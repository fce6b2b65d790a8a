//! Detection of the shapes a saved drawing can arrive in.
//!
//! A persisted `canvas_data` value is one of:
//! - a normalized document (`{ paths, metadata: { normalized: true, .. } }`)
//! - a legacy bare array of pixel-space strokes
//! - a JSON string encoding either of the above
//!
//! [`classify`] turns an untyped value into a [`CanvasInput`] so callers can
//! dispatch on the tag instead of re-probing the value. Strokes are read one
//! at a time; an unreadable stroke is set aside in [`StrokeList::rejected`]
//! without costing the rest of the drawing.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{CanvasMetadata, Stroke};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Canvas data string is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Canvas data has malformed metadata: {0}")]
    MalformedMetadata(#[source] serde_json::Error),
    #[error("Canvas data paths must be an array, found {kind}")]
    PathsNotArray { kind: &'static str },
    #[error("Unrecognized canvas data: {kind}")]
    Unrecognized { kind: &'static str },
}

/// A stored stroke that did not deserialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedStroke {
    /// Position in the stored array
    pub index: usize,
    pub message: String,
}

/// Strokes read from a stored array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeList {
    /// Readable strokes, in stored order
    pub strokes: Vec<Stroke>,
    pub rejected: Vec<RejectedStroke>,
}

impl StrokeList {
    fn parse(items: &[Value]) -> Self {
        let mut list = Self::default();
        for (index, item) in items.iter().enumerate() {
            match Stroke::deserialize(item) {
                Ok(stroke) => list.strokes.push(stroke),
                Err(err) => list.rejected.push(RejectedStroke {
                    index,
                    message: err.to_string(),
                }),
            }
        }
        list
    }
}

/// A classified drawing document
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasInput {
    /// No drawing stored
    Empty,
    /// Current format, points in unit space
    Normalized {
        metadata: CanvasMetadata,
        paths: StrokeList,
    },
    /// Pre-normalization strokes in some unknown pixel space
    Legacy(StrokeList),
}

/// True iff `data` is an object whose `metadata` object has `normalized: true`
pub fn is_normalized_data(data: &Value) -> bool {
    data.as_object()
        .and_then(|obj| obj.get("metadata"))
        .and_then(Value::as_object)
        .and_then(|metadata| metadata.get("normalized"))
        .is_some_and(|normalized| *normalized == Value::Bool(true))
}

/// True iff `data` is an array, including an empty one
pub fn is_legacy_paths_array(data: &Value) -> bool {
    data.is_array()
}

/// Values treated as "nothing saved"
fn is_blank(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn kind_of(data: &Value) -> &'static str {
    match data {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn classify_normalized(data: &Value) -> Result<CanvasInput, FormatError> {
    let metadata =
        CanvasMetadata::deserialize(&data["metadata"]).map_err(FormatError::MalformedMetadata)?;
    let paths = match data.get("paths") {
        None | Some(Value::Null) => StrokeList::default(),
        Some(Value::Array(items)) => StrokeList::parse(items),
        Some(other) => return Err(FormatError::PathsNotArray { kind: kind_of(other) }),
    };
    Ok(CanvasInput::Normalized { metadata, paths })
}

/// Classify an untyped drawing value.
///
/// Checks run in order and the first match wins: blank, normalized,
/// legacy array, serialized string (parsed and classified again), and
/// anything else is [`FormatError::Unrecognized`].
pub fn classify(data: &Value) -> Result<CanvasInput, FormatError> {
    if is_blank(data) {
        return Ok(CanvasInput::Empty);
    }

    if is_normalized_data(data) {
        return classify_normalized(data);
    }

    if let Value::Array(items) = data {
        return Ok(CanvasInput::Legacy(StrokeList::parse(items)));
    }

    if let Value::String(raw) = data {
        // Each pass consumes one layer of quoting, so nesting always ends.
        let parsed: Value = serde_json::from_str(raw)?;
        return classify(&parsed);
    }

    Err(FormatError::Unrecognized { kind: kind_of(data) })
}
