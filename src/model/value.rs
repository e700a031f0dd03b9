// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime values flowing between node ports.
//!
//! Every value published by a node or fed into a node is a [`Value`]: a
//! JSON-serializable sum of scalars, arrays, objects, and object references.
//! Functions, cycles, and opaque handles cannot be represented, which keeps
//! every value safe to cross the durable-step boundary and the persisted
//! execution record.
//!
//! An [`ObjectReference`] stands in for binary content held in the object
//! store. Parameter transformation swaps references for [`InlineBlob`] object
//! forms (base64 payloads) on the way into a node and back into stored
//! references on the way out.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An opaque handle to bytes held in the object store.
///
/// The pair of `id` and `mime_type` is assigned by the store when the bytes
/// are written. References serialize as plain objects, so a reference is
/// itself a valid [`Value`] and can travel through outputs, inputs, and the
/// persisted record unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectReference {
    pub id: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// A JSON-serializable runtime value.
///
/// Deserialization is untagged: a JSON object whose fields are exactly those
/// of [`ObjectReference`] becomes a `Ref`; any other object becomes an
/// `Object`. Variant order matters for that distinction and must not be
/// rearranged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Ref(ObjectReference),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Numeric view of the value, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean view of the value, if it is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String view of the value, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Array view of the value, if it is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Object-reference view of the value, if it is a reference.
    pub fn as_ref_value(&self) -> Option<&ObjectReference> {
        match self {
            Value::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectReference> for Value {
    fn from(reference: ObjectReference) -> Self {
        Value::Ref(reference)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Binary content carried inline as a value.
///
/// The object form is `{ "data": <base64>, "mimeType": <string>,
/// "filename"?: <string> }`. Input transformation produces this form when a
/// binary port receives an [`ObjectReference`]; output transformation
/// recognizes it and materializes the bytes back into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub filename: Option<String>,
}

impl InlineBlob {
    const DATA_KEY: &'static str = "data";
    const MIME_TYPE_KEY: &'static str = "mimeType";
    const FILENAME_KEY: &'static str = "filename";

    /// Encode the blob into its inline object form.
    pub fn into_value(self) -> Value {
        let mut fields = BTreeMap::new();
        fields.insert(
            Self::DATA_KEY.to_string(),
            Value::String(STANDARD.encode(&self.data)),
        );
        fields.insert(
            Self::MIME_TYPE_KEY.to_string(),
            Value::String(self.mime_type),
        );
        if let Some(filename) = self.filename {
            fields.insert(Self::FILENAME_KEY.to_string(), Value::String(filename));
        }
        Value::Object(fields)
    }

    /// Decode a value in inline object form back into a blob.
    ///
    /// Returns `None` when the value is not an object, lacks the `data` or
    /// `mimeType` fields, or the payload is not valid base64.
    pub fn from_value(value: &Value) -> Option<InlineBlob> {
        let fields = match value {
            Value::Object(fields) => fields,
            _ => return None,
        };

        let data = fields.get(Self::DATA_KEY)?.as_str()?;
        let mime_type = fields.get(Self::MIME_TYPE_KEY)?.as_str()?;
        let filename = fields
            .get(Self::FILENAME_KEY)
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let data = STANDARD.decode(data).ok()?;

        Some(InlineBlob {
            data,
            mime_type: mime_type.to_string(),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_reference_roundtrip() {
        let reference = ObjectReference {
            id: "obj-1".to_string(),
            mime_type: "image/png".to_string(),
            filename: Some("chart.png".to_string()),
        };

        let json = serde_json::to_string(&Value::Ref(reference.clone())).unwrap();
        assert!(json.contains("\"mimeType\""));

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Ref(reference));
    }

    #[test]
    fn test_plain_object_does_not_parse_as_reference() {
        let json = r#"{"id":"x","mimeType":"text/plain","extra":true}"#;
        let value: Value = serde_json::from_str(json).unwrap();

        // The extra field disqualifies the reference shape
        assert!(matches!(value, Value::Object(_)));
    }

    #[test]
    fn test_scalar_parsing() {
        let value: Value = serde_json::from_str("42").unwrap();
        assert_eq!(value.as_number(), Some(42.0));

        let value: Value = serde_json::from_str("null").unwrap();
        assert!(value.is_null());

        let value: Value = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(value.as_str(), Some("text"));
    }

    #[test]
    fn test_nested_array_roundtrip() {
        let value = Value::Array(vec![
            Value::Number(1.0),
            Value::Array(vec![Value::Bool(true), Value::Null]),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_inline_blob_roundtrip() {
        let blob = InlineBlob {
            data: b"binary payload".to_vec(),
            mime_type: "application/octet-stream".to_string(),
            filename: None,
        };

        let value = blob.clone().into_value();
        let back = InlineBlob::from_value(&value).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn test_inline_blob_rejects_non_blob_objects() {
        let mut fields = BTreeMap::new();
        fields.insert("data".to_string(), Value::Number(1.0));
        assert!(InlineBlob::from_value(&Value::Object(fields)).is_none());
        assert!(InlineBlob::from_value(&Value::Null).is_none());
    }
}
