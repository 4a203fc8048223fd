// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};

use crate::errors::SocketError;

/// Shape of one field of a structured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name as written in the schema
    pub name: String,
    /// Formatted kind: a scalar name, a message full name, `[]T` or `map[K]V`
    pub kind: String,
    /// Singular message field, decomposed recursively rather than stored as
    /// a raw value
    pub is_message: bool,
}

/// Reflective access to a structured message whose schema is only known at
/// runtime.
///
/// Field values cross this boundary as JSON, which is also the encoding
/// stored in socket raw values.
pub trait MessageFields: Send {
    /// Fully qualified name of the message type.
    fn full_name(&self) -> String;

    /// Every field of the message, in schema order.
    fn describe_fields(&self) -> Vec<FieldSchema>;

    /// JSON encoding of every field's current value keyed by field name,
    /// scalar and collection defaults included. Unset singular message
    /// fields are omitted; reach them through [`MessageFields::nested`].
    fn field_values(&self) -> Result<Map<String, Value>, SocketError>;

    /// Set every field named in `patch` from its JSON value in one pass.
    /// Fields absent from the patch are left untouched.
    fn merge_fields(&mut self, patch: Map<String, Value>) -> Result<(), SocketError>;

    /// A copy of a singular message field, or `None` if the field is not a
    /// message.
    fn nested(&self, name: &str) -> Option<Box<dyn MessageFields>>;

    /// Mutable access to a singular message field, initializing it when
    /// unset.
    fn nested_mut(&mut self, name: &str) -> Option<&mut dyn MessageFields>;

    /// Binary encoding of the whole message.
    fn encode(&self) -> Vec<u8>;

    /// Reset a field to its default value.
    fn clear_field(&mut self, name: &str);
}
