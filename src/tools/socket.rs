// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Nested key/value container carrying tool inputs and outputs.
//!
//! A socket either holds a terminal value (JSON bytes, or a link placeholder)
//! or a tree of named fields. Sockets are converted to and from structured
//! messages through [`MessageFields`], so the engine never needs compile-time
//! knowledge of a worker's schema.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::SocketError;
use crate::proto;
use crate::traits::MessageFields;

/// Terminal value of a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketValue {
    /// JSON encoded value
    Raw(Vec<u8>),
    /// Reference to another socket's value. Not resolved yet.
    Link(String),
}

impl SocketValue {
    pub fn is_empty(&self) -> bool {
        match self {
            SocketValue::Raw(raw) => raw.is_empty(),
            SocketValue::Link(link) => link.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Socket {
    pub kind: String,
    pub value: Option<SocketValue>,
    pub fields: BTreeMap<String, Socket>,
}

impl Socket {
    /// Terminal socket holding a JSON value.
    pub fn raw(kind: impl Into<String>, value: &Value) -> Self {
        Socket {
            kind: kind.into(),
            value: Some(SocketValue::Raw(value.to_string().into_bytes())),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Socket) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Merge `patch` into this socket. Empty kinds and values in the patch
    /// are ignored, fields are merged recursively.
    ///
    /// Returns whether anything changed.
    pub fn update(&mut self, patch: &Socket) -> bool {
        let mut patched = false;

        if !patch.kind.is_empty() && patch.kind != self.kind {
            self.kind = patch.kind.clone();
            patched = true;
        }

        if let Some(value) = &patch.value {
            if !value.is_empty() && self.value.as_ref() != Some(value) {
                self.value = Some(value.clone());
                patched = true;
            }
        }

        for (name, field_patch) in &patch.fields {
            match self.fields.get_mut(name) {
                Some(field) => patched |= field.update(field_patch),
                None => {
                    self.fields.insert(name.clone(), field_patch.clone());
                    patched = true;
                }
            }
        }

        patched
    }

    /// Decompose a message into this socket: singular message fields become
    /// nested sockets, every other field is stored as its JSON value tagged
    /// with the field kind.
    pub fn update_with_message(&mut self, message: &dyn MessageFields) -> Result<(), SocketError> {
        self.update_with_message_excluding(message, &[])
    }

    /// Same as [`Socket::update_with_message`], leaving the top-level fields
    /// named in `excluded` out of the socket.
    pub fn update_with_message_excluding(
        &mut self,
        message: &dyn MessageFields,
        excluded: &[&str],
    ) -> Result<(), SocketError> {
        self.kind = message.full_name();
        let values = message.field_values()?;

        for field in message.describe_fields() {
            if excluded.contains(&field.name.as_str()) {
                continue;
            }
            let mut field_socket = Socket::default();

            if field.is_message {
                if let Some(nested) = message.nested(&field.name) {
                    field_socket.update_with_message(nested.as_ref())?;
                }
            } else {
                let Some(value) = values.get(&field.name) else {
                    continue;
                };
                let raw = serde_json::to_vec(value).map_err(|source| SocketError::FieldEncoding {
                    message: message.full_name(),
                    field: field.name.clone(),
                    source,
                })?;
                field_socket.kind = field.kind;
                field_socket.value = Some(SocketValue::Raw(raw));
            }

            self.fields.insert(field.name, field_socket);
        }

        Ok(())
    }

    /// Write the socket's values into a message.
    ///
    /// Every non-message field is merged in a single patch before nested
    /// messages are visited: the patch rewrites whole fields, so applying it
    /// after the nested writes would discard them.
    pub fn apply_fields_to_message(&self, message: &mut dyn MessageFields) -> Result<(), SocketError> {
        if self.fields.is_empty() {
            return self.apply_value_to_message(message);
        }

        let mut patch = Map::new();
        let mut nested = Vec::new();

        for field in message.describe_fields() {
            let Some(field_socket) = self.fields.get(&field.name) else {
                continue;
            };

            if field.is_message && !field_socket.fields.is_empty() {
                nested.push((field.name, field_socket));
                continue;
            }

            let raw = field_socket.resolve_raw_value();
            if raw.is_empty() {
                continue;
            }
            let value = serde_json::from_slice(raw).map_err(|source| SocketError::InvalidRawValue {
                message: message.full_name(),
                field: field.name.clone(),
                source,
            })?;
            patch.insert(field.name, value);
        }

        message.merge_fields(patch)?;

        for (name, field_socket) in nested {
            if let Some(nested_message) = message.nested_mut(&name) {
                field_socket.apply_fields_to_message(nested_message)?;
            }
        }

        Ok(())
    }

    // A terminal socket targeting a whole message carries a JSON object
    fn apply_value_to_message(&self, message: &mut dyn MessageFields) -> Result<(), SocketError> {
        let raw = self.resolve_raw_value();
        if raw.is_empty() {
            return Ok(());
        }

        let value: Value = serde_json::from_slice(raw).map_err(|source| SocketError::InvalidRawValue {
            message: message.full_name(),
            field: String::new(),
            source,
        })?;

        match value {
            Value::Object(fields) => message.merge_fields(fields),
            other => Err(SocketError::PatchRejected {
                message: message.full_name(),
                patch: other.to_string(),
                reason: "expected a json object".to_string(),
            }),
        }
    }

    /// Raw bytes of a terminal socket. Links are not resolved yet and yield
    /// an empty value.
    pub fn resolve_raw_value(&self) -> &[u8] {
        match &self.value {
            Some(SocketValue::Raw(raw)) => raw,
            Some(SocketValue::Link(_)) | None => &[],
        }
    }

    /// The socket as plain JSON: fields become an object, terminal values are
    /// decoded. Undecodable or missing values become `null`.
    pub fn to_json(&self) -> Value {
        if !self.fields.is_empty() {
            return Value::Object(
                self.fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.to_json()))
                    .collect(),
            );
        }

        serde_json::from_slice(self.resolve_raw_value()).unwrap_or(Value::Null)
    }
}

impl From<proto::Socket> for Socket {
    fn from(socket: proto::Socket) -> Self {
        let value = socket.value.map(|value| match value {
            proto::zorro::tools::socket::Value::Raw(raw) => SocketValue::Raw(raw),
            proto::zorro::tools::socket::Value::Link(link) => SocketValue::Link(link),
        });

        Socket {
            kind: socket.kind,
            value,
            fields: socket
                .fields
                .into_iter()
                .map(|(name, field)| (name, Socket::from(field)))
                .collect(),
        }
    }
}

impl From<Socket> for proto::Socket {
    fn from(socket: Socket) -> Self {
        let value = socket.value.map(|value| match value {
            SocketValue::Raw(raw) => proto::zorro::tools::socket::Value::Raw(raw),
            SocketValue::Link(link) => proto::zorro::tools::socket::Value::Link(link),
        });

        proto::Socket {
            kind: socket.kind,
            value,
            fields: socket
                .fields
                .into_iter()
                .map(|(name, field)| (name, proto::Socket::from(field)))
                .collect(),
        }
    }
}
