// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! [`MessageFields`] backed by `prost-reflect` dynamic messages.

use prost::Message;
use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, ReflectMessage, SerializeOptions};
use serde_json::{Map, Value};

use crate::errors::SocketError;
use crate::traits::{FieldSchema, MessageFields};

fn json_options() -> SerializeOptions {
    SerializeOptions::new()
        .skip_default_fields(false)
        .use_proto_field_name(true)
}

fn is_singular_message(field: &FieldDescriptor) -> bool {
    !field.is_list() && !field.is_map() && matches!(field.kind(), Kind::Message(_))
}

fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".to_string(),
        Kind::Float => "float".to_string(),
        Kind::Int32 => "int32".to_string(),
        Kind::Int64 => "int64".to_string(),
        Kind::Uint32 => "uint32".to_string(),
        Kind::Uint64 => "uint64".to_string(),
        Kind::Sint32 => "sint32".to_string(),
        Kind::Sint64 => "sint64".to_string(),
        Kind::Fixed32 => "fixed32".to_string(),
        Kind::Fixed64 => "fixed64".to_string(),
        Kind::Sfixed32 => "sfixed32".to_string(),
        Kind::Sfixed64 => "sfixed64".to_string(),
        Kind::Bool => "bool".to_string(),
        Kind::String => "string".to_string(),
        Kind::Bytes => "bytes".to_string(),
        Kind::Message(message) => message.full_name().to_string(),
        Kind::Enum(enumeration) => enumeration.full_name().to_string(),
    }
}

/// Kind string stored in sockets: `[]T` for lists, `map[K]V` for maps.
pub fn format_field_kind(field: &FieldDescriptor) -> String {
    if field.is_map() {
        if let Kind::Message(entry) = field.kind() {
            return format!(
                "map[{}]{}",
                format_field_kind(&entry.map_entry_key_field()),
                format_field_kind(&entry.map_entry_value_field())
            );
        }
    }

    let kind = kind_name(&field.kind());
    if field.is_list() {
        format!("[]{}", kind)
    } else {
        kind
    }
}

impl MessageFields for DynamicMessage {
    fn full_name(&self) -> String {
        self.descriptor().full_name().to_string()
    }

    fn describe_fields(&self) -> Vec<FieldSchema> {
        self.descriptor()
            .fields()
            .map(|field| FieldSchema {
                name: field.name().to_string(),
                kind: format_field_kind(&field),
                is_message: is_singular_message(&field),
            })
            .collect()
    }

    fn field_values(&self) -> Result<Map<String, Value>, SocketError> {
        let encoded = self
            .serialize_with_options(serde_json::value::Serializer, &json_options())
            .map_err(|e| SocketError::Decomposition {
                message: self.full_name(),
                reason: e.to_string(),
            })?;

        match encoded {
            Value::Object(fields) => Ok(fields),
            other => Err(SocketError::Decomposition {
                message: self.full_name(),
                reason: format!("expected a json object, received {}", other),
            }),
        }
    }

    fn merge_fields(&mut self, patch: Map<String, Value>) -> Result<(), SocketError> {
        if patch.is_empty() {
            return Ok(());
        }

        let descriptor = self.descriptor();
        let keys: Vec<String> = patch.keys().cloned().collect();
        let patch = Value::Object(patch);
        let rejected = |reason: String| SocketError::PatchRejected {
            message: descriptor.full_name().to_string(),
            patch: patch.to_string(),
            reason,
        };

        let parsed = DynamicMessage::deserialize(descriptor.clone(), patch.clone())
            .map_err(|e| rejected(e.to_string()))?;

        for key in keys {
            let field = descriptor
                .get_field_by_name(&key)
                .or_else(|| descriptor.get_field_by_json_name(&key))
                .ok_or_else(|| rejected(format!("unknown field {}", key)))?;
            self.set_field(&field, parsed.get_field(&field).into_owned());
        }

        Ok(())
    }

    fn nested(&self, name: &str) -> Option<Box<dyn MessageFields>> {
        let field = self.descriptor().get_field_by_name(name)?;
        if !is_singular_message(&field) {
            return None;
        }

        self.get_field(&field)
            .as_message()
            .cloned()
            .map(|message| Box::new(message) as Box<dyn MessageFields>)
    }

    fn nested_mut(&mut self, name: &str) -> Option<&mut dyn MessageFields> {
        let field = self.descriptor().get_field_by_name(name)?;
        if !is_singular_message(&field) {
            return None;
        }

        self.get_field_mut(&field)
            .as_message_mut()
            .map(|message| message as &mut dyn MessageFields)
    }

    fn encode(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    fn clear_field(&mut self, name: &str) {
        if let Some(field) = self.descriptor().get_field_by_name(name) {
            DynamicMessage::clear_field(self, &field);
        }
    }
}
