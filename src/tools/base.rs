// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::proto;
use crate::tools::Socket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ToolStatus {
    #[default]
    Initializing,
    Initialized,
    Running,
    Paused,
    Error,
    Invalid,
}

impl From<i32> for ToolStatus {
    fn from(value: i32) -> Self {
        match value {
            1 => ToolStatus::Initialized,
            2 => ToolStatus::Running,
            3 => ToolStatus::Paused,
            4 => ToolStatus::Error,
            5 => ToolStatus::Invalid,
            _ => ToolStatus::Initializing,
        }
    }
}

impl From<ToolStatus> for i32 {
    fn from(status: ToolStatus) -> Self {
        match status {
            ToolStatus::Initializing => 0,
            ToolStatus::Initialized => 1,
            ToolStatus::Running => 2,
            ToolStatus::Paused => 3,
            ToolStatus::Error => 4,
            ToolStatus::Invalid => 5,
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolStatus::Initializing => "initializing",
            ToolStatus::Initialized => "initialized",
            ToolStatus::Running => "running",
            ToolStatus::Paused => "paused",
            ToolStatus::Error => "error",
            ToolStatus::Invalid => "invalid",
        };
        write!(f, "{}", name)
    }
}

/// Fields shared by every tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolBase {
    /// Unique id, generated once and never patched
    pub id: String,
    pub name: Option<String>,
    pub label: Option<String>,
    pub tooltip: Option<String>,
    pub status: ToolStatus,
    pub input: Socket,
    pub output: Socket,
    /// Append-only log lines keyed by sequence number
    pub logs: BTreeMap<u32, String>,
}

impl Default for ToolBase {
    fn default() -> Self {
        ToolBase {
            id: Uuid::new_v4().to_string(),
            name: None,
            label: None,
            tooltip: None,
            status: ToolStatus::default(),
            input: Socket::default(),
            output: Socket::default(),
            logs: BTreeMap::new(),
        }
    }
}

fn patch_text(current: &mut Option<String>, patch: &Option<String>) -> bool {
    match patch {
        Some(value) if !value.is_empty() && current.as_ref() != Some(value) => {
            *current = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// "log_message" -> "Log Message"
fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl ToolBase {
    pub fn named(name: impl Into<String>) -> Self {
        let mut base = ToolBase::default();
        base.update(&ToolBase {
            name: Some(name.into()),
            ..ToolBase::default()
        });
        base
    }

    /// Name of the tool, or its id when unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Merge `patch` into this base and report whether anything changed.
    ///
    /// Text fields are only overwritten by non-empty values, the status only
    /// by a non-default one. Logs are unioned and never overwritten.
    pub fn update(&mut self, patch: &ToolBase) -> bool {
        let mut patched = false;

        patched |= patch_text(&mut self.name, &patch.name);
        patched |= patch_text(&mut self.label, &patch.label);
        patched |= patch_text(&mut self.tooltip, &patch.tooltip);

        if self.label.is_none() {
            if let Some(name) = &self.name {
                self.label = Some(title_case(name));
                patched = true;
            }
        }

        if patch.status != ToolStatus::Initializing && patch.status != self.status {
            self.status = patch.status;
            patched = true;
        }

        for (sequence, line) in &patch.logs {
            if !self.logs.contains_key(sequence) {
                self.logs.insert(*sequence, line.clone());
                patched = true;
            }
        }

        patched |= self.input.update(&patch.input);
        patched |= self.output.update(&patch.output);

        patched
    }
}

impl From<proto::ToolBase> for ToolBase {
    fn from(base: proto::ToolBase) -> Self {
        let id = if base.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            base.id
        };

        let mut converted = ToolBase {
            id,
            name: None,
            label: None,
            tooltip: None,
            status: ToolStatus::from(base.status),
            input: base.input.map(Socket::from).unwrap_or_default(),
            output: base.output.map(Socket::from).unwrap_or_default(),
            logs: base.logs.into_iter().collect(),
        };
        patch_text(&mut converted.name, &base.name);
        patch_text(&mut converted.label, &base.label);
        patch_text(&mut converted.tooltip, &base.tooltip);
        if converted.label.is_none() {
            converted.label = converted.name.as_deref().map(title_case);
        }
        converted
    }
}

impl From<ToolBase> for proto::ToolBase {
    fn from(base: ToolBase) -> Self {
        proto::ToolBase {
            id: base.id,
            name: base.name,
            label: base.label,
            tooltip: base.tooltip,
            status: base.status.into(),
            input: Some(base.input.into()),
            output: Some(base.output.into()),
            logs: base.logs.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ToolBase::default().id, ToolBase::default().id);
    }

    #[test]
    fn test_label_synthesized_from_name() {
        let base = ToolBase::named("log_message");
        assert_eq!(base.name.as_deref(), Some("log_message"));
        assert_eq!(base.label.as_deref(), Some("Log Message"));
    }

    #[test]
    fn test_explicit_label_is_kept() {
        let mut base = ToolBase::default();
        base.update(&ToolBase {
            name: Some("log".to_string()),
            label: Some("Print".to_string()),
            ..ToolBase::default()
        });
        assert_eq!(base.label.as_deref(), Some("Print"));
    }

    #[test]
    fn test_update_reports_changes() {
        let mut base = ToolBase::named("log");
        let id = base.id.clone();

        let patch = ToolBase {
            status: ToolStatus::Running,
            tooltip: Some("Print a message".to_string()),
            logs: BTreeMap::from([(0, "DEBUG: hello".to_string())]),
            ..ToolBase::default()
        };
        assert!(base.update(&patch));
        assert!(!base.update(&patch));

        assert_eq!(base.id, id);
        assert_eq!(base.status, ToolStatus::Running);
        assert_eq!(base.logs.get(&0).map(String::as_str), Some("DEBUG: hello"));
    }

    #[test]
    fn test_logs_are_append_only() {
        let mut base = ToolBase::default();
        base.update(&ToolBase {
            logs: BTreeMap::from([(0, "first".to_string())]),
            ..ToolBase::default()
        });
        base.update(&ToolBase {
            logs: BTreeMap::from([(0, "overwritten".to_string()), (1, "second".to_string())]),
            ..ToolBase::default()
        });

        assert_eq!(base.logs.len(), 2);
        assert_eq!(base.logs[&0], "first");
        assert_eq!(base.logs[&1], "second");
    }

    #[test]
    fn test_update_cascades_into_sockets() {
        let mut base = ToolBase::default();
        let patch = ToolBase {
            input: Socket::default().with_field("message", Socket::raw("string", &json!("hi"))),
            ..ToolBase::default()
        };

        assert!(base.update(&patch));
        assert_eq!(base.input.to_json(), json!({"message": "hi"}));
    }

    #[test]
    fn test_proto_conversion_keeps_id() {
        let wire = proto::ToolBase {
            id: "abc".to_string(),
            name: Some("log".to_string()),
            status: 2,
            ..Default::default()
        };

        let base = ToolBase::from(wire);
        assert_eq!(base.id, "abc");
        assert_eq!(base.status, ToolStatus::Running);
        assert_eq!(base.label.as_deref(), Some("Log"));
    }
}
