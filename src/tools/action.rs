// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Composite tools and their dependency-respecting traversal.
//!
//! An [`Action`] owns a set of keyed children, each listing the sibling keys
//! it depends on. Traversal runs a task on the action first, then launches
//! every child whose upstream siblings have all reported, waits for the next
//! report and re-evaluates until every launched child has reported.
//!
//! # Failure semantics
//!
//! A child that fails still counts as reported, so its dependents run. Child
//! errors never stop siblings; they are collected and returned together once
//! the traversal is over. Children whose upstream can never report (missing
//! sibling or cycle) never run and are reported as
//! [`TraversalError::NeverReady`].
//!
//! # Concurrency
//!
//! Ready children are spawned on the tokio runtime. An optional limit caps
//! how many children of one action run at the same time; every action level
//! has its own semaphore so nested actions cannot starve their parents.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use prost_reflect::DynamicMessage;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::errors::{ActionLoadError, TaskError, TraversalError};
use crate::observability::messages::traversal::{ChildFailed, ChildNeverReady, TraversalCompleted};
use crate::observability::messages::StructuredLog;
use crate::proto;
use crate::tools::{traversal_task, Command, CommandQueue, ExecutionType, Tool, ToolBase, TraversalTask};
use crate::traits::Context;

#[derive(Debug, Clone)]
pub struct ActionChild {
    pub tool: Tool,
    /// Keys of the sibling children that must report first
    pub upstream: Vec<String>,
}

impl ActionChild {
    pub fn new(tool: Tool) -> Self {
        ActionChild {
            tool,
            upstream: Vec::new(),
        }
    }

    pub fn after<I, S>(mut self, upstream: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upstream = upstream.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug)]
pub struct Action {
    base: Mutex<ToolBase>,
    children: Mutex<BTreeMap<String, ActionChild>>,
}

/// Keys of the pending children whose upstream siblings all completed.
pub(crate) fn ready_children(
    children: &BTreeMap<String, ActionChild>,
    pending: &BTreeSet<String>,
    completed: &HashSet<String>,
) -> Vec<String> {
    pending
        .iter()
        .filter(|key| {
            children
                .get(*key)
                .map(|child| child.upstream.iter().all(|up| completed.contains(up)))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

impl Action {
    pub fn new(base: ToolBase) -> Self {
        Action {
            base: Mutex::new(base),
            children: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_child(self, key: impl Into<String>, child: ActionChild) -> Self {
        self.children_mut().insert(key.into(), child);
        self
    }

    pub fn base(&self) -> MutexGuard<'_, ToolBase> {
        self.base.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn children_mut(&self) -> MutexGuard<'_, BTreeMap<String, ActionChild>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ToolBase {
        self.base().clone()
    }

    /// Copy of the children map. Children are shared handles.
    pub fn children(&self) -> BTreeMap<String, ActionChild> {
        self.children_mut().clone()
    }

    pub fn name(&self) -> String {
        self.base().display_name().to_string()
    }

    /// Read an action definition from a JSON file. The action is named after
    /// the file stem unless the file names it.
    pub fn load(path: impl AsRef<Path>) -> Result<Action, ActionLoadError> {
        let path = path.as_ref();
        let parse_error = |reason: String| ActionLoadError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|source| ActionLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let pool = proto::descriptor_pool().map_err(|e| parse_error(e.to_string()))?;
        let descriptor = pool
            .get_message_by_name("zorro.tools.Action")
            .ok_or_else(|| parse_error("zorro.tools.Action schema is not available".to_string()))?;

        let mut deserializer = serde_json::Deserializer::from_str(&content);
        let message = DynamicMessage::deserialize(descriptor, &mut deserializer)
            .map_err(|e| parse_error(e.to_string()))?;
        deserializer.end().map_err(|e| parse_error(e.to_string()))?;
        let definition: proto::Action = message
            .transcode_to()
            .map_err(|e| parse_error(e.to_string()))?;

        let stem = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .unwrap_or_default();
        let action = Action::new(ToolBase::named(stem));
        action.update(&Action::from(definition));
        Ok(action)
    }

    /// Merge `patch` into this action: the base is merged, absent children
    /// are added, present children are merged recursively and differing
    /// upstream lists are replaced.
    pub fn update(&self, patch: &Action) -> bool {
        if std::ptr::eq(self, patch) {
            return false;
        }

        let patch_base = patch.snapshot();
        let patch_children = patch.children();
        let mut patched = self.base().update(&patch_base);

        let mut children = self.children_mut();
        for (key, patch_child) in patch_children {
            let Some(child) = children.get_mut(&key) else {
                children.insert(key, patch_child);
                patched = true;
                continue;
            };

            match (&child.tool, &patch_child.tool) {
                (Tool::Action(current), Tool::Action(incoming)) => patched |= current.update(incoming),
                (Tool::Command(current), Tool::Command(incoming)) => patched |= current.update(incoming),
                _ => {
                    child.tool = patch_child.tool.clone();
                    patched = true;
                }
            }

            if child.upstream != patch_child.upstream {
                child.upstream = patch_child.upstream;
                patched = true;
            }
        }

        patched
    }

    /// Run `task` on this action and every descendant, respecting upstream
    /// dependencies, with no limit on concurrently running children.
    pub fn traverse(self: Arc<Self>, task: TraversalTask) -> BoxFuture<'static, Result<(), TraversalError>> {
        self.traverse_bounded(task, None)
    }

    /// Same as [`Action::traverse`], running at most `max_concurrency`
    /// children of each action at the same time.
    pub fn traverse_bounded(
        self: Arc<Self>,
        task: TraversalTask,
        max_concurrency: Option<usize>,
    ) -> BoxFuture<'static, Result<(), TraversalError>> {
        async move {
            let name = self.name();
            task(Tool::Action(self.clone()))
                .await
                .map_err(|source| TraversalError::Task {
                    tool: "action",
                    name: name.clone(),
                    source,
                })?;

            let children = self.children();
            let semaphore = max_concurrency.map(|limit| Arc::new(Semaphore::new(limit.max(1))));
            let mut pending: BTreeSet<String> = children.keys().cloned().collect();
            let mut completed: HashSet<String> = HashSet::new();
            let mut running = JoinSet::new();
            let mut errors = Vec::new();

            loop {
                for key in ready_children(&children, &pending, &completed) {
                    pending.remove(&key);
                    let Some(child) = children.get(&key) else {
                        continue;
                    };
                    let tool = child.tool.clone();
                    let task = task.clone();
                    let semaphore = semaphore.clone();

                    running.spawn(async move {
                        let _permit = match semaphore {
                            Some(semaphore) => semaphore.acquire_owned().await.ok(),
                            None => None,
                        };
                        let result = tool.traverse(task, max_concurrency).await;
                        (key, result)
                    });
                }

                match running.join_next().await {
                    Some(Ok((key, result))) => {
                        if let Err(error) = result {
                            ChildFailed {
                                action: &name,
                                child: &key,
                                error: &error,
                            }
                            .log();
                            errors.push(error);
                        }
                        completed.insert(key);
                    }
                    Some(Err(join_error)) => errors.push(TraversalError::Join {
                        name: name.clone(),
                        reason: join_error.to_string(),
                    }),
                    None => break,
                }
            }

            for key in &pending {
                if let Some(child) = children.get(key) {
                    ChildNeverReady {
                        action: &name,
                        child: key,
                        upstream: &child.upstream,
                    }
                    .log();
                    errors.push(TraversalError::NeverReady {
                        child: key.clone(),
                        upstream: child.upstream.clone(),
                    });
                }
            }

            TraversalCompleted {
                action: &name,
                children: children.len(),
                failed: errors.len(),
            }
            .log();

            if errors.is_empty() {
                Ok(())
            } else {
                Err(TraversalError::Children { name, errors })
            }
        }
        .boxed()
    }

    pub async fn execute(
        self: &Arc<Self>,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), TraversalError> {
        self.run(ExecutionType::Execute, context, queue, None).await
    }

    pub async fn undo(
        self: &Arc<Self>,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), TraversalError> {
        self.run(ExecutionType::Undo, context, queue, None).await
    }

    pub async fn test(
        self: &Arc<Self>,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), TraversalError> {
        self.run(ExecutionType::Test, context, queue, None).await
    }

    /// Run every command of the tree with `execution_type`.
    pub async fn run(
        self: &Arc<Self>,
        execution_type: ExecutionType,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
        max_concurrency: Option<usize>,
    ) -> Result<(), TraversalError> {
        let queue = queue.clone();
        let task = traversal_task(move |tool| {
            let context = context.clone();
            let queue = queue.clone();
            async move {
                match tool {
                    Tool::Command(command) => command
                        .run(execution_type, context, &queue)
                        .await
                        .map_err(|e| Box::new(e) as TaskError),
                    Tool::Action(_) => Ok(()),
                }
            }
        });

        self.clone().traverse_bounded(task, max_concurrency).await
    }
}

impl From<proto::Action> for Action {
    fn from(action: proto::Action) -> Self {
        let converted = Action::new(action.base.map(ToolBase::from).unwrap_or_default());
        {
            let mut children = converted.children_mut();
            for (key, child) in action.children {
                let tool = match child.child {
                    Some(proto::zorro::tools::action_child::Child::Action(action)) => {
                        Tool::Action(Arc::new(Action::from(action)))
                    }
                    Some(proto::zorro::tools::action_child::Child::Command(command)) => {
                        Tool::Command(Arc::new(Command::from(command)))
                    }
                    None => continue,
                };
                children.insert(
                    key,
                    ActionChild {
                        tool,
                        upstream: child.upstream,
                    },
                );
            }
        }
        converted
    }
}

impl From<&Action> for proto::Action {
    fn from(action: &Action) -> Self {
        let children = action
            .children()
            .into_iter()
            .map(|(key, child)| {
                let inner = match &child.tool {
                    Tool::Action(action) => {
                        proto::zorro::tools::action_child::Child::Action(proto::Action::from(action.as_ref()))
                    }
                    Tool::Command(command) => {
                        proto::zorro::tools::action_child::Child::Command(proto::Command::from(command.as_ref()))
                    }
                };
                (
                    key,
                    proto::ActionChild {
                        child: Some(inner),
                        upstream: child.upstream,
                    },
                )
            })
            .collect();

        proto::Action {
            base: Some(action.snapshot().into()),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ProcessorQuery;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn command(name: &str) -> Tool {
        Tool::Command(Arc::new(Command::new(ToolBase::named(name), ProcessorQuery::default())))
    }

    fn action(name: &str, children: Vec<(&str, ActionChild)>) -> Arc<Action> {
        let mut action = Action::new(ToolBase::named(name));
        for (key, child) in children {
            action = action.with_child(key, child);
        }
        Arc::new(action)
    }

    fn child(tool: Tool, upstream: &[&str]) -> ActionChild {
        ActionChild::new(tool).after(upstream.iter().copied())
    }

    fn recording_task(history: Arc<Mutex<Vec<String>>>) -> TraversalTask {
        traversal_task(move |tool| {
            let history = history.clone();
            async move {
                history.lock().unwrap().push(tool.name());
                Ok(())
            }
        })
    }

    fn position(history: &[String], name: &str) -> usize {
        history.iter().position(|entry| entry == name).unwrap()
    }

    fn pair_children() -> BTreeMap<String, ActionChild> {
        action(
            "pairs",
            vec![
                ("1", child(command("1"), &[])),
                ("1-1", child(command("1-1"), &["1"])),
                ("2", child(command("2"), &[])),
                ("2-1", child(command("2-1"), &["2"])),
            ],
        )
        .children()
    }

    #[test]
    fn test_ready_children_follow_completed_upstream() {
        let children = pair_children();
        let pending: BTreeSet<String> = ["1-1", "2-1"].iter().map(|k| k.to_string()).collect();
        let completed: HashSet<String> = ["1"].iter().map(|k| k.to_string()).collect();

        assert_eq!(ready_children(&children, &pending, &completed), vec!["1-1".to_string()]);
    }

    #[test]
    fn test_ready_children_wait_for_every_upstream() {
        let children = action(
            "join",
            vec![
                ("1", child(command("1"), &[])),
                ("2", child(command("2"), &[])),
                ("3", child(command("3"), &["1", "2"])),
            ],
        )
        .children();
        let pending: BTreeSet<String> = ["3"].iter().map(|k| k.to_string()).collect();
        let completed: HashSet<String> = ["1"].iter().map(|k| k.to_string()).collect();

        assert!(ready_children(&children, &pending, &completed).is_empty());
    }

    #[tokio::test]
    async fn test_traversal_visits_pairs_in_order() {
        let root = action(
            "pairs",
            vec![
                ("1", child(command("1"), &[])),
                ("1-1", child(command("1-1"), &["1"])),
                ("2", child(command("2"), &[])),
                ("2-1", child(command("2-1"), &["2"])),
            ],
        );
        let history = Arc::new(Mutex::new(Vec::new()));

        root.traverse(recording_task(history.clone())).await.unwrap();

        let history = history.lock().unwrap().clone();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0], "pairs");
        assert!(position(&history, "1") < position(&history, "1-1"));
        assert!(position(&history, "2") < position(&history, "2-1"));
    }

    #[tokio::test]
    async fn test_traversal_visits_nested_tree_once() {
        let branch_a = action(
            "00-A",
            vec![
                ("000-A", child(command("000-A"), &[])),
                ("001-A", child(command("001-A"), &["000-A"])),
                ("002-A", child(command("002-A"), &["001-A"])),
                (
                    "002-B",
                    child(
                        Tool::Action(action(
                            "002-B",
                            vec![
                                ("0020-A", child(command("0020-A"), &[])),
                                ("0020-B", child(command("0020-B"), &[])),
                            ],
                        )),
                        &["001-A"],
                    ),
                ),
                ("002-C", child(command("002-C"), &["001-A"])),
            ],
        );
        let branch_b = action(
            "01-A",
            vec![
                ("010-A", child(command("010-A"), &[])),
                ("011-A", child(command("011-A"), &["010-A"])),
            ],
        );
        let root = action(
            "0",
            vec![
                ("00-A", child(Tool::Action(branch_a), &[])),
                ("01-A", child(Tool::Action(branch_b), &["00-A"])),
                ("01-B", child(command("01-B"), &["00-A"])),
                ("02-A", child(command("02-A"), &["01-A", "01-B"])),
            ],
        );
        let history = Arc::new(Mutex::new(Vec::new()));

        root.traverse_bounded(recording_task(history.clone()), Some(2))
            .await
            .unwrap();

        let history = history.lock().unwrap().clone();
        assert_eq!(history.len(), 14);
        let unique: HashSet<&String> = history.iter().collect();
        assert_eq!(unique.len(), 14);

        let before = |first: &str, second: &str| position(&history, first) < position(&history, second);
        assert_eq!(history[0], "0");
        assert!(before("000-A", "001-A"));
        assert!(before("001-A", "002-B"));
        assert!(before("002-B", "0020-A"));
        assert!(before("0020-B", "02-A"));
        assert!(before("002-C", "01-A"));
        assert!(before("011-A", "02-A"));
        assert!(before("01-B", "02-A"));
    }

    #[tokio::test]
    async fn test_independent_children_run_concurrently() {
        let root = action(
            "parallel",
            vec![("a", child(command("a"), &[])), ("b", child(command("b"), &[]))],
        );
        let barrier = Arc::new(Barrier::new(2));
        let task = traversal_task(move |tool| {
            let barrier = barrier.clone();
            async move {
                if matches!(tool, Tool::Command(_)) {
                    barrier.wait().await;
                }
                Ok(())
            }
        });

        let result = tokio::time::timeout(Duration::from_secs(5), root.traverse(task)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_concurrency_limit_per_level() {
        let root = action(
            "limited",
            (0..6)
                .map(|index| (["a", "b", "c", "d", "e", "f"][index], child(command("leaf"), &[])))
                .collect(),
        );
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (running_task, peak_task) = (running.clone(), peak.clone());
        let task = traversal_task(move |tool| {
            let running = running_task.clone();
            let peak = peak_task.clone();
            async move {
                if matches!(tool, Tool::Command(_)) {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
                Ok(())
            }
        });

        root.traverse_bounded(task, Some(2)).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_child_errors_are_aggregated() {
        let root = action(
            "failing",
            vec![
                ("1", child(command("1"), &[])),
                ("1-1", child(command("1-1"), &["1"])),
                ("2", child(command("2"), &[])),
            ],
        );
        let history = Arc::new(Mutex::new(Vec::new()));
        let recorded = history.clone();
        let task = traversal_task(move |tool| {
            let recorded = recorded.clone();
            async move {
                let name = tool.name();
                recorded.lock().unwrap().push(name.clone());
                if name == "1" || name == "2" {
                    return Err(TaskError::from(format!("{} broke", name)));
                }
                Ok(())
            }
        });

        let error = root.traverse(task).await.unwrap_err();

        // A failed upstream still releases its dependents
        assert!(history.lock().unwrap().contains(&"1-1".to_string()));
        match &error {
            TraversalError::Children { name, errors } => {
                assert_eq!(name, "failing");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error {}", other),
        }
        let message = error.to_string();
        assert!(message.contains("1 broke"));
        assert!(message.contains("2 broke"));
    }

    #[tokio::test]
    async fn test_root_failure_skips_children() {
        let root = action("root", vec![("1", child(command("1"), &[]))]);
        let history = Arc::new(Mutex::new(Vec::new()));
        let recorded = history.clone();
        let task = traversal_task(move |tool| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(tool.name());
                Err(TaskError::from("root refused"))
            }
        });

        let error = root.traverse(task).await.unwrap_err();
        assert!(matches!(error, TraversalError::Task { tool: "action", .. }));
        assert_eq!(history.lock().unwrap().as_slice(), ["root".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_children_fail_the_traversal() {
        let root = action(
            "dangling",
            vec![
                ("1", child(command("1"), &[])),
                ("2", child(command("2"), &["missing"])),
                ("3", child(command("3"), &["4"])),
                ("4", child(command("4"), &["3"])),
            ],
        );
        let history = Arc::new(Mutex::new(Vec::new()));

        let result = root.traverse(recording_task(history.clone())).await;

        let history = history.lock().unwrap().clone();
        assert_eq!(history, vec!["dangling".to_string(), "1".to_string()]);

        let Err(TraversalError::Children { name, errors }) = result else {
            panic!("expected the unreachable children to be reported");
        };
        assert_eq!(name, "dangling");
        let never_ready: Vec<(String, Vec<String>)> = errors
            .into_iter()
            .filter_map(|error| match error {
                TraversalError::NeverReady { child, upstream } => Some((child, upstream)),
                _ => None,
            })
            .collect();
        assert_eq!(
            never_ready,
            vec![
                ("2".to_string(), vec!["missing".to_string()]),
                ("3".to_string(), vec!["4".to_string()]),
                ("4".to_string(), vec!["3".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_action_completes() {
        let root = action("empty", vec![]);
        let history = Arc::new(Mutex::new(Vec::new()));

        root.traverse(recording_task(history.clone())).await.unwrap();
        assert_eq!(history.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_update_merges_children() {
        let target = action("target", vec![("1", child(command("1"), &[]))]);
        let patch = action(
            "target",
            vec![
                ("1", child(command("1"), &["0"])),
                ("2", child(command("2"), &["1"])),
            ],
        );

        assert!(target.update(&patch));

        let children = target.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children["1"].upstream, vec!["0".to_string()]);
        assert_eq!(children["2"].upstream, vec!["1".to_string()]);
        assert!(!target.update(&target));
    }

    #[test]
    fn test_load_action_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("greet.json");
        std::fs::write(
            &path,
            r#"{
                "children": {
                    "hello": {
                        "command": {
                            "base": {"name": "zorro_testing.Log"},
                            "processorQuery": {"name": "python"}
                        }
                    },
                    "bye": {
                        "command": {"base": {"name": "zorro_testing.Log"}},
                        "upstream": ["hello"]
                    }
                }
            }"#,
        )
        .unwrap();

        let loaded = Action::load(&path).unwrap();

        assert_eq!(loaded.name(), "greet");
        let children = loaded.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children["bye"].upstream, vec!["hello".to_string()]);
        match &children["hello"].tool {
            Tool::Command(command) => {
                assert_eq!(command.name(), "zorro_testing.Log");
                assert_eq!(command.processor_query().name.as_deref(), Some("python"));
            }
            other => panic!("expected a command, found {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = Action::load("/definitely/not/here.json");
        assert!(matches!(result, Err(ActionLoadError::Read { .. })));
    }
}
