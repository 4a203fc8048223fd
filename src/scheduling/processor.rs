// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Starting worker processes from processor templates.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use handlebars::Handlebars;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::SchedulingError;
use crate::observability::messages::scheduling::{
    ProcessorExited, ProcessorOutput, ProcessorSpawnStarted,
};
use crate::observability::messages::StructuredLog;
use crate::proto::{Processor, ProcessorQuery, ProcessorStatus};
use crate::scheduling::pending::{OutputCapture, PendingProcessor, PendingRegistry, RegistrationResult};
use crate::scheduling::pool::{ProcessorPool, RegisteredProcessor};
use crate::traits::Context;

/// How long the output of an exited worker is still drained for its error
/// report.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Check that a launch template compiles.
pub fn check_launch_template(template: &str) -> Result<(), String> {
    handlebars::Template::compile(template)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Render the launch template of `processor` and split it into a program and
/// its arguments. No shell quoting is applied.
pub fn render_launch_command(
    processor: &Processor,
    command_paths: &[String],
) -> Result<Vec<String>, SchedulingError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let data = json!({
        "name": processor.name,
        "label": processor.label,
        "version": processor.version,
        "id": processor.id,
        "metadata": processor.metadata,
        "command_paths": command_paths,
    });

    let rendered = handlebars
        .render_template(&processor.start_processor_template, &data)
        .map_err(|e| SchedulingError::Template {
            processor: processor.name.clone(),
            reason: e.to_string(),
        })?;

    let arguments: Vec<String> = rendered.split_whitespace().map(str::to_string).collect();
    if arguments.is_empty() {
        return Err(SchedulingError::EmptyLaunchCommand {
            processor: processor.name.clone(),
        });
    }
    Ok(arguments)
}

/// Merge what a worker reported at registration into the processor that was
/// spawned for it. Metadata is merged, the status is taken as reported and
/// the other fields only when set.
pub fn patch_processor(target: &mut Processor, patch: &Processor) {
    if !patch.name.is_empty() {
        target.name = patch.name.clone();
    }
    if !patch.label.is_empty() {
        target.label = patch.label.clone();
    }
    if !patch.version.is_empty() {
        target.version = patch.version.clone();
    }
    if !patch.subsets.is_empty() {
        target.subsets = patch.subsets.clone();
    }
    target
        .metadata
        .extend(patch.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    target.status = patch.status;
}

/// Start a worker from `template` and wait until it registers or exits.
///
/// The new processor gets a fresh id and the metadata of `query`, so it
/// satisfies the query that started it. It is pending until
/// [`Scheduler::register_processor`](crate::scheduling::Scheduler::register_processor)
/// is called with its id.
pub async fn spawn_processor(
    pending: &PendingRegistry,
    pool: Arc<ProcessorPool>,
    context: &dyn Context,
    template: &Processor,
    query: &ProcessorQuery,
) -> Result<Arc<RegisteredProcessor>, SchedulingError> {
    let mut processor = template.clone();
    processor.id = Uuid::new_v4().to_string();
    processor.status = ProcessorStatus::Starting as i32;
    processor
        .metadata
        .extend(query.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));

    let arguments = render_launch_command(&processor, &context.available_command_paths(template))?;
    let name = processor.name.clone();
    let id = processor.id.clone();

    ProcessorSpawnStarted {
        processor: &name,
        id: &id,
        command_line: &arguments.join(" "),
    }
    .log();

    let capture = Arc::new(OutputCapture::default());
    let (entry, registered) = PendingProcessor::new(processor, capture.clone());
    pending.enqueue(entry);

    let mut child = match tokio::process::Command::new(&arguments[0])
        .args(&arguments[1..])
        .env_clear()
        .envs(context.environ(true))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            pending.unqueue(&id);
            return Err(SchedulingError::Spawn {
                processor: name,
                reason: e.to_string(),
            });
        }
    };

    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward_output(&id, "stdout", stdout, capture.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward_output(&id, "stderr", stderr, capture.clone()));
    }

    let outcome = tokio::select! {
        registration = registered => SpawnOutcome::Registration(registration.ok()),
        status = child.wait() => SpawnOutcome::Exited(status),
    };

    match outcome {
        SpawnOutcome::Registration(Some(Ok(registered))) => {
            tokio::spawn(watch_exit(child, pool, name, id));
            Ok(registered)
        }
        SpawnOutcome::Registration(Some(Err(error))) => {
            let _ = child.kill().await;
            Err(error)
        }
        SpawnOutcome::Registration(None) => {
            pending.unqueue(&id);
            let _ = child.kill().await;
            Err(SchedulingError::NotRegistered { id })
        }
        SpawnOutcome::Exited(status) => {
            pending.unqueue(&id);
            for reader in readers {
                let _ = tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, reader).await;
            }
            let (status, success) = match status {
                Ok(status) => (status.to_string(), status.success()),
                Err(e) => (e.to_string(), false),
            };

            // Registration may have landed between the exit and this branch
            if pool.remove(&id).is_some() {
                ProcessorExited {
                    processor: &name,
                    id: &id,
                    status: &status,
                    success,
                }
                .log();
            }

            Err(SchedulingError::ExitedBeforeRegistering {
                processor: name,
                id,
                status,
                stderr: capture.stderr(),
            })
        }
    }
}

enum SpawnOutcome {
    Registration(Option<RegistrationResult>),
    Exited(std::io::Result<std::process::ExitStatus>),
}

/// Forward every line of a worker stream to the log and the capture.
fn forward_output<R>(id: &str, stream: &'static str, reader: R, capture: Arc<OutputCapture>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let id = id.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            ProcessorOutput {
                id: &id,
                stream,
                line: &line,
            }
            .log();
            capture.push(stream, line);
        }
    })
}

/// Wait for a registered worker to exit and take it out of the pool.
async fn watch_exit(mut child: Child, pool: Arc<ProcessorPool>, name: String, id: String) {
    let (status, success) = match child.wait().await {
        Ok(status) => (status.to_string(), status.success()),
        Err(e) => (e.to_string(), false),
    };
    pool.remove(&id);

    ProcessorExited {
        processor: &name,
        id: &id,
        status: &status,
        success,
    }
    .log();
}
