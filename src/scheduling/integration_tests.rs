// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    use futures::Stream;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{Request, Response, Status};

    use crate::config::{ProcessorTemplate, StaticContext};
    use crate::errors::SchedulingError;
    use crate::proto::zorro::scheduling::scheduling_client::SchedulingClient;
    use crate::proto::zorro_testing::log_server::{Log, LogServer};
    use crate::proto::zorro_testing::{LogInput, LogOutput};
    use crate::proto::{self, Processor, ProcessorQuery, ProcessorRegistration, ProcessorStatus};
    use crate::reflection::ReflectionClient;
    use crate::scheduling::{RegisteredProcessor, Scheduler, SchedulingService};
    use crate::tools::{Action, ActionChild, Command, CommandQueue, Socket, Tool, ToolBase};
    use crate::traits::Context;

    type LogStream = Pin<Box<dyn Stream<Item = Result<LogOutput, Status>> + Send + 'static>>;

    /// Worker answering every call with the logged line as a command patch.
    struct LogWorker;

    fn log_response(input: LogInput, prefix: &str) -> Result<Response<LogStream>, Status> {
        let level = if input.level.is_empty() {
            "INFO".to_string()
        } else {
            input.level.to_uppercase()
        };
        let patch = proto::Command {
            base: Some(proto::ToolBase {
                logs: [(0, format!("{}{}: {}", prefix, level, input.message))]
                    .into_iter()
                    .collect(),
                ..Default::default()
            }),
            processor_query: None,
        };
        let outputs = vec![Ok(LogOutput {
            zorro_command: Some(patch),
            message: input.message,
        })];
        Ok(Response::new(Box::pin(futures::stream::iter(outputs))))
    }

    #[tonic::async_trait]
    impl Log for LogWorker {
        type ExecuteStream = LogStream;
        type UndoStream = LogStream;
        type TestStream = LogStream;

        async fn execute(&self, request: Request<LogInput>) -> Result<Response<Self::ExecuteStream>, Status> {
            log_response(request.into_inner(), "")
        }

        async fn undo(&self, request: Request<LogInput>) -> Result<Response<Self::UndoStream>, Status> {
            log_response(request.into_inner(), "UNDO ")
        }

        async fn test(&self, request: Request<LogInput>) -> Result<Response<Self::TestStream>, Status> {
            log_response(request.into_inner(), "TEST ")
        }
    }

    /// Serve the mock worker with server reflection on a free port.
    async fn start_log_worker() -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
            .build()
            .unwrap();

        let handle = tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(reflection)
                .add_service(LogServer::new(LogWorker))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        (address.to_string(), handle)
    }

    /// Serve the engine's scheduling service on a free port.
    async fn start_engine(scheduler: Arc<Scheduler>) -> (SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(SchedulingService::new(scheduler).into_server())
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        (address, handle)
    }

    fn worker_processor(id: &str) -> Processor {
        Processor {
            id: id.to_string(),
            name: "log".to_string(),
            label: "Log".to_string(),
            status: ProcessorStatus::Idle as i32,
            ..Default::default()
        }
    }

    fn log_query() -> ProcessorQuery {
        ProcessorQuery {
            name: Some("log".to_string()),
            ..Default::default()
        }
    }

    fn log_command(message: &str) -> Arc<Command> {
        let input = Socket::default()
            .with_field("message", Socket::raw("string", &json!(message)))
            .with_field("level", Socket::raw("string", &json!("debug")));
        Arc::new(Command::new(
            ToolBase {
                input,
                ..ToolBase::named("zorro_testing.Log")
            },
            log_query(),
        ))
    }

    async fn wait_for_pending(scheduler: &Scheduler) -> String {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                if let Some(id) = scheduler.pending().ids().pop() {
                    return id;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_registered_processor_is_reused() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Scheduler::new();

        let registered = scheduler
            .register_processor(worker_processor("worker-1"), host.clone())
            .await
            .unwrap();
        assert_eq!(registered.host(), host);
        assert!(registered
            .client()
            .services()
            .contains(&"zorro_testing.Log".to_string()));

        let context = StaticContext::default();
        let first = scheduler.get_or_start_processor(&context, &log_query()).await.unwrap();
        let second = scheduler.get_or_start_processor(&context, &log_query()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &registered));
        assert!(scheduler.pending().is_empty());
        assert_eq!(scheduler.pool().len(), 1);
    }

    #[tokio::test]
    async fn test_registering_twice_returns_existing() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Scheduler::new();

        let first = scheduler
            .register_processor(worker_processor("worker-1"), host.clone())
            .await
            .unwrap();
        let second = scheduler
            .register_processor(worker_processor("worker-1"), "127.0.0.1:1".to_string())
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_unknown_processor_is_not_found() {
        let scheduler = Scheduler::new();
        let context = StaticContext::default();

        let result = scheduler.get_or_start_processor(&context, &log_query()).await;
        assert!(matches!(result, Err(SchedulingError::NoMatchingProcessor { .. })));

        let anonymous = scheduler
            .get_or_start_processor(&context, &ProcessorQuery::default())
            .await;
        assert!(matches!(anonymous, Err(SchedulingError::NoMatchingProcessor { .. })));
    }

    #[tokio::test]
    async fn test_processor_exiting_before_registration() {
        let scheduler = Scheduler::new();
        let context = StaticContext::default().with_processor(ProcessorTemplate::new("log", "false"));

        let result = scheduler.get_or_start_processor(&context, &log_query()).await;

        assert!(
            matches!(&result, Err(SchedulingError::ExitedBeforeRegistering { processor, .. }) if processor == "log"),
            "{:?}",
            result
        );
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_exit_after_pool_insert_leaves_no_dead_entry() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Arc::new(Scheduler::new());
        let context: Arc<dyn Context> =
            Arc::new(StaticContext::default().with_processor(ProcessorTemplate::new("log", "sleep 1")));

        let spawn = {
            let scheduler = scheduler.clone();
            let context = context.clone();
            tokio::spawn(async move { scheduler.get_or_start_processor(context.as_ref(), &log_query()).await })
        };

        // Joins the pool without waking the spawn, as a registration racing the exit would
        let id = wait_for_pending(&scheduler).await;
        let client = ReflectionClient::connect(&host).await.unwrap();
        scheduler
            .pool()
            .insert_if_absent(Arc::new(RegisteredProcessor::new(worker_processor(&id), client)));
        assert!(scheduler.pool().get(&id).is_some());

        let result = spawn.await.unwrap();

        assert!(
            matches!(&result, Err(SchedulingError::ExitedBeforeRegistering { id: exited, .. }) if *exited == id),
            "{:?}",
            result
        );
        assert!(scheduler.pool().get(&id).is_none());
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_missing_executable_fails_the_spawn() {
        let scheduler = Scheduler::new();
        let context = StaticContext::default()
            .with_processor(ProcessorTemplate::new("log", "/nonexistent/zorro-worker --id {{id}}"));

        let result = scheduler.get_or_start_processor(&context, &log_query()).await;

        assert!(matches!(result, Err(SchedulingError::Spawn { .. })), "{:?}", result);
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_processor_completes_on_registration() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Arc::new(Scheduler::new());
        let context: Arc<dyn Context> =
            Arc::new(StaticContext::default().with_processor(ProcessorTemplate::new("log", "sleep 30")));

        let mut query = log_query();
        query.metadata.insert("site".to_string(), "paris".to_string());

        let spawn = {
            let scheduler = scheduler.clone();
            let context = context.clone();
            let query = query.clone();
            tokio::spawn(async move { scheduler.get_or_start_processor(context.as_ref(), &query).await })
        };

        let id = wait_for_pending(&scheduler).await;
        let reported = Processor {
            label: "Log Worker".to_string(),
            ..worker_processor(&id)
        };
        let registered = scheduler.register_processor(reported, host).await.unwrap();
        let spawned = spawn.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&registered, &spawned));
        assert_eq!(spawned.id(), id);
        assert_eq!(spawned.processor().label, "Log Worker");
        assert_eq!(spawned.processor().status, ProcessorStatus::Idle as i32);
        assert_eq!(spawned.processor().metadata.get("site"), Some(&"paris".to_string()));
        assert!(scheduler.pending().is_empty());

        let again = scheduler.get_or_start_processor(context.as_ref(), &query).await.unwrap();
        assert!(Arc::ptr_eq(&again, &spawned));
    }

    #[tokio::test]
    async fn test_failed_registration_wakes_the_spawn() {
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let unreachable = closed.local_addr().unwrap().to_string();
        drop(closed);

        let scheduler = Arc::new(Scheduler::new());
        let context: Arc<dyn Context> =
            Arc::new(StaticContext::default().with_processor(ProcessorTemplate::new("log", "sleep 30")));

        let spawn = {
            let scheduler = scheduler.clone();
            let context = context.clone();
            tokio::spawn(async move { scheduler.get_or_start_processor(context.as_ref(), &log_query()).await })
        };

        let id = wait_for_pending(&scheduler).await;
        let registration = scheduler.register_processor(worker_processor(&id), unreachable).await;
        let spawned = spawn.await.unwrap();

        assert!(matches!(registration, Err(SchedulingError::Registration { .. })));
        assert!(matches!(spawned, Err(SchedulingError::Registration { .. })));
        assert!(scheduler.pool().is_empty());
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_register_over_rpc() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Arc::new(Scheduler::new());
        let (engine, _server) = start_engine(scheduler.clone()).await;

        let mut client = SchedulingClient::connect(format!("http://{}", engine)).await.unwrap();
        let response = client
            .register_processor(ProcessorRegistration {
                processor: Some(worker_processor("worker-rpc")),
                host,
            })
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.id, "worker-rpc");
        assert!(scheduler.pool().get("worker-rpc").is_some());

        let missing = client
            .register_processor(ProcessorRegistration {
                processor: None,
                host: "127.0.0.1:1".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(missing.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_command_runs_on_registered_processor() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Arc::new(Scheduler::new());
        scheduler
            .register_processor(worker_processor("worker-1"), host)
            .await
            .unwrap();

        let (queue, receiver) = CommandQueue::new(1);
        let consumer = tokio::spawn(scheduler.clone().listen(receiver));
        let context: Arc<dyn Context> = Arc::new(StaticContext::default());

        let command = log_command("hello");
        command.execute(context.clone(), &queue).await.unwrap();
        command.undo(context.clone(), &queue).await.unwrap();

        let base = command.snapshot();
        assert_eq!(base.logs.get(&0).map(String::as_str), Some("DEBUG: hello"));
        assert_eq!(base.output.fields["message"].to_json(), json!("hello"));
        assert!(!base.output.fields.contains_key("zorro_command"));

        drop(queue);
        assert_eq!(consumer.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_action_runs_every_command() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Arc::new(Scheduler::new());
        scheduler
            .register_processor(worker_processor("worker-1"), host)
            .await
            .unwrap();

        let (queue, receiver) = CommandQueue::new(1);
        let consumer = tokio::spawn(scheduler.clone().listen(receiver));
        let context: Arc<dyn Context> = Arc::new(StaticContext::default());

        let first = log_command("first");
        let second = log_command("second");
        let action = Arc::new(
            Action::new(ToolBase::named("build"))
                .with_child("1", ActionChild::new(Tool::Command(first.clone())))
                .with_child("2", ActionChild::new(Tool::Command(second.clone())).after(["1"])),
        );

        action.test(context, &queue).await.unwrap();

        assert_eq!(
            first.snapshot().logs.get(&0).map(String::as_str),
            Some("TEST DEBUG: first")
        );
        assert_eq!(
            second.snapshot().logs.get(&0).map(String::as_str),
            Some("TEST DEBUG: second")
        );

        drop(queue);
        assert_eq!(consumer.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_service_fails_only_the_command() {
        let (host, _worker) = start_log_worker().await;
        let scheduler = Arc::new(Scheduler::new());
        scheduler
            .register_processor(worker_processor("worker-1"), host)
            .await
            .unwrap();

        let (queue, receiver) = CommandQueue::new(1);
        tokio::spawn(scheduler.clone().listen(receiver));
        let context: Arc<dyn Context> = Arc::new(StaticContext::default());

        let unknown = Arc::new(Command::new(ToolBase::named("zorro_testing.Missing"), log_query()));
        let result = unknown.execute(context.clone(), &queue).await;
        assert!(matches!(result, Err(SchedulingError::Command { .. })), "{:?}", result);

        log_command("still working").execute(context, &queue).await.unwrap();
    }
}
