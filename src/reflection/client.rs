// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Client talking to a worker whose RPC schema is discovered at runtime.
//!
//! On connection the worker's server reflection service is asked for its
//! services and the schema files declaring them. Imports the worker did not
//! send along are fetched by file name until the set is closed, then the
//! files are loaded into a descriptor pool used to build requests and decode
//! responses.

use std::collections::BTreeSet;
use std::time::Instant;

use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, MethodDescriptor};
use prost_types::FileDescriptorProto;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic_reflection::pb::server_reflection_client::ServerReflectionClient;
use tonic_reflection::pb::server_reflection_request::MessageRequest;
use tonic_reflection::pb::server_reflection_response::MessageResponse;
use tonic_reflection::pb::ServerReflectionRequest;

use crate::errors::{ReflectionError, SocketError};
use crate::observability::messages::reflection::{DependencyFetched, ServicesDiscovered};
use crate::observability::messages::scheduling::CommandCompleted;
use crate::observability::messages::StructuredLog;
use crate::reflection::codec::DynamicCodec;
use crate::reflection::registry::{build_pool, missing_dependencies, SchemaFiles};
use crate::tools::{Command, ExecutionType};

/// Services every worker exposes for discovery, never used for tools.
const REFLECTION_SERVICES: [&str; 2] = [
    "grpc.reflection.v1alpha.ServerReflection",
    "grpc.reflection.v1.ServerReflection",
];

#[derive(Debug, Clone)]
pub struct ReflectionClient {
    host: String,
    channel: Channel,
    pool: DescriptorPool,
    services: Vec<String>,
}

impl ReflectionClient {
    /// Connect to the worker at `host` (`address:port`) and discover its
    /// schema.
    pub async fn connect(host: &str) -> Result<Self, ReflectionError> {
        let connect_error = |source| ReflectionError::Connect {
            host: host.to_string(),
            source,
        };
        let channel = Endpoint::from_shared(format!("http://{}", host))
            .map_err(connect_error)?
            .connect()
            .await
            .map_err(connect_error)?;

        let mut discovery = Discovery {
            host,
            client: ServerReflectionClient::new(channel.clone()),
        };

        let services = discovery.list_services().await?;
        let mut files = SchemaFiles::new();
        for service in &services {
            for file in discovery.file_containing_symbol(service).await? {
                files.entry(file.name().to_string()).or_insert(file);
            }
        }

        let mut requested = BTreeSet::new();
        loop {
            let missing: Vec<String> = missing_dependencies(&files)
                .into_iter()
                .filter(|name| !requested.contains(name))
                .collect();
            if missing.is_empty() {
                break;
            }

            for name in missing {
                for file in discovery.file_by_filename(&name).await? {
                    DependencyFetched {
                        host,
                        file: file.name(),
                    }
                    .log();
                    files.entry(file.name().to_string()).or_insert(file);
                }
                requested.insert(name);
            }
        }

        let pool = build_pool(&files).map_err(|source| ReflectionError::Registry {
            host: host.to_string(),
            source,
        })?;

        ServicesDiscovered {
            host,
            services: &services,
            files: files.len(),
        }
        .log();

        Ok(ReflectionClient {
            host: host.to_string(),
            channel,
            pool,
            services,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Names of the tool services the worker exposes.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Resolve a method and its request path. The service is looked up by
    /// full name first, then by its short name.
    pub fn get_method_descriptor(
        &self,
        service: &str,
        method: &str,
    ) -> Result<(MethodDescriptor, String), ReflectionError> {
        let service_descriptor = self
            .pool
            .get_service_by_name(service)
            .or_else(|| self.pool.services().find(|candidate| candidate.name() == service))
            .ok_or_else(|| ReflectionError::ServiceNotFound {
                host: self.host.clone(),
                service: service.to_string(),
            })?;

        let method_descriptor = service_descriptor
            .methods()
            .find(|candidate| candidate.name() == method)
            .ok_or_else(|| ReflectionError::MethodNotFound {
                host: self.host.clone(),
                service: service_descriptor.full_name().to_string(),
                method: method.to_string(),
            })?;

        let path = format!("/{}/{}", service_descriptor.full_name(), method_descriptor.name());
        Ok((method_descriptor, path))
    }

    /// Run `command` on the worker: the input socket becomes the request,
    /// every response is stored on the command. Returns the number of
    /// responses received.
    pub async fn process_command(
        &self,
        command: &Command,
        execution_type: ExecutionType,
    ) -> Result<usize, ReflectionError> {
        let started = Instant::now();
        let service = command.name();
        let (method, path) = self.get_method_descriptor(&service, execution_type.method_name())?;
        let socket_error = |source: SocketError| ReflectionError::Socket {
            host: self.host.clone(),
            method: path.clone(),
            source,
        };

        let mut input = DynamicMessage::new(method.input());
        {
            let base = command.base();
            base.input.apply_fields_to_message(&mut input).map_err(socket_error)?;
        }

        let responses = self
            .invoke(&method, &path, input, |mut response| command.set_output(&mut response))
            .await?;

        CommandCompleted {
            command: &service,
            responses,
            duration: started.elapsed(),
        }
        .log();
        Ok(responses)
    }

    /// Send `input` to a method and hand every response to `on_response`,
    /// honoring the method's streaming flags. A single request is sent on
    /// client streams before the send side is closed.
    pub async fn invoke<F>(
        &self,
        method: &MethodDescriptor,
        path: &str,
        input: DynamicMessage,
        mut on_response: F,
    ) -> Result<usize, ReflectionError>
    where
        F: FnMut(DynamicMessage) -> Result<(), SocketError>,
    {
        let stream_error = |source| ReflectionError::Stream {
            host: self.host.clone(),
            method: path.to_string(),
            source,
        };
        let socket_error = |source| ReflectionError::Socket {
            host: self.host.clone(),
            method: path.to_string(),
            source,
        };

        let request_path = PathAndQuery::try_from(path).map_err(|_| ReflectionError::InvalidMethodPath {
            host: self.host.clone(),
            path: path.to_string(),
        })?;
        let codec = DynamicCodec::new(method.output());

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|source| ReflectionError::NotReady {
            host: self.host.clone(),
            method: path.to_string(),
            source,
        })?;

        let mut received = 0;
        match (method.is_client_streaming(), method.is_server_streaming()) {
            (false, false) => {
                let response = grpc
                    .unary(tonic::Request::new(input), request_path, codec)
                    .await
                    .map_err(stream_error)?;
                on_response(response.into_inner()).map_err(socket_error)?;
                received += 1;
            }
            (true, false) => {
                let request = tonic::Request::new(futures::stream::iter(vec![input]));
                let response = grpc
                    .client_streaming(request, request_path, codec)
                    .await
                    .map_err(stream_error)?;
                on_response(response.into_inner()).map_err(socket_error)?;
                received += 1;
            }
            (client_streaming, true) => {
                let mut responses = if client_streaming {
                    let request = tonic::Request::new(futures::stream::iter(vec![input]));
                    grpc.streaming(request, request_path, codec).await
                } else {
                    grpc.server_streaming(tonic::Request::new(input), request_path, codec)
                        .await
                }
                .map_err(stream_error)?
                .into_inner();

                while let Some(response) = responses.message().await.map_err(stream_error)? {
                    on_response(response).map_err(socket_error)?;
                    received += 1;
                }
            }
        }

        Ok(received)
    }
}

/// One reflection stream per request.
struct Discovery<'a> {
    host: &'a str,
    client: ServerReflectionClient<Channel>,
}

impl Discovery<'_> {
    async fn request(&mut self, label: String, request: MessageRequest) -> Result<MessageResponse, ReflectionError> {
        let request = ServerReflectionRequest {
            host: String::new(),
            message_request: Some(request),
        };
        let rpc_error = |source| ReflectionError::Rpc {
            host: self.host.to_string(),
            request: label.clone(),
            source,
        };

        let mut responses = self
            .client
            .server_reflection_info(futures::stream::iter(vec![request]))
            .await
            .map_err(rpc_error)?
            .into_inner();
        let response = responses.message().await.map_err(rpc_error)?;

        match response.and_then(|r| r.message_response) {
            Some(MessageResponse::ErrorResponse(error)) => Err(ReflectionError::Refused {
                host: self.host.to_string(),
                request: label,
                code: error.error_code,
                message: error.error_message,
            }),
            Some(response) => Ok(response),
            None => Err(ReflectionError::UnexpectedResponse {
                host: self.host.to_string(),
                request: label,
            }),
        }
    }

    async fn list_services(&mut self) -> Result<Vec<String>, ReflectionError> {
        let label = "ListServices".to_string();
        match self
            .request(label.clone(), MessageRequest::ListServices(String::new()))
            .await?
        {
            MessageResponse::ListServicesResponse(list) => Ok(list
                .service
                .into_iter()
                .map(|service| service.name)
                .filter(|name| !REFLECTION_SERVICES.contains(&name.as_str()))
                .collect()),
            _ => Err(ReflectionError::UnexpectedResponse {
                host: self.host.to_string(),
                request: label,
            }),
        }
    }

    async fn file_containing_symbol(&mut self, symbol: &str) -> Result<Vec<FileDescriptorProto>, ReflectionError> {
        let label = format!("FileContainingSymbol({})", symbol);
        let response = self
            .request(label.clone(), MessageRequest::FileContainingSymbol(symbol.to_string()))
            .await?;
        self.decode_files(label, symbol, response)
    }

    async fn file_by_filename(&mut self, file_name: &str) -> Result<Vec<FileDescriptorProto>, ReflectionError> {
        let label = format!("FileByFilename({})", file_name);
        let response = self
            .request(label.clone(), MessageRequest::FileByFilename(file_name.to_string()))
            .await?;
        self.decode_files(label, file_name, response)
    }

    fn decode_files(
        &self,
        label: String,
        symbol: &str,
        response: MessageResponse,
    ) -> Result<Vec<FileDescriptorProto>, ReflectionError> {
        let MessageResponse::FileDescriptorResponse(files) = response else {
            return Err(ReflectionError::UnexpectedResponse {
                host: self.host.to_string(),
                request: label,
            });
        };

        files
            .file_descriptor_proto
            .iter()
            .map(|raw| {
                FileDescriptorProto::decode(raw.as_slice()).map_err(|source| ReflectionError::InvalidDescriptor {
                    host: self.host.to_string(),
                    symbol: symbol.to_string(),
                    source,
                })
            })
            .collect()
    }
}
