// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::proto::zorro::scheduling::scheduling_server::{Scheduling, SchedulingServer};
use crate::proto::{Processor, ProcessorRegistration};
use crate::scheduling::Scheduler;

/// RPC surface workers call once their own listener is up.
#[derive(Debug, Clone)]
pub struct SchedulingService {
    scheduler: Arc<Scheduler>,
}

impl SchedulingService {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        SchedulingService { scheduler }
    }

    pub fn into_server(self) -> SchedulingServer<Self> {
        SchedulingServer::new(self)
    }
}

#[tonic::async_trait]
impl Scheduling for SchedulingService {
    async fn register_processor(
        &self,
        request: Request<ProcessorRegistration>,
    ) -> Result<Response<Processor>, Status> {
        let registration = request.into_inner();
        let processor = registration
            .processor
            .ok_or_else(|| Status::invalid_argument("registration without a processor"))?;
        if registration.host.is_empty() {
            return Err(Status::invalid_argument("registration without a host"));
        }

        let registered = self
            .scheduler
            .register_processor(processor, registration.host)
            .await?;
        Ok(Response::new(registered.processor().clone()))
    }
}
