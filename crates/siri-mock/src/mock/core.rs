//! Core MockServer struct and implementation.
//!
//! A `MockServer` owns one listener bound to one URL. It captures every
//! non-administrative request and answers it with the next queued response.

use super::handler::handle_mock_request;
use super::types::{CapturedRequest, MockEndpoint, MockError, MockReply, PendingResponse, WaitPolicy};
use crate::siri::{check_status_response, extract_message_identifiers, is_check_status};
use crate::template::{has_placeholders, render_response};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Captured requests and queued responses, guarded together so that a request
/// is logged and its response dequeued atomically.
#[derive(Debug, Default)]
struct MockState {
    requests: Vec<CapturedRequest>,
    responses: VecDeque<PendingResponse>,
}

/// Running listener of a started server
struct Listener {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

/// Mock SIRI peer
pub struct MockServer {
    name: String,
    endpoint: MockEndpoint,
    pub(super) wait_policy: WaitPolicy,
    /// Log every captured body at info level
    debug_requests: bool,
    state: Mutex<MockState>,
    /// Number of captured requests, observed by `wait_request`
    pub(super) request_count_tx: watch::Sender<usize>,
    started: AtomicBool,
    local_addr: RwLock<Option<SocketAddr>>,
    listener: tokio::sync::Mutex<Option<Listener>>,
}

impl MockServer {
    /// Create a stopped server for `url`
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self, MockError> {
        let endpoint = MockEndpoint::parse(url)?;
        let (request_count_tx, _) = watch::channel(0);

        Ok(Self {
            name: name.into(),
            endpoint,
            wait_policy: WaitPolicy::default(),
            debug_requests: false,
            state: Mutex::new(MockState::default()),
            request_count_tx,
            started: AtomicBool::new(false),
            local_addr: RwLock::new(None),
            listener: tokio::sync::Mutex::new(None),
        })
    }

    pub fn with_wait_policy(mut self, wait_policy: WaitPolicy) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    pub fn with_debug_requests(mut self, debug_requests: bool) -> Self {
        self.debug_requests = debug_requests;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &MockEndpoint {
        &self.endpoint
    }

    /// Mount path requests are served on
    pub fn path(&self) -> &str {
        &self.endpoint.path
    }

    /// Configured port (0 until bound when an ephemeral port was asked for)
    pub fn port(&self) -> u16 {
        self.local_addr()
            .map(|addr| addr.port())
            .unwrap_or(self.endpoint.port)
    }

    /// Effective URL: the configured one, with an ephemeral port resolved once bound
    pub fn url(&self) -> String {
        match self.local_addr() {
            Some(addr) => self.endpoint.url_for(addr),
            None => self.endpoint.url.clone(),
        }
    }

    /// Bound address, while started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Bind the listener and serve requests on a background task.
    ///
    /// Does nothing when already started.
    pub async fn start(self: &Arc<Self>) -> Result<(), MockError> {
        let mut listener_slot = self.listener.lock().await;
        if listener_slot.is_some() {
            return Ok(());
        }

        let bind_addr = format!("{}:{}", self.endpoint.host, self.endpoint.port);
        let listener = TcpListener::bind((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|e| MockError::BindError(bind_addr.clone(), e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| MockError::BindError(bind_addr, e.to_string()))?;

        *self.local_addr.write() = Some(local_addr);
        info!(
            "Mock SIRI server '{}' listening on {} ({})",
            self.name,
            local_addr,
            self.url()
        );

        // The receiver exists before the task runs: broadcast drops sends with no subscriber
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(Self::accept_loop(
            Arc::clone(self),
            listener,
            shutdown_tx.clone(),
            shutdown_rx,
        ));

        *listener_slot = Some(Listener { shutdown_tx, task });
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn accept_loop(
        server: Arc<MockServer>,
        listener: TcpListener,
        shutdown_tx: broadcast::Sender<()>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let server = Arc::clone(&server);
                            let mut conn_shutdown_rx = shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let name = server.name.clone();
                                let service = service_fn(move |req| {
                                    let server = Arc::clone(&server);
                                    async move { handle_mock_request(req, server, addr).await }
                                });
                                let conn = http1::Builder::new().serve_connection(io, service);
                                tokio::pin!(conn);
                                let mut shutting_down = false;
                                let result = loop {
                                    tokio::select! {
                                        result = conn.as_mut() => break result,
                                        _ = conn_shutdown_rx.recv(), if !shutting_down => {
                                            shutting_down = true;
                                            conn.as_mut().graceful_shutdown();
                                        }
                                    }
                                };
                                if let Err(e) = result {
                                    debug!("Connection error on mock '{}': {}", name, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on mock '{}': {}", server.name, e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Mock SIRI server '{}' shutting down", server.name);
                    break;
                }
            }
        }
    }

    /// Close the listener and clear captured requests and queued responses.
    ///
    /// Only clears state when not started.
    pub async fn stop(&self) {
        let mut listener_slot = self.listener.lock().await;
        let Some(listener) = listener_slot.take() else {
            self.clear();
            return;
        };

        if listener.shutdown_tx.send(()).is_err() {
            warn!("Mock '{}' listener task already gone", self.name);
        }
        if let Err(e) = listener.task.await {
            warn!("Mock '{}' listener task ended abnormally: {}", self.name, e);
        }

        self.clear();
        *self.local_addr.write() = None;
        self.started.store(false, Ordering::SeqCst);
        info!("Mock SIRI server '{}' stopped", self.name);
    }

    /// Drop captured requests and queued responses
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.requests.clear();
        state.responses.clear();
        self.request_count_tx.send_replace(0);
    }

    /// Queue a response for the next non-administrative request.
    ///
    /// `request_type` is recorded but does not filter matching: responses are
    /// consumed in the order they were queued.
    pub fn expect_request(
        &self,
        request_type: impl Into<String>,
        template: impl Into<String>,
    ) -> &Self {
        let response = PendingResponse {
            request_type: request_type.into(),
            template: template.into(),
        };
        debug!(
            "Mock '{}' expects a {} request",
            self.name, response.request_type
        );
        self.state.lock().responses.push_back(response);
        self
    }

    /// Snapshot of captured requests, in arrival order
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of captured requests
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Snapshot of responses still queued
    pub fn pending_responses(&self) -> Vec<PendingResponse> {
        self.state.lock().responses.iter().cloned().collect()
    }

    /// Answer an inbound body.
    ///
    /// CheckStatus requests get the synthetic status reply and leave the log
    /// and the queue untouched. Any other request is captured, then answered
    /// with the next queued response rendered against its identifiers.
    pub fn respond(
        &self,
        request_from: &str,
        method: &str,
        path: &str,
        query: Option<&str>,
        headers: HashMap<String, String>,
        body: String,
    ) -> Result<MockReply, MockError> {
        let message_identifiers = extract_message_identifiers(&body);

        if is_check_status(&body) {
            debug!("Mock '{}' answering CheckStatus", self.name);
            return Ok(MockReply::CheckStatus(check_status_response(
                &self.url(),
                message_identifiers.first().map(String::as_str),
            )));
        }

        if self.debug_requests {
            info!("Mock '{}' received SIRI request:\n{}", self.name, body);
        }

        let captured = CapturedRequest {
            request_from: request_from.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            headers,
            body,
            message_identifiers,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let (pending, count, identifiers) = {
            let mut state = self.state.lock();
            let identifiers = captured.message_identifiers.clone();
            state.requests.push(captured);
            (state.responses.pop_front(), state.requests.len(), identifiers)
        };
        self.request_count_tx.send_replace(count);

        debug!(
            "Mock '{}' captured request #{} {:?}",
            self.name, count, identifiers
        );

        let pending = pending.ok_or_else(|| MockError::ResponseQueueUnderflow(self.name.clone()))?;
        if identifiers.is_empty() && has_placeholders(&pending.template) {
            debug!(
                "Mock '{}' found no MessageIdentifier, placeholders left as is",
                self.name
            );
        }
        Ok(MockReply::Queued(render_response(&pending.template, &identifiers)))
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("name", &self.name)
            .field("url", &self.endpoint.url)
            .field("started", &self.is_started())
            .finish()
    }
}
