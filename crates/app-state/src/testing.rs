//! Test doubles shared by the unit tests of this crate

use async_trait::async_trait;
use networking::{ApiRequest, FetchError, HttpMethod, RemoteFetcher, RequestBody};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Parks async work until the test lets it through
pub(crate) struct Gate {
    open: bool,
    entered: Notify,
    permits: Semaphore,
}

impl Gate {
    pub(crate) fn open() -> Self {
        Self {
            open: true,
            entered: Notify::new(),
            permits: Semaphore::new(0),
        }
    }

    pub(crate) fn closed() -> Self {
        Self {
            open: false,
            ..Self::open()
        }
    }

    /// Wait for a permit (no-op on an open gate)
    pub(crate) async fn pass(&self) {
        if self.open {
            return;
        }
        self.entered.notify_one();
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    /// Resolves once something is parked at the gate
    pub(crate) async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let `n` parked or future callers through
    pub(crate) fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }
}

type Responder = Box<dyn Fn(&ApiRequest) -> Result<Value, FetchError> + Send + Sync>;

/// In-process backend routing on method and path
#[derive(Default)]
pub(crate) struct FakeBackend {
    routes: parking_lot::Mutex<HashMap<(HttpMethod, String), Responder>>,
    requests: parking_lot::Mutex<Vec<ApiRequest>>,
    gated: parking_lot::Mutex<HashSet<(HttpMethod, String)>>,
    gate: Option<Arc<Gate>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A backend whose gated routes park on `gate`
    pub(crate) fn with_gate(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, method: HttpMethod, path: &str, body: Value) {
        self.respond_with(method, path, move |_| Ok(body.clone()));
    }

    pub(crate) fn fail(&self, method: HttpMethod, path: &str, error: FetchError) {
        self.respond_with(method, path, move |_| Err(error.clone()));
    }

    /// Answer with the request's JSON body
    pub(crate) fn echo(&self, method: HttpMethod, path: &str) {
        self.respond_with(method, path, |req| {
            Ok(match &req.body {
                Some(RequestBody::Json(value)) => value.clone(),
                _ => Value::Null,
            })
        });
    }

    pub(crate) fn respond_with<F>(&self, method: HttpMethod, path: &str, responder: F)
    where
        F: Fn(&ApiRequest) -> Result<Value, FetchError> + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .insert((method, path.to_string()), Box::new(responder));
    }

    /// Park requests to this route on the gate
    pub(crate) fn gate_route(&self, method: HttpMethod, path: &str) {
        self.gated.lock().insert((method, path.to_string()));
    }

    pub(crate) fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RemoteFetcher for FakeBackend {
    async fn execute(&self, request: ApiRequest) -> Result<Value, FetchError> {
        let route = (request.method, request.path.clone());
        self.requests.lock().push(request.clone());

        let parked = self.gated.lock().contains(&route);
        if parked {
            if let Some(gate) = &self.gate {
                gate.pass().await;
            }
        }

        let routes = self.routes.lock();
        match routes.get(&route) {
            Some(responder) => responder(&request),
            None => Err(FetchError::Http {
                status: 404,
                body: format!("no route for {} {}", route.0.as_str(), route.1),
            }),
        }
    }
}
