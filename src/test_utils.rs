// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking the Kubernetes API server.
//!
//! [`MockService`] keeps created objects in memory keyed by their item path,
//! so a probe can run its whole create/get/replace/delete sequence against it.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request as seen by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

type StatusHook = Arc<dyn Fn(&mut Value) + Send + Sync>;

#[derive(Default)]
struct State {
    objects: HashMap<String, Value>,
    requests: Vec<RecordedRequest>,
    /// Remaining replace requests to reject with 409, keyed by path prefix
    conflicts: Vec<(String, u32)>,
    /// Hooks run against stored objects on every GET, keyed by path prefix
    status_hooks: Vec<(String, StatusHook)>,
    next_resource_version: u64,
}

impl State {
    fn bump_version(&mut self, obj: &mut Value) {
        self.next_resource_version += 1;
        obj["metadata"]["resourceVersion"] = json!(self.next_resource_version.to_string());
    }
}

/// A stateful mock HTTP service standing in for the API server.
#[derive(Clone)]
pub struct MockService {
    state: Arc<Mutex<State>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Seed an object at the given item path
    pub fn with_object(self, path: &str, mut object: Value) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.bump_version(&mut object);
            state.objects.insert(path.to_string(), object);
        }
        self
    }

    /// Mutate stored objects under `prefix` each time they are read,
    /// standing in for a controller converging their status.
    pub fn on_get_status<F>(self, prefix: &str, hook: F) -> Self
    where
        F: Fn(&mut Value) + Send + Sync + 'static,
    {
        self.state
            .lock()
            .unwrap()
            .status_hooks
            .push((prefix.to_string(), Arc::new(hook)));
        self
    }

    /// Reject the next `times` replace requests under `prefix` with 409 Conflict
    pub fn conflict_on_replace(self, prefix: &str, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .conflicts
            .push((prefix.to_string(), times));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(path)
    }

    /// Paths of all stored objects under `prefix`
    pub fn paths_under(&self, prefix: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .objects
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    fn handle(&self, method: &str, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: body.clone(),
        });

        match method {
            "GET" => {
                let hooks: Vec<StatusHook> = state
                    .status_hooks
                    .iter()
                    .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
                    .map(|(_, hook)| hook.clone())
                    .collect();
                match state.objects.get_mut(path) {
                    Some(obj) => {
                        for hook in hooks {
                            hook(obj);
                        }
                        (200, obj.clone())
                    }
                    None => not_found(path),
                }
            }
            "POST" => {
                let Some(mut obj) = body else {
                    return (400, status_json(400, "BadRequest", "missing body"));
                };
                let Some(name) = obj["metadata"]["name"].as_str().map(str::to_string) else {
                    return (422, status_json(422, "Invalid", "metadata.name is required"));
                };
                let key = format!("{}/{}", path, name);
                if state.objects.contains_key(&key) {
                    let msg = format!("{} already exists", name);
                    return (409, status_json(409, "AlreadyExists", &msg));
                }
                obj["metadata"]["uid"] = json!(format!("uid-{}", name));
                state.bump_version(&mut obj);
                state.objects.insert(key, obj.clone());
                (201, obj)
            }
            "PUT" => {
                let Some(mut obj) = body else {
                    return (400, status_json(400, "BadRequest", "missing body"));
                };
                let Some(stored) = state.objects.get(path).cloned() else {
                    return not_found(path);
                };
                if let Some((_, remaining)) = state
                    .conflicts
                    .iter_mut()
                    .find(|(prefix, remaining)| path.starts_with(prefix.as_str()) && *remaining > 0)
                {
                    *remaining -= 1;
                    return (409, conflict(path));
                }
                if obj["metadata"]["resourceVersion"] != stored["metadata"]["resourceVersion"] {
                    return (409, conflict(path));
                }
                // status is owned by the status subresource
                if let Some(status) = stored.get("status") {
                    obj["status"] = status.clone();
                }
                state.bump_version(&mut obj);
                state.objects.insert(path.to_string(), obj.clone());
                (200, obj)
            }
            "DELETE" => match state.objects.remove(path) {
                Some(obj) => (200, obj),
                None => not_found(path),
            },
            _ => (405, status_json(405, "MethodNotAllowed", method)),
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let this = self.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let bytes = req.into_body().collect().await?.to_bytes();
            let body = if bytes.is_empty() {
                None
            } else {
                Some(serde_json::from_slice(&bytes)?)
            };

            let (status, value) = this.handle(&method, &path, body);

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))?)
        })
    }
}

fn status_json(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
}

fn not_found(path: &str) -> (u16, Value) {
    let name = path.rsplit('/').next().unwrap_or(path);
    (404, status_json(404, "NotFound", &format!("\"{}\" not found", name)))
}

fn conflict(path: &str) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    status_json(
        409,
        "Conflict",
        &format!(
            "Operation cannot be fulfilled on \"{}\": the object has been modified",
            name
        ),
    )
}
