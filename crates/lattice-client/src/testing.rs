use crate::{FetchRequest, Method, Transport, TransportError};
use async_trait::async_trait;
use lattice_core::TransportReply;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory transport that replays scripted replies per method and URL.
///
/// Replies queued for the same route are served in order; the last one
/// repeats once the queue is down to it. Unscripted routes answer 404.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    routes: BTreeMap<String, VecDeque<TransportReply>>,
    requests: Vec<FetchRequest>,
}

fn route(method: Method, url: &str) -> String {
    format!("{} {url}", method.as_str())
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poisoned locks are recovered; the script state stays consistent.
    fn state(&self) -> MutexGuard<'_, ScriptedState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn respond(&self, method: Method, url: impl AsRef<str>, reply: TransportReply) -> &Self {
        self.state()
            .routes
            .entry(route(method, url.as_ref()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn respond_json(&self, url: impl AsRef<str>, body: serde_json::Value) -> &Self {
        self.respond(Method::Get, url, TransportReply::success(body))
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.state().requests.clone()
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.url)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<TransportReply, TransportError> {
        let mut state = self.state();
        let key = route(request.method, &request.url);
        state.requests.push(request);

        let reply = match state.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(reply.unwrap_or_else(|| {
            TransportReply::from_status(
                404,
                json!({"errors": [{"status": "404", "title": format!("no scripted reply for {key}")}]}),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison(transport: &ScriptedTransport) {
        let inner = Arc::clone(&transport.inner);
        let outcome = std::thread::spawn(move || {
            let _guard = inner.lock().expect("lock should be free");
            panic!("poisoning the scripted transport");
        })
        .join();
        assert!(outcome.is_err());
        assert!(transport.inner.is_poisoned());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn respond_after_poisoned_lock_expected_reply_still_served() {
        let transport = ScriptedTransport::new();
        poison(&transport);

        transport.respond_json("http://api.test/people", json!({"data": []}));
        let reply = transport
            .fetch(FetchRequest::get("http://api.test/people"))
            .await
            .expect("fetch should succeed");

        assert!(reply.ok);
        assert_eq!(reply.data, json!({"data": []}));
        assert_eq!(transport.request_urls(), vec!["http://api.test/people"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_queued_replies_expected_in_order_then_last_repeats() {
        let transport = ScriptedTransport::new();
        transport.respond_json("http://api.test/people", json!({"data": [], "meta": {"n": 1}}));
        transport.respond_json("http://api.test/people", json!({"data": [], "meta": {"n": 2}}));

        let mut seen = Vec::new();
        for _ in 0..3 {
            let reply = transport
                .fetch(FetchRequest::get("http://api.test/people"))
                .await
                .expect("fetch should succeed");
            seen.push(reply.data["meta"]["n"].clone());
        }

        assert_eq!(seen, vec![json!(1), json!(2), json!(2)]);
    }
}
