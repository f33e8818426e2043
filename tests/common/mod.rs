//! Shared fixtures for relay integration tests: a scripted transport plus
//! descriptor/relay builders.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use api_relay::{
	auth::{MemoryTokenStore, RefreshCoordinator, RefreshGrant, TokenSecret, TokenStore},
	connectivity::ConnectivityMonitor,
	endpoint::{Credential, EndpointDescriptor, Method},
	http::{RawResponse, Transport, TransportFailure, TransportFuture},
	relay::Relay,
	request::BuiltRequest,
};

/// One scripted transport exchange.
pub struct Scripted {
	delay: Option<Duration>,
	result: Result<RawResponse, TransportFailure>,
}

/// Transport that replays a scripted sequence of results and records every
/// request it executed.
#[derive(Default)]
pub struct MockTransport {
	script: Mutex<VecDeque<Scripted>>,
	seen: Mutex<Vec<BuiltRequest>>,
}
impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn push_response(&self, status: u16, body: &str) {
		self.script
			.lock()
			.push_back(Scripted { delay: None, result: Ok(RawResponse::new(status, body)) });
	}

	pub fn push_response_with_header(&self, status: u16, body: &str, name: &str, value: &str) {
		let mut response = RawResponse::new(status, body);

		response.headers.insert(name.into(), value.into());
		self.script.lock().push_back(Scripted { delay: None, result: Ok(response) });
	}

	pub fn push_delayed_response(&self, delay: Duration, status: u16, body: &str) {
		self.script
			.lock()
			.push_back(Scripted { delay: Some(delay), result: Ok(RawResponse::new(status, body)) });
	}

	pub fn push_failure(&self, failure: TransportFailure) {
		self.script.lock().push_back(Scripted { delay: None, result: Err(failure) });
	}

	pub fn calls(&self) -> usize {
		self.seen.lock().len()
	}

	pub fn requests(&self) -> Vec<BuiltRequest> {
		self.seen.lock().clone()
	}
}
impl Transport for MockTransport {
	fn execute<'a>(&'a self, request: &'a BuiltRequest) -> TransportFuture<'a> {
		self.seen.lock().push(request.clone());

		let scripted = self.script.lock().pop_front();

		Box::pin(async move {
			let Some(scripted) = scripted else {
				return Err(TransportFailure::Other { message: "script exhausted".into() });
			};

			if let Some(delay) = scripted.delay {
				tokio::time::sleep(delay).await;
			}

			scripted.result
		})
	}
}

/// Monitor that reports reachability for a fixed number of checks, then goes dark.
pub struct StepMonitor(AtomicUsize);
impl StepMonitor {
	pub fn reachable_for(checks: usize) -> Self {
		Self(AtomicUsize::new(checks))
	}
}
impl ConnectivityMonitor for StepMonitor {
	fn is_reachable(&self) -> bool {
		self.0
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |remaining| {
				remaining.checked_sub(1)
			})
			.is_ok()
	}
}

/// Refresh endpoint description shared across scripted tests.
pub fn refresh_grant() -> RefreshGrant {
	let endpoint = EndpointDescriptor::builder("auth.test")
		.path("/token")
		.method(Method::Post)
		.build()
		.expect("Refresh endpoint fixture should build successfully.");

	RefreshGrant::new(endpoint)
}

/// Builds a relay + coordinator + in-memory store around a scripted transport.
pub fn build_relay(
	transport: Arc<MockTransport>,
) -> (Relay<MockTransport>, Arc<RefreshCoordinator<MockTransport>>, Arc<MemoryTokenStore>) {
	let store_backend = Arc::new(MemoryTokenStore::default());
	let store: Arc<dyn TokenStore> = store_backend.clone();
	let coordinator = Arc::new(RefreshCoordinator::new(transport.clone(), store, refresh_grant()));
	let relay = Relay::with_transport(transport, coordinator.clone());

	(relay, coordinator, store_backend)
}

/// Seeds the store with an access/refresh token pair.
pub async fn seed_tokens(store: &MemoryTokenStore, access: &str, refresh: &str) {
	store
		.store(Some(TokenSecret::new(access)), Some(TokenSecret::new(refresh)))
		.await
		.expect("Failed to seed tokens into the store.");
}

/// Bearer-authenticated GET descriptor with the provided retry budget.
pub fn bearer_get(path: &str, retry_budget: u32) -> EndpointDescriptor {
	EndpointDescriptor::builder("api.test")
		.path(path)
		.credential(Credential::Bearer)
		.retry_budget(retry_budget)
		.build()
		.expect("Endpoint fixture should build successfully.")
}

/// Unauthenticated GET descriptor with the provided retry budget.
pub fn plain_get(path: &str, retry_budget: u32) -> EndpointDescriptor {
	EndpointDescriptor::builder("api.test")
		.path(path)
		.retry_budget(retry_budget)
		.build()
		.expect("Endpoint fixture should build successfully.")
}
