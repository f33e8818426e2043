//! Single-flight token refresh coordination.
//!
//! One coordinator owns one auth state. However many requests hit a 401
//! simultaneously, exactly one refresh call goes out: the first caller spawns the
//! refresh as a detached task and every caller (including later arrivals) awaits a
//! shared handle to it. Because the task is detached, a caller that gets canceled
//! abandons only its own continuation—the refresh keeps running for the others.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures::{FutureExt, future::Shared};
// self
use crate::{
	_prelude::*,
	auth::{StoreError, TokenSecret, TokenStore},
	classify::{self, Outcome},
	endpoint::{EndpointDescriptor, ParamValue},
	error::ErrorKind,
	http::Transport,
	obs::{self, CallKind, CallOutcome, CallSpan},
	request,
};

type SharedRefresh = Shared<Pin<Box<dyn Future<Output = Result<(), RefreshFailure>> + Send>>>;

/// Failure surfaced by a refresh operation.
///
/// Cloneable because every caller awaiting the shared in-flight operation receives
/// the same value.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshFailure {
	/// No refresh token is stored; only a new login can recover.
	#[error("No refresh token is available.")]
	Unauthenticated,
	/// The refresh endpoint rejected the stored grant; the tokens were cleared.
	#[error("The refresh endpoint rejected the stored grant: {message}")]
	Rejected {
		/// Server-supplied rejection message.
		message: String,
	},
	/// The refresh call failed before completing; the tokens were left untouched.
	#[error("The refresh call failed before completing: {message}")]
	Upstream {
		/// Underlying failure description.
		message: String,
	},
	/// The refresh task was interrupted before producing a result.
	#[error("The refresh task was interrupted before it finished.")]
	Interrupted,
}

/// Description of the external refresh endpoint.
///
/// Shaped like any other endpoint, but executed directly against the transport:
/// the refresh call never retries and never triggers its own reauthentication.
#[derive(Clone, Debug)]
pub struct RefreshGrant {
	/// Endpoint the rotation request is sent to.
	pub endpoint: EndpointDescriptor,
	/// Body parameter name carrying the stored refresh token.
	pub token_param: String,
}
impl RefreshGrant {
	/// Creates a grant description for the provided endpoint.
	pub fn new(endpoint: EndpointDescriptor) -> Self {
		Self { endpoint, token_param: "refresh_token".into() }
	}

	/// Overrides the body parameter name carrying the refresh token.
	pub fn with_token_param(mut self, name: impl Into<String>) -> Self {
		self.token_param = name.into();

		self
	}

	fn request_for(&self, refresh_token: &str) -> crate::request::BuiltRequest {
		let mut endpoint = self.endpoint.clone();

		endpoint
			.body
			.get_or_insert_with(BTreeMap::new)
			.insert(self.token_param.clone(), ParamValue::Text(refresh_token.into()));

		request::build(&endpoint, None)
	}
}

/// Token pair issued by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct IssuedTokens {
	access_token: String,
	refresh_token: String,
}

/// Thread-safe counters for refresh attempts.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of refresh calls that went out.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refresh calls.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh calls.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

struct InflightRefresh {
	generation: u64,
	operation: SharedRefresh,
}

/// Coordinates token refreshes for one shared auth state.
///
/// Construct once and share (`Arc`) between every relay whose requests authenticate
/// against the same account. Requires a running tokio runtime, because refresh
/// operations run as detached tasks.
pub struct RefreshCoordinator<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	store: Arc<dyn TokenStore>,
	grant: RefreshGrant,
	metrics: Arc<RefreshMetrics>,
	generation: AtomicU64,
	inflight: Mutex<Option<InflightRefresh>>,
}
impl<T> RefreshCoordinator<T>
where
	T: ?Sized + Transport,
{
	/// Creates a coordinator around the provided transport, store, and grant.
	pub fn new(
		transport: impl Into<Arc<T>>,
		store: Arc<dyn TokenStore>,
		grant: RefreshGrant,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			grant,
			metrics: Default::default(),
			generation: AtomicU64::new(0),
			inflight: Mutex::new(None),
		}
	}

	/// Returns the refresh counters shared with this coordinator.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns the current access token without blocking on other operations.
	///
	/// Storage read failures degrade to `None`; the caller then behaves as if no
	/// credential were present.
	pub async fn current_access_token(&self) -> Option<TokenSecret> {
		self.store.access_token().await.ok().flatten()
	}

	/// Installs a freshly issued token pair (login hand-off).
	pub async fn install_tokens(
		&self,
		access: impl Into<TokenSecret>,
		refresh: impl Into<TokenSecret>,
	) -> Result<(), StoreError> {
		self.store.store(Some(access.into()), Some(refresh.into())).await
	}

	/// Clears the stored token pair (logout).
	pub async fn clear_tokens(&self) -> Result<(), StoreError> {
		self.store.store(None, None).await
	}

	/// Rotates the stored tokens through the refresh endpoint.
	///
	/// Callers arriving while a refresh is in flight await the same operation
	/// instead of issuing a duplicate network call.
	pub async fn refresh(&self) -> Result<(), RefreshFailure> {
		let (generation, operation) = self.join_inflight();
		let result = operation.await;
		let mut slot = self.inflight.lock();

		if slot.as_ref().is_some_and(|inflight| inflight.generation == generation) {
			*slot = None;
		}

		drop(slot);

		result
	}

	fn join_inflight(&self) -> (u64, SharedRefresh) {
		let mut slot = self.inflight.lock();

		if let Some(inflight) = slot.as_ref() {
			return (inflight.generation, inflight.operation.clone());
		}

		let generation = self.generation.fetch_add(1, Ordering::Relaxed);
		let task = tokio::spawn(Self::execute(
			Arc::clone(&self.transport),
			Arc::clone(&self.store),
			self.grant.clone(),
			Arc::clone(&self.metrics),
		));
		let boxed: Pin<Box<dyn Future<Output = Result<(), RefreshFailure>> + Send>> =
			Box::pin(async move { task.await.unwrap_or(Err(RefreshFailure::Interrupted)) });
		let operation = boxed.shared();

		*slot = Some(InflightRefresh { generation, operation: operation.clone() });

		(generation, operation)
	}

	async fn execute(
		transport: Arc<T>,
		store: Arc<dyn TokenStore>,
		grant: RefreshGrant,
		metrics: Arc<RefreshMetrics>,
	) -> Result<(), RefreshFailure> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		metrics.record_attempt();

		let result = span
			.instrument(async move {
				let stored = store
					.refresh_token()
					.await
					.map_err(|error| RefreshFailure::Upstream { message: error.to_string() })?;
				let Some(refresh_token) = stored else {
					return Err(RefreshFailure::Unauthenticated);
				};
				let request = grant.request_for(refresh_token.expose());

				match classify::classify::<IssuedTokens>(transport.execute(&request).await) {
					Outcome::Success(issued) => {
						store
							.store(
								Some(TokenSecret::new(issued.access_token)),
								Some(TokenSecret::new(issued.refresh_token)),
							)
							.await
							.map_err(|error| RefreshFailure::Upstream {
								message: error.to_string(),
							})?;

						Ok(())
					},
					Outcome::AuthExpired => {
						let _ = store.store(None, None).await;

						Err(RefreshFailure::Rejected {
							message: "the stored refresh token is no longer accepted".into(),
						})
					},
					Outcome::Fail(error) => match error.kind() {
						ErrorKind::Authentication
						| ErrorKind::Authorization
						| ErrorKind::Client => {
							let _ = store.store(None, None).await;

							Err(RefreshFailure::Rejected { message: error.to_string() })
						},
						_ => Err(RefreshFailure::Upstream { message: error.to_string() }),
					},
					Outcome::Retry(reason) =>
						Err(RefreshFailure::Upstream { message: reason.to_string() }),
					Outcome::Offline => Err(RefreshFailure::Upstream {
						message: "connectivity was lost during the token refresh".into(),
					}),
				}
			})
			.await;

		match &result {
			Ok(()) => {
				metrics.record_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);
			},
			Err(_) => {
				metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);
			},
		}

		result
	}
}
impl<T> Debug for RefreshCoordinator<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("grant", &self.grant)
			.field("inflight", &self.inflight.lock().is_some())
			.finish()
	}
}
