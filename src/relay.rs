//! The retry orchestrator tying the pipeline together.
//!
//! One [`Relay::call`] drives the full lifecycle of a logical request: gate on
//! connectivity, build the wire request from the descriptor and the current auth
//! state, execute it, classify the outcome, and loop according to policy. Auth
//! expiry on the first attempt triggers exactly one refresh-then-retry; retryable
//! failures burn the descriptor's retry budget with a backoff wait in between;
//! everything else is terminal.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{RefreshCoordinator, TokenSecret},
	classify::{self, Outcome},
	connectivity::{AlwaysReachable, ConnectivityMonitor},
	endpoint::EndpointDescriptor,
	error::{AuthError, ConnectivityError, PolicyError},
	http::Transport,
	obs::{self, CallKind, CallOutcome, CallSpan},
	request,
};
#[cfg(feature = "reqwest")]
use crate::{auth::{RefreshGrant, TokenStore}, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Relay specialized for the crate's default reqwest transport stack.
pub type ReqwestRelay = Relay<ReqwestTransport>;

/// Backoff applied between retryable attempts.
///
/// A server-supplied `Retry-After` hint, when present, takes precedence over the
/// computed delay.
#[derive(Clone, Debug, PartialEq)]
pub enum BackoffPolicy {
	/// Fixed delay between attempts.
	Fixed(Duration),
	/// Exponential delay: `base * factor^retry`, capped at `max`.
	Exponential {
		/// Delay before the first retry.
		base: Duration,
		/// Multiplier applied per retry.
		factor: f64,
		/// Upper bound for the computed delay.
		max: Duration,
	},
}
impl BackoffPolicy {
	/// Computes the delay before retry number `retry` (0-indexed).
	pub fn delay(&self, retry: u32) -> Duration {
		match self {
			BackoffPolicy::Fixed(delay) => *delay,
			BackoffPolicy::Exponential { base, factor, max } => {
				let scaled = base.as_secs_f64() * factor.powi(retry.min(16) as i32);

				Duration::from_secs_f64(scaled.min(max.as_secs_f64()))
			},
		}
	}
}
impl Default for BackoffPolicy {
	fn default() -> Self {
		Self::Fixed(Duration::from_secs(1))
	}
}

/// Thread-safe counters for relay attempts.
#[derive(Debug, Default)]
pub struct RetryMetrics {
	attempts: AtomicU64,
	retries: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RetryMetrics {
	/// Returns the total number of transport attempts across all calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of attempts that were retries.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of logical calls that succeeded.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of logical calls that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

/// Executes declarative endpoints against one transport and one shared auth state.
///
/// The relay owns no global state; construct as many as needed and share the
/// refresh coordinator between relays whose requests authenticate against the same
/// account.
pub struct Relay<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for every attempt.
	pub transport: Arc<T>,
	/// Coordinator owning the shared auth state.
	pub auth: Arc<RefreshCoordinator<T>>,
	/// Connectivity snapshot provider queried before every attempt.
	pub connectivity: Arc<dyn ConnectivityMonitor>,
	/// Backoff applied between retryable attempts.
	pub backoff: BackoffPolicy,
	/// Shared attempt counters.
	pub metrics: Arc<RetryMetrics>,
}
impl<T> Relay<T>
where
	T: ?Sized + Transport,
{
	/// Creates a relay that reuses the caller-provided transport + coordinator pair.
	pub fn with_transport(
		transport: impl Into<Arc<T>>,
		auth: Arc<RefreshCoordinator<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			auth,
			connectivity: Arc::new(AlwaysReachable),
			backoff: BackoffPolicy::default(),
			metrics: Default::default(),
		}
	}

	/// Sets or replaces the connectivity monitor.
	pub fn with_connectivity(mut self, monitor: impl ConnectivityMonitor + 'static) -> Self {
		self.connectivity = Arc::new(monitor);

		self
	}

	/// Sets or replaces the backoff policy.
	pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
		self.backoff = backoff;

		self
	}

	/// Executes one logical request and decodes its payload.
	///
	/// Terminal results are exactly one of: a decoded payload, or one structured
	/// [`Error`]—never both, never neither.
	pub async fn call<P>(&self, endpoint: &EndpointDescriptor) -> Result<P>
	where
		P: DeserializeOwned,
	{
		const KIND: CallKind = CallKind::Execute;

		let span = CallSpan::new(KIND, "call");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.drive(endpoint)).await;

		match &result {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);
			},
		}

		result
	}

	async fn drive<P>(&self, endpoint: &EndpointDescriptor) -> Result<P>
	where
		P: DeserializeOwned,
	{
		// Attempt numbering follows the retry budget: the first attempt is 0 and
		// retryable failures may push it up to `retry_budget`. The one-shot auth
		// retry advances the number without consuming budget.
		let mut attempt: u32 = 0;
		let mut auth_retry_used = false;

		loop {
			if !self.connectivity.is_reachable() {
				return Err(ConnectivityError::Offline.into());
			}

			self.metrics.record_attempt();

			let token = self.auth.current_access_token().await;
			let access_token = token.as_ref().map(TokenSecret::expose);
			let credential_present = endpoint.credential.is_present(access_token);
			let built = request::build(endpoint, access_token);

			match classify::classify::<P>(self.transport.execute(&built).await) {
				Outcome::Success(payload) => return Ok(payload),
				Outcome::Offline => return Err(ConnectivityError::Offline.into()),
				Outcome::Fail(error) => return Err(error),
				Outcome::AuthExpired => {
					if attempt == 0 && !auth_retry_used && credential_present {
						auth_retry_used = true;

						match self.auth.refresh().await {
							Ok(()) => {
								attempt = 1;

								continue;
							},
							Err(_) => return Err(AuthError::Unauthenticated.into()),
						}
					}

					return Err(if credential_present {
						AuthError::SessionExpired.into()
					} else {
						AuthError::Unauthenticated.into()
					});
				},
				Outcome::Retry(reason) => {
					if attempt >= endpoint.retry_budget {
						return Err(PolicyError::MaxRetriesExceeded {
							attempts: attempt + 1,
							last: reason.to_string(),
						}
						.into());
					}

					self.metrics.record_retry();

					let delay = match &reason {
						classify::RetryReason::ServerError {
							retry_after: Some(hint), ..
						} => *hint,
						_ => self.backoff.delay(attempt),
					};

					tokio::time::sleep(delay).await;

					attempt += 1;
				},
			}
		}
	}
}
#[cfg(feature = "reqwest")]
impl ReqwestRelay {
	/// Creates a relay with a stock reqwest transport and its own coordinator.
	///
	/// The relay provisions the transport itself so callers only supply the token
	/// store and the refresh endpoint description. Use [`Relay::with_transport`]
	/// to share one transport or coordinator across relays.
	pub fn new(store: Arc<dyn TokenStore>, grant: RefreshGrant) -> Self {
		let transport = Arc::new(ReqwestTransport::default());
		let auth = Arc::new(RefreshCoordinator::new(transport.clone(), store, grant));

		Self::with_transport(transport, auth)
	}
}
impl<T> Debug for Relay<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay").field("backoff", &self.backoff).finish()
	}
}
