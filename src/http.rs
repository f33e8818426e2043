//! Transport primitives for executing built requests.
//!
//! The module exposes [`Transport`] as the relay's only dependency on an HTTP stack,
//! together with the raw response/failure types the classifier consumes. A
//! reqwest-backed implementation ships behind the default `reqwest` feature;
//! callers with bespoke stacks (pinned sessions, test harnesses) implement the
//! trait themselves and hand the relay an `Arc` of it.

// std
use std::ops::Deref;
// crates.io
use time::{OffsetDateTime, format_description::well_known::Rfc2822};
// self
use crate::{_prelude::*, request::BuiltRequest};

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportFailure>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing one built request.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared between a
/// relay and its refresh coordinator without additional wrappers. One call maps to
/// at most one outstanding HTTP exchange; retries live above this seam.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request and resolves with the raw response or a transport failure.
	fn execute<'a>(&'a self, request: &'a BuiltRequest) -> TransportFuture<'a>;
}

/// Raw HTTP response captured before classification.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lowercased names.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Constructs a response from a status and body with no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Returns the `Retry-After` hint as a relative duration, when present.
	///
	/// Accepts both the integer-seconds and RFC 2822 date forms; dates in the past
	/// yield no hint.
	pub fn retry_after(&self) -> Option<Duration> {
		let raw = self.headers.get("retry-after")?.trim();

		if let Ok(secs) = raw.parse::<u64>() {
			return Some(Duration::from_secs(secs));
		}
		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			if delta.is_positive() {
				return Some(delta.unsigned_abs());
			}
		}

		None
	}
}

/// Transport-level failure raised before any HTTP response was produced.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TransportFailure {
	/// The network is unreachable.
	#[error("The network is unreachable.")]
	Offline,
	/// The attempt exceeded its timeout.
	#[error("The request timed out.")]
	Timeout,
	/// The caller canceled the request.
	#[error("The request was canceled.")]
	Canceled,
	/// The transport produced no usable HTTP response.
	#[error("The transport produced no usable HTTP response.")]
	Invalid,
	/// Any other transport failure.
	#[error("The transport failed: {message}")]
	Other {
		/// Transport-specific failure description.
		message: String,
	},
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The wrapped client is reused across every attempt; per-attempt timeouts come from
/// the built request rather than the client configuration.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute<'a>(&'a self, request: &'a BuiltRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			let method = reqwest::Method::from(request.method);
			let mut builder =
				self.0.request(method, request.url.clone()).timeout(request.timeout);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = &request.body {
				builder = builder.body(body.clone());
			}

			let response = builder.send().await.map_err(map_reqwest_error)?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value
						.to_str()
						.ok()
						.map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
				})
				.collect();
			let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

			Ok(RawResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
impl From<crate::endpoint::Method> for reqwest::Method {
	fn from(method: crate::endpoint::Method) -> Self {
		use crate::endpoint::Method as Endpoint;

		match method {
			Endpoint::Delete => reqwest::Method::DELETE,
			Endpoint::Get => reqwest::Method::GET,
			Endpoint::Head => reqwest::Method::HEAD,
			Endpoint::Patch => reqwest::Method::PATCH,
			Endpoint::Post => reqwest::Method::POST,
			Endpoint::Put => reqwest::Method::PUT,
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(error: reqwest::Error) -> TransportFailure {
	if error.is_timeout() {
		TransportFailure::Timeout
	} else if error.is_connect() {
		TransportFailure::Offline
	} else {
		TransportFailure::Other { message: error.to_string() }
	}
}
