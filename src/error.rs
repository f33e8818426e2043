//! Relay-level error types shared across the request pipeline, classifier, and auth layer.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical relay error exposed by public APIs.
///
/// Every variant renders a stable, human-readable message and maps onto an
/// [`ErrorKind`] via [`Error::kind`] so user interfaces can branch on the failure
/// category without matching individual variants.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Authentication failure (missing or expired credentials).
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Request was rejected by the server for a client-side reason.
	#[error(transparent)]
	Client(#[from] ClientError),
	/// Network is unreachable.
	#[error(transparent)]
	Connectivity(#[from] ConnectivityError),
	/// Endpoint description could not be validated.
	#[error(transparent)]
	Endpoint(#[from] crate::endpoint::EndpointError),
	/// Retry or cancellation policy terminated the request.
	#[error(transparent)]
	Policy(#[from] PolicyError),
	/// Response could not be interpreted as the expected protocol exchange.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Token-storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::auth::StoreError,
	),

	/// Server refused access to the resource.
	#[error("Access to this resource is forbidden.")]
	Forbidden,
	/// Server reported a failure with a message of its own.
	#[error("{message}")]
	Server {
		/// HTTP status code the failure was derived from.
		status: u16,
		/// Server- or relay-supplied message describing the failure.
		message: String,
	},
	/// Server requires a newer client version before serving requests.
	#[error("The application must be updated to continue.")]
	AppUpdateRequired,
}
impl Error {
	/// Returns the stable failure category for UI branching.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Auth(_) => ErrorKind::Authentication,
			Self::Client(_) => ErrorKind::Client,
			Self::Connectivity(_) => ErrorKind::Connectivity,
			Self::Endpoint(_) => ErrorKind::Configuration,
			Self::Policy(_) => ErrorKind::Policy,
			Self::Protocol(_) => ErrorKind::Protocol,
			Self::Storage(_) => ErrorKind::Storage,
			Self::Forbidden => ErrorKind::Authorization,
			Self::Server { .. } => ErrorKind::Server,
			Self::AppUpdateRequired => ErrorKind::Versioning,
		}
	}
}

/// Stable failure categories surfaced alongside every terminal [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Missing or expired credentials.
	Authentication,
	/// Credentials were valid but access was refused.
	Authorization,
	/// Request was malformed, invalid, or targeted a missing resource.
	Client,
	/// Local endpoint configuration problem.
	Configuration,
	/// No network, or the network dropped mid-request.
	Connectivity,
	/// Retry budget or cancellation policy ended the request.
	Policy,
	/// Response could not be parsed or decoded.
	Protocol,
	/// Upstream 5xx failure.
	Server,
	/// Token storage backend failure.
	Storage,
	/// Client version is too old for the server.
	Versioning,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Authentication => "authentication",
			ErrorKind::Authorization => "authorization",
			ErrorKind::Client => "client",
			ErrorKind::Configuration => "configuration",
			ErrorKind::Connectivity => "connectivity",
			ErrorKind::Policy => "policy",
			ErrorKind::Protocol => "protocol",
			ErrorKind::Server => "server",
			ErrorKind::Storage => "storage",
			ErrorKind::Versioning => "versioning",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Authentication failures raised by the relay.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// No usable credentials are available.
	#[error("No credentials are available; sign in to continue.")]
	Unauthenticated,
	/// Credentials were present but the server no longer accepts them.
	#[error("The session has expired; sign in again to continue.")]
	SessionExpired,
}

/// Client-side request failures reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientError {
	/// Server rejected the request as malformed.
	#[error("{message}")]
	BadRequest {
		/// Server- or relay-supplied message describing the failure.
		message: String,
	},
	/// Requested resource does not exist.
	#[error("{message}")]
	NotFound {
		/// Server- or relay-supplied message describing the failure.
		message: String,
	},
	/// Request was well-formed but semantically invalid.
	#[error("{message}")]
	Validation {
		/// Server- or relay-supplied message describing the failure.
		message: String,
	},
}

/// Connectivity failures observed before or during an attempt.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConnectivityError {
	/// The device has no route to the network.
	#[error("The network connection appears to be offline.")]
	Offline,
}

/// Policy-driven terminations (retry budgets, cancellation).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PolicyError {
	/// Caller canceled the request.
	#[error("The request was canceled.")]
	Canceled,
	/// Every allowed attempt failed with a retryable error.
	#[error("The request failed after {attempts} attempts: {last}")]
	MaxRetriesExceeded {
		/// Total number of attempts performed.
		attempts: u32,
		/// Message describing the final retryable failure.
		last: String,
	},
}

/// Protocol failures (unusable responses, decode errors).
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Transport produced no usable HTTP response.
	#[error("The server returned an unusable response.")]
	InvalidResponse,
	/// Transport failed for a reason outside the retry taxonomy.
	#[error("The transport failed before a response was received: {message}")]
	Transport {
		/// Transport-supplied message summarizing the failure.
		message: String,
	},
	/// Response body matched neither the envelope nor the target payload shape.
	#[error("The response body could not be decoded.")]
	Decode {
		/// Structured parsing failure pointing at the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
