//! Response classification: one transport result in, one tagged [`Outcome`] out.
//!
//! Classification runs in a fixed order: transport failures first, then the status
//! table, then body decoding. Success bodies may arrive wrapped in an envelope
//! (`{success, message, data, statusCode}`) or as the bare payload; a 2xx envelope
//! with `success == false` counts as a server-reported failure. Error bodies get a
//! secondary pass that prefers a server-supplied `message` over the generic
//! status-derived one, except for auth/forbidden/update-required responses whose
//! bodies carry no reliable message.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ClientError, PolicyError, ProtocolError},
	http::{RawResponse, TransportFailure},
};

/// Tagged outcome of one attempt, produced fresh per transport call.
#[derive(Debug)]
pub enum Outcome<P> {
	/// Decoded payload from a successful response.
	Success(P),
	/// Transient failure; the orchestrator may retry it within budget.
	Retry(RetryReason),
	/// Terminal failure, surfaced to the caller unchanged.
	Fail(Error),
	/// Credential was rejected; eligible for the one-shot refresh-then-retry path.
	AuthExpired,
	/// Connectivity was lost at the transport layer.
	Offline,
}

/// Why an attempt is worth retrying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryReason {
	/// The attempt exceeded its timeout.
	Timeout,
	/// Upstream 5xx failure.
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Server- or relay-supplied message describing the failure.
		message: String,
		/// Optional server-supplied delay hint.
		retry_after: Option<Duration>,
	},
}
impl Display for RetryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			RetryReason::Timeout => f.write_str("The request timed out."),
			RetryReason::ServerError { message, .. } => f.write_str(message),
		}
	}
}

/// Response envelope some endpoints wrap their payloads in.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "P: DeserializeOwned"))]
struct Envelope<P> {
	success: bool,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	data: Option<P>,
	#[serde(default, rename = "statusCode")]
	status_code: Option<u16>,
}

/// Classifies one transport result into an [`Outcome`].
pub fn classify<P>(result: Result<RawResponse, TransportFailure>) -> Outcome<P>
where
	P: DeserializeOwned,
{
	let response = match result {
		Ok(response) => response,
		Err(TransportFailure::Offline) => return Outcome::Offline,
		Err(TransportFailure::Timeout) => return Outcome::Retry(RetryReason::Timeout),
		Err(TransportFailure::Canceled) => return Outcome::Fail(PolicyError::Canceled.into()),
		Err(TransportFailure::Invalid) =>
			return Outcome::Fail(ProtocolError::InvalidResponse.into()),
		Err(TransportFailure::Other { message }) =>
			return Outcome::Fail(ProtocolError::Transport { message }.into()),
	};
	let status = response.status;

	match status {
		200 | 201 => decode_success(&response.body),
		401 | 440 => Outcome::AuthExpired,
		400 => Outcome::Fail(
			ClientError::BadRequest { message: error_message(&response.body, status) }.into(),
		),
		403 => Outcome::Fail(Error::Forbidden),
		404 => Outcome::Fail(
			ClientError::NotFound { message: error_message(&response.body, status) }.into(),
		),
		422 => Outcome::Fail(
			ClientError::Validation { message: error_message(&response.body, status) }.into(),
		),
		426 => Outcome::Fail(Error::AppUpdateRequired),
		status if status >= 500 => Outcome::Retry(RetryReason::ServerError {
			status,
			message: error_message(&response.body, status),
			retry_after: response.retry_after(),
		}),
		status => Outcome::Fail(Error::Server {
			status,
			message: error_message(&response.body, status),
		}),
	}
}

fn decode_success<P>(body: &[u8]) -> Outcome<P>
where
	P: DeserializeOwned,
{
	if let Ok(envelope) = serde_json::from_slice::<Envelope<P>>(body) {
		if !envelope.success {
			let message = envelope
				.message
				.unwrap_or_else(|| "The server reported a failure.".into());

			return Outcome::Fail(Error::Server {
				status: envelope.status_code.unwrap_or(200),
				message,
			});
		}
		if let Some(data) = envelope.data {
			return Outcome::Success(data);
		}
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	match serde_path_to_error::deserialize(&mut deserializer) {
		Ok(payload) => Outcome::Success(payload),
		Err(source) => Outcome::Fail(ProtocolError::Decode { source }.into()),
	}
}

/// Extracts a server-supplied message from an error body, falling back to the
/// generic status-derived message.
fn error_message(body: &[u8], status: u16) -> String {
	body_message(body).unwrap_or_else(|| format!("Request failed with status code {status}"))
}

fn body_message(body: &[u8]) -> Option<String> {
	#[derive(Deserialize)]
	struct MessageOnly {
		message: String,
	}

	if let Ok(extracted) = serde_json::from_slice::<MessageOnly>(body) {
		return Some(extracted.message);
	}

	serde_json::from_slice::<Envelope<serde_json::Value>>(body)
		.ok()
		.and_then(|envelope| envelope.message)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ErrorKind;

	#[derive(Debug, Deserialize, PartialEq)]
	struct User {
		id: u32,
	}

	fn ok(status: u16, body: &str) -> Result<RawResponse, TransportFailure> {
		Ok(RawResponse::new(status, body.as_bytes().to_vec()))
	}

	#[test]
	fn bare_payloads_decode_directly() {
		match classify::<User>(ok(200, r#"{"id":7}"#)) {
			Outcome::Success(user) => assert_eq!(user, User { id: 7 }),
			other => panic!("Expected a success outcome, got {other:?}."),
		}
	}

	#[test]
	fn enveloped_payloads_unwrap_the_data_field() {
		match classify::<User>(ok(200, r#"{"success":true,"data":{"id":9}}"#)) {
			Outcome::Success(user) => assert_eq!(user, User { id: 9 }),
			other => panic!("Expected a success outcome, got {other:?}."),
		}
	}

	#[test]
	fn envelope_failure_beats_the_http_status() {
		match classify::<User>(ok(
			200,
			r#"{"success":false,"message":"Quota exhausted","statusCode":429}"#,
		)) {
			Outcome::Fail(Error::Server { status, message }) => {
				assert_eq!(status, 429);
				assert_eq!(message, "Quota exhausted");
			},
			other => panic!("Expected a server failure, got {other:?}."),
		}
	}

	#[test]
	fn undecodable_bodies_fail_with_a_decode_error() {
		match classify::<User>(ok(200, "not json")) {
			Outcome::Fail(error) => assert_eq!(error.kind(), ErrorKind::Protocol),
			other => panic!("Expected a protocol failure, got {other:?}."),
		}
	}

	#[test]
	fn unauthorized_statuses_map_to_auth_expired() {
		assert!(matches!(classify::<User>(ok(401, "")), Outcome::AuthExpired));
		assert!(matches!(classify::<User>(ok(440, "")), Outcome::AuthExpired));
	}

	#[test]
	fn client_errors_prefer_the_body_message() {
		match classify::<User>(ok(400, r#"{"message":"Name is required"}"#)) {
			Outcome::Fail(Error::Client(ClientError::BadRequest { message })) =>
				assert_eq!(message, "Name is required"),
			other => panic!("Expected a bad-request failure, got {other:?}."),
		}
	}

	#[test]
	fn client_errors_fall_back_to_the_status_message() {
		match classify::<User>(ok(404, "")) {
			Outcome::Fail(Error::Client(ClientError::NotFound { message })) =>
				assert_eq!(message, "Request failed with status code 404"),
			other => panic!("Expected a not-found failure, got {other:?}."),
		}
	}

	#[test]
	fn envelope_messages_back_fill_client_errors() {
		match classify::<User>(ok(422, r#"{"success":false,"message":"Too short"}"#)) {
			Outcome::Fail(Error::Client(ClientError::Validation { message })) =>
				assert_eq!(message, "Too short"),
			other => panic!("Expected a validation failure, got {other:?}."),
		}
	}

	#[test]
	fn forbidden_and_update_required_pass_through_unchanged() {
		match classify::<User>(ok(403, r#"{"message":"ignored"}"#)) {
			Outcome::Fail(Error::Forbidden) => (),
			other => panic!("Expected a forbidden failure, got {other:?}."),
		}
		match classify::<User>(ok(426, r#"{"message":"ignored"}"#)) {
			Outcome::Fail(Error::AppUpdateRequired) => (),
			other => panic!("Expected an update-required failure, got {other:?}."),
		}
	}

	#[test]
	fn server_errors_are_retryable_with_hints() {
		let mut response = RawResponse::new(503, br#"{"message":"Maintenance"}"#.to_vec());

		response.headers.insert("retry-after".into(), "2".into());

		match classify::<User>(Ok(response)) {
			Outcome::Retry(RetryReason::ServerError { status, message, retry_after }) => {
				assert_eq!(status, 503);
				assert_eq!(message, "Maintenance");
				assert_eq!(retry_after, Some(Duration::from_secs(2)));
			},
			other => panic!("Expected a retryable outcome, got {other:?}."),
		}
	}

	#[test]
	fn unlisted_statuses_fail_with_the_generic_message() {
		match classify::<User>(ok(418, "")) {
			Outcome::Fail(Error::Server { status, message }) => {
				assert_eq!(status, 418);
				assert_eq!(message, "Request failed with status code 418");
			},
			other => panic!("Expected a server failure, got {other:?}."),
		}
		assert!(matches!(classify::<User>(ok(302, "")), Outcome::Fail(Error::Server { .. })));
	}

	#[test]
	fn transport_failures_map_into_the_taxonomy() {
		assert!(matches!(classify::<User>(Err(TransportFailure::Offline)), Outcome::Offline));
		assert!(matches!(
			classify::<User>(Err(TransportFailure::Timeout)),
			Outcome::Retry(RetryReason::Timeout)
		));

		match classify::<User>(Err(TransportFailure::Canceled)) {
			Outcome::Fail(error) => assert_eq!(error.kind(), ErrorKind::Policy),
			other => panic!("Expected a policy failure, got {other:?}."),
		}
		match classify::<User>(Err(TransportFailure::Invalid)) {
			Outcome::Fail(error) => assert_eq!(error.kind(), ErrorKind::Protocol),
			other => panic!("Expected a protocol failure, got {other:?}."),
		}
	}

}
