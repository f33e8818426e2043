//! Pure request construction: an endpoint descriptor plus the current auth state
//! in, a fully-formed wire request out.
//!
//! [`build`] is total for validated descriptors; every fallible step (URL assembly)
//! runs once inside the descriptor builder instead. Query strings and URL-encoded
//! bodies percent-encode everything outside the RFC 3986 unreserved set so the
//! serialized form parses back to the original pairs byte-for-byte.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{
	_prelude::*,
	endpoint::{BodyEncoding, EndpointDescriptor, EndpointError, Method, ParamValue},
};

/// Percent-encode everything outside the RFC 3986 unreserved set.
const COMPONENT: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Fully-formed wire request; derived, stateless, discarded after one transport call.
#[derive(Clone, Debug)]
pub struct BuiltRequest {
	/// Absolute request URL including the serialized query string.
	pub url: Url,
	/// HTTP method.
	pub method: Method,
	/// Ordered header list (caller headers first, relay-added headers after).
	pub headers: Vec<(String, String)>,
	/// Serialized body, when the method and encoding produce one.
	pub body: Option<Vec<u8>>,
	/// Per-attempt timeout inherited from the descriptor.
	pub timeout: Duration,
}
impl BuiltRequest {
	/// Returns the first header matching `name`, case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Builds a wire request from a descriptor and the current access token.
///
/// Header precedence: caller-supplied headers win; the authorization header and the
/// content-type/accept defaults are only added when no caller header with the same
/// name exists. A multipart body overrides the content type regardless, because the
/// boundary must match the body being sent.
pub fn build(endpoint: &EndpointDescriptor, access_token: Option<&str>) -> BuiltRequest {
	let mut headers: Vec<(String, String)> =
		endpoint.headers.iter().map(|(name, value)| (name.clone(), value.clone())).collect();

	if let Some((name, value)) = endpoint
		.credential
		.resolve(access_token)
		.filter(|(name, _)| !has_header(&headers, name))
	{
		headers.push((name, value));
	}
	if !has_header(&headers, "Content-Type") {
		headers.push(("Content-Type".into(), endpoint.content_type.clone()));
	}
	if !has_header(&headers, "Accept") {
		headers.push(("Accept".into(), endpoint.accept.clone()));
	}

	let body = match (&endpoint.body, endpoint.method.allows_body()) {
		(Some(params), true) => match &endpoint.encoding {
			// ParamValue serialization is infallible.
			BodyEncoding::Json => Some(serde_json::to_vec(params).unwrap_or_default()),
			BodyEncoding::FormUrlEncoded => Some(form_body(params)),
			BodyEncoding::Multipart { boundary } => {
				set_header(
					&mut headers,
					"Content-Type",
					format!("multipart/form-data; boundary={boundary}"),
				);

				Some(multipart_body(params, boundary))
			},
		},
		_ => None,
	};

	BuiltRequest {
		url: endpoint.url.clone(),
		method: endpoint.method,
		headers,
		body,
		timeout: endpoint.timeout,
	}
}

/// Assembles and validates the absolute URL for a descriptor.
///
/// The path is appended verbatim (duplicate slashes included); query parameters are
/// serialized in the order supplied.
pub(crate) fn assemble_url(
	scheme: &str,
	host: &str,
	port: Option<u16>,
	path: &str,
	query: &[(String, String)],
) -> Result<Url, EndpointError> {
	let mut raw = format!("{scheme}://{host}");

	if let Some(port) = port {
		raw.push(':');
		raw.push_str(&port.to_string());
	}

	raw.push_str(path);

	if !query.is_empty() {
		raw.push('?');
		raw.push_str(&encode_query(query));
	}

	Url::parse(&raw).map_err(|source| EndpointError::InvalidUrl { source })
}

fn encode_query(query: &[(String, String)]) -> String {
	let mut buf = String::new();

	for (idx, (name, value)) in query.iter().enumerate() {
		if idx > 0 {
			buf.push('&');
		}

		buf.extend(utf8_percent_encode(name, COMPONENT));
		buf.push('=');
		buf.extend(utf8_percent_encode(value, COMPONENT));
	}

	buf
}

fn form_body(params: &BTreeMap<String, ParamValue>) -> Vec<u8> {
	let pairs: Vec<(String, String)> =
		params.iter().map(|(name, value)| (name.clone(), value.describe())).collect();

	encode_query(&pairs).into_bytes()
}

fn multipart_body(params: &BTreeMap<String, ParamValue>, boundary: &str) -> Vec<u8> {
	let mut body = Vec::new();

	for (name, value) in params {
		body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());

		if value.is_binary() {
			body.extend_from_slice(
				format!(
					"Content-Disposition: form-data; name=\"{name}\"; filename=\"file\"\r\nContent-Type: application/octet-stream\r\n\r\n"
				)
				.as_bytes(),
			);
		} else {
			body.extend_from_slice(
				format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
			);
		}

		match value {
			ParamValue::Binary(bytes) => body.extend_from_slice(bytes),
			other => body.extend_from_slice(other.describe().as_bytes()),
		}

		body.extend_from_slice(b"\r\n");
	}

	body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

	body
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
	headers.iter().any(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
	headers.retain(|(candidate, _)| !candidate.eq_ignore_ascii_case(name));
	headers.push((name.into(), value));
}
