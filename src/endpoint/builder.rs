// self
use crate::{
	_prelude::*,
	endpoint::{BodyEncoding, Credential, EndpointDescriptor, Method, ParamValue},
	request,
};

/// Errors raised while constructing or validating endpoint descriptors.
#[derive(Debug, ThisError)]
pub enum EndpointError {
	/// Host is mandatory for every endpoint.
	#[error("The host must not be empty.")]
	MissingHost,
	/// Only HTTP schemes are supported.
	#[error("The `{scheme}` scheme is not supported.")]
	UnsupportedScheme {
		/// Scheme that failed validation.
		scheme: String,
	},
	/// Paths are appended verbatim, so anything non-empty must begin with a slash.
	#[error("The path must be empty or begin with a slash: `{path}`.")]
	InvalidPath {
		/// Path that failed validation.
		path: String,
	},
	/// Scheme, host, port, path, and query must combine into a parseable URL.
	#[error("The endpoint components do not form a valid URL.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A zero timeout would fail every attempt before it starts.
	#[error("The timeout must be positive.")]
	NonPositiveTimeout,
	/// Multipart boundaries travel inside the `Content-Type` header.
	#[error("The multipart boundary must be a non-empty printable ASCII token.")]
	InvalidBoundary,
}

/// Builder for [`EndpointDescriptor`] values.
#[derive(Clone, Debug)]
pub struct EndpointBuilder {
	/// URL scheme; defaults to `https`.
	pub scheme: String,
	/// Host the request is sent to.
	pub host: String,
	/// Optional explicit port.
	pub port: Option<u16>,
	/// Path appended verbatim to the authority.
	pub path: String,
	/// HTTP method; defaults to GET.
	pub method: Method,
	/// Per-attempt timeout; defaults to 30 seconds.
	pub timeout: Duration,
	/// Body encoding; defaults to JSON.
	pub encoding: BodyEncoding,
	/// Content type attached when no caller header is present.
	pub content_type: String,
	/// Accept header attached when no caller header is present.
	pub accept: String,
	/// Caller-supplied headers.
	pub headers: BTreeMap<String, String>,
	/// Ordered query parameters.
	pub query: Vec<(String, String)>,
	/// Optional body parameters.
	pub body: Option<BTreeMap<String, ParamValue>>,
	/// Credential requirement; defaults to [`Credential::None`].
	pub credential: Credential,
	/// Retry budget; defaults to zero.
	pub retry_budget: u32,
}
impl EndpointBuilder {
	const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Creates a new builder seeded with the provided host.
	pub fn new(host: impl Into<String>) -> Self {
		Self {
			scheme: "https".into(),
			host: host.into(),
			port: None,
			path: String::new(),
			method: Method::default(),
			timeout: Self::DEFAULT_TIMEOUT,
			encoding: BodyEncoding::Json,
			content_type: "application/json".into(),
			accept: "application/json".into(),
			headers: BTreeMap::new(),
			query: Vec::new(),
			body: None,
			credential: Credential::default(),
			retry_budget: 0,
		}
	}

	/// Overrides the URL scheme.
	pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
		self.scheme = scheme.into();

		self
	}

	/// Sets an explicit port.
	pub fn port(mut self, port: u16) -> Self {
		self.port = Some(port);

		self
	}

	/// Sets the request path.
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();

		self
	}

	/// Sets the HTTP method.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the body encoding.
	pub fn encoding(mut self, encoding: BodyEncoding) -> Self {
		self.encoding = encoding;

		self
	}

	/// Overrides the default content type.
	pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = content_type.into();

		self
	}

	/// Overrides the default accept header.
	pub fn accept(mut self, accept: impl Into<String>) -> Self {
		self.accept = accept.into();

		self
	}

	/// Adds a caller-supplied header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Appends a query parameter, preserving insertion order.
	pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Appends multiple query parameters, preserving iteration order.
	pub fn query_params<I, N, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (N, V)>,
		N: Into<String>,
		V: Into<String>,
	{
		for (name, value) in params {
			self.query.push((name.into(), value.into()));
		}

		self
	}

	/// Adds a body parameter.
	pub fn body_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.body.get_or_insert_with(BTreeMap::new).insert(name.into(), value.into());

		self
	}

	/// Sets the credential requirement.
	pub fn credential(mut self, credential: Credential) -> Self {
		self.credential = credential;

		self
	}

	/// Sets the retry budget (additional attempts beyond the first).
	pub fn retry_budget(mut self, budget: u32) -> Self {
		self.retry_budget = budget;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<EndpointDescriptor, EndpointError> {
		if self.host.is_empty() {
			return Err(EndpointError::MissingHost);
		}
		if !matches!(self.scheme.as_str(), "http" | "https") {
			return Err(EndpointError::UnsupportedScheme { scheme: self.scheme });
		}
		if !self.path.is_empty() && !self.path.starts_with('/') {
			return Err(EndpointError::InvalidPath { path: self.path });
		}
		if self.timeout.is_zero() {
			return Err(EndpointError::NonPositiveTimeout);
		}
		let boundary_ok = match &self.encoding {
			BodyEncoding::Multipart { boundary } =>
				!boundary.is_empty() && boundary.chars().all(|c| c.is_ascii_graphic() && c != '"'),
			_ => true,
		};

		if !boundary_ok {
			return Err(EndpointError::InvalidBoundary);
		}

		let url =
			request::assemble_url(&self.scheme, &self.host, self.port, &self.path, &self.query)?;

		Ok(EndpointDescriptor {
			scheme: self.scheme,
			host: self.host,
			port: self.port,
			path: self.path,
			method: self.method,
			timeout: self.timeout,
			encoding: self.encoding,
			content_type: self.content_type,
			accept: self.accept,
			headers: self.headers,
			query: self.query,
			body: self.body,
			credential: self.credential,
			retry_budget: self.retry_budget,
			url,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn build_precomputes_the_full_url() {
		let endpoint = EndpointDescriptor::builder("api.example.com")
			.path("/v1/users")
			.port(8443)
			.query_param("page", "2")
			.build()
			.expect("Descriptor fixture should build successfully.");

		assert_eq!(endpoint.url.as_str(), "https://api.example.com:8443/v1/users?page=2");
	}

	#[test]
	fn duplicate_slashes_survive_validation() {
		let endpoint = EndpointDescriptor::builder("api.example.com")
			.path("//v1//users")
			.build()
			.expect("Descriptor fixture should build successfully.");

		assert_eq!(endpoint.url.path(), "//v1//users");
	}

	#[test]
	fn empty_host_is_rejected() {
		assert!(matches!(
			EndpointDescriptor::builder("").build(),
			Err(EndpointError::MissingHost)
		));
	}

	#[test]
	fn non_http_schemes_are_rejected() {
		assert!(matches!(
			EndpointDescriptor::builder("api.example.com").scheme("ftp").build(),
			Err(EndpointError::UnsupportedScheme { .. })
		));
	}

	#[test]
	fn relative_paths_are_rejected() {
		assert!(matches!(
			EndpointDescriptor::builder("api.example.com").path("users").build(),
			Err(EndpointError::InvalidPath { .. })
		));
	}

	#[test]
	fn zero_timeouts_are_rejected() {
		assert!(matches!(
			EndpointDescriptor::builder("api.example.com").timeout(Duration::ZERO).build(),
			Err(EndpointError::NonPositiveTimeout)
		));
	}

	#[test]
	fn blank_multipart_boundaries_are_rejected() {
		assert!(matches!(
			EndpointDescriptor::builder("api.example.com")
				.encoding(BodyEncoding::Multipart { boundary: String::new() })
				.build(),
			Err(EndpointError::InvalidBoundary)
		));
	}

	#[test]
	fn generated_multipart_boundaries_validate() {
		let endpoint = EndpointDescriptor::builder("api.example.com")
			.encoding(BodyEncoding::multipart())
			.build()
			.expect("Generated boundaries should pass validation.");

		assert!(matches!(endpoint.encoding, BodyEncoding::Multipart { .. }));
	}
}
