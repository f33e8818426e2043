//! Endpoint descriptor data structures and helpers consumed by the request pipeline.
//!
//! A descriptor is an immutable description of one logical API call: where it goes,
//! how the body is encoded, what credential it carries, and how many retries its
//! budget allows. Descriptors are validated once at construction time; everything
//! downstream treats them as plain data.

/// Builder API for assembling endpoint descriptors.
pub mod builder;
/// Credential variants resolved into authorization headers at build time.
pub mod credential;
/// Body parameter values and their canonical string conversions.
pub mod param;

pub use builder::*;
pub use credential::*;
pub use param::*;

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// HTTP methods supported by endpoint descriptors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// HTTP DELETE.
	Delete,
	#[default]
	/// HTTP GET.
	Get,
	/// HTTP HEAD.
	Head,
	/// HTTP PATCH.
	Patch,
	/// HTTP POST.
	Post,
	/// HTTP PUT.
	Put,
}
impl Method {
	/// Returns the canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Delete => "DELETE",
			Method::Get => "GET",
			Method::Head => "HEAD",
			Method::Patch => "PATCH",
			Method::Post => "POST",
			Method::Put => "PUT",
		}
	}

	/// Whether requests with this method may carry a body.
	pub const fn allows_body(self) -> bool {
		!matches!(self, Method::Get | Method::Head)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Body encodings supported by the request builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
	/// Body parameters serialized to a JSON object.
	Json,
	/// Body parameters serialized as `key=value` pairs joined with `&`.
	FormUrlEncoded,
	/// Body parameters emitted as multipart form-data parts.
	Multipart {
		/// Boundary string separating the parts; also injected into the
		/// `Content-Type` header, overriding any previously set value.
		boundary: String,
	},
}
impl BodyEncoding {
	/// Creates a multipart encoding with a freshly generated boundary.
	pub fn multipart() -> Self {
		let tag: u128 = rand::rng().random();

		Self::Multipart { boundary: format!("relay-{tag:032x}") }
	}
}

/// Immutable description of one logical API call.
///
/// Constructed through [`EndpointDescriptor::builder`], which validates the URL
/// components up front so request construction downstream is total.
#[derive(Clone, Debug)]
pub struct EndpointDescriptor {
	/// URL scheme (`http` or `https`).
	pub scheme: String,
	/// Host the request is sent to.
	pub host: String,
	/// Optional explicit port.
	pub port: Option<u16>,
	/// Path appended verbatim to the authority (no slash normalization).
	pub path: String,
	/// HTTP method.
	pub method: Method,
	/// Per-attempt timeout.
	pub timeout: Duration,
	/// Body encoding applied when the method allows a body.
	pub encoding: BodyEncoding,
	/// Content type attached when the caller supplied none.
	pub content_type: String,
	/// Accept header attached when the caller supplied none.
	pub accept: String,
	/// Caller-supplied headers; these win over relay-added headers.
	pub headers: BTreeMap<String, String>,
	/// Query parameters serialized in the order supplied.
	pub query: Vec<(String, String)>,
	/// Optional body parameters.
	pub body: Option<BTreeMap<String, ParamValue>>,
	/// Credential resolved into an authorization header at build time.
	pub credential: Credential,
	/// Maximum additional attempts beyond the first.
	pub retry_budget: u32,
	/// Full request URL, derived and validated at construction time.
	pub url: Url,
}
impl EndpointDescriptor {
	/// Creates a new builder for the provided host.
	pub fn builder(host: impl Into<String>) -> EndpointBuilder {
		EndpointBuilder::new(host)
	}
}
