// crates.io
use base64::prelude::*;
// self
use crate::_prelude::*;

/// Canonical name of the authorization header attached by the relay.
pub const AUTHORIZATION: &str = "Authorization";

/// Credential requirement carried by an endpoint descriptor.
///
/// Resolved into a concrete header pair when the request is built; [`Credential::Bearer`]
/// reads the access token from the shared auth state at that moment, so a token rotated
/// mid-flight is picked up by the next attempt automatically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
	#[default]
	/// No authorization header is attached.
	None,
	/// `Authorization: Bearer <token>` using the current access token.
	Bearer,
	/// `Authorization: Basic <base64(user:password)>`.
	Basic {
		/// Basic-auth user name.
		user: String,
		/// Basic-auth password.
		password: String,
	},
	/// A caller-named header carrying a fixed value.
	ApiKey {
		/// Header name the key travels in.
		header: String,
		/// Header value.
		value: String,
	},
	/// `Authorization: Basic <token>` with the token inserted verbatim.
	///
	/// The token is not base64-encoded; deployed servers consuming this scheme
	/// parse the raw value after the `Basic ` prefix.
	Custom {
		/// Pre-encoded token value.
		token: String,
	},
}
impl Credential {
	/// Resolves the credential into a `(header, value)` pair.
	///
	/// Returns `None` when the variant attaches no header, including a bearer
	/// requirement with no stored access token.
	pub fn resolve(&self, access_token: Option<&str>) -> Option<(String, String)> {
		match self {
			Credential::None => None,
			Credential::Bearer =>
				access_token.map(|token| (AUTHORIZATION.into(), format!("Bearer {token}"))),
			Credential::Basic { user, password } => {
				let encoded = BASE64_STANDARD.encode(format!("{user}:{password}"));

				Some((AUTHORIZATION.into(), format!("Basic {encoded}")))
			},
			Credential::ApiKey { header, value } => Some((header.clone(), value.clone())),
			Credential::Custom { token } => Some((AUTHORIZATION.into(), format!("Basic {token}"))),
		}
	}

	/// Whether a resolvable credential is present for the given auth state.
	pub fn is_present(&self, access_token: Option<&str>) -> bool {
		self.resolve(access_token).is_some()
	}
}
