// crates.io
use base64::prelude::*;
use serde::Serializer;
// self
use crate::_prelude::*;

/// Body parameter value carried by an endpoint descriptor.
///
/// JSON bodies serialize values with their native JSON types; URL-encoded and
/// multipart bodies use [`ParamValue::describe`] for a canonical string form.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
	/// UTF-8 text.
	Text(String),
	/// Signed integer.
	Integer(i64),
	/// Floating-point number.
	Float(f64),
	/// Boolean flag.
	Bool(bool),
	/// Raw bytes; emitted as a file part in multipart bodies and base64 elsewhere.
	Binary(Vec<u8>),
}
impl ParamValue {
	/// Canonical string conversion used by URL-encoded and multipart bodies.
	pub fn describe(&self) -> String {
		match self {
			ParamValue::Text(value) => value.clone(),
			ParamValue::Integer(value) => value.to_string(),
			ParamValue::Float(value) => value.to_string(),
			ParamValue::Bool(value) => value.to_string(),
			ParamValue::Binary(bytes) => BASE64_STANDARD.encode(bytes),
		}
	}

	/// Whether the value carries raw bytes.
	pub const fn is_binary(&self) -> bool {
		matches!(self, ParamValue::Binary(_))
	}
}
impl Serialize for ParamValue {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			ParamValue::Text(value) => serializer.serialize_str(value),
			ParamValue::Integer(value) => serializer.serialize_i64(*value),
			ParamValue::Float(value) => serializer.serialize_f64(*value),
			ParamValue::Bool(value) => serializer.serialize_bool(*value),
			ParamValue::Binary(bytes) => serializer.serialize_str(&BASE64_STANDARD.encode(bytes)),
		}
	}
}
impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::Text(value.into())
	}
}
impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<i64> for ParamValue {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}
impl From<f64> for ParamValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<bool> for ParamValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<Vec<u8>> for ParamValue {
	fn from(value: Vec<u8>) -> Self {
		Self::Binary(value)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn describe_is_canonical() {
		assert_eq!(ParamValue::from("foo").describe(), "foo");
		assert_eq!(ParamValue::from(42_i64).describe(), "42");
		assert_eq!(ParamValue::from(true).describe(), "true");
		assert_eq!(ParamValue::from(1.5).describe(), "1.5");
		assert_eq!(ParamValue::from(vec![0_u8, 1, 2]).describe(), "AAEC");
	}

	#[test]
	fn json_serialization_uses_native_types() {
		let mut body = BTreeMap::new();

		body.insert("name", ParamValue::from("foo"));
		body.insert("count", ParamValue::from(3_i64));
		body.insert("active", ParamValue::from(true));

		let json = serde_json::to_string(&body).expect("Body fixture should serialize.");

		assert_eq!(json, r#"{"active":true,"count":3,"name":"foo"}"#);
	}

	#[test]
	fn binary_values_serialize_as_base64_text() {
		let json = serde_json::to_string(&ParamValue::from(vec![0_u8, 1, 2]))
			.expect("Binary fixture should serialize.");

		assert_eq!(json, "\"AAEC\"");
	}
}
