//! Declarative HTTP endpoint execution—request construction, outcome classification, retry
//! budgets, and single-flight reauthentication in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod classify;
pub mod connectivity;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod obs;
pub mod relay;
pub mod request;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{MemoryTokenStore, RefreshCoordinator, RefreshGrant, TokenSecret, TokenStore},
		http::ReqwestTransport,
		relay::{Relay, ReqwestRelay},
	};

	/// Relay type alias used by reqwest-backed integration tests.
	pub type ReqwestTestRelay = ReqwestRelay;

	/// Constructs a [`Relay`] backed by an in-memory token store and the stock reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_relay(grant: RefreshGrant) -> (ReqwestRelay, Arc<MemoryTokenStore>) {
		let store_backend = Arc::new(MemoryTokenStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let transport = Arc::new(ReqwestTransport::default());
		let coordinator = Arc::new(RefreshCoordinator::new(transport.clone(), store, grant));
		let relay = Relay::with_transport(transport, coordinator);

		(relay, store_backend)
	}

	/// Seeds the provided store with an access/refresh token pair.
	pub async fn seed_tokens(store: &MemoryTokenStore, access: &str, refresh: &str) {
		store
			.store(Some(TokenSecret::new(access)), Some(TokenSecret::new(refresh)))
			.await
			.expect("Failed to seed tokens into the store.");
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")] pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
