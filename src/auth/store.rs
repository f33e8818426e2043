//! Storage contract for the two persisted token strings, plus the built-in
//! in-memory backend used by tests and demos.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the relay's auth state.
///
/// The refresh coordinator is the only writer; every other component reads
/// eventually-consistent snapshots. Implementations decide where the two strings
/// live (keychain, keyring, plain file) and must apply [`TokenStore::store`]
/// atomically so readers never observe a half-rotated pair.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the current access token, if one is stored.
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Returns the current refresh token, if one is stored.
	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Atomically replaces both stored tokens.
	///
	/// `None` clears the corresponding slot; `store(None, None)` is a logout.
	fn store(
		&self,
		access: Option<TokenSecret>,
		refresh: Option<TokenSecret>,
	) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Token storage backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

type TokenPair = (Option<TokenSecret>, Option<TokenSecret>);

/// Thread-safe storage backend that keeps tokens in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(Arc<RwLock<TokenPair>>);
impl MemoryTokenStore {
	fn read_access(pair: &Arc<RwLock<TokenPair>>) -> Option<TokenSecret> {
		pair.read().0.clone()
	}

	fn read_refresh(pair: &Arc<RwLock<TokenPair>>) -> Option<TokenSecret> {
		pair.read().1.clone()
	}

	fn replace(
		pair: &Arc<RwLock<TokenPair>>,
		access: Option<TokenSecret>,
		refresh: Option<TokenSecret>,
	) {
		*pair.write() = (access, refresh);
	}
}
impl TokenStore for MemoryTokenStore {
	fn access_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let pair = self.0.clone();

		Box::pin(async move { Ok(Self::read_access(&pair)) })
	}

	fn refresh_token(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let pair = self.0.clone();

		Box::pin(async move { Ok(Self::read_refresh(&pair)) })
	}

	fn store(
		&self,
		access: Option<TokenSecret>,
		refresh: Option<TokenSecret>,
	) -> StoreFuture<'_, ()> {
		let pair = self.0.clone();

		Box::pin(async move {
			Self::replace(&pair, access, refresh);

			Ok(())
		})
	}
}
