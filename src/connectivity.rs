//! Connectivity snapshots consumed by the retry loop.
//!
//! The relay only reads a boolean; how the platform watches the network (NWPath
//! monitors, netlink, polling) stays outside this crate. Monitors must answer
//! without blocking, because the question is asked before every attempt.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::_prelude::*;

/// Non-blocking reachability snapshot provider.
pub trait ConnectivityMonitor
where
	Self: Send + Sync,
{
	/// Returns the most recent reachability snapshot.
	fn is_reachable(&self) -> bool;
}

/// Monitor that always reports reachability.
///
/// The default for relays without a platform monitor; the transport still surfaces
/// connection failures, they just cost an attempt.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReachable;
impl ConnectivityMonitor for AlwaysReachable {
	fn is_reachable(&self) -> bool {
		true
	}
}

/// Monitor backed by a shared flag, flipped by an external watcher.
#[derive(Clone, Debug, Default)]
pub struct ReachabilityFlag(Arc<AtomicBool>);
impl ReachabilityFlag {
	/// Creates a flag with the provided initial state.
	pub fn new(reachable: bool) -> Self {
		Self(Arc::new(AtomicBool::new(reachable)))
	}

	/// Updates the snapshot; relays observe the new value on their next check.
	pub fn set_reachable(&self, reachable: bool) {
		self.0.store(reachable, Ordering::Relaxed);
	}
}
impl ConnectivityMonitor for ReachabilityFlag {
	fn is_reachable(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}
