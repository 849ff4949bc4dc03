// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token issuance.
#[derive(Debug, Default)]
pub struct IssuanceMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	renewals: AtomicU64,
}
impl IssuanceMetrics {
	/// Returns the number of issuance requests sent upstream.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of issuance requests that produced a token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of issuance requests that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of forced renewals.
	pub fn renewals(&self) -> u64 {
		self.renewals.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal(&self) {
		self.renewals.fetch_add(1, Ordering::Relaxed);
	}
}
