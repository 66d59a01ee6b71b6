//! Opaque identifiers shared across the scheduler.

use core::fmt;

/// A physical core number. Pcore `0` is always the low-latency / management
/// core; every other pcore is a compute-grained (CG) core.
pub type PcoreId = u32;

/// Pcore `0` hosts the tick and dispatches SCPs; it is never idle, never
/// provisioned, and never handed to an MCP.
pub const MANAGEMENT_PCORE: PcoreId = 0;

/// A handle to a registered process, opaque to the scheduler.
///
/// The host kernel mints these (the scheduler never constructs one itself)
/// and is expected to hand out a unique value per live process, the same way
/// `hermit-os-kernel`'s `TaskId` wraps a plain integer minted by its task
/// spawn path.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProcId(u64);

impl ProcId {
	/// Wraps a raw identifier minted by the host kernel.
	#[must_use]
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw identifier the host kernel minted.
	#[must_use]
	pub const fn as_raw(self) -> u64 {
		self.0
	}
}

impl fmt::Debug for ProcId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ProcId({})", self.0)
	}
}

impl fmt::Display for ProcId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
