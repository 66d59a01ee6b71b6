//! Per-pcore bookkeeping and the idle-core pool.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crossbeam_utils::CachePadded;

use super::ids::{PcoreId, ProcId, MANAGEMENT_PCORE};

/// One record per physical core, indexed by [`PcoreId`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PcoreRecord {
	/// The process currently granted this core, if any.
	pub alloc_proc: Option<ProcId>,
	/// The process this core is provisioned to, if any.
	pub prov_proc: Option<ProcId>,
	/// Ghost-return counter; see [`super::core_request`].
	pub ignore_next_idle: u32,
}

/// The fixed-size, zero-initialized table of every pcore in the system,
/// established once at [`super::Scheduler::schedule_init`].
///
/// Each record is cache-line padded: different pcores update their own
/// entry concurrently (a core granting itself cores, another core's
/// `core_request` pass reading it), so adjacent records sharing a cache
/// line would otherwise ping-pong between them.
#[derive(Debug)]
pub struct PcoreTable {
	records: Vec<CachePadded<PcoreRecord>>,
}

impl PcoreTable {
	/// Builds a table sized to `num_pcores`, every record starting idle and
	/// unprovisioned.
	#[must_use]
	pub fn new(num_pcores: u32) -> Self {
		Self {
			records: alloc::vec![CachePadded::new(PcoreRecord::default()); num_pcores as usize],
		}
	}

	/// Total number of pcores tracked, including the management core.
	#[must_use]
	pub fn len(&self) -> u32 {
		self.records.len() as u32
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Number of compute-grained (non-management) cores.
	#[must_use]
	pub fn cg_core_count(&self) -> u32 {
		self.len().saturating_sub(1)
	}

	/// The real grant ceiling: all CG cores normally, but only half the
	/// table under disable-SMT, since only one sibling of each hyperthread
	/// pair ever joins the idle pool (mirrors `num_cpus >> 1` in the
	/// original under `__CONFIG_DISABLE_SMT__`).
	#[must_use]
	pub fn grantable_ceiling(&self, disable_smt: bool) -> u32 {
		if disable_smt {
			self.len() / 2
		} else {
			self.cg_core_count()
		}
	}

	#[must_use]
	pub fn is_ll_core(id: PcoreId) -> bool {
		id == MANAGEMENT_PCORE
	}

	#[must_use]
	pub fn get(&self, id: PcoreId) -> Option<&PcoreRecord> {
		self.records.get(id as usize).map(|r| &**r)
	}

	#[must_use]
	pub fn get_mut(&mut self, id: PcoreId) -> Option<&mut PcoreRecord> {
		self.records.get_mut(id as usize).map(|r| &mut **r)
	}

	#[must_use]
	pub fn in_bounds(&self, id: PcoreId) -> bool {
		(id as usize) < self.records.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (PcoreId, &PcoreRecord)> {
		self.records
			.iter()
			.enumerate()
			.map(|(i, r)| (i as PcoreId, &**r))
	}
}

/// FIFO pool of currently unassigned compute-grained pcores.
///
/// Grounded on the teacher's `TaskHandlePriorityQueue`: a flat `VecDeque`
/// with linear-scan removal rather than an intrusive linked list, since the
/// pool never holds more than `num_pcores` entries.
#[derive(Debug, Default)]
pub struct IdleCorePool {
	cores: VecDeque<PcoreId>,
}

impl IdleCorePool {
	#[must_use]
	pub fn new() -> Self {
		Self {
			cores: VecDeque::new(),
		}
	}

	pub fn push_back(&mut self, id: PcoreId) {
		debug_assert!(
			!self.cores.contains(&id),
			"pcore {id} pushed onto the idle pool while already a member"
		);
		self.cores.push_back(id);
	}

	pub fn pop_front(&mut self) -> Option<PcoreId> {
		self.cores.pop_front()
	}

	/// Removes `id` from wherever it sits in the pool, if present.
	pub fn remove(&mut self, id: PcoreId) -> bool {
		if let Some(pos) = self.cores.iter().position(|&c| c == id) {
			self.cores.remove(pos);
			true
		} else {
			false
		}
	}

	#[must_use]
	pub fn contains(&self, id: PcoreId) -> bool {
		self.cores.contains(&id)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.cores.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.cores.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &PcoreId> {
		self.cores.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn table_seeds_empty_records() {
		let table = PcoreTable::new(4);
		assert_eq!(table.len(), 4);
		assert_eq!(table.cg_core_count(), 3);
		for (_, record) in table.iter() {
			assert!(record.alloc_proc.is_none());
			assert!(record.prov_proc.is_none());
			assert_eq!(record.ignore_next_idle, 0);
		}
	}

	#[test]
	fn grantable_ceiling_halves_under_disable_smt() {
		let table = PcoreTable::new(8);
		assert_eq!(table.grantable_ceiling(false), 7);
		assert_eq!(table.grantable_ceiling(true), 4);
	}

	#[test]
	fn ll_core_is_pcore_zero() {
		assert!(PcoreTable::is_ll_core(0));
		assert!(!PcoreTable::is_ll_core(1));
	}

	#[test]
	fn idle_pool_is_fifo() {
		let mut pool = IdleCorePool::new();
		pool.push_back(1);
		pool.push_back(2);
		pool.push_back(3);
		assert_eq!(pool.pop_front(), Some(1));
		assert_eq!(pool.pop_front(), Some(2));
		assert_eq!(pool.len(), 1);
	}

	#[test]
	fn idle_pool_remove_by_value() {
		let mut pool = IdleCorePool::new();
		pool.push_back(1);
		pool.push_back(2);
		pool.push_back(3);
		assert!(pool.remove(2));
		assert!(!pool.remove(2));
		assert_eq!(pool.pop_front(), Some(1));
		assert_eq!(pool.pop_front(), Some(3));
	}
}
