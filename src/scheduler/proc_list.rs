//! The three global process lists and each process's scheduler-data.

use alloc::collections::VecDeque;

use super::ids::{PcoreId, ProcId};

/// Which of the three global lists a process currently sits on.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ProcListKind {
	UnrunnableScps,
	RunnableScps,
	AllMcps,
}

/// Scheduler-owned data embedded in each registered process: which global
/// list it is on, and its two provisioning lists.
#[derive(Debug, Default)]
pub struct ProcSchedData {
	pub cur_list: Option<ProcListKind>,
	/// Pcores provisioned to this process AND currently allocated to it.
	pub prov_alloc_me: VecDeque<PcoreId>,
	/// Pcores provisioned to this process AND currently NOT allocated to it
	/// — the victim list consulted first by `__core_request`.
	pub prov_not_alloc_me: VecDeque<PcoreId>,
}

impl ProcSchedData {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

/// The three named process lists.
///
/// Operates on a caller-supplied map of [`ProcSchedData`] rather than owning
/// the processes itself, so it stays a focused 10%-of-budget component the
/// way the distilled spec frames it, instead of absorbing the whole process
/// registry.
#[derive(Debug, Default)]
pub struct ProcListSet {
	unrunnable_scps: VecDeque<ProcId>,
	runnable_scps: VecDeque<ProcId>,
	all_mcps: VecDeque<ProcId>,
}

impl ProcListSet {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn list_mut(&mut self, kind: ProcListKind) -> &mut VecDeque<ProcId> {
		match kind {
			ProcListKind::UnrunnableScps => &mut self.unrunnable_scps,
			ProcListKind::RunnableScps => &mut self.runnable_scps,
			ProcListKind::AllMcps => &mut self.all_mcps,
		}
	}

	#[must_use]
	pub fn list(&self, kind: ProcListKind) -> &VecDeque<ProcId> {
		match kind {
			ProcListKind::UnrunnableScps => &self.unrunnable_scps,
			ProcListKind::RunnableScps => &self.runnable_scps,
			ProcListKind::AllMcps => &self.all_mcps,
		}
	}

	/// Appends `p` to the tail of `kind` and records that membership on
	/// `data`. Asserts `p` was not already on a list (invariant I1).
	pub fn add(&mut self, p: ProcId, kind: ProcListKind, data: &mut ProcSchedData) {
		debug_assert!(
			data.cur_list.is_none(),
			"proc {p} added to {kind:?} while already on a list"
		);
		self.list_mut(kind).push_back(p);
		data.cur_list = Some(kind);
	}

	/// Removes `p` from `kind`. Asserts `p` was actually there.
	pub fn remove(&mut self, p: ProcId, kind: ProcListKind, data: &mut ProcSchedData) {
		debug_assert_eq!(
			data.cur_list,
			Some(kind),
			"proc {p} removed from {kind:?} but cur_list says {:?}",
			data.cur_list
		);
		let list = self.list_mut(kind);
		let pos = list.iter().position(|&q| q == p);
		debug_assert!(pos.is_some(), "proc {p} not actually present on {kind:?}");
		if let Some(pos) = pos {
			list.remove(pos);
		}
		data.cur_list = None;
	}

	/// Moves `p` from `old` to the tail of `new`.
	pub fn switch(&mut self, p: ProcId, old: ProcListKind, new: ProcListKind, data: &mut ProcSchedData) {
		self.remove(p, old, data);
		self.add(p, new, data);
	}

	/// Removes `p` from whichever list it is on, if any. Safe to call on a
	/// process with no current list.
	pub fn remove_any(&mut self, p: ProcId, data: &mut ProcSchedData) {
		if let Some(kind) = data.cur_list {
			self.remove(p, kind, data);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn add_then_remove_clears_cur_list() {
		let mut lists = ProcListSet::new();
		let mut data = ProcSchedData::new();
		let p = ProcId::from_raw(1);
		lists.add(p, ProcListKind::UnrunnableScps, &mut data);
		assert_eq!(data.cur_list, Some(ProcListKind::UnrunnableScps));
		assert_eq!(lists.list(ProcListKind::UnrunnableScps).len(), 1);
		lists.remove(p, ProcListKind::UnrunnableScps, &mut data);
		assert!(data.cur_list.is_none());
		assert!(lists.list(ProcListKind::UnrunnableScps).is_empty());
	}

	#[test]
	fn switch_moves_to_tail_of_new_list() {
		let mut lists = ProcListSet::new();
		let mut a = ProcSchedData::new();
		let mut b = ProcSchedData::new();
		let p1 = ProcId::from_raw(1);
		let p2 = ProcId::from_raw(2);
		lists.add(p1, ProcListKind::RunnableScps, &mut a);
		lists.add(p2, ProcListKind::RunnableScps, &mut b);
		lists.switch(p1, ProcListKind::RunnableScps, ProcListKind::UnrunnableScps, &mut a);
		let runnable: alloc::vec::Vec<_> = lists.list(ProcListKind::RunnableScps).iter().copied().collect();
		assert_eq!(runnable, alloc::vec![p2]);
		assert_eq!(a.cur_list, Some(ProcListKind::UnrunnableScps));
	}

	#[test]
	fn remove_any_is_noop_without_membership() {
		let mut lists = ProcListSet::new();
		let mut data = ProcSchedData::new();
		lists.remove_any(ProcId::from_raw(9), &mut data);
		assert!(data.cur_list.is_none());
	}
}
