//! `__schedule_scp`: round-robins single-core processes on the management
//! core.
//!
//! This is the corrected form of the original's lock-nesting bug (Design
//! Notes open question (a)): every facility call here that changes a
//! process's own state (`set_runnable_s`, `save_context_s`) is made on the
//! *outgoing* process, never on the incoming one.

use super::facility::Facilities;
use super::ids::MANAGEMENT_PCORE;
use super::proc_list::ProcListKind;
use super::{ProcListSet, ProcMap};

/// Runs one dispatch step. Returns `true` if an SCP was (re)started on the
/// management core.
pub fn schedule_scp<F: Facilities>(lists: &mut ProcListSet, procs: &mut ProcMap, facilities: &F) -> bool {
	let Some(&incoming) = lists.list(ProcListKind::RunnableScps).front() else {
		return false;
	};

	if let Some(outgoing) = facilities.owning_proc(MANAGEMENT_PCORE) {
		facilities.set_runnable_s(outgoing);
		facilities.save_context_s(outgoing);
		if let Some(data) = procs.get_mut(&outgoing) {
			lists.switch(outgoing, ProcListKind::UnrunnableScps, ProcListKind::RunnableScps, data);
		}
		facilities.clear_owning_proc(MANAGEMENT_PCORE);
		facilities.abandon_core();
	}

	if let Some(data) = procs.get_mut(&incoming) {
		lists.switch(incoming, ProcListKind::RunnableScps, ProcListKind::UnrunnableScps, data);
	}
	facilities.run_s(incoming);

	true
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scheduler::ids::ProcId;
	use crate::scheduler::proc_list::ProcSchedData;
	use crate::scheduler::test_support::MockFacilities;
	use ahash::RandomState;
	use hashbrown::HashMap;

	#[test]
	fn round_robins_three_scps() {
		let mut lists = ProcListSet::new();
		let mut procs: ProcMap = HashMap::with_hasher(RandomState::new());
		let facilities = MockFacilities::default();

		let ids = [ProcId::from_raw(1), ProcId::from_raw(2), ProcId::from_raw(3)];
		for &id in &ids {
			let mut data = ProcSchedData::new();
			lists.add(id, ProcListKind::RunnableScps, &mut data);
			procs.insert(id, data);
		}

		assert!(schedule_scp(&mut lists, &mut procs, &facilities));
		assert_eq!(*facilities.run_s_calls.borrow(), alloc::vec![ids[0]]);

		assert!(schedule_scp(&mut lists, &mut procs, &facilities));
		assert_eq!(
			*facilities.run_s_calls.borrow(),
			alloc::vec![ids[0], ids[1]]
		);
		assert_eq!(*facilities.set_runnable_s_calls.borrow(), alloc::vec![ids[0]]);

		assert!(schedule_scp(&mut lists, &mut procs, &facilities));
		assert!(schedule_scp(&mut lists, &mut procs, &facilities));
		assert_eq!(
			*facilities.run_s_calls.borrow(),
			alloc::vec![ids[0], ids[1], ids[2], ids[0]]
		);
		// The first call has no outgoing SCP yet; the other three each clear
		// the management core's owning-process binding before abandoning it.
		assert_eq!(*facilities.clear_owning_proc_calls.borrow(), 3);
	}

	#[test]
	fn empty_runnable_list_returns_false() {
		let mut lists = ProcListSet::new();
		let mut procs: ProcMap = HashMap::with_hasher(RandomState::new());
		let facilities = MockFacilities::default();
		assert!(!schedule_scp(&mut lists, &mut procs, &facilities));
	}
}
