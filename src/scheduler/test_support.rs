//! A configurable in-memory [`Facilities`] implementation shared by this
//! crate's unit and integration tests.

#![cfg(test)]

use alloc::vec::Vec;
use core::cell::RefCell;

use ahash::RandomState;
use hashbrown::HashMap;
use smallvec::SmallVec;

use super::facility::{
	AlarmFacility, ChangeToMError, GiveCoresOutcome, KernelMessaging, PerCpu, ProcessFacility,
	WakeupKind,
};
use super::ids::{PcoreId, ProcId};

#[derive(Default)]
pub struct MockFacilities {
	pub wanted: RefCell<HashMap<ProcId, u32, RandomState>>,
	pub granted: RefCell<HashMap<ProcId, u32, RandomState>>,
	pub is_mcp: RefCell<HashMap<ProcId, bool, RandomState>>,
	pub is_waiting: RefCell<HashMap<ProcId, bool, RandomState>>,
	pub owning: RefCell<Option<ProcId>>,
	pub clear_owning_proc_calls: RefCell<u32>,
	pub preempt_result: RefCell<bool>,
	pub give_outcome: RefCell<Option<GiveCoresOutcome>>,
	pub change_to_m_result: RefCell<Option<ChangeToMError>>,
	pub destroy_returns: RefCell<HashMap<ProcId, SmallVec<[PcoreId; 8]>, RandomState>>,
	pub wakeup_kind: RefCell<HashMap<ProcId, WakeupKind, RandomState>>,
	pub given: RefCell<Vec<(ProcId, Vec<PcoreId>)>>,
	pub run_m_calls: RefCell<Vec<ProcId>>,
	pub run_s_calls: RefCell<Vec<ProcId>>,
	pub set_runnable_s_calls: RefCell<Vec<ProcId>>,
}

impl MockFacilities {
	pub fn set_wanted(&self, id: ProcId, amt: u32) {
		self.wanted.borrow_mut().insert(id, amt);
	}

	pub fn set_granted(&self, id: ProcId, amt: u32) {
		self.granted.borrow_mut().insert(id, amt);
	}

	pub fn set_mcp(&self, id: ProcId, is_mcp: bool) {
		self.is_mcp.borrow_mut().insert(id, is_mcp);
	}

	pub fn set_destroy_returns(&self, id: ProcId, cores: &[PcoreId]) {
		self.destroy_returns
			.borrow_mut()
			.insert(id, cores.iter().copied().collect());
	}

	pub fn set_wakeup_kind(&self, id: ProcId, kind: WakeupKind) {
		self.wakeup_kind.borrow_mut().insert(id, kind);
	}
}

impl ProcessFacility for MockFacilities {
	fn change_to_m(&self, _id: ProcId) -> Result<(), ChangeToMError> {
		match *self.change_to_m_result.borrow() {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	fn destroy(&self, id: ProcId) -> SmallVec<[PcoreId; 8]> {
		self.destroy_returns.borrow_mut().remove(&id).unwrap_or_default()
	}

	fn wakeup(&self, id: ProcId) -> WakeupKind {
		self.wakeup_kind.borrow().get(&id).copied().unwrap_or(WakeupKind::Scp)
	}

	fn give_cores(&self, id: ProcId, cores: &[PcoreId]) -> GiveCoresOutcome {
		self.given.borrow_mut().push((id, cores.to_vec()));
		self.give_outcome.borrow().unwrap_or(GiveCoresOutcome::Granted)
	}

	fn run_m(&self, id: ProcId) {
		self.run_m_calls.borrow_mut().push(id);
	}

	fn run_s(&self, id: ProcId) {
		self.run_s_calls.borrow_mut().push(id);
		*self.owning.borrow_mut() = Some(id);
	}

	fn save_context_s(&self, _id: ProcId) {}

	fn set_runnable_s(&self, id: ProcId) {
		self.set_runnable_s_calls.borrow_mut().push(id);
	}

	fn is_mcp(&self, id: ProcId) -> bool {
		self.is_mcp.borrow().get(&id).copied().unwrap_or(false)
	}

	fn is_waiting(&self, id: ProcId) -> bool {
		self.is_waiting.borrow().get(&id).copied().unwrap_or(false)
	}

	fn preempt_core(&self, _id: ProcId, _core: PcoreId) -> bool {
		*self.preempt_result.borrow()
	}

	fn amt_wanted(&self, id: ProcId) -> u32 {
		self.wanted.borrow().get(&id).copied().unwrap_or(0)
	}

	fn set_amt_wanted(&self, id: ProcId, amt: u32) {
		self.wanted.borrow_mut().insert(id, amt);
	}

	fn amt_granted(&self, id: ProcId) -> u32 {
		self.granted.borrow().get(&id).copied().unwrap_or(0)
	}
}

impl AlarmFacility for MockFacilities {
	fn arm_relative(&self, _usec: u64) {}
	fn arm_incremental(&self, _usec: u64) {}
}

impl KernelMessaging for MockFacilities {
	fn send_routine_tick(&self, _core: PcoreId) {}
}

impl PerCpu for MockFacilities {
	fn core_id(&self) -> PcoreId {
		0
	}

	fn is_management_core(&self, core: PcoreId) -> bool {
		core == 0
	}

	fn owning_proc(&self, _core: PcoreId) -> Option<ProcId> {
		*self.owning.borrow()
	}

	fn clear_owning_proc(&self, _core: PcoreId) {
		*self.clear_owning_proc_calls.borrow_mut() += 1;
		*self.owning.borrow_mut() = None;
	}

	fn abandon_core(&self) {
		*self.owning.borrow_mut() = None;
	}

	fn restart_core(&self) -> ! {
		panic!("restart_core called in test")
	}
}
