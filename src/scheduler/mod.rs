// Copyright (c) 2017 Stefan Lankes, RWTH Aachen University
//               2017 Colin Finck, RWTH Aachen University
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The gang-scheduling core: pcore tracking, process lists, provisioning,
//! core requests, SCP dispatch and the periodic tick, behind a single
//! coarse lock.

use ahash::RandomState;
use hashbrown::HashMap;
use hermit_sync::InterruptTicketMutex;
use log::warn;

pub mod core_request;
pub mod diag;
pub mod dispatch;
pub mod facility;
pub mod ids;
pub mod lifecycle;
pub mod pcore;
pub mod proc_list;
pub mod provision;
pub mod tick;

#[cfg(test)]
mod test_support;

use facility::{ChangeToMError, Facilities, ResourceKind};
use ids::{PcoreId, ProcId};
use pcore::{IdleCorePool, PcoreTable};
use proc_list::ProcSchedData;
pub use proc_list::ProcListSet;
use tick::DEFAULT_TICK_PERIOD_USEC;

/// The process-scheduler-data registry, keyed by [`ProcId`].
///
/// `ahash`/`hashbrown` match the teacher's own `object_map: HashMap<FileDescriptor,
/// Arc<dyn ObjectInterface>, RandomState>` pattern for a registry keyed by a
/// small integer handle.
pub(crate) type ProcMap = HashMap<ProcId, ProcSchedData, RandomState>;

/// Everything the scheduler lock protects: the pcore table, the idle pool,
/// the three process lists, and every registered process's scheduler-data.
pub(crate) struct SchedState {
	pub pcores: PcoreTable,
	pub idle: IdleCorePool,
	pub lists: ProcListSet,
	pub procs: ProcMap,
}

/// Runtime configuration for [`Scheduler::schedule_init`].
#[derive(Copy, Clone, Debug)]
pub struct SchedConfig {
	/// Total pcore count, including the management core.
	pub num_pcores: u32,
	/// When true, only odd-numbered pcores seed the idle pool (the
	/// even-numbered sibling of each hyperthread pair is left for its SMT
	/// partner to use implicitly). `num_pcores` must be even in this mode.
	pub disable_smt: bool,
	/// Tick period in microseconds. `0` uses [`DEFAULT_TICK_PERIOD_USEC`].
	pub tick_period_usec: u64,
	/// Number of CG cores to remove from the idle pool at init for an
	/// auxiliary server (e.g. an ARSC-style helper) and never return.
	pub aux_server_cores: u32,
}

impl SchedConfig {
	#[must_use]
	pub fn new(num_pcores: u32) -> Self {
		Self {
			num_pcores,
			disable_smt: false,
			tick_period_usec: DEFAULT_TICK_PERIOD_USEC,
			aux_server_cores: 0,
		}
	}

	fn effective_tick_period(&self) -> u64 {
		if self.tick_period_usec == 0 {
			DEFAULT_TICK_PERIOD_USEC
		} else {
			self.tick_period_usec
		}
	}
}

/// The gang-scheduling core. Generic over the host-supplied collaborator
/// facilities; see [`facility`] for the trait set.
///
/// There is no crate-level singleton: the host owns an instance of this
/// type (typically behind its own `static`/`OnceCell`), the same way
/// `hermit-os-kernel` owns its scheduler state in kernel-binary statics
/// rather than inside a reusable library.
pub struct Scheduler<F: Facilities> {
	state: InterruptTicketMutex<SchedState>,
	facilities: F,
	/// Copied out of [`SchedConfig`] at init; the grant ceiling (`max_vcores`)
	/// and `core_request`'s clamp guard both need it outside the lock.
	disable_smt: bool,
}

impl<F: Facilities> Scheduler<F> {
	/// One-time setup: builds the pcore table, seeds the idle pool, steals
	/// any configured auxiliary-server cores, and arms the first tick.
	pub fn schedule_init(config: SchedConfig, facilities: F) -> Self {
		assert!(config.num_pcores > 0, "a scheduler needs at least one pcore");
		#[cfg(not(feature = "smp"))]
		assert_eq!(
			config.num_pcores, 1,
			"without the \"smp\" feature ksched only supports the single management core"
		);
		if config.disable_smt {
			assert!(
				config.num_pcores % 2 == 0,
				"disable_smt idle-pool seeding requires an even pcore count"
			);
		}

		let pcores = PcoreTable::new(config.num_pcores);
		let mut idle = IdleCorePool::new();

		let step = if config.disable_smt { 2 } else { 1 };
		let mut core = 1;
		while core < config.num_pcores {
			idle.push_back(core);
			core += step;
		}

		for _ in 0..config.aux_server_cores {
			match idle.pop_front() {
				Some(stolen) => warn!("using pcore {stolen} for an auxiliary server; it will never return to scheduling"),
				None => {
					warn!("requested an auxiliary-server core but the idle pool was already empty");
					break;
				}
			}
		}

		let scheduler = Self {
			state: InterruptTicketMutex::new(SchedState {
				pcores,
				idle,
				lists: ProcListSet::new(),
				procs: ProcMap::with_hasher(RandomState::new()),
			}),
			facilities,
			disable_smt: config.disable_smt,
		};

		scheduler.facilities.arm_relative(config.effective_tick_period());
		scheduler
	}

	/// Direct access to the facilities this scheduler was built with, for
	/// hosts that need to reach through (e.g. to register a kernel message
	/// handler pointing back at [`Self::on_tick`]).
	pub fn facilities(&self) -> &F {
		&self.facilities
	}

	pub fn register_proc(&self, id: ProcId) {
		lifecycle::register_proc(&mut self.state.lock(), id);
	}

	pub fn proc_change_to_m(&self, id: ProcId) -> Result<(), ChangeToMError> {
		lifecycle::proc_change_to_m(&mut self.state.lock(), &self.facilities, id)
	}

	pub fn proc_wakeup(&self, id: ProcId) {
		let mut state = self.state.lock();
		let max_vcores = state.pcores.grantable_ceiling(self.disable_smt);
		lifecycle::proc_wakeup(&mut state, &self.facilities, max_vcores, id);
	}

	pub fn proc_destroy(&self, id: ProcId) {
		lifecycle::proc_destroy(&mut self.state.lock(), &self.facilities, id);
	}

	pub fn poke_ksched(&self, id: ProcId, resource: ResourceKind) {
		let mut state = self.state.lock();
		let max_vcores = state.pcores.grantable_ceiling(self.disable_smt);
		lifecycle::poke_ksched(&mut state, &self.facilities, max_vcores, id, resource);
	}

	pub fn provision_core(&self, target: Option<ProcId>, pcore: PcoreId) {
		lifecycle::provision_core(&mut self.state.lock(), target, pcore);
	}

	pub fn put_idle_core(&self, id: ProcId, pcore: PcoreId) {
		lifecycle::put_idle_core(&mut self.state.lock(), id, pcore);
	}

	pub fn put_idle_cores(&self, id: ProcId, pcores: &[PcoreId]) {
		lifecycle::put_idle_cores(&mut self.state.lock(), id, pcores);
	}

	/// The per-process vcore ceiling. Matches the original's global
	/// formula: it does not actually vary per process (see SPEC_FULL.md).
	/// Halved under disable-SMT, since only one sibling of each hyperthread
	/// pair ever joins the idle pool.
	pub fn max_vcores(&self, _id: ProcId) -> u32 {
		self.state.lock().pcores.grantable_ceiling(self.disable_smt)
	}

	/// Runs one scheduling pass: services every non-waiting MCP's core
	/// request, then dispatches an SCP if this is the management core.
	pub fn schedule(&self) {
		let mut state = self.state.lock();
		let state = &mut *state;
		let max_vcores = state.pcores.grantable_ceiling(self.disable_smt);
		let mcps: alloc::vec::Vec<ProcId> = state.lists.list(proc_list::ProcListKind::AllMcps).iter().copied().collect();
		for id in mcps {
			if !self.facilities.is_waiting(id) {
				core_request::core_request(&mut state.pcores, &mut state.idle, &mut state.procs, &self.facilities, max_vcores, id);
			}
		}

		if self.facilities.is_management_core(self.facilities.core_id()) {
			dispatch::schedule_scp(&mut state.lists, &mut state.procs, &self.facilities);
		}
	}

	/// Called outside interrupt context by the host's routine kernel
	/// message pump when the tick alarm fires: runs one scheduling pass
	/// then re-arms the alarm incrementally.
	pub fn on_tick(&self, tick_period_usec: u64) {
		self.schedule();
		let period = if tick_period_usec == 0 {
			DEFAULT_TICK_PERIOD_USEC
		} else {
			tick_period_usec
		};
		self.facilities.arm_incremental(period);
	}

	/// Called from interrupt context when the tick alarm fires. Does not
	/// call `schedule()` directly (that acquires the scheduler lock and the
	/// per-process lock); it only posts a routine kernel message that will
	/// invoke [`Self::on_tick`] later, outside interrupt context.
	pub fn on_alarm(&self) {
		self.facilities.send_routine_tick(self.facilities.core_id());
	}

	/// A core with nothing else to do calls this. On the management core,
	/// tries to dispatch an SCP; if one was scheduled, tail-calls
	/// `restart_core()` (never returns). Otherwise returns so the caller
	/// can halt.
	pub fn cpu_bored(&self) {
		let core = self.facilities.core_id();
		if !self.facilities.is_management_core(core) {
			return;
		}
		let scheduled = {
			let mut state = self.state.lock();
			let state = &mut *state;
			dispatch::schedule_scp(&mut state.lists, &mut state.procs, &self.facilities)
		};
		if scheduled {
			self.facilities.restart_core();
		}
	}

	/// Stub: the original only logs that available resources changed.
	pub fn avail_res_changed(&self, id: ProcId, resource: ResourceKind) {
		warn!("avail_res_changed: proc {id} resource {resource:?} (no-op)");
	}

	pub fn sched_diag(&self) {
		let state = self.state.lock();
		diag::sched_diag(&state.pcores, &state.idle, &state.lists);
	}

	pub fn print_idlecoremap(&self) {
		diag::print_idlecoremap(&self.state.lock().idle);
	}

	pub fn print_resources(&self, id: ProcId) {
		diag::print_resources(&self.facilities, id);
	}

	pub fn print_all_resources(&self) {
		diag::print_all_resources(&self.state.lock().procs, &self.facilities);
	}

	pub fn print_prov_map(&self) {
		diag::print_prov_map(&self.state.lock().pcores);
	}

	pub fn print_proc_prov(&self, id: ProcId) {
		diag::print_proc_prov(&self.state.lock().procs, id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use test_support::MockFacilities;

	#[test]
	fn schedule_init_seeds_idle_pool_excluding_management_core() {
		let facilities = MockFacilities::default();
		let scheduler = Scheduler::schedule_init(SchedConfig::new(4), facilities);
		assert_eq!(scheduler.state.lock().idle.len(), 3);
	}

	#[test]
	fn schedule_init_disable_smt_seeds_only_odd_cores() {
		let facilities = MockFacilities::default();
		let config = SchedConfig {
			disable_smt: true,
			..SchedConfig::new(4)
		};
		let scheduler = Scheduler::schedule_init(config, facilities);
		let state = scheduler.state.lock();
		let ids: alloc::vec::Vec<_> = state.idle.iter().copied().collect();
		assert_eq!(ids, alloc::vec![1, 3]);
	}

	#[test]
	fn schedule_init_steals_aux_server_cores() {
		let facilities = MockFacilities::default();
		let config = SchedConfig {
			aux_server_cores: 1,
			..SchedConfig::new(4)
		};
		let scheduler = Scheduler::schedule_init(config, facilities);
		assert_eq!(scheduler.state.lock().idle.len(), 2);
	}

	#[test]
	fn max_vcores_is_cg_core_count() {
		let facilities = MockFacilities::default();
		let scheduler = Scheduler::schedule_init(SchedConfig::new(8), facilities);
		assert_eq!(scheduler.max_vcores(ProcId::from_raw(1)), 7);
	}

	#[test]
	fn max_vcores_halves_under_disable_smt() {
		let facilities = MockFacilities::default();
		let config = SchedConfig {
			disable_smt: true,
			..SchedConfig::new(8)
		};
		let scheduler = Scheduler::schedule_init(config, facilities);
		assert_eq!(scheduler.max_vcores(ProcId::from_raw(1)), 4);
	}
}
