//! Registration, promotion, wakeup and teardown hooks — the scheduler-side
//! half of a process's lifecycle.

use log::{debug, warn};

use super::core_request::core_request;
use super::facility::{ChangeToMError, Facilities, ResourceKind, WakeupKind};
use super::ids::{PcoreId, ProcId};
use super::proc_list::{ProcListKind, ProcSchedData};
use super::provision::{provision_core as provision_core_impl, track_dealloc_bulk};
use super::SchedState;

pub fn register_proc(state: &mut SchedState, id: ProcId) {
	let mut data = ProcSchedData::new();
	state.lists.add(id, ProcListKind::UnrunnableScps, &mut data);
	state.procs.insert(id, data);
}

/// Promotes `id` from SCP to MCP. Only legal while `id` sits on
/// `unrunnable_scps`, per Design Notes open question (b): there is no
/// MCP-to-SCP transition, so this is the only direction ever taken.
pub fn proc_change_to_m<F: Facilities>(state: &mut SchedState, facilities: &F, id: ProcId) -> Result<(), ChangeToMError> {
	facilities.change_to_m(id)?;

	if facilities.amt_wanted(id) == 0 {
		debug!("proc {id} became an MCP with amt_wanted == 0; defaulting to 1");
		facilities.set_amt_wanted(id, 1);
	}

	if let Some(data) = state.procs.get_mut(&id) {
		state
			.lists
			.switch(id, ProcListKind::UnrunnableScps, ProcListKind::AllMcps, data);
	}
	Ok(())
}

pub fn proc_wakeup<F: Facilities>(state: &mut SchedState, facilities: &F, max_vcores: u32, id: ProcId) {
	match facilities.wakeup(id) {
		WakeupKind::Scp => sched_scp_wakeup(state, id),
		WakeupKind::Mcp => sched_mcp_wakeup(state, facilities, max_vcores, id),
	}
}

fn sched_scp_wakeup(state: &mut SchedState, id: ProcId) {
	if let Some(data) = state.procs.get_mut(&id) {
		state.lists.remove_any(id, data);
		state.lists.add(id, ProcListKind::RunnableScps, data);
	}
}

fn sched_mcp_wakeup<F: Facilities>(state: &mut SchedState, facilities: &F, max_vcores: u32, id: ProcId) {
	core_request(&mut state.pcores, &mut state.idle, &mut state.procs, facilities, max_vcores, id);
}

/// `poke_ksched`: signal that `id`'s resource desires may have changed.
/// Only `RES_CORES` is implemented, matching the source material.
pub fn poke_ksched<F: Facilities>(state: &mut SchedState, facilities: &F, max_vcores: u32, id: ProcId, resource: ResourceKind) {
	match resource {
		ResourceKind::Cores => {
			if facilities.is_mcp(id) {
				core_request(&mut state.pcores, &mut state.idle, &mut state.procs, facilities, max_vcores, id);
			}
		}
	}
}

pub fn proc_destroy<F: Facilities>(state: &mut SchedState, facilities: &F, id: ProcId) {
	let returned = facilities.destroy(id);

	if !returned.is_empty() {
		put_idle_cores(state, id, &returned);
	}

	if let Some(mut data) = state.procs.remove(&id) {
		unprovision_all(&mut state.pcores, &mut data);
		state.lists.remove_any(id, &mut data);
	}
}

fn unprovision_all(pcores: &mut super::pcore::PcoreTable, data: &mut ProcSchedData) {
	for core in data.prov_alloc_me.drain(..) {
		if let Some(record) = pcores.get_mut(core) {
			record.prov_proc = None;
		}
	}
	for core in data.prov_not_alloc_me.drain(..) {
		if let Some(record) = pcores.get_mut(core) {
			record.prov_proc = None;
		}
	}
}

pub fn provision_core(state: &mut SchedState, target: Option<ProcId>, pcore: PcoreId) {
	provision_core_impl(&mut state.pcores, &mut state.procs, target, pcore);
}

pub fn put_idle_core(state: &mut SchedState, id: ProcId, pcore: PcoreId) {
	put_idle_cores(state, id, core::slice::from_ref(&pcore));
}

pub fn put_idle_cores(state: &mut SchedState, id: ProcId, pcores: &[PcoreId]) {
	let mut returned: smallvec::SmallVec<[PcoreId; 8]> = smallvec::SmallVec::new();
	for &pcore in pcores {
		let ignored = state.pcores.get_mut(pcore).is_some_and(|record| {
			if record.ignore_next_idle > 0 {
				record.ignore_next_idle -= 1;
				true
			} else {
				false
			}
		});
		if ignored {
			warn!("pcore {pcore} returned idle but absorbed by a ghost-return count");
			continue;
		}
		state.idle.push_back(pcore);
		returned.push(pcore);
	}
	track_dealloc_bulk(&mut state.pcores, &mut state.procs, id, &returned);
}
