//! `__core_request`: decide which pcores to grant an MCP in response to its
//! published `amt_wanted`, preempting provisioned-but-elsewhere-allocated
//! cores before dipping into the idle pool.

use alloc::vec::Vec;

use log::warn;
use smallvec::SmallVec;

use super::facility::{Facilities, GiveCoresOutcome};
use super::ids::{PcoreId, ProcId};
use super::pcore::{IdleCorePool, PcoreTable};
use super::provision::track_alloc;
use super::ProcMap;

/// Ghost-return counts above this are almost certainly a stuck preemption
/// loop rather than ordinary races, so we log at `warn!` past it. This is
/// deliberately a log threshold, not a hard cap — see Design Notes open
/// question (c).
const IGNORE_NEXT_IDLE_WARN_THRESHOLD: u32 = 100;

/// Runs one `__core_request` pass for `id`. Idempotent if `id` is already
/// satisfied.
pub fn core_request<F: Facilities>(
	pcores: &mut PcoreTable,
	idle: &mut IdleCorePool,
	procs: &mut ProcMap,
	facilities: &F,
	max_vcores: u32,
	id: ProcId,
) {
	let mut amt_wanted = facilities.amt_wanted(id);
	if amt_wanted > max_vcores {
		warn!("proc {id} wants {amt_wanted} vcores, above the ceiling of {max_vcores}; clamping to 1");
		facilities.set_amt_wanted(id, 1);
		amt_wanted = 1;
	}

	let amt_granted = facilities.amt_granted(id);
	if amt_wanted <= amt_granted {
		return;
	}
	let amt_needed = (amt_wanted - amt_granted) as usize;

	let mut grants: SmallVec<[PcoreId; 8]> = SmallVec::new();

	provisioned_pass(pcores, idle, procs, facilities, id, amt_needed, &mut grants);
	idle_pass(idle, amt_needed, &mut grants);

	if grants.is_empty() {
		return;
	}

	match facilities.give_cores(id, &grants) {
		GiveCoresOutcome::Rejected => {
			for &core in &grants {
				idle.push_back(core);
			}
		}
		GiveCoresOutcome::Granted => {
			for &core in &grants {
				track_alloc(pcores, procs, id, core);
			}
			facilities.run_m(id);
		}
	}
}

fn provisioned_pass<F: Facilities>(
	pcores: &mut PcoreTable,
	idle: &mut IdleCorePool,
	procs: &ProcMap,
	facilities: &F,
	id: ProcId,
	amt_needed: usize,
	grants: &mut SmallVec<[PcoreId; 8]>,
) {
	let Some(data) = procs.get(&id) else {
		return;
	};
	let candidates: Vec<PcoreId> = data.prov_not_alloc_me.iter().copied().collect();

	for core in candidates {
		if grants.len() >= amt_needed {
			break;
		}
		let currently_allocated_to = pcores.get(core).and_then(|r| r.alloc_proc);
		match currently_allocated_to {
			Some(victim) if victim != id => {
				let preempted = facilities.preempt_core(id, core);
				if !preempted {
					if let Some(record) = pcores.get_mut(core) {
						record.ignore_next_idle = record.ignore_next_idle.saturating_add(1);
						if record.ignore_next_idle > IGNORE_NEXT_IDLE_WARN_THRESHOLD {
							warn!(
								"pcore {core} has accumulated {} ignored idle returns",
								record.ignore_next_idle
							);
						}
					}
				}
				if let Some(record) = pcores.get_mut(core) {
					record.alloc_proc = None;
				}
				grants.push(core);
			}
			Some(_) => {
				// Already allocated to `id` itself; nothing to do here.
			}
			None => {
				idle.remove(core);
				grants.push(core);
			}
		}
	}
}

fn idle_pass(idle: &mut IdleCorePool, amt_needed: usize, grants: &mut SmallVec<[PcoreId; 8]>) {
	while grants.len() < amt_needed {
		match idle.pop_front() {
			Some(core) => grants.push(core),
			None => break,
		}
	}
}
