//! Provisioning: earmarking specific pcores for specific processes, and the
//! bookkeeping that keeps a pcore's provisioning list membership consistent
//! with whether it is currently allocated to that same process.

use log::trace;

use super::ids::{PcoreId, ProcId};
use super::pcore::PcoreTable;
use super::proc_list::ProcSchedData;
use super::ProcMap;

/// Sets (or clears, when `target` is `None`) the provisioning of `pcore` to
/// `target`. Out-of-range pcore ids and the management core are silently
/// rejected, matching the original's "no error path for a user mistake
/// here" stance (§4.3, §7).
pub fn provision_core(pcores: &mut PcoreTable, procs: &mut ProcMap, target: Option<ProcId>, pcore: PcoreId) {
	if !pcores.in_bounds(pcore) {
		trace!("provision_core: pcore {pcore} out of range, ignoring");
		return;
	}
	if PcoreTable::is_ll_core(pcore) {
		trace!("provision_core: pcore {pcore} is the management core, ignoring");
		return;
	}

	let prior = pcores.get(pcore).and_then(|r| r.prov_proc);
	if let Some(prior_owner) = prior {
		if let Some(data) = procs.get_mut(&prior_owner) {
			unlink_from_prov_lists(data, pcore);
		}
	}

	if let Some(new_owner) = target {
		let allocated_to_new_owner = pcores.get(pcore).and_then(|r| r.alloc_proc) == Some(new_owner);
		if let Some(data) = procs.get_mut(&new_owner) {
			if allocated_to_new_owner {
				data.prov_alloc_me.push_back(pcore);
			} else {
				data.prov_not_alloc_me.push_back(pcore);
			}
		}
	}

	if let Some(record) = pcores.get_mut(pcore) {
		record.prov_proc = target;
	}
}

fn unlink_from_prov_lists(data: &mut ProcSchedData, pcore: PcoreId) {
	if let Some(pos) = data.prov_alloc_me.iter().position(|&c| c == pcore) {
		data.prov_alloc_me.remove(pos);
		return;
	}
	if let Some(pos) = data.prov_not_alloc_me.iter().position(|&c| c == pcore) {
		data.prov_not_alloc_me.remove(pos);
	}
}

/// Records that `pcore` is now allocated to `proc`. If `pcore` is
/// provisioned to `proc`, moves it from `prov_not_alloc_me` to the tail of
/// `prov_alloc_me`.
pub fn track_alloc(pcores: &mut PcoreTable, procs: &mut ProcMap, proc: ProcId, pcore: PcoreId) {
	let record = pcores
		.get_mut(pcore)
		.unwrap_or_else(|| panic!("track_alloc: pcore {pcore} out of range"));
	debug_assert_ne!(
		record.alloc_proc,
		Some(proc),
		"double allocation of pcore {pcore} to proc {proc}"
	);
	record.alloc_proc = Some(proc);
	let provisioned_to_proc = record.prov_proc == Some(proc);

	if provisioned_to_proc {
		if let Some(data) = procs.get_mut(&proc) {
			if let Some(pos) = data.prov_not_alloc_me.iter().position(|&c| c == pcore) {
				data.prov_not_alloc_me.remove(pos);
				data.prov_alloc_me.push_back(pcore);
			}
		}
	}
}

/// Records that `pcore` is no longer allocated to `proc`. If `pcore` is
/// provisioned to `proc`, moves it from `prov_alloc_me` to the *head* of
/// `prov_not_alloc_me`, making it the first victim considered on the next
/// provisioning pass.
pub fn track_dealloc(pcores: &mut PcoreTable, procs: &mut ProcMap, proc: ProcId, pcore: PcoreId) {
	let record = pcores
		.get_mut(pcore)
		.unwrap_or_else(|| panic!("track_dealloc: pcore {pcore} out of range"));
	record.alloc_proc = None;
	let provisioned_to_proc = record.prov_proc == Some(proc);

	if provisioned_to_proc {
		if let Some(data) = procs.get_mut(&proc) {
			if let Some(pos) = data.prov_alloc_me.iter().position(|&c| c == pcore) {
				data.prov_alloc_me.remove(pos);
				data.prov_not_alloc_me.push_front(pcore);
			}
		}
	}
}

/// Bulk form of [`track_dealloc`].
pub fn track_dealloc_bulk(pcores: &mut PcoreTable, procs: &mut ProcMap, proc: ProcId, cores: &[PcoreId]) {
	for &pcore in cores {
		track_dealloc(pcores, procs, proc, pcore);
	}
}
