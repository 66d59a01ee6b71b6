//! Debug readouts. All of these funnel through [`crate::logging::DIAG_LEVEL`]
//! rather than returning formatted strings, matching the teacher's
//! `log`-crate-based diagnostics instead of the repository's old
//! `printlog!` macro family.

use log::log;

use super::facility::Facilities;
use super::ids::ProcId;
use super::pcore::{IdleCorePool, PcoreTable};
use super::proc_list::ProcListKind;
use super::ProcListSet;
use super::ProcMap;
use crate::logging::DIAG_LEVEL;

/// One-shot summary of every pcore, the idle pool size, and every process
/// list's length.
pub fn sched_diag(pcores: &PcoreTable, idle: &IdleCorePool, lists: &ProcListSet) {
	log!(DIAG_LEVEL, "=== scheduler diagnostic ===");
	log!(
		DIAG_LEVEL,
		"pcores: {} total, {} CG, {} idle",
		pcores.len(),
		pcores.cg_core_count(),
		idle.len()
	);
	log!(
		DIAG_LEVEL,
		"lists: {} runnable_scps, {} unrunnable_scps, {} all_mcps",
		lists.list(ProcListKind::RunnableScps).len(),
		lists.list(ProcListKind::UnrunnableScps).len(),
		lists.list(ProcListKind::AllMcps).len()
	);
}

pub fn print_idlecoremap(idle: &IdleCorePool) {
	log!(DIAG_LEVEL, "idle core map ({} cores):", idle.len());
	for core in idle.iter() {
		log!(DIAG_LEVEL, "  pcore {core}");
	}
}

pub fn print_resources<F: Facilities>(facilities: &F, id: ProcId) {
	log!(
		DIAG_LEVEL,
		"proc {id}: wanted={} granted={}",
		facilities.amt_wanted(id),
		facilities.amt_granted(id)
	);
}

pub fn print_all_resources<F: Facilities>(procs: &ProcMap, facilities: &F) {
	log!(DIAG_LEVEL, "all resources ({} procs):", procs.len());
	for &id in procs.keys() {
		print_resources(facilities, id);
	}
}

pub fn print_prov_map(pcores: &PcoreTable) {
	log!(DIAG_LEVEL, "provisioning map:");
	for (id, record) in pcores.iter() {
		if let Some(owner) = record.prov_proc {
			log!(DIAG_LEVEL, "  pcore {id} -> proc {owner}");
		}
	}
}

pub fn print_proc_prov(procs: &ProcMap, id: ProcId) {
	let Some(data) = procs.get(&id) else {
		log!(DIAG_LEVEL, "proc {id}: not registered");
		return;
	};
	log!(
		DIAG_LEVEL,
		"proc {id}: prov_alloc_me={:?} prov_not_alloc_me={:?}",
		data.prov_alloc_me,
		data.prov_not_alloc_me
	);
}
