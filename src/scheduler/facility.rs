//! Collaborator facilities the scheduler consumes but does not implement.
//!
//! Everything in this module is a trait boundary: the process state
//! machine, context save/restore, the alarm subsystem, kernel messaging and
//! per-CPU bookkeeping all live on the host kernel's side of it. A host
//! implements [`ProcessFacility`], [`AlarmFacility`], [`KernelMessaging`]
//! and [`PerCpu`] (or just [`Facilities`], its blanket supertrait) and hands
//! the implementation to [`crate::Scheduler::schedule_init`].
//!
//! This mirrors how `hermit-os-kernel`'s scheduler is written against a
//! fixed set of `crate::arch::*` free functions (`core_id()`,
//! `wakeup_core()`, ...) that differ per target — the difference here is
//! that the boundary is an explicit trait rather than a `cfg`-gated module,
//! since `ksched` is meant to be reused by more than one kernel.

use smallvec::SmallVec;

use super::ids::{PcoreId, ProcId};

/// The process facility's answer to [`ProcessFacility::change_to_m`] failing.
///
/// The scheduler does not attempt to interpret *why* the transition was
/// refused (the process state machine is a collaborator, not something this
/// crate models) — it only needs to propagate the refusal to the caller of
/// `proc_change_to_m` untouched.
#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum ChangeToMError {
	/// The process was not in a state from which promotion to MCP is legal.
	#[error("process is not in a state that allows promotion to MCP")]
	InvalidState,
	/// The process facility otherwise refused the transition.
	#[error("process facility rejected the transition to MCP")]
	Rejected,
}

/// What kind of process a wakeup found, so the scheduler knows which of
/// `__sched_scp_wakeup` / `__sched_mcp_wakeup` to run.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WakeupKind {
	/// The process is an SCP: move it onto `runnable_scps`.
	Scp,
	/// The process is an MCP: re-run its core request.
	Mcp,
}

/// The result of offering a grant of pcores to a process via
/// [`ProcessFacility::give_cores`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GiveCoresOutcome {
	/// The process accepted the cores and is expected to run on them.
	Granted,
	/// The process could not accept them (it is `WAITING` or `DYING`); the
	/// caller must return the cores to the idle pool.
	Rejected,
}

/// The resource kind named by [`crate::Scheduler::poke_ksched`]. Only cores
/// are modeled; the original interface's other resource kinds were never
/// implemented either.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ResourceKind {
	Cores,
}

/// Operations the scheduler needs from the process control block / process
/// state machine. None of these are implemented by `ksched` itself.
pub trait ProcessFacility {
	/// Attempt to promote `id` from SCP to MCP. Scheduler list bookkeeping
	/// (`unrunnable_scps` → `all_mcps`) happens only after this succeeds.
	fn change_to_m(&self, id: ProcId) -> Result<(), ChangeToMError>;

	/// Tear the process down. Returns the pcores it still held allocated,
	/// if any, so the caller can return them to the idle pool. Mirrors the
	/// original `proc_destroy`'s `(bool-destroyed, pcore_id[])` contract,
	/// but since this scheduler only ever calls it once per process (from
	/// `proc_destroy`, which already owns the only scheduler reference) the
	/// boolean collapses into "destroy always happens here".
	fn destroy(&self, id: ProcId) -> SmallVec<[PcoreId; 8]>;

	/// Wake `id` up. The process facility classifies whether it is dealing
	/// with an SCP or an MCP; the scheduler dispatches accordingly while
	/// still holding the scheduler lock.
	fn wakeup(&self, id: ProcId) -> WakeupKind;

	/// Offer `id` the pcores in `cores`. The process may reject the gift if
	/// it has since become `WAITING` or is dying.
	fn give_cores(&self, id: ProcId, cores: &[PcoreId]) -> GiveCoresOutcome;

	/// Start any vcores `id` was just granted.
	fn run_m(&self, id: ProcId);

	/// Hand the calling management core over to SCP `id`.
	fn run_s(&self, id: ProcId);

	/// Save the outgoing SCP's user context before it is descheduled.
	fn save_context_s(&self, id: ProcId);

	/// Mark a descheduled SCP as runnable again (`RUNNABLE_S` in the
	/// original state machine, which this crate does not otherwise model).
	fn set_runnable_s(&self, id: ProcId);

	/// Whether `id` is currently an MCP. Used only by diagnostics; list
	/// membership is what the scheduler itself relies on.
	fn is_mcp(&self, id: ProcId) -> bool;

	/// Whether `id` is blocked (`PROC_WAITING`); such processes are skipped
	/// by the tick's core-request pass.
	fn is_waiting(&self, id: ProcId) -> bool;

	/// Attempt to immediately preempt whatever is running on `core` on
	/// behalf of `id`, the process being evicted. No warning interval is
	/// given in this design; see the ghost-return race in
	/// [`super::core_request`].
	fn preempt_core(&self, id: ProcId, core: PcoreId) -> bool;

	/// The vcore count `id` has published that it wants.
	fn amt_wanted(&self, id: ProcId) -> u32;

	/// Overwrite the vcore count `id` has published that it wants; used
	/// only for the user-bug guard rails in `__core_request` and
	/// `change_to_m`.
	fn set_amt_wanted(&self, id: ProcId, amt: u32);

	/// The vcore count `id` currently holds.
	fn amt_granted(&self, id: ProcId) -> u32;
}

/// The alarm subsystem's two relevant operations: arm once relative to now,
/// then keep re-arming incrementally from the previous fire time so ticks
/// do not drift under load.
pub trait AlarmFacility {
	/// Arm the tick alarm to fire `usec` microseconds from now. Called
	/// exactly once, from `schedule_init`.
	fn arm_relative(&self, usec: u64);

	/// Re-arm the tick alarm `usec` microseconds after its *previous*
	/// scheduled fire time, even if that places the new fire time in the
	/// past (the alarm subsystem must fire promptly in that case rather
	/// than reject the request).
	fn arm_incremental(&self, usec: u64);
}

/// Posting work to run outside interrupt context.
pub trait KernelMessaging {
	/// Post a routine (non-immediate) kernel message to `core` that will
	/// run `Scheduler::on_tick` outside interrupt context. The alarm
	/// callback itself must not call `schedule()` directly, since
	/// `schedule()` acquires per-process locks.
	fn send_routine_tick(&self, core: PcoreId);
}

/// Per-core identity and control the scheduler needs.
pub trait PerCpu {
	/// The id of the pcore this call is running on.
	fn core_id(&self) -> PcoreId;

	/// Whether `core` is the management core that hosts the tick and runs
	/// SCPs.
	fn is_management_core(&self, core: PcoreId) -> bool;

	/// The SCP currently installed on `core`, if any. Only meaningful for
	/// the management core in this design.
	fn owning_proc(&self, core: PcoreId) -> Option<ProcId>;

	/// Clears `core`'s owning-process binding after its context has been
	/// saved and it has been marked runnable again.
	fn clear_owning_proc(&self, core: PcoreId);

	/// Releases the calling core's address-space binding without
	/// installing a new one.
	fn abandon_core(&self);

	/// Restart the calling core into whatever was just scheduled onto it.
	/// Used by `cpu_bored`; never returns when a process was scheduled.
	fn restart_core(&self) -> !;
}

/// Every facility the scheduler needs, bundled for convenience. Any type
/// implementing the four component traits gets this for free.
pub trait Facilities: ProcessFacility + AlarmFacility + KernelMessaging + PerCpu {}

impl<T> Facilities for T where T: ProcessFacility + AlarmFacility + KernelMessaging + PerCpu {}
