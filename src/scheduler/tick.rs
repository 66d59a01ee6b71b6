//! The periodic tick: an alarm re-entering the scheduler every 10ms by
//! default, rearmed incrementally from its previous fire time so it does
//! not drift under load.

/// Default tick period, matching the original's `TIMER_TICK_USEC`.
pub const DEFAULT_TICK_PERIOD_USEC: u64 = 10_000;
