// Copyright (c) 2017 Stefan Lankes, RWTH Aachen University
//               2017 Colin Finck, RWTH Aachen University
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! All of ksched's diagnostics go through the `log` facade rather than a
//! bespoke macro set. The crate never installs a logger itself; the host
//! kernel is expected to register one (e.g. via `log::set_logger`) before
//! calling into the scheduler. This module only centralizes the handful of
//! multi-line debug readouts (`sched_diag` and friends in [`crate::scheduler::diag`])
//! so they all emit at a single, consistent level.

/// The level at which the scheduler's debug readouts (`sched_diag`,
/// `print_idlecoremap`, ...) log. Kept separate from ordinary `log::info!`
/// call sites so a host can filter dump output independently if desired.
pub const DIAG_LEVEL: log::Level = log::Level::Info;
