// Copyright (c) 2017 Stefan Lankes, RWTH Aachen University
//               2017 Colin Finck, RWTH Aachen University
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Gang-scheduling core for a many-core research kernel.
//!
//! `ksched` tracks physical cores (pcores), the three process lists a
//! single-core process (SCP) or multi-core process (MCP) can sit on, and the
//! provisioning relationship that lets an MCP reclaim specific pcores from
//! whoever currently holds them. It does not implement process state
//! machines, context switching, interrupt routing, or memory allocation
//! itself — those are supplied by the host kernel through the traits in
//! [`scheduler::facility`].
//!
//! The crate is `no_std` + `alloc`; it is built against `std` under
//! `cfg(test)` so its data-structure logic can be exercised on the host
//! without a booted kernel.

#![cfg_attr(not(test), no_std)]
#![warn(rust_2018_idioms)]

extern crate alloc;

pub mod logging;
pub mod scheduler;

pub use scheduler::facility::{
	AlarmFacility, ChangeToMError, Facilities, GiveCoresOutcome, KernelMessaging, PerCpu,
	ProcessFacility, ResourceKind, WakeupKind,
};
pub use scheduler::ids::{PcoreId, ProcId};
pub use scheduler::{SchedConfig, Scheduler};
