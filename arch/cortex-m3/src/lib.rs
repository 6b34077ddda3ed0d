// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Cortex-M3 core peripherals used by the HK32F39A.
//!
//! The core blocks live in the System Control Space at `0xE000_E000`:
//! the NVIC, the System Control Block and the SysTick timer. These modules
//! replace the parts of CMSIS `core_cm3.h` that chip code relies on.

#![no_std]

pub mod nvic;
pub mod scb;
pub mod support;
pub mod systick;

/// Cortex-M3 processor exception numbers, negative as in the CMSIS
/// `IRQn_Type` numbering. External interrupts start at 0.
pub mod exceptions {
    pub const NON_MASKABLE_INT: i32 = -14;
    pub const MEMORY_MANAGEMENT: i32 = -12;
    pub const BUS_FAULT: i32 = -11;
    pub const USAGE_FAULT: i32 = -10;
    pub const SV_CALL: i32 = -5;
    pub const DEBUG_MONITOR: i32 = -4;
    pub const PEND_SV: i32 = -2;
    pub const SYS_TICK: i32 = -1;
}

/// Number of priority bits implemented by the HK32 NVIC.
pub const NVIC_PRIO_BITS: u32 = 4;

#[cfg(test)]
extern crate std;

/// Allocate a zeroed register block on the host heap for unit tests.
#[cfg(test)]
pub(crate) fn fake_registers<T: 'static>() -> hk32_utilities::StaticRef<T> {
    // SAFETY: register blocks are plain integer cells, zero is a valid state.
    let block: &'static mut T = std::boxed::Box::leak(std::boxed::Box::new(unsafe {
        core::mem::zeroed::<T>()
    }));
    unsafe { hk32_utilities::StaticRef::new(block as *const T) }
}
