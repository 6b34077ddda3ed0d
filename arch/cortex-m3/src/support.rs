// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Core instructions the chip crate needs, mocked when not building for an
//! ARM target so that host unit tests link.

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline(always)]
pub fn nop() {
    use core::arch::asm;
    // SAFETY: `nop` has no side effects.
    unsafe {
        asm!("nop", options(nomem, nostack, preserves_flags));
    }
}

/// Wait for interrupt.
///
/// On the HK32 this is how STOP, STANDBY and SHUTDOWN modes are entered once
/// `SCB.SLEEPDEEP` and the PWR mode bits are set.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline(always)]
pub unsafe fn wfi() {
    use core::arch::asm;
    asm!("wfi", options(nomem, preserves_flags));
}

/// Wait for event.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline(always)]
pub unsafe fn wfe() {
    use core::arch::asm;
    asm!("wfe", options(nomem, preserves_flags));
}

/// Send event, used to clear a stale event flag before `wfe`.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline(always)]
pub unsafe fn sev() {
    use core::arch::asm;
    asm!("sev", options(nomem, preserves_flags));
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub fn nop() {
    core::hint::spin_loop();
}

// Off target the core never sleeps; returning keeps drivers testable.
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub unsafe fn wfi() {}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub unsafe fn wfe() {}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub unsafe fn sev() {}
