// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Cortex-M3 Nested Vectored Interrupt Controller.
//!
//! The interrupt lines are numbered by the chip crate; this module only
//! knows about the enable, pending, active and priority banks. `ICTR`
//! tells how many 32-line banks the silicon implements.

use hk32_utilities::registers::interfaces::{Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{ErrorCode, StaticRef};

use crate::NVIC_PRIO_BITS;

register_structs! {
    /// NVIC registers, starting at the base of the System Control Space.
    pub NvicRegisters {
        (0x000 => _reserved0),

        /// Interrupt Controller Type Register
        (0x004 => ictr: ReadOnly<u32, InterruptControllerType::Register>),

        (0x008 => _reserved1),

        /// Interrupt Set-Enable Registers
        (0x100 => iser: [ReadWrite<u32, NvicSetClear::Register>; 8]),

        (0x120 => _reserved2),

        /// Interrupt Clear-Enable Registers
        (0x180 => icer: [ReadWrite<u32, NvicSetClear::Register>; 8]),

        (0x1a0 => _reserved3),

        /// Interrupt Set-Pending Registers
        (0x200 => ispr: [ReadWrite<u32, NvicSetClear::Register>; 8]),

        (0x220 => _reserved4),

        /// Interrupt Clear-Pending Registers
        (0x280 => icpr: [ReadWrite<u32, NvicSetClear::Register>; 8]),

        (0x2a0 => _reserved5),

        /// Interrupt Active Bit Registers
        (0x300 => iabr: [ReadOnly<u32, NvicSetClear::Register>; 8]),

        (0x320 => _reserved6),

        /// Interrupt Priority Registers, one byte per line
        (0x400 => ipr: [ReadWrite<u8, NvicPriority::Register>; 240]),

        (0x4f0 => @END),
    }
}

register_bitfields![u32,
    InterruptControllerType [
        /// Total number of interrupt lines in groups of 32, minus one
        INTLINESNUM     OFFSET(0)   NUMBITS(4)
    ],

    NvicSetClear [
        /// Bit m of register n covers interrupt m + 32n
        BITS            OFFSET(0)   NUMBITS(32)
    ]
];

register_bitfields![u8,
    NvicPriority [
        /// Implemented priority bits sit in the top of the byte
        PRIORITY        OFFSET(4)   NUMBITS(4)
    ]
];

const NVIC: StaticRef<NvicRegisters> =
    unsafe { StaticRef::new(0xE000_E000 as *const NvicRegisters) };

/// Highest priority value that fits in the implemented bits.
pub const MAX_PRIORITY_VALUE: u8 = (1 << NVIC_PRIO_BITS) - 1;

fn banks(registers: &NvicRegisters) -> usize {
    ((registers.ictr.read(InterruptControllerType::INTLINESNUM) + 1) as usize).min(8)
}

/// Clear all pending interrupts
pub unsafe fn clear_all_pending() {
    for icpr in NVIC.icpr.iter().take(banks(&NVIC)) {
        icpr.set(!0)
    }
}

/// Enable all interrupts
pub unsafe fn enable_all() {
    for iser in NVIC.iser.iter().take(banks(&NVIC)) {
        iser.set(!0)
    }
}

/// Disable all interrupts
pub unsafe fn disable_all() {
    for icer in NVIC.icer.iter().take(banks(&NVIC)) {
        icer.set(!0)
    }
}

/// Lowest numbered pending interrupt, if any.
pub unsafe fn next_pending() -> Option<u32> {
    next_pending_in(&NVIC)
}

fn next_pending_in(registers: &NvicRegisters) -> Option<u32> {
    registers
        .ispr
        .iter()
        .take(banks(registers))
        .enumerate()
        .find_map(|(bank, ispr)| {
            let bits = ispr.get();
            if bits != 0 {
                Some(bank as u32 * 32 + bits.trailing_zeros())
            } else {
                None
            }
        })
}

/// Handle on a single interrupt line.
///
/// Drivers receive one of these for their own line so they cannot touch
/// other lines.
pub struct Nvic {
    registers: StaticRef<NvicRegisters>,
    idx: u32,
}

impl Nvic {
    /// Marked unsafe because only chip configuration code should hand
    /// these out.
    pub const unsafe fn new(idx: u32) -> Nvic {
        Nvic {
            registers: NVIC,
            idx,
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<NvicRegisters>, idx: u32) -> Nvic {
        Nvic { registers, idx }
    }

    pub fn number(&self) -> u32 {
        self.idx
    }

    fn bank(&self) -> usize {
        (self.idx / 32) as usize
    }

    fn bit(&self) -> u32 {
        1 << (self.idx & 31)
    }

    pub fn enable(&self) {
        self.registers.iser[self.bank()].set(self.bit());
    }

    pub fn disable(&self) {
        self.registers.icer[self.bank()].set(self.bit());
    }

    pub fn is_enabled(&self) -> bool {
        self.registers.iser[self.bank()].get() & self.bit() != 0
    }

    pub fn set_pending(&self) {
        self.registers.ispr[self.bank()].set(self.bit());
    }

    pub fn clear_pending(&self) {
        self.registers.icpr[self.bank()].set(self.bit());
    }

    pub fn is_pending(&self) -> bool {
        self.registers.ispr[self.bank()].get() & self.bit() != 0
    }

    pub fn is_active(&self) -> bool {
        self.registers.iabr[self.bank()].get() & self.bit() != 0
    }

    /// Program the line priority. Lower values preempt higher ones.
    pub fn set_priority(&self, priority: u8) -> Result<(), ErrorCode> {
        if priority > MAX_PRIORITY_VALUE {
            return Err(ErrorCode::INVAL);
        }
        self.registers.ipr[self.idx as usize].write(NvicPriority::PRIORITY.val(priority));
        Ok(())
    }

    pub fn priority(&self) -> u8 {
        self.registers.ipr[self.idx as usize].read(NvicPriority::PRIORITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn register_offsets() {
        assert_eq!(core::mem::offset_of!(NvicRegisters, iser), 0x100);
        assert_eq!(core::mem::offset_of!(NvicRegisters, icpr), 0x280);
        assert_eq!(core::mem::offset_of!(NvicRegisters, ipr), 0x400);
    }

    #[test]
    fn enable_writes_the_right_bank() {
        let regs = fake_registers::<NvicRegisters>();
        let usart6 = Nvic::with_registers(regs, 60);
        usart6.enable();
        assert_eq!(regs.iser[1].get(), 1 << 28);
        assert!(usart6.is_enabled());
        usart6.disable();
        assert_eq!(regs.icer[1].get(), 1 << 28);
    }

    #[test]
    fn priority_uses_upper_nibble() {
        let regs = fake_registers::<NvicRegisters>();
        let line = Nvic::with_registers(regs, 37);
        assert_eq!(line.set_priority(3), Ok(()));
        assert_eq!(regs.ipr[37].get(), 0x30);
        assert_eq!(line.priority(), 3);
        assert_eq!(line.set_priority(16), Err(ErrorCode::INVAL));
    }

    #[test]
    fn next_pending_picks_lowest_line() {
        let regs = fake_registers::<NvicRegisters>();
        assert_eq!(next_pending_in(&regs), None);
        // ISPR is write-one-to-set in silicon, RAM keeps only the last write.
        regs.ispr[0].set((1 << 21) | (1 << 6));
        assert_eq!(next_pending_in(&regs), Some(6));
        assert!(Nvic::with_registers(regs, 21).is_pending());
    }

    #[test]
    fn set_pending_writes_a_single_bit() {
        let regs = fake_registers::<NvicRegisters>();
        Nvic::with_registers(regs, 6).set_pending();
        assert_eq!(regs.ispr[0].get(), 1 << 6);
    }
}
