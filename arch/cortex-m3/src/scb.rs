// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! ARMv7-M System Control Block, the subset the HK32 chip code uses.

use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{ErrorCode, StaticRef};

register_structs! {
    pub ScbRegisters {
        /// CPUID Base Register
        (0x00 => cpuid: ReadOnly<u32, CpuId::Register>),
        /// Interrupt Control and State Register
        (0x04 => icsr: ReadWrite<u32, InterruptControlAndState::Register>),
        /// Vector Table Offset Register
        (0x08 => vtor: ReadWrite<u32, VectorTableOffset::Register>),
        /// Application Interrupt and Reset Control Register
        (0x0c => aircr: ReadWrite<u32, ApplicationInterruptAndReset::Register>),
        /// System Control Register
        (0x10 => scr: ReadWrite<u32, SystemControl::Register>),
        /// Configuration and Control Register
        (0x14 => ccr: ReadWrite<u32, ConfigurationAndControl::Register>),
        /// System Handler Priority Registers
        (0x18 => shpr: [ReadWrite<u8>; 12]),
        /// System Handler Control and State Register
        (0x24 => shcsr: ReadWrite<u32>),
        (0x28 => @END),
    }
}

register_bitfields![u32,
    CpuId [
        IMPLEMENTER     OFFSET(24)  NUMBITS(8),
        VARIANT         OFFSET(20)  NUMBITS(4),
        PARTNO          OFFSET(4)   NUMBITS(12),
        REVISION        OFFSET(0)   NUMBITS(4)
    ],

    InterruptControlAndState [
        NMIPENDSET      OFFSET(31)  NUMBITS(1),
        PENDSVSET       OFFSET(28)  NUMBITS(1),
        PENDSVCLR       OFFSET(27)  NUMBITS(1),
        PENDSTSET       OFFSET(26)  NUMBITS(1),
        PENDSTCLR       OFFSET(25)  NUMBITS(1),
        ISRPENDING      OFFSET(22)  NUMBITS(1),
        VECTPENDING     OFFSET(12)  NUMBITS(9),
        RETTOBASE       OFFSET(11)  NUMBITS(1),
        VECTACTIVE      OFFSET(0)   NUMBITS(9)
    ],

    VectorTableOffset [
        /// Bits [29:7] of the table address; the table is 128-byte aligned
        TBLOFF          OFFSET(7)   NUMBITS(23)
    ],

    ApplicationInterruptAndReset [
        /// Writes must carry 0x05FA or they are ignored
        VECTKEY         OFFSET(16)  NUMBITS(16),
        ENDIANNESS      OFFSET(15)  NUMBITS(1),
        PRIGROUP        OFFSET(8)   NUMBITS(3),
        SYSRESETREQ     OFFSET(2)   NUMBITS(1),
        VECTCLRACTIVE   OFFSET(1)   NUMBITS(1),
        VECTRESET       OFFSET(0)   NUMBITS(1)
    ],

    SystemControl [
        SEVONPEND       OFFSET(4)   NUMBITS(1),
        SLEEPDEEP       OFFSET(2)   NUMBITS(1),
        SLEEPONEXIT     OFFSET(1)   NUMBITS(1)
    ],

    ConfigurationAndControl [
        STKALIGN        OFFSET(9)   NUMBITS(1),
        BFHFNMIGN       OFFSET(8)   NUMBITS(1),
        DIV_0_TRP       OFFSET(4)   NUMBITS(1),
        UNALIGN_TRP     OFFSET(3)   NUMBITS(1),
        USERSETMPEND    OFFSET(1)   NUMBITS(1),
        NONBASETHRDENA  OFFSET(0)   NUMBITS(1)
    ]
];

/// Writes to AIRCR are ignored unless they carry this key.
const AIRCR_VECTKEY: u32 = 0x05FA;

const SCB: StaticRef<ScbRegisters> = unsafe { StaticRef::new(0xE000_ED00 as *const ScbRegisters) };

pub struct Scb {
    registers: StaticRef<ScbRegisters>,
}

impl Scb {
    pub const fn new() -> Scb {
        Scb { registers: SCB }
    }

    #[cfg(test)]
    pub(crate) fn with_registers(registers: StaticRef<ScbRegisters>) -> Scb {
        Scb { registers }
    }

    pub fn cpu_part_number(&self) -> u32 {
        self.registers.cpuid.read(CpuId::PARTNO)
    }

    /// Relocate the vector table. The address must be 128-byte aligned.
    pub fn set_vector_table_offset(&self, address: u32) -> Result<(), ErrorCode> {
        if address & 0x7f != 0 {
            return Err(ErrorCode::INVAL);
        }
        self.registers.vtor.set(address);
        Ok(())
    }

    pub fn vector_table_offset(&self) -> u32 {
        self.registers.vtor.get()
    }

    /// Select how many priority bits are preemption bits (`PRIGROUP`).
    pub fn set_priority_grouping(&self, group: u32) -> Result<(), ErrorCode> {
        if group > 7 {
            return Err(ErrorCode::INVAL);
        }
        self.registers.aircr.modify(
            ApplicationInterruptAndReset::VECTKEY.val(AIRCR_VECTKEY)
                + ApplicationInterruptAndReset::PRIGROUP.val(group),
        );
        Ok(())
    }

    pub fn priority_grouping(&self) -> u32 {
        self.registers
            .aircr
            .read(ApplicationInterruptAndReset::PRIGROUP)
    }

    pub fn set_sleepdeep(&self) {
        self.registers.scr.modify(SystemControl::SLEEPDEEP::SET);
    }

    pub fn unset_sleepdeep(&self) {
        self.registers.scr.modify(SystemControl::SLEEPDEEP::CLEAR);
    }

    pub fn is_sleepdeep(&self) -> bool {
        self.registers.scr.is_set(SystemControl::SLEEPDEEP)
    }

    pub fn set_sleep_on_exit(&self, enable: bool) {
        if enable {
            self.registers.scr.modify(SystemControl::SLEEPONEXIT::SET);
        } else {
            self.registers.scr.modify(SystemControl::SLEEPONEXIT::CLEAR);
        }
    }

    pub fn set_pendsv(&self) {
        self.registers
            .icsr
            .write(InterruptControlAndState::PENDSVSET::SET);
    }

    /// Trap on division by zero instead of returning 0.
    pub fn trap_divide_by_zero(&self, enable: bool) {
        if enable {
            self.registers.ccr.modify(ConfigurationAndControl::DIV_0_TRP::SET);
        } else {
            self.registers.ccr.modify(ConfigurationAndControl::DIV_0_TRP::CLEAR);
        }
    }

    /// Priority of a system handler, indexed by exception number - 4.
    pub fn set_system_handler_priority(&self, handler: usize, priority: u8) {
        if let Some(shpr) = self.registers.shpr.get(handler) {
            shpr.set(priority << 4);
        }
    }

    /// Request a system reset.
    pub fn reset(&self) -> ! {
        let prigroup = self.priority_grouping();
        self.registers.aircr.write(
            ApplicationInterruptAndReset::VECTKEY.val(AIRCR_VECTKEY)
                + ApplicationInterruptAndReset::PRIGROUP.val(prigroup)
                + ApplicationInterruptAndReset::SYSRESETREQ::SET,
        );
        loop {
            crate::support::nop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn register_offsets() {
        assert_eq!(core::mem::offset_of!(ScbRegisters, vtor), 0x08);
        assert_eq!(core::mem::offset_of!(ScbRegisters, scr), 0x10);
        assert_eq!(core::mem::offset_of!(ScbRegisters, shcsr), 0x24);
    }

    #[test]
    fn vector_table_must_be_aligned() {
        let scb = Scb::with_registers(fake_registers());
        assert_eq!(scb.set_vector_table_offset(0x0800_0040), Err(ErrorCode::INVAL));
        assert_eq!(scb.set_vector_table_offset(0x0800_4000), Ok(()));
        assert_eq!(scb.vector_table_offset(), 0x0800_4000);
    }

    #[test]
    fn sleepdeep_toggles_bit_two() {
        let regs = fake_registers::<ScbRegisters>();
        let scb = Scb::with_registers(regs);
        scb.set_sleepdeep();
        assert_eq!(regs.scr.get(), 0b100);
        assert!(scb.is_sleepdeep());
        scb.unset_sleepdeep();
        assert_eq!(regs.scr.get(), 0);
    }

    #[test]
    fn priority_grouping_carries_the_key() {
        let regs = fake_registers::<ScbRegisters>();
        let scb = Scb::with_registers(regs);
        assert_eq!(scb.set_priority_grouping(5), Ok(()));
        assert_eq!(regs.aircr.get(), 0x05FA_0500);
        assert_eq!(scb.set_priority_grouping(8), Err(ErrorCode::INVAL));
    }
}
