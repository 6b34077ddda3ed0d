// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! CRC-32 calculation unit (polynomial `0x04C1_1DB7`, word input, no
//! reflection, initial value `0xFFFF_FFFF`).

use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK};
use hk32_utilities::registers::interfaces::{Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub CrcRegisters {
        /// Data register, reads the running CRC
        (0x00 => pub dr: ReadWrite<u32>),
        /// Independent data register, free scratch byte
        (0x04 => pub idr: ReadWrite<u32, IDR::Register>),
        (0x08 => pub cr: ReadWrite<u32, CR::Register>),
        (0x0C => @END),
    }
}

register_bitfields![u32,
    pub IDR [
        IDR OFFSET(0) NUMBITS(8) []
    ],
    pub CR [
        /// Reload the initial value, self clearing
        RESET OFFSET(0) NUMBITS(1) []
    ]
];

pub const CRC_BASE: StaticRef<CrcRegisters> =
    unsafe { StaticRef::new(memory_map::CRC_BASE as *const CrcRegisters) };

pub struct Crc<'a> {
    registers: StaticRef<CrcRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Crc<'a> {
    pub const fn new(rcc: &'a Rcc) -> Crc<'a> {
        Crc {
            registers: CRC_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB(HCLK::CRC), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<CrcRegisters>, rcc: &'a Rcc) -> Crc<'a> {
        Crc {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB(HCLK::CRC), rcc),
        }
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    pub fn reset(&self) {
        self.registers.cr.write(CR::RESET::SET);
    }

    /// Feed `data` into the running CRC and return the new value.
    pub fn accumulate(&self, data: &[u32]) -> u32 {
        for &word in data {
            self.registers.dr.set(word);
        }
        self.registers.dr.get()
    }

    /// CRC of `data` from the initial value.
    pub fn calculate(&self, data: &[u32]) -> u32 {
        self.reset();
        self.accumulate(data)
    }

    pub fn value(&self) -> u32 {
        self.registers.dr.get()
    }

    pub fn set_scratch(&self, value: u8) {
        self.registers.idr.write(IDR::IDR.val(value.into()));
    }

    pub fn scratch(&self) -> u8 {
        self.registers.idr.read(IDR::IDR) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn calculate_resets_first() {
        let regs: StaticRef<CrcRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let crc = Crc::with_registers(regs, &rcc);

        // Fake registers store the last word written instead of hashing it.
        assert_eq!(crc.calculate(&[0x1234_5678, 0xCAFE_F00D]), 0xCAFE_F00D);
        assert!(regs.cr.is_set(CR::RESET));
        assert_eq!(crc.accumulate(&[]), 0xCAFE_F00D);
    }

    #[test]
    fn scratch_is_one_byte() {
        let regs: StaticRef<CrcRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let crc = Crc::with_registers(regs, &rcc);

        crc.set_scratch(0xA5);
        assert_eq!(crc.scratch(), 0xA5);
        assert_eq!(core::mem::offset_of!(CrcRegisters, cr), 0x08);
    }
}
