// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Backup domain register map: 42 16-bit data registers, tamper pin and
//! RTC calibration. Writes need `PWR_CR.DBP`.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub BkpRegisters {
        (0x00 => _reserved0),
        /// Data registers 1 to 10
        (0x04 => pub dr_low: [ReadWrite<u32, DR::Register>; 10]),
        /// RTC clock calibration register
        (0x2C => pub rtccr: ReadWrite<u32, RTCCR::Register>),
        (0x30 => pub cr: ReadWrite<u32, CR::Register>),
        /// Control/status register
        (0x34 => pub csr: ReadWrite<u32, CSR::Register>),
        (0x38 => _reserved1),
        /// Data registers 11 to 42
        (0x40 => pub dr_high: [ReadWrite<u32, DR::Register>; 32]),
        (0xC0 => @END),
    }
}

register_bitfields![u32,
    pub DR [
        D OFFSET(0) NUMBITS(16) []
    ],
    pub RTCCR [
        /// Alarm or second output selection
        ASOS OFFSET(9) NUMBITS(1) [],
        /// Alarm or second output enable
        ASOE OFFSET(8) NUMBITS(1) [],
        /// Calibration clock output
        CCO OFFSET(7) NUMBITS(1) [],
        /// Clock pulses ignored every 2^20 cycles
        CAL OFFSET(0) NUMBITS(7) []
    ],
    pub CR [
        /// Tamper pin active level, set for low
        TPAL OFFSET(1) NUMBITS(1) [],
        TPE OFFSET(0) NUMBITS(1) []
    ],
    pub CSR [
        /// Tamper interrupt flag
        TIF OFFSET(9) NUMBITS(1) [],
        /// Tamper event flag
        TEF OFFSET(8) NUMBITS(1) [],
        TPIE OFFSET(2) NUMBITS(1) [],
        /// Clear tamper interrupt
        CTI OFFSET(1) NUMBITS(1) [],
        /// Clear tamper event
        CTE OFFSET(0) NUMBITS(1) []
    ]
];

pub const BKP_BASE: StaticRef<BkpRegisters> =
    unsafe { StaticRef::new(memory_map::BKP_BASE as *const BkpRegisters) };

pub const BACKUP_REGISTER_COUNT: usize = 42;

impl BkpRegisters {
    /// Data register `n`, counting from 1 like the reference manual.
    pub fn data(&self, n: usize) -> Option<&ReadWrite<u32, DR::Register>> {
        match n {
            1..=10 => self.dr_low.get(n - 1),
            11..=BACKUP_REGISTER_COUNT => self.dr_high.get(n - 11),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;
    use hk32_utilities::registers::interfaces::{Readable, Writeable};

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(BkpRegisters, dr_low), 0x04);
        assert_eq!(core::mem::offset_of!(BkpRegisters, rtccr), 0x2C);
        assert_eq!(core::mem::offset_of!(BkpRegisters, csr), 0x34);
        assert_eq!(core::mem::offset_of!(BkpRegisters, dr_high), 0x40);
        assert_eq!(CSR::TIF::SET.value, 0x200);
    }

    #[test]
    fn data_register_numbering() {
        let regs: StaticRef<BkpRegisters> = fake_registers();

        if let Some(dr) = regs.data(11) {
            dr.set(0xBEEF);
        }
        assert_eq!(regs.dr_high[0].get(), 0xBEEF);
        if let Some(dr) = regs.data(10) {
            dr.set(0x1234);
        }
        assert_eq!(regs.dr_low[9].get(), 0x1234);
        assert!(regs.data(0).is_none());
        assert!(regs.data(43).is_none());
    }
}
