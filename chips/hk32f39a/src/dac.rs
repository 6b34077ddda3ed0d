// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Dual 12-bit DAC register map.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub DacRegisters {
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Software trigger register
        (0x04 => pub swtrigr: ReadWrite<u32, SWTRIGR::Register>),
        /// Channel 1 12-bit right aligned data holding register
        (0x08 => pub dhr12r1: ReadWrite<u32>),
        (0x0C => pub dhr12l1: ReadWrite<u32>),
        (0x10 => pub dhr8r1: ReadWrite<u32>),
        /// Channel 2 12-bit right aligned data holding register
        (0x14 => pub dhr12r2: ReadWrite<u32>),
        (0x18 => pub dhr12l2: ReadWrite<u32>),
        (0x1C => pub dhr8r2: ReadWrite<u32>),
        /// Dual channel data holding registers
        (0x20 => pub dhr12rd: ReadWrite<u32, DUAL12::Register>),
        (0x24 => pub dhr12ld: ReadWrite<u32>),
        (0x28 => pub dhr8rd: ReadWrite<u32>),
        /// Data output registers
        (0x2C => pub dor1: ReadOnly<u32>),
        (0x30 => pub dor2: ReadOnly<u32>),
        (0x34 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        DMAEN2 OFFSET(28) NUMBITS(1) [],
        /// Mask/amplitude selector
        MAMP2 OFFSET(24) NUMBITS(4) [],
        WAVE2 OFFSET(22) NUMBITS(2) [
            Disabled = 0b00,
            Noise = 0b01,
            Triangle = 0b10
        ],
        TSEL2 OFFSET(19) NUMBITS(3) [],
        TEN2 OFFSET(18) NUMBITS(1) [],
        /// Output buffer disable
        BOFF2 OFFSET(17) NUMBITS(1) [],
        EN2 OFFSET(16) NUMBITS(1) [],
        DMAEN1 OFFSET(12) NUMBITS(1) [],
        MAMP1 OFFSET(8) NUMBITS(4) [],
        WAVE1 OFFSET(6) NUMBITS(2) [
            Disabled = 0b00,
            Noise = 0b01,
            Triangle = 0b10
        ],
        TSEL1 OFFSET(3) NUMBITS(3) [
            Tim6Trgo = 0b000,
            Tim8Trgo = 0b001,
            Tim7Trgo = 0b010,
            Tim5Trgo = 0b011,
            Tim2Trgo = 0b100,
            Tim4Trgo = 0b101,
            Exti9 = 0b110,
            Software = 0b111
        ],
        TEN1 OFFSET(2) NUMBITS(1) [],
        BOFF1 OFFSET(1) NUMBITS(1) [],
        EN1 OFFSET(0) NUMBITS(1) []
    ],
    pub SWTRIGR [
        SWTRIG2 OFFSET(1) NUMBITS(1) [],
        SWTRIG1 OFFSET(0) NUMBITS(1) []
    ],
    pub DUAL12 [
        DACC2DHR OFFSET(16) NUMBITS(12) [],
        DACC1DHR OFFSET(0) NUMBITS(12) []
    ]
];

pub const DAC_BASE: StaticRef<DacRegisters> =
    unsafe { StaticRef::new(memory_map::DAC_BASE as *const DacRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(DacRegisters, dhr12r2), 0x14);
        assert_eq!(core::mem::offset_of!(DacRegisters, dhr12rd), 0x20);
        assert_eq!(core::mem::offset_of!(DacRegisters, dor2), 0x30);
        assert_eq!(CR::EN2::SET.value, 0x0001_0000);
        assert_eq!(CR::TSEL1::Software.value, 0x38);
        assert_eq!(DUAL12::DACC2DHR.val(0xFFF).value, 0x0FFF_0000);
    }
}
