// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! 12-bit successive approximation ADC register map.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub AdcRegisters {
        (0x00 => pub sr: ReadWrite<u32, SR::Register>),
        (0x04 => pub cr1: ReadWrite<u32, CR1::Register>),
        (0x08 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// Sample time register 1, channels 10 to 17
        (0x0C => pub smpr1: ReadWrite<u32>),
        /// Sample time register 2, channels 0 to 9
        (0x10 => pub smpr2: ReadWrite<u32>),
        /// Injected channel data offsets
        (0x14 => pub jofr: [ReadWrite<u32, OFFSET::Register>; 4]),
        /// Watchdog high threshold
        (0x24 => pub htr: ReadWrite<u32, THRESHOLD::Register>),
        /// Watchdog low threshold
        (0x28 => pub ltr: ReadWrite<u32, THRESHOLD::Register>),
        /// Regular sequence registers
        (0x2C => pub sqr1: ReadWrite<u32, SQR1::Register>),
        (0x30 => pub sqr2: ReadWrite<u32>),
        (0x34 => pub sqr3: ReadWrite<u32>),
        /// Injected sequence register
        (0x38 => pub jsqr: ReadWrite<u32, JSQR::Register>),
        /// Injected data registers
        (0x3C => pub jdr: [ReadOnly<u32>; 4]),
        /// Regular data register
        (0x4C => pub dr: ReadOnly<u32, DR::Register>),
        (0x50 => @END),
    }
}

register_bitfields![u32,
    pub SR [
        /// Regular channel start
        STRT OFFSET(4) NUMBITS(1) [],
        /// Injected channel start
        JSTRT OFFSET(3) NUMBITS(1) [],
        JEOC OFFSET(2) NUMBITS(1) [],
        EOC OFFSET(1) NUMBITS(1) [],
        /// Analog watchdog flag
        AWD OFFSET(0) NUMBITS(1) []
    ],
    pub CR1 [
        AWDEN OFFSET(23) NUMBITS(1) [],
        JAWDEN OFFSET(22) NUMBITS(1) [],
        /// Dual mode selection, ADC1 only
        DUALMOD OFFSET(16) NUMBITS(4) [],
        /// Channels per discontinuous group minus one
        DISCNUM OFFSET(13) NUMBITS(3) [],
        JDISCEN OFFSET(12) NUMBITS(1) [],
        DISCEN OFFSET(11) NUMBITS(1) [],
        JAUTO OFFSET(10) NUMBITS(1) [],
        AWDSGL OFFSET(9) NUMBITS(1) [],
        SCAN OFFSET(8) NUMBITS(1) [],
        JEOCIE OFFSET(7) NUMBITS(1) [],
        AWDIE OFFSET(6) NUMBITS(1) [],
        EOCIE OFFSET(5) NUMBITS(1) [],
        AWDCH OFFSET(0) NUMBITS(5) []
    ],
    pub CR2 [
        /// Temperature sensor and VREFINT enable
        TSVREFE OFFSET(23) NUMBITS(1) [],
        SWSTART OFFSET(22) NUMBITS(1) [],
        JSWSTART OFFSET(21) NUMBITS(1) [],
        EXTTRIG OFFSET(20) NUMBITS(1) [],
        EXTSEL OFFSET(17) NUMBITS(3) [
            Tim1Cc1 = 0b000,
            Tim1Cc2 = 0b001,
            Tim1Cc3 = 0b010,
            Tim2Cc2 = 0b011,
            Tim3Trgo = 0b100,
            Tim4Cc4 = 0b101,
            Exti11 = 0b110,
            Swstart = 0b111
        ],
        JEXTTRIG OFFSET(15) NUMBITS(1) [],
        JEXTSEL OFFSET(12) NUMBITS(3) [],
        /// Left alignment
        ALIGN OFFSET(11) NUMBITS(1) [],
        DMA OFFSET(8) NUMBITS(1) [],
        /// Reset calibration
        RSTCAL OFFSET(3) NUMBITS(1) [],
        CAL OFFSET(2) NUMBITS(1) [],
        /// Continuous conversion
        CONT OFFSET(1) NUMBITS(1) [],
        ADON OFFSET(0) NUMBITS(1) []
    ],
    pub OFFSET [
        JOFFSET OFFSET(0) NUMBITS(12) []
    ],
    pub THRESHOLD [
        VALUE OFFSET(0) NUMBITS(12) []
    ],
    pub SQR1 [
        /// Regular sequence length minus one
        L OFFSET(20) NUMBITS(4) [],
        SQ16 OFFSET(15) NUMBITS(5) [],
        SQ15 OFFSET(10) NUMBITS(5) [],
        SQ14 OFFSET(5) NUMBITS(5) [],
        SQ13 OFFSET(0) NUMBITS(5) []
    ],
    pub JSQR [
        /// Injected sequence length minus one
        JL OFFSET(20) NUMBITS(2) [],
        JSQ4 OFFSET(15) NUMBITS(5) [],
        JSQ3 OFFSET(10) NUMBITS(5) [],
        JSQ2 OFFSET(5) NUMBITS(5) [],
        JSQ1 OFFSET(0) NUMBITS(5) []
    ],
    pub DR [
        /// ADC2 result in dual mode
        ADC2DATA OFFSET(16) NUMBITS(16) [],
        DATA OFFSET(0) NUMBITS(16) []
    ]
];

pub const ADC1_BASE: StaticRef<AdcRegisters> =
    unsafe { StaticRef::new(memory_map::ADC1_BASE as *const AdcRegisters) };
pub const ADC2_BASE: StaticRef<AdcRegisters> =
    unsafe { StaticRef::new(memory_map::ADC2_BASE as *const AdcRegisters) };
pub const ADC3_BASE: StaticRef<AdcRegisters> =
    unsafe { StaticRef::new(memory_map::ADC3_BASE as *const AdcRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(AdcRegisters, jofr), 0x14);
        assert_eq!(core::mem::offset_of!(AdcRegisters, sqr1), 0x2C);
        assert_eq!(core::mem::offset_of!(AdcRegisters, jdr), 0x3C);
        assert_eq!(core::mem::offset_of!(AdcRegisters, dr), 0x4C);
        assert_eq!(CR2::SWSTART::SET.value, 0x0040_0000);
        assert_eq!(CR2::EXTSEL::Swstart.value, 0x000E_0000);
        assert_eq!(SQR1::L.val(15).value, 0x00F0_0000);
    }
}
