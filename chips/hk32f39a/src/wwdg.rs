// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Window watchdog register map.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub WwdgRegisters {
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Configuration register
        (0x04 => pub cfr: ReadWrite<u32, CFR::Register>),
        (0x08 => pub sr: ReadWrite<u32, SR::Register>),
        (0x0C => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Activation, cleared only by reset
        WDGA OFFSET(7) NUMBITS(1) [],
        /// Counter, reset when bit 6 falls
        T OFFSET(0) NUMBITS(7) []
    ],
    pub CFR [
        /// Early wakeup interrupt
        EWI OFFSET(9) NUMBITS(1) [],
        /// Timer base, PCLK1 / 4096 / 2^WDGTB
        WDGTB OFFSET(7) NUMBITS(2) [
            Div1 = 0b00,
            Div2 = 0b01,
            Div4 = 0b10,
            Div8 = 0b11
        ],
        /// Window value
        W OFFSET(0) NUMBITS(7) []
    ],
    pub SR [
        /// Early wakeup interrupt flag
        EWIF OFFSET(0) NUMBITS(1) []
    ]
];

pub const WWDG_BASE: StaticRef<WwdgRegisters> =
    unsafe { StaticRef::new(memory_map::WWDG_BASE as *const WwdgRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(WwdgRegisters, sr), 0x08);
        assert_eq!(CFR::WDGTB::Div8.value, 0x180);
        assert_eq!(CR::WDGA::SET.value + CR::T.val(0x7F).value, 0xFF);
    }
}
