// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Real-time clock register map.
//!
//! The 32-bit prescaler, divider, counter and alarm values are split into
//! 16-bit high and low registers. Writes need `CNF` set and complete when
//! `RTOFF` reads back as one.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub RtcRegisters {
        (0x00 => pub crh: ReadWrite<u32, CRH::Register>),
        (0x04 => pub crl: ReadWrite<u32, CRL::Register>),
        /// Prescaler load, bits 19:16
        (0x08 => pub prlh: ReadWrite<u32, HIGH4::Register>),
        /// Prescaler load, bits 15:0
        (0x0C => pub prll: ReadWrite<u32, HALF::Register>),
        (0x10 => pub divh: ReadOnly<u32, HIGH4::Register>),
        (0x14 => pub divl: ReadOnly<u32, HALF::Register>),
        (0x18 => pub cnth: ReadWrite<u32, HALF::Register>),
        (0x1C => pub cntl: ReadWrite<u32, HALF::Register>),
        (0x20 => pub alrh: ReadWrite<u32, HALF::Register>),
        (0x24 => pub alrl: ReadWrite<u32, HALF::Register>),
        (0x28 => @END),
    }
}

register_bitfields![u32,
    pub CRH [
        /// Overflow interrupt enable
        OWIE OFFSET(2) NUMBITS(1) [],
        /// Alarm interrupt enable
        ALRIE OFFSET(1) NUMBITS(1) [],
        /// Second interrupt enable
        SECIE OFFSET(0) NUMBITS(1) []
    ],
    pub CRL [
        /// Last write operation finished
        RTOFF OFFSET(5) NUMBITS(1) [],
        /// Configuration mode
        CNF OFFSET(4) NUMBITS(1) [],
        /// Registers synchronized
        RSF OFFSET(3) NUMBITS(1) [],
        OWF OFFSET(2) NUMBITS(1) [],
        ALRF OFFSET(1) NUMBITS(1) [],
        SECF OFFSET(0) NUMBITS(1) []
    ],
    pub HIGH4 [
        VALUE OFFSET(0) NUMBITS(4) []
    ],
    pub HALF [
        VALUE OFFSET(0) NUMBITS(16) []
    ]
];

pub const RTC_BASE: StaticRef<RtcRegisters> =
    unsafe { StaticRef::new(memory_map::RTC_BASE as *const RtcRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(RtcRegisters, prll), 0x0C);
        assert_eq!(core::mem::offset_of!(RtcRegisters, cnth), 0x18);
        assert_eq!(core::mem::offset_of!(RtcRegisters, alrl), 0x24);
        assert_eq!(CRL::RTOFF::SET.value, 0x20);
        assert_eq!(CRL::CNF::SET.value, 0x10);
    }
}
