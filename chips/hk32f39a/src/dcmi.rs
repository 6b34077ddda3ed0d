// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Digital camera interface register map.

use crate::memory_map;
use hk32_utilities::registers::{
    register_bitfields, register_structs, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::StaticRef;

register_structs! {
    pub DcmiRegisters {
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        (0x04 => pub sr: ReadOnly<u32, SR::Register>),
        /// Raw interrupt status
        (0x08 => pub ris: ReadOnly<u32, INT::Register>),
        (0x0C => pub ier: ReadWrite<u32, INT::Register>),
        /// Masked interrupt status
        (0x10 => pub mis: ReadOnly<u32, INT::Register>),
        (0x14 => pub icr: WriteOnly<u32, INT::Register>),
        /// Embedded synchronization code
        (0x18 => pub escr: ReadWrite<u32, SYNC::Register>),
        /// Embedded synchronization unmask
        (0x1C => pub esur: ReadWrite<u32, SYNC::Register>),
        /// Crop window start
        (0x20 => pub cwstrt: ReadWrite<u32, CWSTRT::Register>),
        (0x24 => pub cwsize: ReadWrite<u32, CWSIZE::Register>),
        (0x28 => pub dr: ReadOnly<u32>),
        (0x2C => @END),
    }
}

register_bitfields![u32,
    pub CR [
        ENABLE OFFSET(14) NUMBITS(1) [],
        /// Extended data mode
        EDM OFFSET(10) NUMBITS(2) [
            Bits8 = 0b00,
            Bits10 = 0b01,
            Bits12 = 0b10,
            Bits14 = 0b11
        ],
        /// Frame capture rate
        FCRC OFFSET(8) NUMBITS(2) [
            All = 0b00,
            Alternate = 0b01,
            OneOfFour = 0b10
        ],
        VSPOL OFFSET(7) NUMBITS(1) [],
        HSPOL OFFSET(6) NUMBITS(1) [],
        PCKPOL OFFSET(5) NUMBITS(1) [],
        /// Embedded synchronization select
        ESS OFFSET(4) NUMBITS(1) [],
        /// JPEG format
        JPEG OFFSET(3) NUMBITS(1) [],
        CROP OFFSET(2) NUMBITS(1) [],
        /// Set for snapshot, clear for continuous
        CM OFFSET(1) NUMBITS(1) [],
        CAPTURE OFFSET(0) NUMBITS(1) []
    ],
    pub SR [
        FNE OFFSET(2) NUMBITS(1) [],
        VSYNC OFFSET(1) NUMBITS(1) [],
        HSYNC OFFSET(0) NUMBITS(1) []
    ],
    pub INT [
        LINE OFFSET(4) NUMBITS(1) [],
        VSYNC OFFSET(3) NUMBITS(1) [],
        /// Synchronization error
        ERR OFFSET(2) NUMBITS(1) [],
        OVR OFFSET(1) NUMBITS(1) [],
        /// Capture complete
        FRAME OFFSET(0) NUMBITS(1) []
    ],
    pub SYNC [
        FEC OFFSET(24) NUMBITS(8) [],
        LEC OFFSET(16) NUMBITS(8) [],
        LSC OFFSET(8) NUMBITS(8) [],
        FSC OFFSET(0) NUMBITS(8) []
    ],
    pub CWSTRT [
        VST OFFSET(16) NUMBITS(13) [],
        HOFFCNT OFFSET(0) NUMBITS(14) []
    ],
    pub CWSIZE [
        /// Line count minus one
        VLINE OFFSET(16) NUMBITS(14) [],
        /// Pixel clocks per line minus one
        CAPCNT OFFSET(0) NUMBITS(14) []
    ]
];

pub const DCMI_BASE: StaticRef<DcmiRegisters> =
    unsafe { StaticRef::new(memory_map::DCMI_BASE as *const DcmiRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(DcmiRegisters, escr), 0x18);
        assert_eq!(core::mem::offset_of!(DcmiRegisters, cwsize), 0x24);
        assert_eq!(core::mem::offset_of!(DcmiRegisters, dr), 0x28);
        assert_eq!(CR::ENABLE::SET.value, 0x4000);
        assert_eq!(INT::FRAME::SET.value | INT::LINE::SET.value, 0x11);
    }
}
