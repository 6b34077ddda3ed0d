// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Serial audio interface register map. One global register followed by
//! two identical audio sub-blocks, A and B.

use crate::memory_map;
use hk32_utilities::registers::{
    register_bitfields, register_structs, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::StaticRef;

register_structs! {
    pub SaiRegisters {
        /// Global configuration register
        (0x00 => pub gcr: ReadWrite<u32, GCR::Register>),
        (0x04 => pub block_a: SaiBlock),
        (0x24 => pub block_b: SaiBlock),
        (0x44 => @END),
    },

    pub SaiBlock {
        (0x00 => pub cr1: ReadWrite<u32, CR1::Register>),
        (0x04 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// Frame configuration register
        (0x08 => pub frcr: ReadWrite<u32, FRCR::Register>),
        (0x0C => pub slotr: ReadWrite<u32, SLOTR::Register>),
        /// Interrupt mask, same bits as `sr`
        (0x10 => pub im: ReadWrite<u32, SR::Register>),
        (0x14 => pub sr: ReadOnly<u32, SR::Register>),
        (0x18 => pub clrfr: WriteOnly<u32, SR::Register>),
        (0x1C => pub dr: ReadWrite<u32>),
        (0x20 => @END),
    }
}

register_bitfields![u32,
    pub GCR [
        /// Synchronization output
        SYNCOUT OFFSET(4) NUMBITS(2) [
            Off = 0b00,
            BlockA = 0b01,
            BlockB = 0b10
        ],
        SYNCIN OFFSET(0) NUMBITS(2) []
    ],
    pub CR1 [
        /// Master clock divider, 0 bypasses
        MCKDIV OFFSET(20) NUMBITS(4) [],
        NODIV OFFSET(19) NUMBITS(1) [],
        DMAEN OFFSET(17) NUMBITS(1) [],
        SAIEN OFFSET(16) NUMBITS(1) [],
        OUTDRIV OFFSET(13) NUMBITS(1) [],
        /// Mono mode
        MONO OFFSET(12) NUMBITS(1) [],
        SYNCEN OFFSET(10) NUMBITS(2) [
            Asynchronous = 0b00,
            Internal = 0b01,
            External = 0b10
        ],
        /// Clock strobing edge
        CKSTR OFFSET(9) NUMBITS(1) [],
        LSBFIRST OFFSET(8) NUMBITS(1) [],
        DS OFFSET(5) NUMBITS(3) [
            Bits8 = 0b010,
            Bits10 = 0b011,
            Bits16 = 0b100,
            Bits20 = 0b101,
            Bits24 = 0b110,
            Bits32 = 0b111
        ],
        PRTCFG OFFSET(2) NUMBITS(2) [
            Free = 0b00,
            Spdif = 0b01,
            Ac97 = 0b10
        ],
        MODE OFFSET(0) NUMBITS(2) [
            MasterTransmit = 0b00,
            MasterReceive = 0b01,
            SlaveTransmit = 0b10,
            SlaveReceive = 0b11
        ]
    ],
    pub CR2 [
        COMP OFFSET(14) NUMBITS(2) [],
        CPL OFFSET(13) NUMBITS(1) [],
        /// Mute counter
        MUTECNT OFFSET(7) NUMBITS(6) [],
        MUTEVAL OFFSET(6) NUMBITS(1) [],
        MUTE OFFSET(5) NUMBITS(1) [],
        TRIS OFFSET(4) NUMBITS(1) [],
        /// FIFO flush, self clearing
        FFLUSH OFFSET(3) NUMBITS(1) [],
        FTH OFFSET(0) NUMBITS(3) [
            Empty = 0b000,
            Quarter = 0b001,
            Half = 0b010,
            ThreeQuarters = 0b011,
            Full = 0b100
        ]
    ],
    pub FRCR [
        /// Frame sync offset
        FSOFF OFFSET(18) NUMBITS(1) [],
        FSPOL OFFSET(17) NUMBITS(1) [],
        /// Frame sync is also the channel identifier
        FSDEF OFFSET(16) NUMBITS(1) [],
        /// Frame sync active length minus one
        FSALL OFFSET(8) NUMBITS(7) [],
        /// Frame length minus one
        FRL OFFSET(0) NUMBITS(8) []
    ],
    pub SLOTR [
        /// Enabled slots bitmap
        SLOTEN OFFSET(16) NUMBITS(16) [],
        /// Number of slots minus one
        NBSLOT OFFSET(8) NUMBITS(4) [],
        SLOTSZ OFFSET(6) NUMBITS(2) [
            DataSize = 0b00,
            Bits16 = 0b01,
            Bits32 = 0b10
        ],
        FBOFF OFFSET(0) NUMBITS(5) []
    ],
    pub SR [
        /// FIFO level, read only in `sr`
        FLVL OFFSET(16) NUMBITS(3) [],
        LFSDET OFFSET(6) NUMBITS(1) [],
        AFSDET OFFSET(5) NUMBITS(1) [],
        CNRDY OFFSET(4) NUMBITS(1) [],
        FREQ OFFSET(3) NUMBITS(1) [],
        WCKCFG OFFSET(2) NUMBITS(1) [],
        MUTEDET OFFSET(1) NUMBITS(1) [],
        /// Overrun or underrun
        OVRUDR OFFSET(0) NUMBITS(1) []
    ]
];

pub const SAI_BASE: StaticRef<SaiRegisters> =
    unsafe { StaticRef::new(memory_map::SAI_BASE as *const SaiRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(
            memory_map::SAI_BASE + core::mem::offset_of!(SaiRegisters, block_a),
            memory_map::SAI_BLOCK_A_BASE
        );
        assert_eq!(
            memory_map::SAI_BASE + core::mem::offset_of!(SaiRegisters, block_b),
            memory_map::SAI_BLOCK_B_BASE
        );
        assert_eq!(core::mem::size_of::<SaiBlock>(), 0x20);
        assert_eq!(core::mem::offset_of!(SaiBlock, dr), 0x1C);
        assert_eq!(CR1::DS::Bits16.value, 0x80);
    }
}
