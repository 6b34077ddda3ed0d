// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! DMA controller register map. DMA1 has seven channels, DMA2 five.
//!
//! `ISR` and `IFCR` hold four flags per channel, channel `n` (counting
//! from 1) at bits `4 * (n - 1)` to `4 * (n - 1) + 3`.

use crate::memory_map;
use hk32_utilities::registers::{
    register_bitfields, register_structs, Field, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::StaticRef;

pub const DMA1_CHANNELS: usize = 7;
pub const DMA2_CHANNELS: usize = 5;

register_structs! {
    pub DmaRegisters {
        /// Interrupt status register
        (0x00 => pub isr: ReadOnly<u32, FLAGS::Register>),
        /// Interrupt flag clear register
        (0x04 => pub ifcr: WriteOnly<u32, FLAGS::Register>),
        (0x08 => pub channel: [DmaChannel; DMA1_CHANNELS]),
        (0x94 => @END),
    },

    pub DmaChannel {
        /// Channel configuration register
        (0x00 => pub ccr: ReadWrite<u32, CCR::Register>),
        /// Number of data to transfer
        (0x04 => pub cndtr: ReadWrite<u32, CNDTR::Register>),
        /// Peripheral address
        (0x08 => pub cpar: ReadWrite<u32>),
        /// Memory address
        (0x0C => pub cmar: ReadWrite<u32>),
        (0x10 => _reserved0),
        (0x14 => @END),
    }
}

register_bitfields![u32,
    // Channel 1 shown, see `channel_flags`.
    pub FLAGS [
        TEIF1 OFFSET(3) NUMBITS(1) [],
        HTIF1 OFFSET(2) NUMBITS(1) [],
        TCIF1 OFFSET(1) NUMBITS(1) [],
        GIF1 OFFSET(0) NUMBITS(1) []
    ],
    pub CCR [
        /// Memory to memory mode
        MEM2MEM OFFSET(14) NUMBITS(1) [],
        /// Priority level
        PL OFFSET(12) NUMBITS(2) [
            Low = 0b00,
            Medium = 0b01,
            High = 0b10,
            VeryHigh = 0b11
        ],
        MSIZE OFFSET(10) NUMBITS(2) [
            Bits8 = 0b00,
            Bits16 = 0b01,
            Bits32 = 0b10
        ],
        PSIZE OFFSET(8) NUMBITS(2) [
            Bits8 = 0b00,
            Bits16 = 0b01,
            Bits32 = 0b10
        ],
        MINC OFFSET(7) NUMBITS(1) [],
        PINC OFFSET(6) NUMBITS(1) [],
        CIRC OFFSET(5) NUMBITS(1) [],
        /// Set to read from memory
        DIR OFFSET(4) NUMBITS(1) [],
        TEIE OFFSET(3) NUMBITS(1) [],
        HTIE OFFSET(2) NUMBITS(1) [],
        TCIE OFFSET(1) NUMBITS(1) [],
        EN OFFSET(0) NUMBITS(1) []
    ],
    pub CNDTR [
        NDT OFFSET(0) NUMBITS(16) []
    ]
];

/// The four flags (`GIF`, `TCIF`, `HTIF`, `TEIF`) of a channel, numbered
/// from 1.
pub fn channel_flags(channel: usize) -> Field<u32, FLAGS::Register> {
    Field::<u32, FLAGS::Register>::new(0xF, 4 * (channel.saturating_sub(1) % DMA1_CHANNELS))
}

pub const DMA1_BASE: StaticRef<DmaRegisters> =
    unsafe { StaticRef::new(memory_map::DMA1_BASE as *const DmaRegisters) };
/// Only the first five channels exist on DMA2.
pub const DMA2_BASE: StaticRef<DmaRegisters> =
    unsafe { StaticRef::new(memory_map::DMA2_BASE as *const DmaRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(DmaRegisters, channel), 0x08);
        assert_eq!(core::mem::size_of::<DmaChannel>(), 0x14);
        assert_eq!(core::mem::size_of::<DmaRegisters>(), 0x94);
        assert_eq!(CCR::PL::VeryHigh.value, 0x3000);
        assert_eq!(CCR::MSIZE::Bits32.value, 0x800);
    }

    #[test]
    fn flag_groups() {
        assert_eq!(channel_flags(1).val(0xF).value, 0x0000_000F);
        assert_eq!(channel_flags(7).val(0x2).value, 0x0200_0000);
    }

    #[test]
    fn transfer_complete_of_channel_three() {
        use hk32_utilities::registers::interfaces::Readable;
        use hk32_utilities::registers::InMemoryRegister;

        let isr: InMemoryRegister<u32, FLAGS::Register> = InMemoryRegister::new(0x0000_0200);
        // TCIF sits one bit above GIF in every group.
        assert_eq!(isr.read(channel_flags(3)) & 0b0010, 0b0010);
        assert_eq!(isr.read(channel_flags(2)), 0);
    }
}
