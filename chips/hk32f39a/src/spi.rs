// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! SPI/I2S register map.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub SpiRegisters {
        (0x00 => pub cr1: ReadWrite<u32, CR1::Register>),
        (0x04 => pub cr2: ReadWrite<u32, CR2::Register>),
        (0x08 => pub sr: ReadWrite<u32, SR::Register>),
        (0x0C => pub dr: ReadWrite<u32>),
        /// CRC polynomial register
        (0x10 => pub crcpr: ReadWrite<u32>),
        (0x14 => pub rxcrcr: ReadWrite<u32>),
        (0x18 => pub txcrcr: ReadWrite<u32>),
        /// I2S configuration register
        (0x1C => pub i2scfgr: ReadWrite<u32, I2SCFGR::Register>),
        /// I2S prescaler register
        (0x20 => pub i2spr: ReadWrite<u32, I2SPR::Register>),
        (0x24 => @END),
    }
}

register_bitfields![u32,
    pub CR1 [
        /// Bidirectional data mode
        BIDIMODE OFFSET(15) NUMBITS(1) [],
        /// Output enable in bidirectional mode
        BIDIOE OFFSET(14) NUMBITS(1) [],
        CRCEN OFFSET(13) NUMBITS(1) [],
        CRCNEXT OFFSET(12) NUMBITS(1) [],
        /// Data frame format, set for 16 bit
        DFF OFFSET(11) NUMBITS(1) [],
        RXONLY OFFSET(10) NUMBITS(1) [],
        /// Software slave management
        SSM OFFSET(9) NUMBITS(1) [],
        /// Internal slave select
        SSI OFFSET(8) NUMBITS(1) [],
        LSBFIRST OFFSET(7) NUMBITS(1) [],
        SPE OFFSET(6) NUMBITS(1) [],
        /// Baud rate, PCLK / 2^(BR + 1)
        BR OFFSET(3) NUMBITS(3) [
            Div2 = 0b000,
            Div4 = 0b001,
            Div8 = 0b010,
            Div16 = 0b011,
            Div32 = 0b100,
            Div64 = 0b101,
            Div128 = 0b110,
            Div256 = 0b111
        ],
        MSTR OFFSET(2) NUMBITS(1) [],
        CPOL OFFSET(1) NUMBITS(1) [],
        CPHA OFFSET(0) NUMBITS(1) []
    ],
    pub CR2 [
        TXEIE OFFSET(7) NUMBITS(1) [],
        RXNEIE OFFSET(6) NUMBITS(1) [],
        ERRIE OFFSET(5) NUMBITS(1) [],
        /// SS output enable
        SSOE OFFSET(2) NUMBITS(1) [],
        TXDMAEN OFFSET(1) NUMBITS(1) [],
        RXDMAEN OFFSET(0) NUMBITS(1) []
    ],
    pub SR [
        BSY OFFSET(7) NUMBITS(1) [],
        OVR OFFSET(6) NUMBITS(1) [],
        /// Mode fault
        MODF OFFSET(5) NUMBITS(1) [],
        CRCERR OFFSET(4) NUMBITS(1) [],
        /// I2S underrun
        UDR OFFSET(3) NUMBITS(1) [],
        /// I2S channel side
        CHSIDE OFFSET(2) NUMBITS(1) [],
        TXE OFFSET(1) NUMBITS(1) [],
        RXNE OFFSET(0) NUMBITS(1) []
    ],
    pub I2SCFGR [
        /// I2S mode selection
        I2SMOD OFFSET(11) NUMBITS(1) [],
        I2SE OFFSET(10) NUMBITS(1) [],
        I2SCFG OFFSET(8) NUMBITS(2) [
            SlaveTransmit = 0b00,
            SlaveReceive = 0b01,
            MasterTransmit = 0b10,
            MasterReceive = 0b11
        ],
        PCMSYNC OFFSET(7) NUMBITS(1) [],
        I2SSTD OFFSET(4) NUMBITS(2) [
            Philips = 0b00,
            Msb = 0b01,
            Lsb = 0b10,
            Pcm = 0b11
        ],
        CKPOL OFFSET(3) NUMBITS(1) [],
        DATLEN OFFSET(1) NUMBITS(2) [
            Bits16 = 0b00,
            Bits24 = 0b01,
            Bits32 = 0b10
        ],
        /// Channel length, set for 32 bit
        CHLEN OFFSET(0) NUMBITS(1) []
    ],
    pub I2SPR [
        /// Master clock output enable
        MCKOE OFFSET(9) NUMBITS(1) [],
        ODD OFFSET(8) NUMBITS(1) [],
        I2SDIV OFFSET(0) NUMBITS(8) []
    ]
];

pub const SPI1_BASE: StaticRef<SpiRegisters> =
    unsafe { StaticRef::new(memory_map::SPI1_BASE as *const SpiRegisters) };
pub const SPI2_BASE: StaticRef<SpiRegisters> =
    unsafe { StaticRef::new(memory_map::SPI2_BASE as *const SpiRegisters) };
pub const SPI3_BASE: StaticRef<SpiRegisters> =
    unsafe { StaticRef::new(memory_map::SPI3_BASE as *const SpiRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(SpiRegisters, dr), 0x0C);
        assert_eq!(core::mem::offset_of!(SpiRegisters, i2scfgr), 0x1C);
        assert_eq!(core::mem::offset_of!(SpiRegisters, i2spr), 0x20);
        assert_eq!(CR1::BR::Div256.value, 0x38);
        assert_eq!(CR1::SPE::SET.value, 0x40);
        assert_eq!(I2SCFGR::I2SCFG::MasterTransmit.value, 0x200);
        assert_eq!(SR::BSY::SET.value, 0x80);
    }
}
