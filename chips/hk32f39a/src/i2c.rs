// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! I2C register map.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub I2cRegisters {
        (0x00 => pub cr1: ReadWrite<u32, CR1::Register>),
        (0x04 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// Own address register 1
        (0x08 => pub oar1: ReadWrite<u32, OAR1::Register>),
        /// Own address register 2
        (0x0C => pub oar2: ReadWrite<u32, OAR2::Register>),
        (0x10 => pub dr: ReadWrite<u32, DR::Register>),
        (0x14 => pub sr1: ReadWrite<u32, SR1::Register>),
        (0x18 => pub sr2: ReadWrite<u32, SR2::Register>),
        /// Clock control register
        (0x1C => pub ccr: ReadWrite<u32, CCR::Register>),
        (0x20 => pub trise: ReadWrite<u32, TRISE::Register>),
        (0x24 => @END),
    }
}

register_bitfields![u32,
    pub CR1 [
        SWRST OFFSET(15) NUMBITS(1) [],
        /// SMBus alert
        ALERT OFFSET(13) NUMBITS(1) [],
        /// Packet error checking
        PEC OFFSET(12) NUMBITS(1) [],
        /// ACK/PEC position
        POS OFFSET(11) NUMBITS(1) [],
        ACK OFFSET(10) NUMBITS(1) [],
        STOP OFFSET(9) NUMBITS(1) [],
        START OFFSET(8) NUMBITS(1) [],
        NOSTRETCH OFFSET(7) NUMBITS(1) [],
        /// General call enable
        ENGC OFFSET(6) NUMBITS(1) [],
        ENPEC OFFSET(5) NUMBITS(1) [],
        ENARP OFFSET(4) NUMBITS(1) [],
        SMBTYPE OFFSET(3) NUMBITS(1) [],
        SMBUS OFFSET(1) NUMBITS(1) [],
        PE OFFSET(0) NUMBITS(1) []
    ],
    pub CR2 [
        /// DMA last transfer
        LAST OFFSET(12) NUMBITS(1) [],
        DMAEN OFFSET(11) NUMBITS(1) [],
        ITBUFEN OFFSET(10) NUMBITS(1) [],
        ITEVTEN OFFSET(9) NUMBITS(1) [],
        ITERREN OFFSET(8) NUMBITS(1) [],
        /// Peripheral clock frequency in MHz
        FREQ OFFSET(0) NUMBITS(6) []
    ],
    pub OAR1 [
        /// Set for 10-bit addressing
        ADDMODE OFFSET(15) NUMBITS(1) [],
        ADD OFFSET(0) NUMBITS(10) []
    ],
    pub OAR2 [
        ADD2 OFFSET(1) NUMBITS(7) [],
        ENDUAL OFFSET(0) NUMBITS(1) []
    ],
    pub DR [
        DR OFFSET(0) NUMBITS(8) []
    ],
    pub SR1 [
        SMBALERT OFFSET(15) NUMBITS(1) [],
        TIMEOUT OFFSET(14) NUMBITS(1) [],
        PECERR OFFSET(12) NUMBITS(1) [],
        OVR OFFSET(11) NUMBITS(1) [],
        /// Acknowledge failure
        AF OFFSET(10) NUMBITS(1) [],
        /// Arbitration lost
        ARLO OFFSET(9) NUMBITS(1) [],
        BERR OFFSET(8) NUMBITS(1) [],
        TXE OFFSET(7) NUMBITS(1) [],
        RXNE OFFSET(6) NUMBITS(1) [],
        STOPF OFFSET(4) NUMBITS(1) [],
        /// 10-bit header sent
        ADD10 OFFSET(3) NUMBITS(1) [],
        /// Byte transfer finished
        BTF OFFSET(2) NUMBITS(1) [],
        ADDR OFFSET(1) NUMBITS(1) [],
        /// Start bit generated
        SB OFFSET(0) NUMBITS(1) []
    ],
    pub SR2 [
        PEC OFFSET(8) NUMBITS(8) [],
        DUALF OFFSET(7) NUMBITS(1) [],
        SMBHOST OFFSET(6) NUMBITS(1) [],
        SMBDEFAULT OFFSET(5) NUMBITS(1) [],
        GENCALL OFFSET(4) NUMBITS(1) [],
        /// Transmitter/receiver
        TRA OFFSET(2) NUMBITS(1) [],
        BUSY OFFSET(1) NUMBITS(1) [],
        /// Master/slave
        MSL OFFSET(0) NUMBITS(1) []
    ],
    pub CCR [
        /// Fast mode
        FS OFFSET(15) NUMBITS(1) [],
        /// Fast mode duty cycle, set for 16/9
        DUTY OFFSET(14) NUMBITS(1) [],
        CCR OFFSET(0) NUMBITS(12) []
    ],
    pub TRISE [
        TRISE OFFSET(0) NUMBITS(6) []
    ]
];

pub const I2C1_BASE: StaticRef<I2cRegisters> =
    unsafe { StaticRef::new(memory_map::I2C1_BASE as *const I2cRegisters) };
pub const I2C2_BASE: StaticRef<I2cRegisters> =
    unsafe { StaticRef::new(memory_map::I2C2_BASE as *const I2cRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(I2cRegisters, dr), 0x10);
        assert_eq!(core::mem::offset_of!(I2cRegisters, ccr), 0x1C);
        assert_eq!(core::mem::offset_of!(I2cRegisters, trise), 0x20);
        assert_eq!(CR1::SWRST::SET.value, 0x8000);
        assert_eq!(SR1::AF::SET.value, 0x400);
        assert_eq!(CCR::FS::SET.value + CCR::DUTY::SET.value, 0xC000);
    }
}
