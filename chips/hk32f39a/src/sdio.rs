// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! SD/SDIO/MMC host interface register map.

use crate::memory_map;
use hk32_utilities::registers::{
    register_bitfields, register_structs, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::StaticRef;

register_structs! {
    pub SdioRegisters {
        (0x00 => pub power: ReadWrite<u32, POWER::Register>),
        (0x04 => pub clkcr: ReadWrite<u32, CLKCR::Register>),
        /// Command argument
        (0x08 => pub arg: ReadWrite<u32>),
        (0x0C => pub cmd: ReadWrite<u32, CMD::Register>),
        /// Index of the last response received
        (0x10 => pub respcmd: ReadOnly<u32>),
        (0x14 => pub resp: [ReadOnly<u32>; 4]),
        /// Data timeout in bus clock periods
        (0x24 => pub dtimer: ReadWrite<u32>),
        /// Data length in bytes, 25 bits
        (0x28 => pub dlen: ReadWrite<u32>),
        (0x2C => pub dctrl: ReadWrite<u32, DCTRL::Register>),
        (0x30 => pub dcount: ReadOnly<u32>),
        (0x34 => pub sta: ReadOnly<u32, STA::Register>),
        /// Interrupt clear register, write ones
        (0x38 => pub icr: WriteOnly<u32, STA::Register>),
        (0x3C => pub mask: ReadWrite<u32, STA::Register>),
        (0x40 => _reserved0),
        /// Words left to transfer through the FIFO
        (0x48 => pub fifocnt: ReadOnly<u32>),
        (0x4C => _reserved1),
        (0x80 => pub fifo: [ReadWrite<u32>; 32]),
        (0x100 => @END),
    }
}

register_bitfields![u32,
    pub POWER [
        PWRCTRL OFFSET(0) NUMBITS(2) [
            Off = 0b00,
            On = 0b11
        ]
    ],
    pub CLKCR [
        /// Hardware flow control
        HWFC_EN OFFSET(14) NUMBITS(1) [],
        /// Set to drive data on the falling edge
        NEGEDGE OFFSET(13) NUMBITS(1) [],
        WIDBUS OFFSET(11) NUMBITS(2) [
            Bits1 = 0b00,
            Bits4 = 0b01,
            Bits8 = 0b10
        ],
        BYPASS OFFSET(10) NUMBITS(1) [],
        PWRSAV OFFSET(9) NUMBITS(1) [],
        CLKEN OFFSET(8) NUMBITS(1) [],
        /// SDIO_CK = SDIOCLK / (CLKDIV + 2)
        CLKDIV OFFSET(0) NUMBITS(8) []
    ],
    pub CMD [
        /// CE-ATA command
        ATACMD OFFSET(14) NUMBITS(1) [],
        NIEN OFFSET(13) NUMBITS(1) [],
        ENCMDCOMPL OFFSET(12) NUMBITS(1) [],
        SDIOSUSPEND OFFSET(11) NUMBITS(1) [],
        /// Command path state machine enable
        CPSMEN OFFSET(10) NUMBITS(1) [],
        WAITPEND OFFSET(9) NUMBITS(1) [],
        WAITINT OFFSET(8) NUMBITS(1) [],
        WAITRESP OFFSET(6) NUMBITS(2) [
            NoResponse = 0b00,
            Short = 0b01,
            Long = 0b11
        ],
        CMDINDEX OFFSET(0) NUMBITS(6) []
    ],
    pub DCTRL [
        SDIOEN OFFSET(11) NUMBITS(1) [],
        RWMOD OFFSET(10) NUMBITS(1) [],
        RWSTOP OFFSET(9) NUMBITS(1) [],
        RWSTART OFFSET(8) NUMBITS(1) [],
        /// Block size is 2^DBLOCKSIZE bytes
        DBLOCKSIZE OFFSET(4) NUMBITS(4) [],
        DMAEN OFFSET(3) NUMBITS(1) [],
        /// Set for a stream transfer
        DTMODE OFFSET(2) NUMBITS(1) [],
        /// Set for card to controller
        DTDIR OFFSET(1) NUMBITS(1) [],
        DTEN OFFSET(0) NUMBITS(1) []
    ],
    pub STA [
        CEATAEND OFFSET(23) NUMBITS(1) [],
        SDIOIT OFFSET(22) NUMBITS(1) [],
        RXDAVL OFFSET(21) NUMBITS(1) [],
        TXDAVL OFFSET(20) NUMBITS(1) [],
        RXFIFOE OFFSET(19) NUMBITS(1) [],
        TXFIFOE OFFSET(18) NUMBITS(1) [],
        RXFIFOF OFFSET(17) NUMBITS(1) [],
        TXFIFOF OFFSET(16) NUMBITS(1) [],
        RXFIFOHF OFFSET(15) NUMBITS(1) [],
        TXFIFOHE OFFSET(14) NUMBITS(1) [],
        RXACT OFFSET(13) NUMBITS(1) [],
        TXACT OFFSET(12) NUMBITS(1) [],
        CMDACT OFFSET(11) NUMBITS(1) [],
        DBCKEND OFFSET(10) NUMBITS(1) [],
        STBITERR OFFSET(9) NUMBITS(1) [],
        DATAEND OFFSET(8) NUMBITS(1) [],
        CMDSENT OFFSET(7) NUMBITS(1) [],
        CMDREND OFFSET(6) NUMBITS(1) [],
        RXOVERR OFFSET(5) NUMBITS(1) [],
        TXUNDERR OFFSET(4) NUMBITS(1) [],
        DTIMEOUT OFFSET(3) NUMBITS(1) [],
        CTIMEOUT OFFSET(2) NUMBITS(1) [],
        DCRCFAIL OFFSET(1) NUMBITS(1) [],
        CCRCFAIL OFFSET(0) NUMBITS(1) []
    ]
];

pub const SDIO_BASE: StaticRef<SdioRegisters> =
    unsafe { StaticRef::new(memory_map::SDIO_BASE as *const SdioRegisters) };

/// Static flags cleared through `icr`.
pub const STATIC_FLAGS: u32 = 0x0000_05FF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(SdioRegisters, resp), 0x14);
        assert_eq!(core::mem::offset_of!(SdioRegisters, sta), 0x34);
        assert_eq!(core::mem::offset_of!(SdioRegisters, fifocnt), 0x48);
        assert_eq!(core::mem::offset_of!(SdioRegisters, fifo), 0x80);
        assert_eq!(CMD::WAITRESP::Long.value, 0xC0);
        let statics = STA::CCRCFAIL::SET
            + STA::DCRCFAIL::SET
            + STA::CTIMEOUT::SET
            + STA::DTIMEOUT::SET
            + STA::TXUNDERR::SET
            + STA::RXOVERR::SET
            + STA::CMDREND::SET
            + STA::CMDSENT::SET
            + STA::DATAEND::SET
            + STA::DBCKEND::SET;
        assert_eq!(statics.value, STATIC_FLAGS);
    }
}
