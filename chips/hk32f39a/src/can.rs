// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! bxCAN register map. CAN1 owns the 28 filter banks shared with CAN2.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

pub const TX_MAILBOX_COUNT: usize = 3;
pub const RX_FIFO_COUNT: usize = 2;
pub const FILTER_BANK_COUNT: usize = 28;

register_structs! {
    pub CanRegisters {
        /// Master control register
        (0x000 => pub mcr: ReadWrite<u32, MCR::Register>),
        /// Master status register
        (0x004 => pub msr: ReadWrite<u32, MSR::Register>),
        /// Transmit status register
        (0x008 => pub tsr: ReadWrite<u32, TSR::Register>),
        /// Receive FIFO registers
        (0x00C => pub rfr: [ReadWrite<u32, RFR::Register>; RX_FIFO_COUNT]),
        (0x014 => pub ier: ReadWrite<u32, IER::Register>),
        /// Error status register
        (0x018 => pub esr: ReadWrite<u32, ESR::Register>),
        /// Bit timing register
        (0x01C => pub btr: ReadWrite<u32, BTR::Register>),
        (0x020 => _reserved0),
        (0x180 => pub tx_mailbox: [TxMailbox; TX_MAILBOX_COUNT]),
        (0x1B0 => pub rx_fifo: [RxMailbox; RX_FIFO_COUNT]),
        (0x1D0 => _reserved1),
        /// Filter master register
        (0x200 => pub fmr: ReadWrite<u32, FMR::Register>),
        /// Filter mode register, set for list mode
        (0x204 => pub fm1r: ReadWrite<u32>),
        (0x208 => _reserved2),
        /// Filter scale register, set for 32 bit
        (0x20C => pub fs1r: ReadWrite<u32>),
        (0x210 => _reserved3),
        /// Filter FIFO assignment register
        (0x214 => pub ffa1r: ReadWrite<u32>),
        (0x218 => _reserved4),
        /// Filter activation register
        (0x21C => pub fa1r: ReadWrite<u32>),
        (0x220 => _reserved5),
        (0x240 => pub filter: [FilterBank; FILTER_BANK_COUNT]),
        (0x320 => @END),
    },

    pub TxMailbox {
        (0x00 => pub tir: ReadWrite<u32, TIR::Register>),
        (0x04 => pub tdtr: ReadWrite<u32, TDTR::Register>),
        (0x08 => pub tdlr: ReadWrite<u32>),
        (0x0C => pub tdhr: ReadWrite<u32>),
        (0x10 => @END),
    },

    pub RxMailbox {
        (0x00 => pub rir: ReadWrite<u32, RIR::Register>),
        (0x04 => pub rdtr: ReadWrite<u32, RDTR::Register>),
        (0x08 => pub rdlr: ReadWrite<u32>),
        (0x0C => pub rdhr: ReadWrite<u32>),
        (0x10 => @END),
    },

    pub FilterBank {
        (0x00 => pub fr1: ReadWrite<u32>),
        (0x04 => pub fr2: ReadWrite<u32>),
        (0x08 => @END),
    }
}

register_bitfields![u32,
    pub MCR [
        /// Debug freeze
        DBF OFFSET(16) NUMBITS(1) [],
        RESET OFFSET(15) NUMBITS(1) [],
        /// Time triggered communication mode
        TTCM OFFSET(7) NUMBITS(1) [],
        /// Automatic bus-off management
        ABOM OFFSET(6) NUMBITS(1) [],
        /// Automatic wakeup mode
        AWUM OFFSET(5) NUMBITS(1) [],
        /// No automatic retransmission
        NART OFFSET(4) NUMBITS(1) [],
        /// Receive FIFO locked mode
        RFLM OFFSET(3) NUMBITS(1) [],
        /// Transmit FIFO priority
        TXFP OFFSET(2) NUMBITS(1) [],
        SLEEP OFFSET(1) NUMBITS(1) [],
        /// Initialization request
        INRQ OFFSET(0) NUMBITS(1) []
    ],
    pub MSR [
        RX OFFSET(11) NUMBITS(1) [],
        SAMP OFFSET(10) NUMBITS(1) [],
        RXM OFFSET(9) NUMBITS(1) [],
        TXM OFFSET(8) NUMBITS(1) [],
        SLAKI OFFSET(4) NUMBITS(1) [],
        WKUI OFFSET(3) NUMBITS(1) [],
        ERRI OFFSET(2) NUMBITS(1) [],
        /// Sleep acknowledge
        SLAK OFFSET(1) NUMBITS(1) [],
        /// Initialization acknowledge
        INAK OFFSET(0) NUMBITS(1) []
    ],
    pub TSR [
        LOW2 OFFSET(31) NUMBITS(1) [],
        LOW1 OFFSET(30) NUMBITS(1) [],
        LOW0 OFFSET(29) NUMBITS(1) [],
        /// Transmit mailbox empty
        TME2 OFFSET(28) NUMBITS(1) [],
        TME1 OFFSET(27) NUMBITS(1) [],
        TME0 OFFSET(26) NUMBITS(1) [],
        /// Next free mailbox
        CODE OFFSET(24) NUMBITS(2) [],
        ABRQ2 OFFSET(23) NUMBITS(1) [],
        TERR2 OFFSET(19) NUMBITS(1) [],
        ALST2 OFFSET(18) NUMBITS(1) [],
        TXOK2 OFFSET(17) NUMBITS(1) [],
        /// Request completed
        RQCP2 OFFSET(16) NUMBITS(1) [],
        ABRQ1 OFFSET(15) NUMBITS(1) [],
        TERR1 OFFSET(11) NUMBITS(1) [],
        ALST1 OFFSET(10) NUMBITS(1) [],
        TXOK1 OFFSET(9) NUMBITS(1) [],
        RQCP1 OFFSET(8) NUMBITS(1) [],
        ABRQ0 OFFSET(7) NUMBITS(1) [],
        TERR0 OFFSET(3) NUMBITS(1) [],
        ALST0 OFFSET(2) NUMBITS(1) [],
        TXOK0 OFFSET(1) NUMBITS(1) [],
        RQCP0 OFFSET(0) NUMBITS(1) []
    ],
    pub RFR [
        /// Release FIFO output mailbox
        RFOM OFFSET(5) NUMBITS(1) [],
        FOVR OFFSET(4) NUMBITS(1) [],
        FULL OFFSET(3) NUMBITS(1) [],
        /// Pending messages
        FMP OFFSET(0) NUMBITS(2) []
    ],
    pub IER [
        SLKIE OFFSET(17) NUMBITS(1) [],
        WKUIE OFFSET(16) NUMBITS(1) [],
        ERRIE OFFSET(15) NUMBITS(1) [],
        LECIE OFFSET(11) NUMBITS(1) [],
        BOFIE OFFSET(10) NUMBITS(1) [],
        EPVIE OFFSET(9) NUMBITS(1) [],
        EWGIE OFFSET(8) NUMBITS(1) [],
        FOVIE1 OFFSET(6) NUMBITS(1) [],
        FFIE1 OFFSET(5) NUMBITS(1) [],
        FMPIE1 OFFSET(4) NUMBITS(1) [],
        FOVIE0 OFFSET(3) NUMBITS(1) [],
        FFIE0 OFFSET(2) NUMBITS(1) [],
        FMPIE0 OFFSET(1) NUMBITS(1) [],
        TMEIE OFFSET(0) NUMBITS(1) []
    ],
    pub ESR [
        /// Receive error counter
        REC OFFSET(24) NUMBITS(8) [],
        /// Transmit error counter
        TEC OFFSET(16) NUMBITS(8) [],
        /// Last error code
        LEC OFFSET(4) NUMBITS(3) [
            NoError = 0,
            Stuff = 1,
            Form = 2,
            Acknowledgment = 3,
            BitRecessive = 4,
            BitDominant = 5,
            Crc = 6,
            SetBySoftware = 7
        ],
        BOFF OFFSET(2) NUMBITS(1) [],
        EPVF OFFSET(1) NUMBITS(1) [],
        EWGF OFFSET(0) NUMBITS(1) []
    ],
    pub BTR [
        /// Silent mode
        SILM OFFSET(31) NUMBITS(1) [],
        /// Loop back mode
        LBKM OFFSET(30) NUMBITS(1) [],
        /// Resynchronization jump width minus one
        SJW OFFSET(24) NUMBITS(2) [],
        TS2 OFFSET(20) NUMBITS(3) [],
        TS1 OFFSET(16) NUMBITS(4) [],
        /// Baud rate prescaler minus one
        BRP OFFSET(0) NUMBITS(10) []
    ],
    pub TIR [
        STID OFFSET(21) NUMBITS(11) [],
        EXID OFFSET(3) NUMBITS(18) [],
        /// Extended identifier
        IDE OFFSET(2) NUMBITS(1) [],
        /// Remote transmission request
        RTR OFFSET(1) NUMBITS(1) [],
        /// Transmit mailbox request
        TXRQ OFFSET(0) NUMBITS(1) []
    ],
    pub TDTR [
        TIME OFFSET(16) NUMBITS(16) [],
        /// Transmit global time
        TGT OFFSET(8) NUMBITS(1) [],
        DLC OFFSET(0) NUMBITS(4) []
    ],
    pub RIR [
        STID OFFSET(21) NUMBITS(11) [],
        EXID OFFSET(3) NUMBITS(18) [],
        IDE OFFSET(2) NUMBITS(1) [],
        RTR OFFSET(1) NUMBITS(1) []
    ],
    pub RDTR [
        TIME OFFSET(16) NUMBITS(16) [],
        /// Filter match index
        FMI OFFSET(8) NUMBITS(8) [],
        DLC OFFSET(0) NUMBITS(4) []
    ],
    pub FMR [
        /// First filter bank of CAN2
        CAN2SB OFFSET(8) NUMBITS(6) [],
        /// Filter init mode
        FINIT OFFSET(0) NUMBITS(1) []
    ]
];

pub const CAN1_BASE: StaticRef<CanRegisters> =
    unsafe { StaticRef::new(memory_map::CAN1_BASE as *const CanRegisters) };
pub const CAN2_BASE: StaticRef<CanRegisters> =
    unsafe { StaticRef::new(memory_map::CAN2_BASE as *const CanRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(CanRegisters, btr), 0x1C);
        assert_eq!(core::mem::offset_of!(CanRegisters, tx_mailbox), 0x180);
        assert_eq!(core::mem::offset_of!(CanRegisters, rx_fifo), 0x1B0);
        assert_eq!(core::mem::offset_of!(CanRegisters, fa1r), 0x21C);
        assert_eq!(core::mem::offset_of!(CanRegisters, filter), 0x240);
        assert_eq!(core::mem::size_of::<CanRegisters>(), 0x320);
        assert_eq!(TSR::TME0::SET.value, 0x0400_0000);
        assert_eq!(ESR::LEC::Crc.value, 0x60);
        assert_eq!(FMR::CAN2SB.val(14).value, 0x0E00);
    }
}
