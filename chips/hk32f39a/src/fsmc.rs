// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Flexible static memory controller.
//!
//! Bank 1 drives four NOR/SRAM/PSRAM chip selects, banks 2 and 3 drive NAND
//! flash with hardware ECC and bank 4 a PC card.

use crate::config::CONFIG;
use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{debug, ErrorCode, StaticRef};

/// Control and timing register pair of one NOR/SRAM chip select.
#[repr(C)]
pub struct NorSramRegion {
    pub bcr: ReadWrite<u32, BCR::Register>,
    pub btr: ReadWrite<u32, BTR::Register>,
}

/// Extended mode write timing of one chip select.
#[repr(C)]
pub struct WriteTimingRegion {
    pub bwtr: ReadWrite<u32, BWTR::Register>,
    _reserved: u32,
}

#[repr(C)]
pub struct NandBankRegisters {
    pub pcr: ReadWrite<u32, PCR::Register>,
    pub sr: ReadWrite<u32, SR::Register>,
    /// Common memory space timing
    pub pmem: ReadWrite<u32, SPACE::Register>,
    /// Attribute memory space timing
    pub patt: ReadWrite<u32, SPACE::Register>,
    _reserved0: u32,
    pub eccr: ReadOnly<u32>,
    _reserved1: [u32; 2],
}

register_structs! {
    pub FsmcRegisters {
        /// BCR1/BTR1 to BCR4/BTR4
        (0x000 => pub norsram: [NorSramRegion; 4]),
        (0x020 => _reserved0),
        /// NAND banks 2 and 3
        (0x060 => pub nand: [NandBankRegisters; 2]),
        /// PC card control register
        (0x0A0 => pub pcr4: ReadWrite<u32, PCR::Register>),
        (0x0A4 => pub sr4: ReadWrite<u32, SR::Register>),
        (0x0A8 => pub pmem4: ReadWrite<u32, SPACE::Register>),
        (0x0AC => pub patt4: ReadWrite<u32, SPACE::Register>),
        /// I/O space timing
        (0x0B0 => pub pio4: ReadWrite<u32, SPACE::Register>),
        (0x0B4 => _reserved1),
        /// BWTR1 to BWTR4
        (0x104 => pub bwtr: [WriteTimingRegion; 4]),
        (0x124 => @END),
    }
}

register_bitfields![u32,
    pub BCR [
        /// Write burst enable
        CBURSTRW OFFSET(19) NUMBITS(1) [],
        /// Wait signal during asynchronous transfers
        ASYNCWAIT OFFSET(15) NUMBITS(1) [],
        /// Extended mode enable
        EXTMOD OFFSET(14) NUMBITS(1) [],
        WAITEN OFFSET(13) NUMBITS(1) [],
        WREN OFFSET(12) NUMBITS(1) [],
        /// Wait asserted during the wait state instead of one cycle before
        WAITCFG OFFSET(11) NUMBITS(1) [],
        /// Wrapped burst support
        WRAPMOD OFFSET(10) NUMBITS(1) [],
        WAITPOL OFFSET(9) NUMBITS(1) [],
        BURSTEN OFFSET(8) NUMBITS(1) [],
        /// Flash access enable
        FACCEN OFFSET(6) NUMBITS(1) [],
        MWID OFFSET(4) NUMBITS(2) [
            Bits8 = 0b00,
            Bits16 = 0b01
        ],
        MTYP OFFSET(2) NUMBITS(2) [
            Sram = 0b00,
            Psram = 0b01,
            Nor = 0b10
        ],
        /// Address/data multiplexing
        MUXEN OFFSET(1) NUMBITS(1) [],
        /// Memory bank enable
        MBKEN OFFSET(0) NUMBITS(1) []
    ],
    pub BTR [
        ACCMOD OFFSET(28) NUMBITS(2) [
            A = 0b00,
            B = 0b01,
            C = 0b10,
            D = 0b11
        ],
        /// Data latency minus two, synchronous only
        DATLAT OFFSET(24) NUMBITS(4) [],
        /// FSMC_CLK divider minus one
        CLKDIV OFFSET(20) NUMBITS(4) [],
        BUSTURN OFFSET(16) NUMBITS(4) [],
        DATAST OFFSET(8) NUMBITS(8) [],
        ADDHLD OFFSET(4) NUMBITS(4) [],
        ADDSET OFFSET(0) NUMBITS(4) []
    ],
    pub BWTR [
        ACCMOD OFFSET(28) NUMBITS(2) [],
        DATLAT OFFSET(24) NUMBITS(4) [],
        CLKDIV OFFSET(20) NUMBITS(4) [],
        BUSTURN OFFSET(16) NUMBITS(4) [],
        DATAST OFFSET(8) NUMBITS(8) [],
        ADDHLD OFFSET(4) NUMBITS(4) [],
        ADDSET OFFSET(0) NUMBITS(4) []
    ],
    pub PCR [
        /// ECC page size
        ECCPS OFFSET(17) NUMBITS(3) [
            Bytes256 = 0b000,
            Bytes512 = 0b001,
            Bytes1024 = 0b010,
            Bytes2048 = 0b011,
            Bytes4096 = 0b100,
            Bytes8192 = 0b101
        ],
        /// ALE to RE delay
        TAR OFFSET(13) NUMBITS(4) [],
        /// CLE to RE delay
        TCLR OFFSET(9) NUMBITS(4) [],
        ECCEN OFFSET(6) NUMBITS(1) [],
        PWID OFFSET(4) NUMBITS(2) [
            Bits8 = 0b00,
            Bits16 = 0b01
        ],
        /// Memory type, set for NAND
        PTYP OFFSET(3) NUMBITS(1) [],
        PBKEN OFFSET(2) NUMBITS(1) [],
        PWAITEN OFFSET(1) NUMBITS(1) []
    ],
    pub SR [
        /// FIFO empty
        FEMPT OFFSET(6) NUMBITS(1) [],
        IFEN OFFSET(5) NUMBITS(1) [],
        ILEN OFFSET(4) NUMBITS(1) [],
        IREN OFFSET(3) NUMBITS(1) [],
        IFS OFFSET(2) NUMBITS(1) [],
        ILS OFFSET(1) NUMBITS(1) [],
        IRS OFFSET(0) NUMBITS(1) []
    ],
    pub SPACE [
        HIZ OFFSET(24) NUMBITS(8) [],
        HOLD OFFSET(16) NUMBITS(8) [],
        WAIT OFFSET(8) NUMBITS(8) [],
        SET OFFSET(0) NUMBITS(8) []
    ]
];

pub const FSMC_BASE: StaticRef<FsmcRegisters> =
    unsafe { StaticRef::new(memory_map::FSMC_R_BASE as *const FsmcRegisters) };

const BCR1_RESET: u32 = 0x0000_30DB;
const BCR_RESET: u32 = 0x0000_30D2;
const BTR_RESET: u32 = 0x0FFF_FFFF;
const PCR_RESET: u32 = 0x0000_0018;
const SR_RESET: u32 = 0x0000_0040;
const SPACE_RESET: u32 = 0xFCFC_FCFC;

/// NOR/SRAM chip select of bank 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NorSramBank {
    Bank1 = 0,
    Bank2 = 1,
    Bank3 = 2,
    Bank4 = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NandBank {
    Bank2 = 0,
    Bank3 = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryType {
    Sram,
    Psram,
    Nor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusWidth {
    Bits8,
    Bits16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    A,
    B,
    C,
    D,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EccPageSize {
    Bytes256,
    Bytes512,
    Bytes1024,
    Bytes2048,
    Bytes4096,
    Bytes8192,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NorSramConfig {
    pub memory_type: MemoryType,
    pub data_width: BusWidth,
    pub address_data_mux: bool,
    pub burst: bool,
    pub wait_polarity_high: bool,
    pub wrap: bool,
    pub wait_during_wait_state: bool,
    pub write_enable: bool,
    pub wait_signal: bool,
    /// Use `BWTR` for writes
    pub extended_mode: bool,
    pub async_wait: bool,
    pub write_burst: bool,
}

/// Phase durations in HCLK cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// 0 to 15
    pub address_setup: u8,
    /// 1 to 15
    pub address_hold: u8,
    /// 1 to 255
    pub data_setup: u8,
    /// 0 to 15
    pub bus_turnaround: u8,
    /// 2 to 16
    pub clock_division: u8,
    /// 2 to 17
    pub data_latency: u8,
    pub access_mode: AccessMode,
}

impl Timing {
    fn validate(&self) -> Result<(), ErrorCode> {
        if self.address_setup > 15
            || !(1..=15).contains(&self.address_hold)
            || self.data_setup == 0
            || self.bus_turnaround > 15
            || !(2..=16).contains(&self.clock_division)
            || !(2..=17).contains(&self.data_latency)
        {
            return Err(ErrorCode::INVAL);
        }
        Ok(())
    }

    fn access_mode_bits(&self) -> u32 {
        match self.access_mode {
            AccessMode::A => 0b00,
            AccessMode::B => 0b01,
            AccessMode::C => 0b10,
            AccessMode::D => 0b11,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NandConfig {
    pub wait_feature: bool,
    pub data_width: BusWidth,
    pub ecc: bool,
    pub ecc_page_size: EccPageSize,
    /// CLE to RE delay, 0 to 15
    pub tclr: u8,
    /// ALE to RE delay, 0 to 15
    pub tar: u8,
}

/// Common, attribute or I/O space timing, in HCLK cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpaceTiming {
    pub setup: u8,
    pub wait: u8,
    pub hold: u8,
    pub hiz: u8,
}

impl SpaceTiming {
    fn value(&self) -> u32 {
        u32::from(self.setup)
            | u32::from(self.wait) << 8
            | u32::from(self.hold) << 16
            | u32::from(self.hiz) << 24
    }
}

pub struct Fsmc<'a> {
    registers: StaticRef<FsmcRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Fsmc<'a> {
    pub const fn new(rcc: &'a Rcc) -> Fsmc<'a> {
        Fsmc {
            registers: FSMC_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB(HCLK::FSMC), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<FsmcRegisters>, rcc: &'a Rcc) -> Fsmc<'a> {
        Fsmc {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB(HCLK::FSMC), rcc),
        }
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    /// Configure the control register of a chip select. The bank is left
    /// disabled.
    pub fn init_nor_sram(&self, bank: NorSramBank, config: &NorSramConfig) {
        let region = &self.registers.norsram[bank as usize];
        let mtyp = match config.memory_type {
            MemoryType::Sram => BCR::MTYP::Sram,
            MemoryType::Psram => BCR::MTYP::Psram,
            MemoryType::Nor => BCR::MTYP::Nor,
        };
        let mwid = match config.data_width {
            BusWidth::Bits8 => BCR::MWID::Bits8,
            BusWidth::Bits16 => BCR::MWID::Bits16,
        };
        region.bcr.modify(BCR::MBKEN::CLEAR);
        region.bcr.modify(
            mtyp + mwid
                + BCR::FACCEN.val((config.memory_type == MemoryType::Nor) as u32)
                + BCR::MUXEN.val(config.address_data_mux as u32)
                + BCR::BURSTEN.val(config.burst as u32)
                + BCR::WAITPOL.val(config.wait_polarity_high as u32)
                + BCR::WRAPMOD.val(config.wrap as u32)
                + BCR::WAITCFG.val(config.wait_during_wait_state as u32)
                + BCR::WREN.val(config.write_enable as u32)
                + BCR::WAITEN.val(config.wait_signal as u32)
                + BCR::EXTMOD.val(config.extended_mode as u32)
                + BCR::ASYNCWAIT.val(config.async_wait as u32)
                + BCR::CBURSTRW.val(config.write_burst as u32),
        );
    }

    pub fn set_timing(&self, bank: NorSramBank, timing: &Timing) -> Result<(), ErrorCode> {
        timing.validate()?;
        self.registers.norsram[bank as usize].btr.write(
            BTR::ADDSET.val(timing.address_setup.into())
                + BTR::ADDHLD.val(timing.address_hold.into())
                + BTR::DATAST.val(timing.data_setup.into())
                + BTR::BUSTURN.val(timing.bus_turnaround.into())
                + BTR::CLKDIV.val(u32::from(timing.clock_division) - 1)
                + BTR::DATLAT.val(u32::from(timing.data_latency) - 2)
                + BTR::ACCMOD.val(timing.access_mode_bits()),
        );
        Ok(())
    }

    /// Separate write timing, only honoured with `extended_mode`. `None`
    /// restores the reset value.
    pub fn set_write_timing(
        &self,
        bank: NorSramBank,
        timing: Option<&Timing>,
    ) -> Result<(), ErrorCode> {
        let bwtr = &self.registers.bwtr[bank as usize].bwtr;
        match timing {
            Some(timing) => {
                timing.validate()?;
                bwtr.write(
                    BWTR::ADDSET.val(timing.address_setup.into())
                        + BWTR::ADDHLD.val(timing.address_hold.into())
                        + BWTR::DATAST.val(timing.data_setup.into())
                        + BWTR::BUSTURN.val(timing.bus_turnaround.into())
                        + BWTR::ACCMOD.val(timing.access_mode_bits()),
                );
            }
            None => bwtr.set(BTR_RESET),
        }
        Ok(())
    }

    pub fn enable_nor_sram(&self, bank: NorSramBank) {
        self.registers.norsram[bank as usize]
            .bcr
            .modify(BCR::MBKEN::SET);
        debug!("fsmc: NOR/SRAM bank {} enabled", bank as usize + 1);
    }

    pub fn disable_nor_sram(&self, bank: NorSramBank) {
        self.registers.norsram[bank as usize]
            .bcr
            .modify(BCR::MBKEN::CLEAR);
    }

    pub fn set_write_enable(&self, bank: NorSramBank, enable: bool) {
        self.registers.norsram[bank as usize]
            .bcr
            .modify(BCR::WREN.val(enable as u32));
    }

    /// Restore the reset values of a chip select.
    pub fn deinit_nor_sram(&self, bank: NorSramBank) {
        let region = &self.registers.norsram[bank as usize];
        region.bcr.modify(BCR::MBKEN::CLEAR);
        region.bcr.set(match bank {
            NorSramBank::Bank1 => BCR1_RESET,
            _ => BCR_RESET,
        });
        region.btr.set(BTR_RESET);
        self.registers.bwtr[bank as usize].bwtr.set(BTR_RESET);
    }

    pub fn init_nand(&self, bank: NandBank, config: &NandConfig) -> Result<(), ErrorCode> {
        if config.tclr > 15 || config.tar > 15 {
            return Err(ErrorCode::INVAL);
        }
        let eccps = match config.ecc_page_size {
            EccPageSize::Bytes256 => PCR::ECCPS::Bytes256,
            EccPageSize::Bytes512 => PCR::ECCPS::Bytes512,
            EccPageSize::Bytes1024 => PCR::ECCPS::Bytes1024,
            EccPageSize::Bytes2048 => PCR::ECCPS::Bytes2048,
            EccPageSize::Bytes4096 => PCR::ECCPS::Bytes4096,
            EccPageSize::Bytes8192 => PCR::ECCPS::Bytes8192,
        };
        let pwid = match config.data_width {
            BusWidth::Bits8 => PCR::PWID::Bits8,
            BusWidth::Bits16 => PCR::PWID::Bits16,
        };
        self.registers.nand[bank as usize].pcr.modify(
            PCR::PTYP::SET
                + PCR::PBKEN::CLEAR
                + PCR::PWAITEN.val(config.wait_feature as u32)
                + pwid
                + PCR::ECCEN.val(config.ecc as u32)
                + eccps
                + PCR::TCLR.val(config.tclr.into())
                + PCR::TAR.val(config.tar.into()),
        );
        Ok(())
    }

    pub fn set_nand_common_timing(&self, bank: NandBank, timing: &SpaceTiming) {
        self.registers.nand[bank as usize].pmem.set(timing.value());
    }

    pub fn set_nand_attribute_timing(&self, bank: NandBank, timing: &SpaceTiming) {
        self.registers.nand[bank as usize].patt.set(timing.value());
    }

    pub fn enable_nand(&self, bank: NandBank) {
        self.registers.nand[bank as usize]
            .pcr
            .modify(PCR::PBKEN::SET);
    }

    pub fn disable_nand(&self, bank: NandBank) {
        self.registers.nand[bank as usize]
            .pcr
            .modify(PCR::PBKEN::CLEAR);
    }

    pub fn deinit_nand(&self, bank: NandBank) {
        let regs = &self.registers.nand[bank as usize];
        regs.pcr.modify(PCR::PBKEN::CLEAR);
        regs.pcr.set(PCR_RESET);
        regs.sr.set(SR_RESET);
        regs.pmem.set(SPACE_RESET);
        regs.patt.set(SPACE_RESET);
    }

    pub fn set_ecc(&self, bank: NandBank, enable: bool) {
        self.registers.nand[bank as usize]
            .pcr
            .modify(PCR::ECCEN.val(enable as u32));
    }

    /// ECC of the page written or read since ECC was enabled, available
    /// once the FIFO has drained.
    pub fn ecc(&self, bank: NandBank) -> Result<u32, ErrorCode> {
        let regs = &self.registers.nand[bank as usize];
        wait_until(CONFIG.flag_timeout, || regs.sr.is_set(SR::FEMPT))?;
        Ok(regs.eccr.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    fn sram() -> NorSramConfig {
        NorSramConfig {
            memory_type: MemoryType::Sram,
            data_width: BusWidth::Bits16,
            address_data_mux: false,
            burst: false,
            wait_polarity_high: false,
            wrap: false,
            wait_during_wait_state: false,
            write_enable: true,
            wait_signal: false,
            extended_mode: true,
            async_wait: false,
            write_burst: false,
        }
    }

    fn timing() -> Timing {
        Timing {
            address_setup: 9,
            address_hold: 1,
            data_setup: 36,
            bus_turnaround: 1,
            clock_division: 2,
            data_latency: 2,
            access_mode: AccessMode::A,
        }
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(FsmcRegisters, nand), 0x60);
        assert_eq!(core::mem::offset_of!(FsmcRegisters, pcr4), 0xA0);
        assert_eq!(core::mem::offset_of!(FsmcRegisters, pio4), 0xB0);
        assert_eq!(core::mem::offset_of!(FsmcRegisters, bwtr), 0x104);
        assert_eq!(core::mem::size_of::<NandBankRegisters>(), 0x20);
        assert_eq!(core::mem::offset_of!(NandBankRegisters, eccr), 0x14);
    }

    #[test]
    fn sram_bank_setup() {
        let regs: StaticRef<FsmcRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let fsmc = Fsmc::with_registers(regs, &rcc);

        fsmc.init_nor_sram(NorSramBank::Bank3, &sram());
        assert_eq!(regs.norsram[2].bcr.get(), 0x5010);
        assert_eq!(fsmc.set_timing(NorSramBank::Bank3, &timing()), Ok(()));
        assert_eq!(regs.norsram[2].btr.get(), 0x0011_2419);
        assert_eq!(
            fsmc.set_write_timing(NorSramBank::Bank3, Some(&timing())),
            Ok(())
        );
        assert_eq!(regs.bwtr[2].bwtr.get(), 0x0001_2419);

        let bad = Timing {
            clock_division: 1,
            ..timing()
        };
        assert_eq!(fsmc.set_timing(NorSramBank::Bank3, &bad), Err(ErrorCode::INVAL));

        fsmc.enable_nor_sram(NorSramBank::Bank3);
        assert!(regs.norsram[2].bcr.is_set(BCR::MBKEN));
        fsmc.set_write_enable(NorSramBank::Bank3, false);
        assert!(!regs.norsram[2].bcr.is_set(BCR::WREN));
    }

    #[test]
    fn reset_values() {
        let regs: StaticRef<FsmcRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let fsmc = Fsmc::with_registers(regs, &rcc);

        fsmc.deinit_nor_sram(NorSramBank::Bank1);
        fsmc.deinit_nor_sram(NorSramBank::Bank2);
        assert_eq!(regs.norsram[0].bcr.get(), 0x30DB);
        assert_eq!(regs.norsram[1].bcr.get(), 0x30D2);
        assert_eq!(regs.norsram[1].btr.get(), 0x0FFF_FFFF);
        assert_eq!(regs.bwtr[1].bwtr.get(), 0x0FFF_FFFF);

        fsmc.deinit_nand(NandBank::Bank3);
        assert_eq!(regs.nand[1].pcr.get(), 0x18);
        assert_eq!(regs.nand[1].sr.get(), 0x40);
        assert_eq!(regs.nand[1].pmem.get(), 0xFCFC_FCFC);
        assert_eq!(regs.nand[1].patt.get(), 0xFCFC_FCFC);
    }

    #[test]
    fn nand_ecc() {
        let regs: StaticRef<FsmcRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let fsmc = Fsmc::with_registers(regs, &rcc);
        let config = NandConfig {
            wait_feature: true,
            data_width: BusWidth::Bits8,
            ecc: true,
            ecc_page_size: EccPageSize::Bytes512,
            tclr: 1,
            tar: 1,
        };

        assert_eq!(fsmc.init_nand(NandBank::Bank2, &config), Ok(()));
        assert_eq!(regs.nand[0].pcr.get(), 0x0002_224A);
        fsmc.set_nand_common_timing(
            NandBank::Bank2,
            &SpaceTiming {
                setup: 2,
                wait: 3,
                hold: 2,
                hiz: 1,
            },
        );
        assert_eq!(regs.nand[0].pmem.get(), 0x0102_0302);

        // FIFO not drained
        assert_eq!(fsmc.ecc(NandBank::Bank2), Err(ErrorCode::BUSY));
        regs.nand[0].sr.write(SR::FEMPT::SET);
        assert_eq!(fsmc.ecc(NandBank::Bank2), Ok(0));
    }
}
