// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Quad-SPI flash interface.
//!
//! A command is a sequence of optional phases (instruction, address,
//! alternate bytes, dummy cycles, data), each on one, two or four lines.
//! The controller runs commands in one of four functional modes: indirect
//! write, indirect read, automatic status polling and memory mapped, where
//! the flash appears at `0x9000_0000`.

use crate::config::CONFIG;
use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK2};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::{debug, ErrorCode, StaticRef};

register_structs! {
    pub QspiRegisters {
        /// Control register
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Device configuration register
        (0x04 => pub dcr: ReadWrite<u32, DCR::Register>),
        /// Status register
        (0x08 => pub sr: ReadWrite<u32, SR::Register>),
        /// Flag clear register
        (0x0C => pub fcr: ReadWrite<u32, FCR::Register>),
        /// Data length register, bytes minus one
        (0x10 => pub dlr: ReadWrite<u32>),
        /// Communication configuration register
        (0x14 => pub ccr: ReadWrite<u32, CCR::Register>),
        /// Address register
        (0x18 => pub ar: ReadWrite<u32>),
        /// Alternate bytes register
        (0x1C => pub abr: ReadWrite<u32>),
        /// Data register, accessed bytewise by the drivers
        (0x20 => pub dr: ReadWrite<u8>),
        (0x21 => _reserved0),
        /// Polling status mask register
        (0x24 => pub psmkr: ReadWrite<u32>),
        /// Polling status match register
        (0x28 => pub psmar: ReadWrite<u32>),
        /// Polling interval register
        (0x2C => pub pir: ReadWrite<u32, PIR::Register>),
        /// Low-power timeout register
        (0x30 => pub lptr: ReadWrite<u32, LPTR::Register>),
        (0x34 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Clock prescaler, QSPI clock = HCLK / (PRESCALER + 1)
        PRESCALER OFFSET(24) NUMBITS(8) [],
        /// Polling match mode, set for OR
        PMM OFFSET(23) NUMBITS(1) [],
        /// Automatic poll mode stop
        APMS OFFSET(22) NUMBITS(1) [],
        TOIE OFFSET(20) NUMBITS(1) [],
        SMIE OFFSET(19) NUMBITS(1) [],
        FTIE OFFSET(18) NUMBITS(1) [],
        TCIE OFFSET(17) NUMBITS(1) [],
        TEIE OFFSET(16) NUMBITS(1) [],
        /// FIFO threshold level minus one
        FTHRES OFFSET(8) NUMBITS(5) [],
        /// Flash memory selection
        FSEL OFFSET(7) NUMBITS(1) [],
        /// Dual flash mode
        DFM OFFSET(6) NUMBITS(1) [],
        /// Sample shift by half a cycle
        SSHIFT OFFSET(4) NUMBITS(1) [],
        /// Timeout counter enable
        TCEN OFFSET(3) NUMBITS(1) [],
        DMAEN OFFSET(2) NUMBITS(1) [],
        ABORT OFFSET(1) NUMBITS(1) [],
        EN OFFSET(0) NUMBITS(1) []
    ],
    pub DCR [
        /// Flash size is 2^(FSIZE + 1) bytes
        FSIZE OFFSET(16) NUMBITS(5) [],
        /// Chip select high time minus one, in cycles
        CSHT OFFSET(8) NUMBITS(3) [],
        /// Clock level between commands, set for mode 3
        CKMODE OFFSET(0) NUMBITS(1) []
    ],
    pub SR [
        /// FIFO level
        FLEVEL OFFSET(8) NUMBITS(6) [],
        BUSY OFFSET(5) NUMBITS(1) [],
        /// Timeout flag
        TOF OFFSET(4) NUMBITS(1) [],
        /// Status match flag
        SMF OFFSET(3) NUMBITS(1) [],
        /// FIFO threshold flag
        FTF OFFSET(2) NUMBITS(1) [],
        /// Transfer complete flag
        TCF OFFSET(1) NUMBITS(1) [],
        /// Transfer error flag
        TEF OFFSET(0) NUMBITS(1) []
    ],
    pub FCR [
        CTOF OFFSET(4) NUMBITS(1) [],
        CSMF OFFSET(3) NUMBITS(1) [],
        CTCF OFFSET(1) NUMBITS(1) [],
        CTEF OFFSET(0) NUMBITS(1) []
    ],
    pub CCR [
        /// Double data rate mode
        DDRM OFFSET(31) NUMBITS(1) [],
        /// DDR hold
        DHHC OFFSET(30) NUMBITS(1) [],
        /// Send instruction only once
        SIOO OFFSET(28) NUMBITS(1) [],
        FMODE OFFSET(26) NUMBITS(2) [
            IndirectWrite = 0b00,
            IndirectRead = 0b01,
            AutoPolling = 0b10,
            MemoryMapped = 0b11
        ],
        DMODE OFFSET(24) NUMBITS(2) [],
        /// Number of dummy cycles
        DCYC OFFSET(18) NUMBITS(5) [],
        ABSIZE OFFSET(16) NUMBITS(2) [],
        ABMODE OFFSET(14) NUMBITS(2) [],
        ADSIZE OFFSET(12) NUMBITS(2) [],
        ADMODE OFFSET(10) NUMBITS(2) [],
        IMODE OFFSET(8) NUMBITS(2) [],
        INSTRUCTION OFFSET(0) NUMBITS(8) []
    ],
    pub PIR [
        /// Cycles between two status reads
        INTERVAL OFFSET(0) NUMBITS(16) []
    ],
    pub LPTR [
        /// Cycles before chip select is released in memory-mapped mode
        TIMEOUT OFFSET(0) NUMBITS(16) []
    ]
];

pub const QSPI_BASE: StaticRef<QspiRegisters> =
    unsafe { StaticRef::new(memory_map::QSPI_R_BASE as *const QspiRegisters) };

/// Lines used by a command phase; `None` skips the phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lines {
    None = 0b00,
    Single = 0b01,
    Dual = 0b10,
    Quad = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSize {
    Bits8 = 0b00,
    Bits16 = 0b01,
    Bits24 = 0b10,
    Bits32 = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    /// CLK low while chip select is high
    Mode0,
    /// CLK high while chip select is high
    Mode3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// All unmasked bits must match
    And,
    /// Any unmasked bit matching is enough
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QspiConfig {
    /// HCLK divider minus one
    pub prescaler: u8,
    /// log2 of the flash size in bytes, minus one
    pub flash_size: u8,
    /// Chip select high time between commands, 1 to 8 cycles
    pub cs_high_time: u8,
    pub clock_mode: ClockMode,
    /// Sample read data half a cycle later
    pub sample_shift: bool,
    /// FIFO threshold in bytes, 1 to 32
    pub fifo_threshold: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub instruction: u8,
    pub instruction_lines: Lines,
    pub address: u32,
    pub address_size: FieldSize,
    pub address_lines: Lines,
    pub alternate_bytes: u32,
    pub alternate_size: FieldSize,
    pub alternate_lines: Lines,
    /// 0 to 31
    pub dummy_cycles: u8,
    pub data_lines: Lines,
    pub ddr: bool,
    pub send_instruction_once: bool,
}

impl Command {
    /// Single-line instruction with no other phase.
    pub const fn instruction(instruction: u8) -> Command {
        Command {
            instruction,
            instruction_lines: Lines::Single,
            address: 0,
            address_size: FieldSize::Bits24,
            address_lines: Lines::None,
            alternate_bytes: 0,
            alternate_size: FieldSize::Bits8,
            alternate_lines: Lines::None,
            dummy_cycles: 0,
            data_lines: Lines::None,
            ddr: false,
            send_instruction_once: false,
        }
    }
}

pub struct Qspi<'a> {
    registers: StaticRef<QspiRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Qspi<'a> {
    pub const fn new(rcc: &'a Rcc) -> Qspi<'a> {
        Qspi {
            registers: QSPI_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::QSPI), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<QspiRegisters>, rcc: &'a Rcc) -> Qspi<'a> {
        Qspi {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::QSPI), rcc),
        }
    }

    fn wait_flag(&self, done: impl Fn(&Self) -> bool) -> Result<(), ErrorCode> {
        wait_until(CONFIG.flag_timeout, || done(self))
    }

    fn wait_not_busy(&self) -> Result<(), ErrorCode> {
        self.wait_flag(|q| !q.registers.sr.is_set(SR::BUSY))
    }

    pub fn init(&self, config: QspiConfig) -> Result<(), ErrorCode> {
        if !(1..=8).contains(&config.cs_high_time)
            || !(1..=32).contains(&config.fifo_threshold)
            || config.flash_size > 31
        {
            return Err(ErrorCode::INVAL);
        }
        self.clock.enable();
        self.wait_not_busy()?;
        self.registers.cr.modify(
            CR::PRESCALER.val(config.prescaler.into())
                + CR::FTHRES.val(u32::from(config.fifo_threshold) - 1)
                + CR::SSHIFT.val(config.sample_shift as u32)
                + CR::FSEL::CLEAR
                + CR::DFM::CLEAR,
        );
        self.registers.dcr.modify(
            DCR::FSIZE.val(config.flash_size.into())
                + DCR::CSHT.val(u32::from(config.cs_high_time) - 1)
                + DCR::CKMODE.val((config.clock_mode == ClockMode::Mode3) as u32),
        );
        self.registers.cr.modify(CR::EN::SET);
        debug!("qspi: enabled, prescaler {}", config.prescaler);
        Ok(())
    }

    pub fn deinit(&self) {
        self.registers.cr.modify(CR::EN::CLEAR);
        self.clock.reset();
    }

    /// Program `DLR`, `CCR` and `AR` for `command`. Writing `AR` (or `CCR`
    /// when there is no address phase) starts the transfer.
    fn configure(&self, command: &Command, data_len: usize, mode: u32) -> Result<(), ErrorCode> {
        if command.dummy_cycles > 31 {
            return Err(ErrorCode::INVAL);
        }
        if command.data_lines != Lines::None && mode != 0b11 {
            if data_len == 0 {
                return Err(ErrorCode::SIZE);
            }
            self.registers.dlr.set(data_len as u32 - 1);
        }
        if command.alternate_lines != Lines::None {
            self.registers.abr.set(command.alternate_bytes);
        }
        self.registers.ccr.write(
            CCR::DDRM.val(command.ddr as u32)
                + CCR::SIOO.val(command.send_instruction_once as u32)
                + CCR::FMODE.val(mode)
                + CCR::DMODE.val(command.data_lines as u32)
                + CCR::DCYC.val(command.dummy_cycles.into())
                + CCR::ABSIZE.val(command.alternate_size as u32)
                + CCR::ABMODE.val(command.alternate_lines as u32)
                + CCR::ADSIZE.val(command.address_size as u32)
                + CCR::ADMODE.val(command.address_lines as u32)
                + CCR::IMODE.val(command.instruction_lines as u32)
                + CCR::INSTRUCTION.val(command.instruction.into()),
        );
        if command.address_lines != Lines::None && mode != 0b11 {
            self.registers.ar.set(command.address);
        }
        Ok(())
    }

    fn complete_transfer(&self) -> Result<(), ErrorCode> {
        self.wait_flag(|q| q.registers.sr.is_set(SR::TCF))?;
        if self.registers.sr.is_set(SR::TEF) {
            self.registers.fcr.write(FCR::CTEF::SET);
            return Err(ErrorCode::FAIL);
        }
        self.registers.fcr.write(FCR::CTCF::SET);
        Ok(())
    }

    /// Send a command without data phase, e.g. write enable.
    pub fn command(&self, command: &Command) -> Result<(), ErrorCode> {
        if command.data_lines != Lines::None {
            return Err(ErrorCode::INVAL);
        }
        self.wait_not_busy()?;
        self.configure(command, 0, 0b00)?;
        self.complete_transfer()
    }

    /// Indirect write of `data` after the command phases.
    pub fn write(&self, command: &Command, data: &[u8]) -> Result<(), ErrorCode> {
        if command.data_lines == Lines::None {
            return Err(ErrorCode::INVAL);
        }
        self.wait_not_busy()?;
        self.configure(command, data.len(), 0b00)?;
        for &byte in data {
            self.wait_flag(|q| q.registers.sr.is_set(SR::FTF))?;
            self.registers.dr.set(byte);
        }
        self.complete_transfer()?;
        self.abort()
    }

    /// Indirect read into `buffer`.
    pub fn read(&self, command: &Command, buffer: &mut [u8]) -> Result<(), ErrorCode> {
        if command.data_lines == Lines::None {
            return Err(ErrorCode::INVAL);
        }
        self.wait_not_busy()?;
        self.configure(command, buffer.len(), 0b01)?;
        for byte in buffer.iter_mut() {
            self.wait_flag(|q| q.registers.sr.matches_any(&[SR::FTF::SET, SR::TCF::SET]))?;
            *byte = self.registers.dr.get();
        }
        self.complete_transfer()?;
        // Drop bytes the controller prefetched past the end.
        self.abort()
    }

    /// Read the status register with `command` every `interval` cycles until
    /// `(status & mask)` matches `value`. `status_bytes` is 1 to 4.
    pub fn auto_polling(
        &self,
        command: &Command,
        value: u32,
        mask: u32,
        interval: u16,
        status_bytes: usize,
        match_mode: MatchMode,
    ) -> Result<(), ErrorCode> {
        if !(1..=4).contains(&status_bytes) || command.data_lines == Lines::None {
            return Err(ErrorCode::INVAL);
        }
        self.wait_not_busy()?;
        self.registers.psmar.set(value);
        self.registers.psmkr.set(mask);
        self.registers.pir.write(PIR::INTERVAL.val(interval.into()));
        self.registers
            .cr
            .modify(CR::PMM.val((match_mode == MatchMode::Or) as u32) + CR::APMS::SET);
        self.configure(command, status_bytes, 0b10)?;
        self.wait_flag(|q| q.registers.sr.is_set(SR::SMF))?;
        self.registers.fcr.write(FCR::CSMF::SET);
        Ok(())
    }

    /// Map the flash at `QSPI_MEM_BASE`, read with `command`. A non-zero
    /// `timeout` releases chip select after that many idle cycles.
    pub fn memory_mapped(&self, command: &Command, timeout: u16) -> Result<(), ErrorCode> {
        if command.data_lines == Lines::None {
            return Err(ErrorCode::INVAL);
        }
        self.wait_not_busy()?;
        if timeout != 0 {
            self.registers.lptr.write(LPTR::TIMEOUT.val(timeout.into()));
            self.registers.cr.modify(CR::TCEN::SET);
        } else {
            self.registers.cr.modify(CR::TCEN::CLEAR);
        }
        self.configure(command, 0, 0b11)
    }

    /// Stop the current operation and flush the FIFO.
    pub fn abort(&self) -> Result<(), ErrorCode> {
        self.registers.cr.modify(CR::DMAEN::CLEAR + CR::ABORT::SET);
        self.wait_not_busy()
    }

    pub fn fifo_level(&self) -> u32 {
        self.registers.sr.read(SR::FLEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    fn config() -> QspiConfig {
        QspiConfig {
            prescaler: 1,
            flash_size: 22,
            cs_high_time: 2,
            clock_mode: ClockMode::Mode0,
            sample_shift: true,
            fifo_threshold: 4,
        }
    }

    fn read_command() -> Command {
        Command {
            address: 0x0012_3456,
            address_lines: Lines::Quad,
            dummy_cycles: 6,
            data_lines: Lines::Quad,
            instruction_lines: Lines::Single,
            ..Command::instruction(0xEB)
        }
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(QspiRegisters, ccr), 0x14);
        assert_eq!(core::mem::offset_of!(QspiRegisters, dr), 0x20);
        assert_eq!(core::mem::offset_of!(QspiRegisters, lptr), 0x30);
        assert_eq!(CCR::FMODE::MemoryMapped.value, 0x0C00_0000);
    }

    #[test]
    fn init_programs_device_config() {
        let regs: StaticRef<QspiRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let qspi = Qspi::with_registers(regs, &rcc);

        assert_eq!(qspi.init(config()), Ok(()));
        assert_eq!(regs.cr.get(), 0x0100_0311);
        assert_eq!(regs.dcr.get(), 0x0016_0100);

        let bad = QspiConfig {
            fifo_threshold: 0,
            ..config()
        };
        assert_eq!(qspi.init(bad), Err(ErrorCode::INVAL));
    }

    #[test]
    fn indirect_read_phases() {
        let regs: StaticRef<QspiRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let qspi = Qspi::with_registers(regs, &rcc);
        let mut buf = [0u8; 4];

        regs.sr.write(SR::FTF::SET + SR::TCF::SET);
        regs.dr.set(0x5A);
        assert_eq!(qspi.read(&read_command(), &mut buf), Ok(()));
        assert_eq!(buf, [0x5A; 4]);
        assert_eq!(regs.dlr.get(), 3);
        assert_eq!(regs.ar.get(), 0x0012_3456);
        assert!(regs.ccr.matches_all(
            CCR::FMODE::IndirectRead
                + CCR::DMODE.val(0b11)
                + CCR::DCYC.val(6)
                + CCR::ADMODE.val(0b11)
                + CCR::ADSIZE.val(0b10)
                + CCR::IMODE.val(0b01)
                + CCR::INSTRUCTION.val(0xEB)
        ));
        assert!(regs.cr.is_set(CR::ABORT));

        assert_eq!(qspi.read(&read_command(), &mut []), Err(ErrorCode::SIZE));
    }

    #[test]
    fn transfer_error() {
        let regs: StaticRef<QspiRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let qspi = Qspi::with_registers(regs, &rcc);

        regs.sr.write(SR::TCF::SET + SR::TEF::SET);
        assert_eq!(qspi.command(&Command::instruction(0x06)), Err(ErrorCode::FAIL));
        assert!(regs.fcr.is_set(FCR::CTEF));
        assert_eq!(regs.ccr.read(CCR::INSTRUCTION), 0x06);

        regs.sr.set(0);
        assert_eq!(qspi.command(&Command::instruction(0x06)), Err(ErrorCode::BUSY));
    }

    #[test]
    fn polling_and_mapping() {
        let regs: StaticRef<QspiRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let qspi = Qspi::with_registers(regs, &rcc);
        let status = Command {
            data_lines: Lines::Single,
            ..Command::instruction(0x05)
        };

        regs.sr.write(SR::SMF::SET);
        assert_eq!(
            qspi.auto_polling(&status, 0, 0x01, 0x10, 1, MatchMode::And),
            Ok(())
        );
        assert_eq!(regs.psmkr.get(), 0x01);
        assert_eq!(regs.pir.get(), 0x10);
        assert!(regs.cr.is_set(CR::APMS));
        assert!(!regs.cr.is_set(CR::PMM));
        assert_eq!(regs.dlr.get(), 0);

        assert_eq!(qspi.memory_mapped(&read_command(), 0x40), Ok(()));
        assert!(regs.ccr.matches_all(CCR::FMODE::MemoryMapped));
        assert!(regs.cr.is_set(CR::TCEN));
        assert_eq!(regs.lptr.get(), 0x40);
    }
}
