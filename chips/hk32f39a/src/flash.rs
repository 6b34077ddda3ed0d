// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Embedded flash controller and option bytes.
//!
//! Programming is done by half-words with `CR.PG` set; erasure works on
//! 2 KiB pages or on the whole main array. Every wait on `SR.BSY` is bounded
//! by `CONFIG.flag_timeout`.

use crate::config::CONFIG;
use crate::memory_map;
use core::ptr;
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{
    register_bitfields, register_structs, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::{error, ErrorCode, StaticRef};

register_structs! {
    pub FlashRegisters {
        /// Flash access control register
        (0x00 => pub acr: ReadWrite<u32, ACR::Register>),
        /// Flash key register
        (0x04 => pub keyr: WriteOnly<u32, KEYR::Register>),
        /// Flash option key register
        (0x08 => pub optkeyr: WriteOnly<u32, KEYR::Register>),
        /// Flash status register
        (0x0C => pub sr: ReadWrite<u32, SR::Register>),
        /// Flash control register
        (0x10 => pub cr: ReadWrite<u32, CR::Register>),
        /// Flash address register
        (0x14 => pub ar: WriteOnly<u32>),
        (0x18 => _reserved0),
        /// Option byte register
        (0x1C => pub obr: ReadOnly<u32, OBR::Register>),
        /// Write protection register
        (0x20 => pub wrpr: ReadOnly<u32>),
        (0x24 => @END),
    }
}

register_structs! {
    /// Option bytes, each stored next to its complement in the upper byte.
    pub ObRegisters {
        (0x00 => pub rdp: ReadWrite<u16>),
        (0x02 => pub user: ReadWrite<u16>),
        (0x04 => pub data0: ReadWrite<u16>),
        (0x06 => pub data1: ReadWrite<u16>),
        (0x08 => pub wrp0: ReadWrite<u16>),
        (0x0A => pub wrp1: ReadWrite<u16>),
        (0x0C => pub wrp2: ReadWrite<u16>),
        (0x0E => pub wrp3: ReadWrite<u16>),
        (0x10 => @END),
    }
}

register_bitfields![u32,
    pub ACR [
        /// Prefetch buffer status
        PRFTBS OFFSET(5) NUMBITS(1) [],
        /// Prefetch buffer enable
        PRFTBE OFFSET(4) NUMBITS(1) [],
        /// Flash half cycle access enable
        HLFCYA OFFSET(3) NUMBITS(1) [],
        /// Wait states between HCLK and a flash access
        LATENCY OFFSET(0) NUMBITS(3) [
            /// SYSCLK <= 24 MHz
            ZeroWaitState = 0,
            /// SYSCLK <= 48 MHz
            OneWaitState = 1,
            /// SYSCLK <= 72 MHz
            TwoWaitState = 2,
            /// SYSCLK below 96 MHz
            ThreeWaitState = 3,
            /// SYSCLK <= 100 MHz
            FourWaitState = 4,
            FiveWaitState = 5,
            /// SYSCLK <= 120 MHz
            SixWaitState = 6
        ]
    ],
    pub KEYR [
        KEY OFFSET(0) NUMBITS(32) []
    ],
    pub SR [
        /// End of operation
        EOP OFFSET(5) NUMBITS(1) [],
        /// Write protection error
        WRPRTERR OFFSET(4) NUMBITS(1) [],
        /// Programming error, the target was not erased
        PGERR OFFSET(2) NUMBITS(1) [],
        BSY OFFSET(0) NUMBITS(1) []
    ],
    pub CR [
        EOPIE OFFSET(12) NUMBITS(1) [],
        ERRIE OFFSET(10) NUMBITS(1) [],
        /// Option bytes write enable
        OPTWRE OFFSET(9) NUMBITS(1) [],
        LOCK OFFSET(7) NUMBITS(1) [],
        /// Start an erase
        STRT OFFSET(6) NUMBITS(1) [],
        /// Option byte erase
        OPTER OFFSET(5) NUMBITS(1) [],
        /// Option byte programming
        OPTPG OFFSET(4) NUMBITS(1) [],
        /// Mass erase
        MER OFFSET(2) NUMBITS(1) [],
        /// Page erase
        PER OFFSET(1) NUMBITS(1) [],
        /// Programming
        PG OFFSET(0) NUMBITS(1) []
    ],
    pub OBR [
        DATA1 OFFSET(18) NUMBITS(8) [],
        DATA0 OFFSET(10) NUMBITS(8) [],
        NRST_STDBY OFFSET(4) NUMBITS(1) [],
        NRST_STOP OFFSET(3) NUMBITS(1) [],
        WDG_SW OFFSET(2) NUMBITS(1) [],
        /// Read protection active
        RDPRT OFFSET(1) NUMBITS(1) [],
        /// Option byte load error
        OPTERR OFFSET(0) NUMBITS(1) []
    ]
];

pub const FLASH_R_BASE: StaticRef<FlashRegisters> =
    unsafe { StaticRef::new(memory_map::FLASH_R_BASE as *const FlashRegisters) };

pub const OB_BASE: StaticRef<ObRegisters> =
    unsafe { StaticRef::new(memory_map::OB_BASE as *const ObRegisters) };

pub const KEY1: u32 = 0x4567_0123;
pub const KEY2: u32 = 0xCDEF_89AB;
/// `RDP` value that leaves the device unprotected.
pub const RDP_KEY: u16 = 0x00A5;

pub const PAGE_SIZE: usize = 2048;

/// Outcome of the last flash operation as reported by `SR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashStatus {
    Busy,
    ErrorPg,
    ErrorWrp,
    Complete,
    Timeout,
}

impl From<FlashStatus> for Result<(), ErrorCode> {
    fn from(status: FlashStatus) -> Self {
        match status {
            FlashStatus::Complete => Ok(()),
            FlashStatus::ErrorPg => Err(ErrorCode::FAIL),
            FlashStatus::ErrorWrp => Err(ErrorCode::RESERVE),
            FlashStatus::Busy | FlashStatus::Timeout => Err(ErrorCode::BUSY),
        }
    }
}

/// Flash interrupt sources
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashInterrupt {
    EndOfOperation,
    Error,
}

pub struct Flash {
    registers: StaticRef<FlashRegisters>,
    option_bytes: StaticRef<ObRegisters>,
    /// Address the main array is visible at, `FLASH_BASE` on the chip.
    memory: usize,
}

impl Flash {
    pub const fn new() -> Flash {
        Flash {
            registers: FLASH_R_BASE,
            option_bytes: OB_BASE,
            memory: memory_map::FLASH_BASE,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_registers(registers: StaticRef<FlashRegisters>) -> Flash {
        Flash {
            registers,
            option_bytes: crate::fake_registers(),
            memory: 0,
        }
    }

    #[cfg(test)]
    fn with_memory(
        registers: StaticRef<FlashRegisters>,
        option_bytes: StaticRef<ObRegisters>,
        memory: usize,
    ) -> Flash {
        Flash {
            registers,
            option_bytes,
            memory,
        }
    }

    /* Access control */

    /// Set the wait states for a given system clock frequency.
    pub fn set_latency(&self, sysclk_hz: u32) {
        let latency = match sysclk_hz {
            0..=24_000_000 => ACR::LATENCY::ZeroWaitState,
            24_000_001..=48_000_000 => ACR::LATENCY::OneWaitState,
            48_000_001..=72_000_000 => ACR::LATENCY::TwoWaitState,
            72_000_001..=95_999_999 => ACR::LATENCY::ThreeWaitState,
            96_000_000..=100_000_000 => ACR::LATENCY::FourWaitState,
            _ => ACR::LATENCY::SixWaitState,
        };
        self.registers.acr.modify(latency);
    }

    pub fn get_latency(&self) -> u32 {
        self.registers.acr.read(ACR::LATENCY)
    }

    pub fn enable_prefetch_buffer(&self, enable: bool) {
        self.registers.acr.modify(ACR::PRFTBE.val(enable as u32));
    }

    pub fn is_prefetch_buffer_active(&self) -> bool {
        self.registers.acr.is_set(ACR::PRFTBS)
    }

    /// Half cycle access, only valid below 8 MHz.
    pub fn enable_half_cycle_access(&self, enable: bool) {
        self.registers.acr.modify(ACR::HLFCYA.val(enable as u32));
    }

    /* Locking */

    pub fn is_locked(&self) -> bool {
        self.registers.cr.is_set(CR::LOCK)
    }

    pub fn unlock(&self) {
        self.registers.keyr.write(KEYR::KEY.val(KEY1));
        self.registers.keyr.write(KEYR::KEY.val(KEY2));
    }

    pub fn lock(&self) {
        self.registers.cr.modify(CR::LOCK::SET);
    }

    /// Allow option byte erase and programming. The main array must be
    /// unlocked first.
    pub fn unlock_option_bytes(&self) {
        self.registers.optkeyr.write(KEYR::KEY.val(KEY1));
        self.registers.optkeyr.write(KEYR::KEY.val(KEY2));
    }

    /* Status */

    pub fn status(&self) -> FlashStatus {
        let sr = self.registers.sr.extract();
        if sr.is_set(SR::BSY) {
            FlashStatus::Busy
        } else if sr.is_set(SR::PGERR) {
            FlashStatus::ErrorPg
        } else if sr.is_set(SR::WRPRTERR) {
            FlashStatus::ErrorWrp
        } else {
            FlashStatus::Complete
        }
    }

    /// Wait for `BSY` to drop and report how the operation ended.
    pub fn wait_for_last_operation(&self) -> FlashStatus {
        if wait_until(CONFIG.flag_timeout, || !self.registers.sr.is_set(SR::BSY)).is_err() {
            return FlashStatus::Timeout;
        }
        self.status()
    }

    /// Clear EOP, PGERR and WRPRTERR, all write-one-to-clear.
    pub fn clear_flags(&self) {
        self.registers
            .sr
            .write(SR::EOP::SET + SR::PGERR::SET + SR::WRPRTERR::SET);
    }

    fn finish(&self, status: FlashStatus) -> Result<(), ErrorCode> {
        if status != FlashStatus::Complete {
            error!("flash: operation failed");
        }
        status.into()
    }

    fn check_range(&self, address: usize, alignment: usize) -> Result<usize, ErrorCode> {
        if !(memory_map::FLASH_BASE..=memory_map::FLASH_END).contains(&address)
            || address % alignment != 0
        {
            return Err(ErrorCode::INVAL);
        }
        Ok(self.memory + (address - memory_map::FLASH_BASE))
    }

    /* Erase and program */

    /// Erase the page containing `address`.
    pub fn erase_page(&self, address: usize) -> Result<(), ErrorCode> {
        self.check_range(address, 1)?;
        let page = address - (address - memory_map::FLASH_BASE) % PAGE_SIZE;

        let mut status = self.wait_for_last_operation();
        if status == FlashStatus::Complete {
            self.registers.cr.modify(CR::PER::SET);
            self.registers.ar.set(page as u32);
            self.registers.cr.modify(CR::STRT::SET);
            status = self.wait_for_last_operation();
            self.registers.cr.modify(CR::PER::CLEAR);
        }
        self.finish(status)
    }

    /// Erase the whole main array.
    pub fn erase_all(&self) -> Result<(), ErrorCode> {
        let mut status = self.wait_for_last_operation();
        if status == FlashStatus::Complete {
            self.registers.cr.modify(CR::MER::SET);
            self.registers.cr.modify(CR::STRT::SET);
            status = self.wait_for_last_operation();
            self.registers.cr.modify(CR::MER::CLEAR);
        }
        self.finish(status)
    }

    pub fn program_half_word(&self, address: usize, data: u16) -> Result<(), ErrorCode> {
        let target = self.check_range(address, 2)?;
        let mut status = self.wait_for_last_operation();
        if status == FlashStatus::Complete {
            self.registers.cr.modify(CR::PG::SET);
            // SAFETY: target lies in the main array and is half-word aligned.
            unsafe { ptr::write_volatile(target as *mut u16, data) };
            status = self.wait_for_last_operation();
            self.registers.cr.modify(CR::PG::CLEAR);
        }
        self.finish(status)
    }

    /// Program a word as two half-words, low half first.
    pub fn program_word(&self, address: usize, data: u32) -> Result<(), ErrorCode> {
        if address % 4 != 0 {
            return Err(ErrorCode::INVAL);
        }
        self.program_half_word(address, data as u16)?;
        self.program_half_word(address + 2, (data >> 16) as u16)
    }

    /* Option bytes */

    /// Erase all option bytes, keeping read protection off.
    pub fn erase_option_bytes(&self) -> Result<(), ErrorCode> {
        let rdp = if self.read_out_protection_enabled() {
            0
        } else {
            RDP_KEY
        };
        let mut status = self.wait_for_last_operation();
        if status == FlashStatus::Complete {
            self.unlock_option_bytes();
            self.registers.cr.modify(CR::OPTER::SET);
            self.registers.cr.modify(CR::STRT::SET);
            status = self.wait_for_last_operation();
            self.registers.cr.modify(CR::OPTER::CLEAR);
            if status == FlashStatus::Complete {
                self.registers.cr.modify(CR::OPTPG::SET);
                self.option_bytes.rdp.set(rdp);
                status = self.wait_for_last_operation();
                self.registers.cr.modify(CR::OPTPG::CLEAR);
            }
        }
        self.finish(status)
    }

    /// Program one of the two user data option bytes.
    pub fn program_option_data(&self, index: usize, data: u8) -> Result<(), ErrorCode> {
        let target = match index {
            0 => &self.option_bytes.data0,
            1 => &self.option_bytes.data1,
            _ => return Err(ErrorCode::INVAL),
        };
        let mut status = self.wait_for_last_operation();
        if status == FlashStatus::Complete {
            self.unlock_option_bytes();
            self.registers.cr.modify(CR::OPTPG::SET);
            target.set(data.into());
            status = self.wait_for_last_operation();
            self.registers.cr.modify(CR::OPTPG::CLEAR);
        }
        self.finish(status)
    }

    /// Write protection bits, one per group of pages; a cleared bit means
    /// the group is protected.
    pub fn write_protection(&self) -> u32 {
        self.registers.wrpr.get()
    }

    pub fn read_out_protection_enabled(&self) -> bool {
        self.registers.obr.is_set(OBR::RDPRT)
    }

    pub fn option_byte_data(&self) -> (u8, u8) {
        (
            self.registers.obr.read(OBR::DATA0) as u8,
            self.registers.obr.read(OBR::DATA1) as u8,
        )
    }

    /* Interrupts */

    pub fn enable_interrupt(&self, interrupt: FlashInterrupt, enable: bool) {
        match interrupt {
            FlashInterrupt::EndOfOperation => {
                self.registers.cr.modify(CR::EOPIE.val(enable as u32))
            }
            FlashInterrupt::Error => self.registers.cr.modify(CR::ERRIE.val(enable as u32)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;
    use std::boxed::Box;

    fn flash_with_memory() -> (
        StaticRef<FlashRegisters>,
        StaticRef<ObRegisters>,
        &'static mut [u16],
    ) {
        let regs = fake_registers::<FlashRegisters>();
        let ob = fake_registers::<ObRegisters>();
        let memory = Box::leak(vec![0xFFFFu16; 2 * PAGE_SIZE].into_boxed_slice());
        (regs, ob, memory)
    }

    #[test]
    fn register_layout() {
        assert_eq!(core::mem::offset_of!(FlashRegisters, sr), 0x0C);
        assert_eq!(core::mem::offset_of!(FlashRegisters, obr), 0x1C);
        assert_eq!(core::mem::offset_of!(FlashRegisters, wrpr), 0x20);
        assert_eq!(core::mem::offset_of!(ObRegisters, wrp3), 0x0E);
        assert_eq!(ACR::PRFTBE::SET.value, 0x10);
        assert_eq!(CR::STRT::SET.value, 0x40);
    }

    #[test]
    fn latency_thresholds() {
        let regs = fake_registers::<FlashRegisters>();
        let flash = Flash::with_registers(regs);
        for (hz, latency) in [
            (8_000_000, 0),
            (24_000_000, 0),
            (48_000_000, 1),
            (72_000_000, 2),
            (90_285_000, 3),
            (96_000_000, 4),
            (98_000_000, 4),
            (120_000_000, 6),
        ] {
            flash.set_latency(hz);
            assert_eq!(flash.get_latency(), latency);
        }
    }

    #[test]
    fn program_writes_through_to_memory() {
        let (regs, ob, memory) = flash_with_memory();
        let flash = Flash::with_memory(regs, ob, memory.as_mut_ptr() as usize);

        assert_eq!(flash.program_word(memory_map::FLASH_BASE + 4, 0xDEAD_BEEF), Ok(()));
        assert_eq!(memory[2], 0xBEEF);
        assert_eq!(memory[3], 0xDEAD);
        assert!(!regs.cr.is_set(CR::PG));
    }

    #[test]
    fn range_and_alignment() {
        let (regs, ob, memory) = flash_with_memory();
        let flash = Flash::with_memory(regs, ob, memory.as_mut_ptr() as usize);
        assert_eq!(
            flash.program_half_word(memory_map::FLASH_BASE + 1, 0),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(flash.program_word(memory_map::FLASH_BASE + 2, 0), Err(ErrorCode::INVAL));
        assert_eq!(flash.erase_page(memory_map::FLASH_END + 1), Err(ErrorCode::INVAL));
        assert_eq!(flash.erase_page(0x2000_0000), Err(ErrorCode::INVAL));
    }

    #[test]
    fn erase_page_aligns_address() {
        let regs = fake_registers::<FlashRegisters>();
        let flash = Flash::with_registers(regs);
        assert_eq!(flash.erase_page(memory_map::FLASH_BASE + PAGE_SIZE + 10), Ok(()));
        assert!(regs.cr.is_set(CR::STRT));
        assert!(!regs.cr.is_set(CR::PER));
    }

    #[test]
    fn status_maps_to_error_codes() {
        let regs = fake_registers::<FlashRegisters>();
        let flash = Flash::with_registers(regs);

        regs.sr.write(SR::PGERR::SET);
        assert_eq!(flash.erase_all(), Err(ErrorCode::FAIL));
        regs.sr.write(SR::WRPRTERR::SET);
        assert_eq!(flash.erase_all(), Err(ErrorCode::RESERVE));
        regs.sr.write(SR::BSY::SET);
        assert_eq!(flash.wait_for_last_operation(), FlashStatus::Timeout);
        assert_eq!(flash.erase_all(), Err(ErrorCode::BUSY));
    }

    #[test]
    fn option_bytes() {
        let (regs, ob, memory) = flash_with_memory();
        let flash = Flash::with_memory(regs, ob, memory.as_mut_ptr() as usize);
        assert_eq!(flash.erase_option_bytes(), Ok(()));
        assert_eq!(ob.rdp.get(), RDP_KEY);
        assert_eq!(flash.program_option_data(1, 0x5A), Ok(()));
        assert_eq!(ob.data1.get(), 0x5A);
        assert_eq!(flash.program_option_data(2, 0), Err(ErrorCode::INVAL));
        assert!(!flash.read_out_protection_enabled());
    }
}
