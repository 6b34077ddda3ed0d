// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! SHA-256 hash processor.

use crate::config::CONFIG;
use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK2};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{trace, ErrorCode, StaticRef};

pub const SHA256_DIGEST_SIZE: usize = 32;

register_structs! {
    pub HashRegisters {
        /// Control register
        (0x000 => pub cr: ReadWrite<u32, CR::Register>),
        /// Data input register
        (0x004 => pub din: ReadWrite<u32>),
        /// Start register
        (0x008 => pub str: ReadWrite<u32, STR::Register>),
        /// Digest registers 0 to 4, mirrored in `hr`
        (0x00C => pub hr_short: [ReadOnly<u32>; 5]),
        /// Interrupt enable register
        (0x020 => pub imr: ReadWrite<u32, IMR::Register>),
        /// Status register
        (0x024 => pub sr: ReadWrite<u32, SR::Register>),
        (0x028 => _reserved0),
        /// Context swap registers
        (0x0F8 => pub csr: [ReadWrite<u32>; 54]),
        (0x1D0 => _reserved1),
        /// Digest registers 0 to 7
        (0x310 => pub hr: [ReadOnly<u32>; 8]),
        (0x330 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Long key selection
        LKEY OFFSET(16) NUMBITS(1) [],
        /// Multiple DMA transfers
        MDMAT OFFSET(13) NUMBITS(1) [],
        /// DIN not empty
        DINNE OFFSET(12) NUMBITS(1) [],
        /// Number of words already pushed
        NBW OFFSET(8) NUMBITS(4) [],
        /// Algorithm selection, set for SHA-256
        ALGO OFFSET(7) NUMBITS(1) [],
        /// Mode selection, set for HMAC
        MODE OFFSET(6) NUMBITS(1) [],
        /// Data type selection
        DATATYPE OFFSET(4) NUMBITS(2) [
            Word = 0b00,
            HalfWord = 0b01,
            Byte = 0b10,
            Bit = 0b11
        ],
        /// DMA enable
        DMAE OFFSET(3) NUMBITS(1) [],
        /// Initialize message digest calculation
        INIT OFFSET(2) NUMBITS(1) []
    ],
    pub STR [
        /// Digest calculation
        DCAL OFFSET(8) NUMBITS(1) [],
        /// Number of valid bits in the last word
        NBLW OFFSET(0) NUMBITS(5) []
    ],
    pub IMR [
        /// Digest calculation completion interrupt enable
        DCIE OFFSET(1) NUMBITS(1) [],
        /// Data input interrupt enable
        DINIE OFFSET(0) NUMBITS(1) []
    ],
    pub SR [
        BUSY OFFSET(3) NUMBITS(1) [],
        /// DMA status
        DMAS OFFSET(2) NUMBITS(1) [],
        /// Digest calculation completion interrupt status
        DCIS OFFSET(1) NUMBITS(1) [],
        /// Data input interrupt status
        DINIS OFFSET(0) NUMBITS(1) []
    ]
];

pub const HASH_BASE: StaticRef<HashRegisters> =
    unsafe { StaticRef::new(memory_map::HASH_BASE as *const HashRegisters) };

pub struct Hash<'a> {
    registers: StaticRef<HashRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Hash<'a> {
    pub const fn new(rcc: &'a Rcc) -> Hash<'a> {
        Hash {
            registers: HASH_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::HASH), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<HashRegisters>, rcc: &'a Rcc) -> Hash<'a> {
        Hash {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::HASH), rcc),
        }
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    /// Start a new SHA-256 digest on byte-oriented input.
    pub fn start(&self) {
        self.registers
            .cr
            .write(CR::ALGO::SET + CR::DATATYPE::Byte + CR::INIT::SET);
    }

    fn push(&self, bytes: &[u8]) {
        for chunk in bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.registers.din.set(u32::from_le_bytes(word));
        }
    }

    /// Feed whole words of message. Only the final piece passed to
    /// [`Hash::finish`] may end in a partial word.
    pub fn update(&self, data: &[u8]) -> Result<(), ErrorCode> {
        if data.len() % 4 != 0 {
            return Err(ErrorCode::INVAL);
        }
        self.push(data);
        Ok(())
    }

    /// Feed the last bytes, run the padding and the final rounds and read
    /// the digest out big-endian.
    pub fn finish(
        &self,
        tail: &[u8],
        digest: &mut [u8; SHA256_DIGEST_SIZE],
    ) -> Result<(), ErrorCode> {
        self.push(tail);
        self.registers
            .str
            .write(STR::NBLW.val(8 * (tail.len() % 4) as u32) + STR::DCAL::SET);
        wait_until(CONFIG.flag_timeout, || self.registers.sr.is_set(SR::DCIS))?;
        for (out, hr) in digest.chunks_exact_mut(4).zip(self.registers.hr.iter()) {
            out.copy_from_slice(&hr.get().to_be_bytes());
        }
        trace!("hash: digest ready");
        Ok(())
    }

    /// One-shot SHA-256 of `data`.
    pub fn sha256(
        &self,
        data: &[u8],
        digest: &mut [u8; SHA256_DIGEST_SIZE],
    ) -> Result<(), ErrorCode> {
        self.start();
        let whole = data.len() - data.len() % 4;
        self.push(&data[..whole]);
        self.finish(&data[whole..], digest)
    }

    pub fn enable_interrupts(&self, digest: bool, input: bool) {
        self.registers
            .imr
            .write(IMR::DCIE.val(digest as u32) + IMR::DINIE.val(input as u32));
    }

    pub fn is_busy(&self) -> bool {
        self.registers.sr.is_set(SR::BUSY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(HashRegisters, imr), 0x20);
        assert_eq!(core::mem::offset_of!(HashRegisters, sr), 0x24);
        assert_eq!(core::mem::offset_of!(HashRegisters, csr), 0xF8);
        assert_eq!(core::mem::offset_of!(HashRegisters, hr), 0x310);
        assert_eq!(CR::ALGO::SET.value, 0x80);
        assert_eq!(CR::DATATYPE::Byte.value, 0x20);
    }

    #[test]
    fn last_word_bit_count() {
        let regs: StaticRef<HashRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let hash = Hash::with_registers(regs, &rcc);
        let mut digest = [0u8; SHA256_DIGEST_SIZE];

        assert_eq!(hash.sha256(b"abcdef", &mut digest), Err(ErrorCode::BUSY));
        assert!(regs.cr.matches_all(CR::ALGO::SET + CR::DATATYPE::Byte + CR::INIT::SET));
        assert_eq!(regs.str.read(STR::NBLW), 16);
        assert!(regs.str.is_set(STR::DCAL));
        // Trailing partial word is zero padded.
        assert_eq!(regs.din.get(), u32::from_le_bytes(*b"ef\0\0"));

        assert_eq!(hash.update(b"abc"), Err(ErrorCode::INVAL));
    }

    #[test]
    fn digest_read_big_endian() {
        let regs: StaticRef<HashRegisters> = fake_registers();
        let rcc = Rcc::with_registers(fake_registers());
        let hash = Hash::with_registers(regs, &rcc);
        let mut digest = [0u8; SHA256_DIGEST_SIZE];

        regs.sr.write(SR::DCIS::SET);
        assert_eq!(hash.sha256(b"abcd", &mut digest), Ok(()));
        assert_eq!(regs.str.read(STR::NBLW), 0);
        assert_eq!(regs.din.get(), u32::from_le_bytes(*b"abcd"));
        assert_eq!(digest, [0u8; SHA256_DIGEST_SIZE]);
    }
}
