// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! AES-128/192/256 co-processor.
//!
//! The block has the STM32L1 AES register set, widened with `KEYR4..7` and a
//! second control register carrying the key size. Keys and IVs go into the
//! registers as big-endian words with the first word of the key in the
//! highest numbered register. Data words are loaded from memory as-is and
//! the peripheral swaps bytes (`DATATYPE` = 8-bit).
//!
//! CBC decryption needs a separate key derivation round: the hardware is
//! run once in key derivation mode, then switched to decryption.

use crate::config::CONFIG;
use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK2};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{debug, warn, ErrorCode, StaticRef};

pub const AES_BLOCK_SIZE: usize = 16;

register_structs! {
    pub AesRegisters {
        /// Control register
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Status register
        (0x04 => pub sr: ReadWrite<u32, SR::Register>),
        /// Data input register
        (0x08 => pub dinr: ReadWrite<u32>),
        /// Data output register
        (0x0C => pub doutr: ReadOnly<u32>),
        /// Key registers 0 to 3, bits 31:0 to 127:96
        (0x10 => pub keyr: [ReadWrite<u32>; 4]),
        /// Initialization vector registers 0 to 3
        (0x20 => pub ivr: [ReadWrite<u32>; 4]),
        /// Key registers 4 to 7, bits 159:128 to 255:224
        (0x30 => pub keyr_hi: [ReadWrite<u32>; 4]),
        /// Control register 2
        (0x40 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// Status register 2, suspend/resume state
        (0x44 => pub sr2: ReadOnly<u32>),
        (0x48 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Enable DMA management of data output phase
        DMAOUTEN OFFSET(12) NUMBITS(1) [],
        /// Enable DMA management of data input phase
        DMAINEN OFFSET(11) NUMBITS(1) [],
        /// Error interrupt enable
        ERRIE OFFSET(10) NUMBITS(1) [],
        /// CCF flag interrupt enable
        CCFIE OFFSET(9) NUMBITS(1) [],
        /// Error clear
        ERRC OFFSET(8) NUMBITS(1) [],
        /// Computation complete flag clear
        CCFC OFFSET(7) NUMBITS(1) [],
        /// Chaining mode
        CHMOD OFFSET(5) NUMBITS(2) [
            Ecb = 0b00,
            Cbc = 0b01,
            Ctr = 0b10
        ],
        /// Operating mode
        MODE OFFSET(3) NUMBITS(2) [
            Encrypt = 0b00,
            KeyDerivation = 0b01,
            Decrypt = 0b10,
            KeyDerivationDecrypt = 0b11
        ],
        /// Data swapping on DINR/DOUTR
        DATATYPE OFFSET(1) NUMBITS(2) [
            Word = 0b00,
            HalfWord = 0b01,
            Byte = 0b10,
            Bit = 0b11
        ],
        /// AES enable
        EN OFFSET(0) NUMBITS(1) []
    ],
    pub SR [
        /// Write error flag
        WRERR OFFSET(2) NUMBITS(1) [],
        /// Read error flag
        RDERR OFFSET(1) NUMBITS(1) [],
        /// Computation complete flag
        CCF OFFSET(0) NUMBITS(1) []
    ],
    pub CR2 [
        KEY_SIZE OFFSET(0) NUMBITS(2) [
            Bits128 = 0b00,
            Bits192 = 0b01,
            Bits256 = 0b10
        ]
    ]
];

pub const AES_BASE: StaticRef<AesRegisters> =
    unsafe { StaticRef::new(memory_map::AES_BASE as *const AesRegisters) };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainingMode {
    Ecb,
    Cbc,
    Ctr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

pub struct Aes<'a> {
    registers: StaticRef<AesRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Aes<'a> {
    pub const fn new(rcc: &'a Rcc) -> Aes<'a> {
        Aes {
            registers: AES_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::AES), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<AesRegisters>, rcc: &'a Rcc) -> Aes<'a> {
        Aes {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::AES), rcc),
        }
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    pub fn is_enabled_clock(&self) -> bool {
        self.clock.is_enabled()
    }

    fn key_register(&self, index: usize) -> &ReadWrite<u32> {
        if index < 4 {
            &self.registers.keyr[index]
        } else {
            &self.registers.keyr_hi[index - 4]
        }
    }

    /// Load a 16, 24 or 32 byte key and set the matching key size. The
    /// peripheral must be disabled.
    pub fn set_key(&self, key: &[u8]) -> Result<(), ErrorCode> {
        let size = match key.len() {
            16 => CR2::KEY_SIZE::Bits128,
            24 => CR2::KEY_SIZE::Bits192,
            32 => CR2::KEY_SIZE::Bits256,
            _ => return Err(ErrorCode::INVAL),
        };
        if self.registers.cr.is_set(CR::EN) {
            return Err(ErrorCode::BUSY);
        }
        self.registers.cr2.modify(size);
        let words = key.len() / 4;
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.key_register(words - 1 - i).set(word);
        }
        Ok(())
    }

    /// Load the CBC initialization vector or the CTR initial counter block.
    pub fn set_iv(&self, iv: &[u8; AES_BLOCK_SIZE]) -> Result<(), ErrorCode> {
        if self.registers.cr.is_set(CR::EN) {
            return Err(ErrorCode::BUSY);
        }
        for (i, chunk) in iv.chunks_exact(4).enumerate() {
            let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.registers.ivr[3 - i].set(word);
        }
        Ok(())
    }

    fn wait_complete(&self) -> Result<(), ErrorCode> {
        wait_until(CONFIG.flag_timeout, || self.registers.sr.is_set(SR::CCF)).inspect_err(
            |_| warn!("aes: computation timeout"),
        )?;
        if self
            .registers
            .sr
            .matches_any(&[SR::RDERR::SET, SR::WRERR::SET])
        {
            self.registers.cr.modify(CR::ERRC::SET);
            return Err(ErrorCode::FAIL);
        }
        self.registers.cr.modify(CR::CCFC::SET);
        Ok(())
    }

    /// Select chaining mode and direction and enable the block. The key and
    /// IV must already be loaded.
    pub fn start(&self, mode: ChainingMode, direction: Direction) -> Result<(), ErrorCode> {
        let chmod = match mode {
            ChainingMode::Ecb => CR::CHMOD::Ecb,
            ChainingMode::Cbc => CR::CHMOD::Cbc,
            ChainingMode::Ctr => CR::CHMOD::Ctr,
        };
        self.registers.cr.modify(CR::EN::CLEAR);
        self.registers
            .cr
            .modify(chmod + CR::MODE::Encrypt + CR::DATATYPE::Byte);

        match (mode, direction) {
            (_, Direction::Encrypt) => self.registers.cr.modify(CR::MODE::Encrypt),
            (ChainingMode::Ctr, Direction::Decrypt) => self.registers.cr.modify(CR::MODE::Decrypt),
            (ChainingMode::Ecb, Direction::Decrypt) => {
                self.registers.cr.modify(CR::MODE::KeyDerivationDecrypt)
            }
            (ChainingMode::Cbc, Direction::Decrypt) => {
                // Derive the decryption key schedule first.
                self.registers.cr.modify(CR::MODE::KeyDerivation + CR::EN::SET);
                let derived = self.wait_complete();
                self.registers.cr.modify(CR::EN::CLEAR);
                derived?;
                self.registers.cr.modify(CR::MODE::Decrypt);
            }
        }
        self.registers.cr.modify(CR::EN::SET);
        debug!("aes: started");
        Ok(())
    }

    /// Run whole blocks through the engine. `input` must be a multiple of
    /// the block size and `output` at least as long.
    pub fn process_blocks(&self, input: &[u8], output: &mut [u8]) -> Result<(), ErrorCode> {
        if input.len() % AES_BLOCK_SIZE != 0 || output.len() < input.len() {
            return Err(ErrorCode::SIZE);
        }
        if !self.registers.cr.is_set(CR::EN) {
            return Err(ErrorCode::OFF);
        }
        for (block_in, block_out) in input
            .chunks_exact(AES_BLOCK_SIZE)
            .zip(output.chunks_exact_mut(AES_BLOCK_SIZE))
        {
            for word in block_in.chunks_exact(4) {
                self.registers
                    .dinr
                    .set(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
            }
            self.wait_complete()?;
            for word in block_out.chunks_exact_mut(4) {
                word.copy_from_slice(&self.registers.doutr.get().to_le_bytes());
            }
        }
        Ok(())
    }

    pub fn stop(&self) {
        self.registers.cr.modify(CR::EN::CLEAR);
    }

    pub fn enable_interrupts(&self, enable: bool) {
        self.registers
            .cr
            .modify(CR::CCFIE.val(enable as u32) + CR::ERRIE.val(enable as u32));
    }

    pub fn enable_dma(&self, enable: bool) {
        self.registers
            .cr
            .modify(CR::DMAINEN.val(enable as u32) + CR::DMAOUTEN.val(enable as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    fn setup() -> (StaticRef<AesRegisters>, Rcc) {
        (fake_registers(), Rcc::with_registers(fake_registers()))
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(AesRegisters, keyr), 0x10);
        assert_eq!(core::mem::offset_of!(AesRegisters, ivr), 0x20);
        assert_eq!(core::mem::offset_of!(AesRegisters, keyr_hi), 0x30);
        assert_eq!(core::mem::offset_of!(AesRegisters, cr2), 0x40);
        assert_eq!(CR::MODE::Decrypt.value, 0x10);
        assert_eq!(CR::CHMOD::Cbc.value, 0x20);
    }

    #[test]
    fn key_words_are_reversed() {
        let (regs, rcc) = setup();
        let aes = Aes::with_registers(regs, &rcc);

        let key: [u8; 16] = [
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ];
        assert_eq!(aes.set_key(&key), Ok(()));
        assert_eq!(regs.keyr[3].get(), 0x2b7e_1516);
        assert_eq!(regs.keyr[0].get(), 0x09cf_4f3c);
        assert_eq!(regs.cr2.read(CR2::KEY_SIZE), 0);

        let key256 = [0x11u8; 32];
        assert_eq!(aes.set_key(&key256), Ok(()));
        assert_eq!(regs.keyr_hi[3].get(), 0x1111_1111);
        assert!(regs.cr2.matches_all(CR2::KEY_SIZE::Bits256));

        assert_eq!(aes.set_key(&key[..15]), Err(ErrorCode::INVAL));

        let mut iv = [0u8; 16];
        iv[0] = 0xA0;
        iv[15] = 0x0F;
        assert_eq!(aes.set_iv(&iv), Ok(()));
        assert_eq!(regs.ivr[3].get(), 0xA000_0000);
        assert_eq!(regs.ivr[0].get(), 0x0000_000F);
    }

    #[test]
    fn cbc_decrypt_derives_key_first() {
        let (regs, rcc) = setup();
        let aes = Aes::with_registers(regs, &rcc);

        assert_eq!(
            aes.start(ChainingMode::Cbc, Direction::Decrypt),
            Err(ErrorCode::BUSY)
        );
        assert!(!regs.cr.is_set(CR::EN));

        regs.sr.set(1);
        assert_eq!(aes.start(ChainingMode::Cbc, Direction::Decrypt), Ok(()));
        assert!(regs.cr.matches_all(CR::MODE::Decrypt + CR::CHMOD::Cbc + CR::EN::SET));
        assert!(regs.cr.is_set(CR::CCFC));

        assert_eq!(aes.start(ChainingMode::Ecb, Direction::Decrypt), Ok(()));
        assert!(regs.cr.matches_all(CR::MODE::KeyDerivationDecrypt));
        assert!(aes.set_key(&[0u8; 16]).is_err());
    }

    #[test]
    fn blocks_only() {
        let (regs, rcc) = setup();
        let aes = Aes::with_registers(regs, &rcc);
        let mut out = [0u8; 32];

        assert_eq!(aes.process_blocks(&[0u8; 16], &mut out), Err(ErrorCode::OFF));
        regs.sr.set(1);
        assert_eq!(aes.start(ChainingMode::Ecb, Direction::Encrypt), Ok(()));
        assert_eq!(aes.process_blocks(&[0u8; 15], &mut out), Err(ErrorCode::SIZE));
        assert_eq!(aes.process_blocks(&[0u8; 48], &mut out), Err(ErrorCode::SIZE));

        let input: [u8; 32] = core::array::from_fn(|i| i as u8);
        assert_eq!(aes.process_blocks(&input, &mut out), Ok(()));
        assert_eq!(regs.dinr.get(), 0x1F1E_1D1C);
        assert_eq!(out, [0u8; 32]);

        regs.sr.set(0b101);
        assert_eq!(aes.process_blocks(&input, &mut out), Err(ErrorCode::FAIL));
        assert!(regs.cr.is_set(CR::ERRC));
    }
}
