// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! True random number generator

use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, HCLK2};
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{warn, ErrorCode, StaticRef};

/// Polls of `SR.DRDY` before giving up on a sample.
const RNG_TIMEOUT: u32 = 0x0001_0000;

register_structs! {
    pub RngRegisters {
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        (0x04 => pub sr: ReadWrite<u32, SR::Register>),
        (0x08 => pub dr: ReadOnly<u32, DR::Register>),
        (0x0C => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Interrupt enable
        IE OFFSET(3) NUMBITS(1) [],
        /// Random number generator enable
        RNGEN OFFSET(2) NUMBITS(1) []
    ],
    pub SR [
        /// Seed error interrupt status
        SEIS OFFSET(6) NUMBITS(1) [],
        /// Clock error interrupt status
        CEIS OFFSET(5) NUMBITS(1) [],
        /// Seed error current status
        SECS OFFSET(2) NUMBITS(1) [],
        /// Clock error current status
        CECS OFFSET(1) NUMBITS(1) [],
        /// Data ready
        DRDY OFFSET(0) NUMBITS(1) []
    ],
    pub DR [
        RNDATA OFFSET(0) NUMBITS(32) []
    ]
];

pub const RNG_BASE: StaticRef<RngRegisters> =
    unsafe { StaticRef::new(memory_map::RNG_BASE as *const RngRegisters) };

pub struct Rng<'a> {
    registers: StaticRef<RngRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Rng<'a> {
    pub const fn new(rcc: &'a Rcc) -> Rng<'a> {
        Rng {
            registers: RNG_BASE,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::RNG), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<RngRegisters>, rcc: &'a Rcc) -> Rng<'a> {
        Rng {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::RNG), rcc),
        }
    }

    pub fn is_enabled_clock(&self) -> bool {
        self.clock.is_enabled()
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn disable_clock(&self) {
        self.clock.disable();
    }

    pub fn enable(&self) {
        self.registers.cr.modify(CR::RNGEN::SET);
    }

    /// Stop the generator and drop a pending seed error.
    pub fn disable(&self) {
        self.registers.cr.modify(CR::IE::CLEAR + CR::RNGEN::CLEAR);
        self.registers.sr.modify(SR::SEIS::CLEAR);
    }

    pub fn enable_interrupt(&self) {
        self.registers.cr.modify(CR::IE::SET);
    }

    pub fn disable_interrupt(&self) {
        self.registers.cr.modify(CR::IE::CLEAR);
    }

    /// The RNG clock is too slow compared to HCLK.
    pub fn clock_error(&self) -> bool {
        self.registers.sr.is_set(SR::CECS)
    }

    /// Throw away the current sample and restart the generator after a
    /// seed error.
    fn recover_seed_error(&self) {
        self.registers.sr.modify(SR::SEIS::CLEAR);
        let _ = self.registers.dr.get();
        self.registers.cr.modify(CR::RNGEN::CLEAR);
        self.registers.cr.modify(CR::RNGEN::SET);
    }

    /// Wait for one 32-bit sample.
    ///
    /// A seed error restarts the generator and yields `FAIL`, the caller may
    /// retry. A clock error also yields `FAIL` and clears its flag.
    pub fn get_u32(&self) -> Result<u32, ErrorCode> {
        wait_until(RNG_TIMEOUT, || {
            self.registers
                .sr
                .matches_any(&[SR::DRDY::SET, SR::SEIS::SET, SR::CEIS::SET])
        })?;
        if self.registers.sr.is_set(SR::SEIS) {
            warn!("rng: seed error");
            self.recover_seed_error();
            return Err(ErrorCode::FAIL);
        }
        if self.registers.sr.is_set(SR::CEIS) {
            warn!("rng: clock error");
            self.registers.sr.modify(SR::CEIS::CLEAR);
            return Err(ErrorCode::FAIL);
        }
        Ok(self.registers.dr.read(DR::RNDATA))
    }

    /// Interrupt service. Returns a sample when one is ready.
    pub fn handle_interrupt(&self) -> Option<u32> {
        if self.registers.sr.is_set(SR::SEIS) {
            self.recover_seed_error();
            None
        } else if self.registers.sr.is_set(SR::CEIS) {
            self.registers.sr.modify(SR::CEIS::CLEAR);
            None
        } else if self.registers.sr.is_set(SR::DRDY) {
            Some(self.registers.dr.read(DR::RNDATA))
        } else {
            None
        }
    }
}
