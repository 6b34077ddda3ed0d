// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! General-purpose I/Os, F1 style.
//!
//! Each pin is configured by a four-bit nibble (`MODE` then `CNF`) in `CRL`
//! for pins 0..7 or `CRH` for pins 8..15. Pull-up versus pull-down is
//! selected through the output data register.

use crate::config::CONFIG;
use crate::memory_map;
use crate::rcc::{PeripheralClockType, PCLK2};
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{
    register_bitfields, register_structs, Field, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::{ErrorCode, StaticRef};

register_structs! {
    pub GpioRegisters {
        /// Port configuration register low, pins 0..7
        (0x00 => pub crl: ReadWrite<u32, CR::Register>),
        /// Port configuration register high, pins 8..15
        (0x04 => pub crh: ReadWrite<u32, CR::Register>),
        /// Port input data register
        (0x08 => pub idr: ReadOnly<u32, IDR::Register>),
        /// Port output data register
        (0x0C => pub odr: ReadWrite<u32, ODR::Register>),
        /// Port bit set/reset register
        (0x10 => pub bsrr: WriteOnly<u32, BSRR::Register>),
        /// Port bit reset register
        (0x14 => pub brr: WriteOnly<u32, BRR::Register>),
        /// Port configuration lock register
        (0x18 => pub lckr: ReadWrite<u32, LCKR::Register>),
        (0x1C => @END),
    }
}

register_bitfields![u32,
    // CRH uses the same layout for pins 8..15.
    pub CR [
        CNF7 OFFSET(30) NUMBITS(2) [],
        MODE7 OFFSET(28) NUMBITS(2) [],
        CNF6 OFFSET(26) NUMBITS(2) [],
        MODE6 OFFSET(24) NUMBITS(2) [],
        CNF5 OFFSET(22) NUMBITS(2) [],
        MODE5 OFFSET(20) NUMBITS(2) [],
        CNF4 OFFSET(18) NUMBITS(2) [],
        MODE4 OFFSET(16) NUMBITS(2) [],
        CNF3 OFFSET(14) NUMBITS(2) [],
        MODE3 OFFSET(12) NUMBITS(2) [],
        CNF2 OFFSET(10) NUMBITS(2) [],
        MODE2 OFFSET(8) NUMBITS(2) [],
        CNF1 OFFSET(6) NUMBITS(2) [],
        MODE1 OFFSET(4) NUMBITS(2) [],
        CNF0 OFFSET(2) NUMBITS(2) [],
        MODE0 OFFSET(0) NUMBITS(2) []
    ],
    pub IDR [
        IDR OFFSET(0) NUMBITS(16) []
    ],
    pub ODR [
        ODR OFFSET(0) NUMBITS(16) []
    ],
    pub BSRR [
        /// Reset the matching ODR bits
        BR OFFSET(16) NUMBITS(16) [],
        /// Set the matching ODR bits
        BS OFFSET(0) NUMBITS(16) []
    ],
    pub BRR [
        BR OFFSET(0) NUMBITS(16) []
    ],
    pub LCKR [
        /// Lock key
        LCKK OFFSET(16) NUMBITS(1) [],
        LCK OFFSET(0) NUMBITS(16) []
    ]
];

pub const GPIOA_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOA_BASE as *const GpioRegisters) };
pub const GPIOB_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOB_BASE as *const GpioRegisters) };
pub const GPIOC_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOC_BASE as *const GpioRegisters) };
pub const GPIOD_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOD_BASE as *const GpioRegisters) };
pub const GPIOE_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOE_BASE as *const GpioRegisters) };
pub const GPIOF_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOF_BASE as *const GpioRegisters) };
pub const GPIOG_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(memory_map::GPIOG_BASE as *const GpioRegisters) };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpioPort {
    A = 0,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl GpioPort {
    const fn registers(self) -> StaticRef<GpioRegisters> {
        match self {
            GpioPort::A => GPIOA_BASE,
            GpioPort::B => GPIOB_BASE,
            GpioPort::C => GPIOC_BASE,
            GpioPort::D => GPIOD_BASE,
            GpioPort::E => GPIOE_BASE,
            GpioPort::F => GPIOF_BASE,
            GpioPort::G => GPIOG_BASE,
        }
    }

    /// Whether the port is bonded out on the configured package.
    pub const fn is_present(self) -> bool {
        (self as usize) < CONFIG.package.gpio_ports()
    }

    pub const fn clock(self) -> PeripheralClockType {
        PeripheralClockType::APB2(match self {
            GpioPort::A => PCLK2::GPIOA,
            GpioPort::B => PCLK2::GPIOB,
            GpioPort::C => PCLK2::GPIOC,
            GpioPort::D => PCLK2::GPIOD,
            GpioPort::E => PCLK2::GPIOE,
            GpioPort::F => PCLK2::GPIOF,
            GpioPort::G => PCLK2::GPIOG,
        })
    }
}

/// Output slew limit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speed {
    Mhz10 = 0b01,
    Mhz2 = 0b10,
    Mhz50 = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    InputAnalog,
    InputFloating,
    InputPullDown,
    InputPullUp,
    OutputPushPull(Speed),
    OutputOpenDrain(Speed),
    AlternatePushPull(Speed),
    AlternateOpenDrain(Speed),
}

impl Mode {
    /// The `CNF:MODE` nibble.
    fn nibble(self) -> u32 {
        let (cnf, mode) = match self {
            Mode::InputAnalog => (0b00, 0b00),
            Mode::InputFloating => (0b01, 0b00),
            Mode::InputPullDown | Mode::InputPullUp => (0b10, 0b00),
            Mode::OutputPushPull(speed) => (0b00, speed as u32),
            Mode::OutputOpenDrain(speed) => (0b01, speed as u32),
            Mode::AlternatePushPull(speed) => (0b10, speed as u32),
            Mode::AlternateOpenDrain(speed) => (0b11, speed as u32),
        };
        cnf << 2 | mode
    }
}

pub struct Port {
    registers: StaticRef<GpioRegisters>,
}

impl Port {
    /// The port, or `NODEVICE` when the package does not bond it out.
    pub fn new(port: GpioPort) -> Result<Port, ErrorCode> {
        if !port.is_present() {
            return Err(ErrorCode::NODEVICE);
        }
        Ok(Port {
            registers: port.registers(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_registers(registers: StaticRef<GpioRegisters>) -> Port {
        Port { registers }
    }

    pub fn pin(&self, pin: u8) -> Result<Pin, ErrorCode> {
        if pin > 15 {
            return Err(ErrorCode::INVAL);
        }
        Ok(Pin {
            registers: self.registers,
            pin,
        })
    }

    pub fn read(&self) -> u16 {
        self.registers.idr.read(IDR::IDR) as u16
    }

    pub fn write(&self, value: u16) {
        self.registers.odr.write(ODR::ODR.val(value.into()));
    }

    /// Set and reset pins in one write. Set wins for a pin named in both.
    pub fn set_reset(&self, set: u16, reset: u16) {
        self.registers
            .bsrr
            .write(BSRR::BS.val(set.into()) + BSRR::BR.val(reset.into()));
    }

    /// Freeze the configuration of the pins in `mask` until the next reset.
    pub fn lock(&self, mask: u16) -> Result<(), ErrorCode> {
        let mask = LCKR::LCK.val(mask.into());
        self.registers.lckr.write(LCKR::LCKK::SET + mask);
        self.registers.lckr.write(LCKR::LCKK::CLEAR + mask);
        self.registers.lckr.write(LCKR::LCKK::SET + mask);
        let _ = self.registers.lckr.get();
        if self.registers.lckr.is_set(LCKR::LCKK) {
            Ok(())
        } else {
            Err(ErrorCode::FAIL)
        }
    }
}

pub struct Pin {
    registers: StaticRef<GpioRegisters>,
    pin: u8,
}

impl Pin {
    pub fn number(&self) -> u8 {
        self.pin
    }

    fn config_register(&self) -> &ReadWrite<u32, CR::Register> {
        if self.pin < 8 {
            &self.registers.crl
        } else {
            &self.registers.crh
        }
    }

    fn config_field(&self) -> Field<u32, CR::Register> {
        Field::new(0xF, usize::from(self.pin % 8) * 4)
    }

    fn mask(&self) -> u32 {
        1 << self.pin
    }

    pub fn configure(&self, mode: Mode) {
        self.config_register()
            .modify(self.config_field().val(mode.nibble()));
        match mode {
            Mode::InputPullUp => self.set(),
            Mode::InputPullDown => self.clear(),
            _ => {}
        }
    }

    /// Raw `CNF:MODE` nibble currently programmed.
    pub fn configuration(&self) -> u32 {
        self.config_register().read(self.config_field())
    }

    pub fn set(&self) {
        self.registers.bsrr.write(BSRR::BS.val(self.mask()));
    }

    pub fn clear(&self) {
        self.registers.brr.write(BRR::BR.val(self.mask()));
    }

    pub fn toggle(&self) -> bool {
        let was_set = self.read_output();
        if was_set {
            self.clear();
        } else {
            self.set();
        }
        !was_set
    }

    pub fn read(&self) -> bool {
        self.registers.idr.get() & self.mask() != 0
    }

    pub fn read_output(&self) -> bool {
        self.registers.odr.get() & self.mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn register_layout() {
        assert_eq!(core::mem::offset_of!(GpioRegisters, crl), 0x00);
        assert_eq!(core::mem::offset_of!(GpioRegisters, bsrr), 0x10);
        assert_eq!(core::mem::offset_of!(GpioRegisters, lckr), 0x18);
        assert_eq!(CR::CNF7::SET.value, 0xC000_0000);
        assert_eq!(LCKR::LCKK::SET.value, 0x0001_0000);
    }

    #[test]
    fn package_ports() {
        assert!(GpioPort::A.is_present());
        assert!(GpioPort::D.is_present());
        assert_eq!(
            GpioPort::G.is_present(),
            CONFIG.package == crate::config::Package::Zet6
        );
        assert_eq!(GpioPort::C.clock(), PeripheralClockType::APB2(PCLK2::GPIOC));
    }

    #[test]
    fn configure_uses_low_and_high_registers() {
        let regs = fake_registers::<GpioRegisters>();
        let port = Port::with_registers(regs);
        let pa9 = port.pin(9).unwrap();
        pa9.configure(Mode::AlternatePushPull(Speed::Mhz50));
        assert_eq!(regs.crh.get(), 0xB0);
        assert_eq!(pa9.configuration(), 0xB);

        let pa3 = port.pin(3).unwrap();
        pa3.configure(Mode::InputPullUp);
        assert_eq!(regs.crl.get(), 0x8000);
        assert_eq!(port.pin(16).err(), Some(ErrorCode::INVAL));
    }

    #[test]
    fn output_data() {
        let regs = fake_registers::<GpioRegisters>();
        let port = Port::with_registers(regs);
        let pin = port.pin(5).unwrap();
        pin.configure(Mode::OutputPushPull(Speed::Mhz2));
        assert_eq!(regs.crl.get(), 0x0020_0000);

        port.write(1 << 5);
        assert!(pin.read_output());
        assert!(!pin.toggle());
        port.write(0);
        assert!(pin.toggle());
    }

    #[test]
    fn lock_sequence_ends_with_key_set() {
        let regs = fake_registers::<GpioRegisters>();
        let port = Port::with_registers(regs);
        assert_eq!(port.lock(0x0300), Ok(()));
        assert_eq!(regs.lckr.get(), 0x0001_0300);
    }
}
