// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Alternate function I/O: pin remapping, EXTI source selection and the
//! Cortex event output.

use crate::gpio::GpioPort;
use crate::memory_map;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable};
use hk32_utilities::registers::{
    register_bitfields, register_structs, Field, FieldValue, ReadWrite,
};
use hk32_utilities::{ErrorCode, StaticRef};

register_structs! {
    pub AfioRegisters {
        /// Event control register
        (0x00 => pub evcr: ReadWrite<u32, EVCR::Register>),
        /// Remap and debug I/O configuration register
        (0x04 => pub mapr: ReadWrite<u32, MAPR::Register>),
        /// External interrupt configuration registers 1 to 4
        (0x08 => pub exticr: [ReadWrite<u32, EXTICR::Register>; 4]),
        (0x18 => _reserved0),
        /// Remap and debug I/O configuration register 2
        (0x1C => pub mapr2: ReadWrite<u32, MAPR2::Register>),
        (0x20 => @END),
    }
}

register_bitfields![u32,
    pub EVCR [
        /// Event output enable
        EVOE OFFSET(7) NUMBITS(1) [],
        PORT OFFSET(4) NUMBITS(3) [],
        PIN OFFSET(0) NUMBITS(4) []
    ],
    pub MAPR [
        /// Serial wire JTAG configuration, write only
        SWJ_CFG OFFSET(24) NUMBITS(3) [
            Full = 0b000,
            NoNjtrst = 0b001,
            SwdOnly = 0b010,
            Disabled = 0b100
        ],
        ADC2_ETRGREG_REMAP OFFSET(20) NUMBITS(1) [],
        ADC2_ETRGINJ_REMAP OFFSET(19) NUMBITS(1) [],
        ADC1_ETRGREG_REMAP OFFSET(18) NUMBITS(1) [],
        ADC1_ETRGINJ_REMAP OFFSET(17) NUMBITS(1) [],
        TIM5CH4_IREMAP OFFSET(16) NUMBITS(1) [],
        /// OSC_IN/OSC_OUT as PD0/PD1
        PD01_REMAP OFFSET(15) NUMBITS(1) [],
        CAN_REMAP OFFSET(13) NUMBITS(2) [
            PA11PA12 = 0b00,
            PB8PB9 = 0b10,
            PD0PD1 = 0b11
        ],
        TIM4_REMAP OFFSET(12) NUMBITS(1) [],
        TIM3_REMAP OFFSET(10) NUMBITS(2) [
            NoRemap = 0b00,
            Partial = 0b10,
            Full = 0b11
        ],
        TIM2_REMAP OFFSET(8) NUMBITS(2) [
            NoRemap = 0b00,
            Partial1 = 0b01,
            Partial2 = 0b10,
            Full = 0b11
        ],
        TIM1_REMAP OFFSET(6) NUMBITS(2) [
            NoRemap = 0b00,
            Partial = 0b01,
            Full = 0b11
        ],
        USART3_REMAP OFFSET(4) NUMBITS(2) [
            NoRemap = 0b00,
            Partial = 0b01,
            Full = 0b11
        ],
        USART2_REMAP OFFSET(3) NUMBITS(1) [],
        USART1_REMAP OFFSET(2) NUMBITS(1) [],
        I2C1_REMAP OFFSET(1) NUMBITS(1) [],
        SPI1_REMAP OFFSET(0) NUMBITS(1) []
    ],
    pub EXTICR [
        EXTI0 OFFSET(0) NUMBITS(4) [],
        EXTI1 OFFSET(4) NUMBITS(4) [],
        EXTI2 OFFSET(8) NUMBITS(4) [],
        EXTI3 OFFSET(12) NUMBITS(4) []
    ],
    pub MAPR2 [
        FSMC_NADV OFFSET(10) NUMBITS(1) [],
        TIM14_REMAP OFFSET(9) NUMBITS(1) [],
        TIM13_REMAP OFFSET(8) NUMBITS(1) [],
        TIM11_REMAP OFFSET(7) NUMBITS(1) [],
        TIM10_REMAP OFFSET(6) NUMBITS(1) [],
        TIM9_REMAP OFFSET(5) NUMBITS(1) []
    ]
];

pub const AFIO_BASE: StaticRef<AfioRegisters> =
    unsafe { StaticRef::new(memory_map::AFIO_BASE as *const AfioRegisters) };

/// Debug port pin assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwjConfig {
    /// JTAG and SW-DP
    Full,
    /// JTAG and SW-DP without NJTRST
    NoNjtrst,
    /// SW-DP only, JTAG pins released
    SwdOnly,
    /// All debug pins released
    Disabled,
}

pub struct Afio {
    registers: StaticRef<AfioRegisters>,
}

impl Afio {
    pub const fn new() -> Afio {
        Afio {
            registers: AFIO_BASE,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_registers(registers: StaticRef<AfioRegisters>) -> Afio {
        Afio { registers }
    }

    /// Route `port`'s pin `line` to EXTI line `line`.
    pub fn select_exti_source(&self, port: GpioPort, line: u8) -> Result<(), ErrorCode> {
        if line > 15 {
            return Err(ErrorCode::INVAL);
        }
        let field = Field::<u32, EXTICR::Register>::new(0xF, usize::from(line % 4) * 4);
        self.registers.exticr[usize::from(line / 4)].modify(field.val(port as u32));
        Ok(())
    }

    pub fn exti_source(&self, line: u8) -> Option<u8> {
        if line > 15 {
            return None;
        }
        let field = Field::<u32, EXTICR::Register>::new(0xF, usize::from(line % 4) * 4);
        Some(self.registers.exticr[usize::from(line / 4)].read(field) as u8)
    }

    /// Drive the Cortex EVENTOUT signal on the given pin.
    pub fn enable_event_output(&self, port: GpioPort, pin: u8) -> Result<(), ErrorCode> {
        if pin > 15 {
            return Err(ErrorCode::INVAL);
        }
        self.registers.evcr.modify(
            EVCR::PORT.val(port as u32) + EVCR::PIN.val(pin.into()) + EVCR::EVOE::SET,
        );
        Ok(())
    }

    pub fn disable_event_output(&self) {
        self.registers.evcr.modify(EVCR::EVOE::CLEAR);
    }

    /// `SWJ_CFG` reads back as zero, so it is written next to the current
    /// remap bits.
    pub fn set_swj_config(&self, config: SwjConfig) {
        let swj = match config {
            SwjConfig::Full => MAPR::SWJ_CFG::Full,
            SwjConfig::NoNjtrst => MAPR::SWJ_CFG::NoNjtrst,
            SwjConfig::SwdOnly => MAPR::SWJ_CFG::SwdOnly,
            SwjConfig::Disabled => MAPR::SWJ_CFG::Disabled,
        };
        self.registers.mapr.modify(swj);
    }

    /// Apply remap fields, e.g. `MAPR::USART1_REMAP::SET`.
    pub fn remap(&self, value: FieldValue<u32, MAPR::Register>) {
        self.registers.mapr.modify(value);
    }

    pub fn remap2(&self, value: FieldValue<u32, MAPR2::Register>) {
        self.registers.mapr2.modify(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(AfioRegisters, exticr), 0x08);
        assert_eq!(core::mem::offset_of!(AfioRegisters, mapr2), 0x1C);
        assert_eq!(MAPR::SWJ_CFG::SwdOnly.value, 0x0200_0000);
        assert_eq!(MAPR::CAN_REMAP::PB8PB9.value, 0x4000);
    }

    #[test]
    fn exti_source_nibbles() {
        let regs: StaticRef<AfioRegisters> = fake_registers();
        let afio = Afio::with_registers(regs);

        assert_eq!(afio.select_exti_source(GpioPort::C, 13), Ok(()));
        assert_eq!(regs.exticr[3].get(), 0x20);
        assert_eq!(afio.select_exti_source(GpioPort::B, 0), Ok(()));
        assert_eq!(regs.exticr[0].read(EXTICR::EXTI0), 1);
        assert_eq!(afio.exti_source(13), Some(GpioPort::C as u8));
        assert_eq!(afio.select_exti_source(GpioPort::A, 16), Err(ErrorCode::INVAL));
    }

    #[test]
    fn remap_keeps_other_bits() {
        let regs: StaticRef<AfioRegisters> = fake_registers();
        let afio = Afio::with_registers(regs);

        afio.remap(MAPR::USART1_REMAP::SET);
        afio.remap(MAPR::TIM3_REMAP::Partial);
        afio.set_swj_config(SwjConfig::SwdOnly);
        assert_eq!(regs.mapr.get(), 0x0200_0804);

        assert_eq!(afio.enable_event_output(GpioPort::B, 5), Ok(()));
        assert_eq!(regs.evcr.get(), 0x95);
        afio.disable_event_output();
        assert_eq!(regs.evcr.get(), 0x15);
    }
}
