// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! ARM Cortex-M SysTick peripheral.

use hk32_utilities::registers::interfaces::{Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::{ErrorCode, StaticRef};

register_structs! {
    pub SystickRegisters {
        (0x00 => syst_csr: ReadWrite<u32, ControlAndStatus::Register>),
        (0x04 => syst_rvr: ReadWrite<u32, ReloadValue::Register>),
        (0x08 => syst_cvr: ReadWrite<u32, CurrentValue::Register>),
        (0x0c => syst_calib: ReadOnly<u32, CalibrationValue::Register>),
        (0x10 => @END),
    }
}

register_bitfields![u32,
    ControlAndStatus [
        /// Set when the timer counted to 0 since the last read
        COUNTFLAG       OFFSET(16)  NUMBITS(1),
        /// 0 = HCLK/8, 1 = HCLK
        CLKSOURCE       OFFSET(2)   NUMBITS(1),
        TICKINT         OFFSET(1)   NUMBITS(1),
        ENABLE          OFFSET(0)   NUMBITS(1)
    ],

    ReloadValue [
        RELOAD          OFFSET(0)   NUMBITS(24)
    ],

    CurrentValue [
        CURRENT         OFFSET(0)   NUMBITS(24)
    ],

    CalibrationValue [
        NOREF           OFFSET(31)  NUMBITS(1),
        SKEW            OFFSET(30)  NUMBITS(1),
        TENMS           OFFSET(0)   NUMBITS(24)
    ]
];

const SYSTICK_BASE: StaticRef<SystickRegisters> =
    unsafe { StaticRef::new(0xE000_E010 as *const SystickRegisters) };

/// Largest value the 24-bit reload register takes.
pub const MAX_RELOAD: u32 = 0x00FF_FFFF;

/// The SysTick timer driven from HCLK (or HCLK/8).
pub struct SysTick {
    registers: StaticRef<SystickRegisters>,
    hertz: u32,
    external_clock: bool,
}

impl SysTick {
    /// SysTick clocked from the core clock at `clock_speed` Hz.
    pub const fn new_with_calibration(clock_speed: u32) -> SysTick {
        SysTick {
            registers: SYSTICK_BASE,
            hertz: clock_speed,
            external_clock: false,
        }
    }

    /// SysTick clocked from the HCLK/8 reference. `clock_speed` is the
    /// already divided tick rate.
    pub const fn new_with_external_clock(clock_speed: u32) -> SysTick {
        SysTick {
            registers: SYSTICK_BASE,
            hertz: clock_speed,
            external_clock: true,
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<SystickRegisters>, hertz: u32) -> SysTick {
        SysTick {
            registers,
            hertz,
            external_clock: false,
        }
    }

    fn ticks(&self, us: u32) -> u64 {
        u64::from(self.hertz) * u64::from(us) / 1_000_000
    }

    /// Program the reload value for a period of `us` microseconds.
    pub fn set_timer(&self, us: u32) -> Result<(), ErrorCode> {
        let ticks = self.ticks(us);
        if ticks == 0 || ticks - 1 > u64::from(MAX_RELOAD) {
            return Err(ErrorCode::INVAL);
        }
        self.registers
            .syst_rvr
            .write(ReloadValue::RELOAD.val(ticks as u32 - 1));
        self.registers.syst_cvr.set(0);
        Ok(())
    }

    /// Whether more than `us` microseconds remain before the next wrap.
    pub fn greater_than(&self, us: u32) -> bool {
        let value = u64::from(self.registers.syst_cvr.read(CurrentValue::CURRENT));
        value > self.ticks(us)
    }

    pub fn overflowed(&self) -> bool {
        self.registers.syst_csr.is_set(ControlAndStatus::COUNTFLAG)
    }

    pub fn reset(&self) {
        self.registers.syst_csr.set(0);
        self.registers.syst_rvr.set(0);
        self.registers.syst_cvr.set(0);
    }

    pub fn enable(&self, with_interrupt: bool) {
        let clock_source = if self.external_clock {
            ControlAndStatus::CLKSOURCE::CLEAR
        } else {
            ControlAndStatus::CLKSOURCE::SET
        };
        let tickint = if with_interrupt {
            ControlAndStatus::TICKINT::SET
        } else {
            ControlAndStatus::TICKINT::CLEAR
        };
        self.registers
            .syst_csr
            .write(ControlAndStatus::ENABLE::SET + tickint + clock_source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn one_millisecond_at_72mhz() {
        let regs = fake_registers::<SystickRegisters>();
        let systick = SysTick::with_registers(regs, 72_000_000);
        assert_eq!(systick.set_timer(1_000), Ok(()));
        assert_eq!(regs.syst_rvr.get(), 71_999);
    }

    #[test]
    fn reload_is_24_bits() {
        let systick = SysTick::with_registers(fake_registers(), 72_000_000);
        assert_eq!(systick.set_timer(1_000_000), Err(ErrorCode::INVAL));
        assert_eq!(systick.set_timer(0), Err(ErrorCode::INVAL));
    }

    #[test]
    fn enable_with_interrupt_uses_core_clock() {
        let regs = fake_registers::<SystickRegisters>();
        let systick = SysTick::with_registers(regs, 8_000_000);
        systick.enable(true);
        assert_eq!(regs.syst_csr.get(), 0b111);
        systick.reset();
        assert_eq!(regs.syst_csr.get(), 0);
    }
}
