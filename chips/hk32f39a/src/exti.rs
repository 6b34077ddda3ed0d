// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! External interrupt/event controller.
//!
//! Lines 0 to 15 follow the GPIO pin selected in `AFIO_EXTICRx`, the
//! remaining lines are wired to internal sources.

use crate::memory_map;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, Field, ReadWrite};
use hk32_utilities::{trace, ErrorCode, StaticRef};

/// Number of EXTI lines.
pub const EXTI_LINES: u8 = 20;
/// Programmable voltage detector output.
pub const PVD_LINE: u8 = 16;
/// RTC alarm.
pub const RTC_ALARM_LINE: u8 = 17;
/// USB wake-up from suspend.
pub const USB_WAKEUP_LINE: u8 = 18;

register_structs! {
    pub ExtiRegisters {
        /// Interrupt mask register
        (0x00 => pub imr: ReadWrite<u32, LINE::Register>),
        /// Event mask register
        (0x04 => pub emr: ReadWrite<u32, LINE::Register>),
        /// Rising trigger selection register
        (0x08 => pub rtsr: ReadWrite<u32, LINE::Register>),
        /// Falling trigger selection register
        (0x0C => pub ftsr: ReadWrite<u32, LINE::Register>),
        /// Software interrupt event register
        (0x10 => pub swier: ReadWrite<u32, LINE::Register>),
        /// Pending register, write 1 to clear
        (0x14 => pub pr: ReadWrite<u32, LINE::Register>),
        (0x18 => @END),
    }
}

register_bitfields![u32,
    /// One bit per line in every EXTI register
    pub LINE [
        LINES OFFSET(0) NUMBITS(20) []
    ]
];

pub const EXTI_BASE: StaticRef<ExtiRegisters> =
    unsafe { StaticRef::new(memory_map::EXTI_BASE as *const ExtiRegisters) };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Rising,
    Falling,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineMode {
    Interrupt,
    Event,
}

pub struct Exti {
    registers: StaticRef<ExtiRegisters>,
}

fn line_bit(line: u8) -> Result<Field<u32, LINE::Register>, ErrorCode> {
    if line < EXTI_LINES {
        Ok(Field::new(1, line.into()))
    } else {
        Err(ErrorCode::INVAL)
    }
}

impl Exti {
    pub const fn new() -> Exti {
        Exti {
            registers: EXTI_BASE,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_registers(registers: StaticRef<ExtiRegisters>) -> Exti {
        Exti { registers }
    }

    /// Return all lines to the reset state.
    pub fn deinit(&self) {
        self.registers.imr.set(0);
        self.registers.emr.set(0);
        self.registers.rtsr.set(0);
        self.registers.ftsr.set(0);
        self.registers.pr.write(LINE::LINES.val(0xF_FFFF));
    }

    /// Program the edge detectors of `line` and unmask it for the given mode.
    /// The other mask is cleared.
    pub fn configure_line(
        &self,
        line: u8,
        mode: LineMode,
        trigger: Trigger,
    ) -> Result<(), ErrorCode> {
        let bit = line_bit(line)?;
        self.registers.imr.modify(bit.val(0));
        self.registers.emr.modify(bit.val(0));
        self.registers.rtsr.modify(bit.val(0));
        self.registers.ftsr.modify(bit.val(0));

        match trigger {
            Trigger::Rising => self.registers.rtsr.modify(bit.val(1)),
            Trigger::Falling => self.registers.ftsr.modify(bit.val(1)),
            Trigger::Both => {
                self.registers.rtsr.modify(bit.val(1));
                self.registers.ftsr.modify(bit.val(1));
            }
        }
        match mode {
            LineMode::Interrupt => self.registers.imr.modify(bit.val(1)),
            LineMode::Event => self.registers.emr.modify(bit.val(1)),
        }
        trace!("exti: line {} configured", line);
        Ok(())
    }

    pub fn unmask_interrupt(&self, line: u8) -> Result<(), ErrorCode> {
        self.registers.imr.modify(line_bit(line)?.val(1));
        Ok(())
    }

    pub fn mask_interrupt(&self, line: u8) -> Result<(), ErrorCode> {
        self.registers.imr.modify(line_bit(line)?.val(0));
        Ok(())
    }

    pub fn is_interrupt_unmasked(&self, line: u8) -> bool {
        line_bit(line).is_ok_and(|bit| self.registers.imr.read(bit) != 0)
    }

    pub fn unmask_event(&self, line: u8) -> Result<(), ErrorCode> {
        self.registers.emr.modify(line_bit(line)?.val(1));
        Ok(())
    }

    pub fn mask_event(&self, line: u8) -> Result<(), ErrorCode> {
        self.registers.emr.modify(line_bit(line)?.val(0));
        Ok(())
    }

    /// Raise the line from software.
    pub fn generate_swi(&self, line: u8) -> Result<(), ErrorCode> {
        self.registers.swier.modify(line_bit(line)?.val(1));
        Ok(())
    }

    pub fn is_pending(&self, line: u8) -> bool {
        line_bit(line).is_ok_and(|bit| self.registers.pr.read(bit) != 0)
    }

    pub fn clear_pending(&self, line: u8) -> Result<(), ErrorCode> {
        // Write-1-to-clear, a read-modify-write would clear other lines.
        self.registers.pr.write(line_bit(line)?.val(1));
        Ok(())
    }

    /// Acknowledge every pending line and return the set as a bit mask.
    pub fn handle_interrupt(&self) -> u32 {
        let pending = self.registers.pr.read(LINE::LINES);
        if pending != 0 {
            self.registers.pr.write(LINE::LINES.val(pending));
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(ExtiRegisters, swier), 0x10);
        assert_eq!(core::mem::offset_of!(ExtiRegisters, pr), 0x14);
    }

    #[test]
    fn configure_both_edges() {
        let regs: StaticRef<ExtiRegisters> = fake_registers();
        let exti = Exti::with_registers(regs);

        regs.emr.set(1 << 3);
        assert_eq!(exti.configure_line(3, LineMode::Interrupt, Trigger::Both), Ok(()));
        assert_eq!(regs.imr.get(), 1 << 3);
        assert_eq!(regs.emr.get(), 0);
        assert_eq!(regs.rtsr.get(), 1 << 3);
        assert_eq!(regs.ftsr.get(), 1 << 3);
        assert!(exti.is_interrupt_unmasked(3));

        assert_eq!(exti.configure_line(PVD_LINE, LineMode::Event, Trigger::Falling), Ok(()));
        assert_eq!(regs.emr.get(), 1 << 16);
        assert_eq!(regs.rtsr.get(), 1 << 3);
        assert_eq!(
            exti.configure_line(EXTI_LINES, LineMode::Event, Trigger::Rising),
            Err(ErrorCode::INVAL)
        );
    }

    #[test]
    fn pending_lines() {
        let regs: StaticRef<ExtiRegisters> = fake_registers();
        let exti = Exti::with_registers(regs);

        assert_eq!(exti.generate_swi(RTC_ALARM_LINE), Ok(()));
        assert_eq!(regs.swier.get(), 1 << 17);

        regs.pr.set((1 << 5) | (1 << 17));
        assert!(exti.is_pending(5));
        assert_eq!(exti.clear_pending(5), Ok(()));
        // RAM-backed, so the write lands as written.
        assert_eq!(regs.pr.get(), 1 << 5);
        regs.pr.set((1 << 5) | (1 << 17));
        assert_eq!(exti.handle_interrupt(), (1 << 5) | (1 << 17));
        assert!(!exti.is_pending(EXTI_LINES));
    }
}
