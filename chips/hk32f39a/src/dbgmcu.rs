// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Debug support: device identification and peripheral freeze while the
//! core is halted.

use crate::memory_map;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadOnly, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub DbgmcuRegisters {
        (0x00 => pub idcode: ReadOnly<u32, IDCODE::Register>),
        (0x04 => pub cr: ReadWrite<u32, CR::Register>),
        (0x08 => @END),
    }
}

register_bitfields![u32,
    pub IDCODE [
        REV_ID OFFSET(16) NUMBITS(16) [],
        DEV_ID OFFSET(0) NUMBITS(12) []
    ],
    pub CR [
        DBG_TIM7_STOP OFFSET(20) NUMBITS(1) [],
        DBG_TIM6_STOP OFFSET(19) NUMBITS(1) [],
        DBG_TIM5_STOP OFFSET(18) NUMBITS(1) [],
        DBG_TIM8_STOP OFFSET(17) NUMBITS(1) [],
        DBG_I2C2_SMBUS_TIMEOUT OFFSET(16) NUMBITS(1) [],
        DBG_I2C1_SMBUS_TIMEOUT OFFSET(15) NUMBITS(1) [],
        DBG_CAN1_STOP OFFSET(14) NUMBITS(1) [],
        DBG_TIM4_STOP OFFSET(13) NUMBITS(1) [],
        DBG_TIM3_STOP OFFSET(12) NUMBITS(1) [],
        DBG_TIM2_STOP OFFSET(11) NUMBITS(1) [],
        DBG_TIM1_STOP OFFSET(10) NUMBITS(1) [],
        DBG_WWDG_STOP OFFSET(9) NUMBITS(1) [],
        DBG_IWDG_STOP OFFSET(8) NUMBITS(1) [],
        /// Trace pin assignment
        TRACE_MODE OFFSET(6) NUMBITS(2) [
            Async = 0b00,
            Sync1 = 0b01,
            Sync2 = 0b10,
            Sync4 = 0b11
        ],
        TRACE_IOEN OFFSET(5) NUMBITS(1) [],
        /// Keep the debug connection alive in standby
        DBG_STANDBY OFFSET(2) NUMBITS(1) [],
        DBG_STOP OFFSET(1) NUMBITS(1) [],
        DBG_SLEEP OFFSET(0) NUMBITS(1) []
    ]
];

pub const DBGMCU_BASE: StaticRef<DbgmcuRegisters> =
    unsafe { StaticRef::new(memory_map::DBGMCU_BASE as *const DbgmcuRegisters) };

pub struct Dbgmcu {
    registers: StaticRef<DbgmcuRegisters>,
}

impl Dbgmcu {
    pub const fn new() -> Dbgmcu {
        Dbgmcu {
            registers: DBGMCU_BASE,
        }
    }

    pub fn device_id(&self) -> u16 {
        self.registers.idcode.read(IDCODE::DEV_ID) as u16
    }

    pub fn revision_id(&self) -> u16 {
        self.registers.idcode.read(IDCODE::REV_ID) as u16
    }

    /// Keep the debugger attached through sleep, stop and standby.
    pub fn enable_low_power_debug(&self) {
        self.registers
            .cr
            .modify(CR::DBG_SLEEP::SET + CR::DBG_STOP::SET + CR::DBG_STANDBY::SET);
    }

    /// Freeze both watchdogs while the core is halted.
    pub fn freeze_watchdogs(&self) {
        self.registers
            .cr
            .modify(CR::DBG_IWDG_STOP::SET + CR::DBG_WWDG_STOP::SET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    #[test]
    fn freeze_bits() {
        let registers: StaticRef<DbgmcuRegisters> = fake_registers();
        let dbg = Dbgmcu { registers };

        dbg.enable_low_power_debug();
        dbg.freeze_watchdogs();
        assert_eq!(registers.cr.get(), 0x0307);
        assert_eq!(dbg.device_id(), 0);
    }
}
