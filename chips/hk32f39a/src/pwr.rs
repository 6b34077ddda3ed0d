// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Power control.
//!
//! STM32F103 compatible `CR`/`CSR` plus HK32 registers for shutdown mode,
//! wake-up pin polarity, POR/PDR configuration and DAC low-power hold.

use crate::memory_map;
use crate::rcc::{PeripheralClock, PeripheralClockType, Rcc, PCLK1};
use cortexm3::scb::Scb;
use cortexm3::support;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::{debug, ErrorCode, StaticRef};

register_structs! {
    pub PwrRegisters {
        /// Power control register
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Power control/status register
        (0x04 => pub csr: ReadWrite<u32, CSR::Register>),
        (0x08 => _reserved0),
        /// Shutdown control and status
        (0x30 => pub csr2: ReadWrite<u32, CSR2::Register>),
        /// Wake-up pin polarity
        (0x34 => pub wup_pol: ReadWrite<u32, WUP_POL::Register>),
        (0x38 => _reserved1),
        /// POR/PDR configuration, written through an unlock sequence
        (0x3C => pub porpdr_cfg: ReadWrite<u32, PORPDR_CFG::Register>),
        /// DAC output hold in low-power modes
        (0x40 => pub dac_lp_ctl: ReadWrite<u32, DAC_LP_CTL::Register>),
        (0x44 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// Disable backup domain write protection
        DBP OFFSET(8) NUMBITS(1) [],
        /// PVD level selection
        PLS OFFSET(5) NUMBITS(3) [],
        /// Power voltage detector enable
        PVDE OFFSET(4) NUMBITS(1) [],
        /// Clear standby flag
        CSBF OFFSET(3) NUMBITS(1) [],
        /// Clear wake-up flag
        CWUF OFFSET(2) NUMBITS(1) [],
        /// Power down deepsleep
        PDDS OFFSET(1) NUMBITS(1) [],
        /// Low-power deepsleep
        LPDS OFFSET(0) NUMBITS(1) []
    ],
    pub CSR [
        EWUP3 OFFSET(10) NUMBITS(1) [],
        EWUP2 OFFSET(9) NUMBITS(1) [],
        EWUP1 OFFSET(8) NUMBITS(1) [],
        /// PVD output
        PVDO OFFSET(2) NUMBITS(1) [],
        /// Standby flag
        SBF OFFSET(1) NUMBITS(1) [],
        /// Wake-up flag
        WUF OFFSET(0) NUMBITS(1) []
    ],
    pub CSR2 [
        /// RTC wake-up from shutdown
        EWUP_RTC OFFSET(15) NUMBITS(1) [],
        /// Clear shutdown wake-up flag
        CSWUF OFFSET(9) NUMBITS(1) [],
        /// Clear shutdown flag
        CSHUTF OFFSET(8) NUMBITS(1) [],
        /// Shutdown instead of standby on deepsleep
        SHDS OFFSET(7) NUMBITS(1) [],
        /// Power down the backup domain in shutdown
        BKPPDS OFFSET(6) NUMBITS(1) [],
        /// Woken up from shutdown
        SWUF OFFSET(1) NUMBITS(1) [],
        /// Shutdown was entered
        SHUTF OFFSET(0) NUMBITS(1) []
    ],
    pub WUP_POL [
        WUPOL3 OFFSET(2) NUMBITS(1) [],
        WUPOL2 OFFSET(1) NUMBITS(1) [],
        WUPOL1 OFFSET(0) NUMBITS(1) []
    ],
    pub PORPDR_CFG [
        KEY OFFSET(8) NUMBITS(8) [],
        /// PDR off in standby and shutdown
        PDR_OFF OFFSET(0) NUMBITS(1) []
    ],
    pub DAC_LP_CTL [
        DAC2_ALP OFFSET(8) NUMBITS(1) [],
        DAC1_ALP OFFSET(0) NUMBITS(1) []
    ]
];

pub const PWR_BASE: StaticRef<PwrRegisters> =
    unsafe { StaticRef::new(memory_map::PWR_BASE as *const PwrRegisters) };

/// Values written to `PORPDR_CFG`, in order, to turn the PDR off in
/// standby and shutdown.
const PORPDR_UNLOCK: [u32; 9] = [
    0x0000, 0x5500, 0xAA00, 0x5A00, 0xA500, 0xC800, 0x8C00, 0x6900, 0x9601,
];

/// PVD threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PvdLevel {
    V2_2 = 0,
    V2_3 = 1,
    V2_4 = 2,
    V2_5 = 3,
    V2_6 = 4,
    V2_7 = 5,
    V2_8 = 6,
    V2_9 = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regulator {
    On,
    LowPower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopEntry {
    Wfi,
    Wfe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeupPin {
    Pin1,
    Pin2,
    Pin3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeupPolarity {
    Rising,
    Falling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwrFlag {
    WakeUp,
    Standby,
    PvdOutput,
    Shutdown,
    ShutdownWakeUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DacChannel {
    Dac1,
    Dac2,
}

pub struct Pwr<'a> {
    registers: StaticRef<PwrRegisters>,
    clock: PeripheralClock<'a>,
}

impl<'a> Pwr<'a> {
    pub const fn new(rcc: &'a Rcc) -> Pwr<'a> {
        Pwr {
            registers: PWR_BASE,
            clock: PeripheralClock::new(PeripheralClockType::APB1(PCLK1::PWR), rcc),
        }
    }

    #[cfg(test)]
    fn with_registers(registers: StaticRef<PwrRegisters>, rcc: &'a Rcc) -> Pwr<'a> {
        Pwr {
            registers,
            clock: PeripheralClock::new(PeripheralClockType::APB1(PCLK1::PWR), rcc),
        }
    }

    pub fn enable_clock(&self) {
        self.clock.enable();
    }

    pub fn is_enabled_clock(&self) -> bool {
        self.clock.is_enabled()
    }

    /// Pulse the PWR reset line.
    pub fn deinit(&self) {
        self.clock.reset();
    }

    /// Allow writes to the RTC, backup registers and `RCC_BDCR`.
    pub fn enable_backup_access(&self) {
        self.registers.cr.modify(CR::DBP::SET);
    }

    pub fn disable_backup_access(&self) {
        self.registers.cr.modify(CR::DBP::CLEAR);
    }

    pub fn set_pvd_level(&self, level: PvdLevel) {
        self.registers.cr.modify(CR::PLS.val(level as u32));
    }

    pub fn enable_pvd(&self, enable: bool) {
        self.registers.cr.modify(CR::PVDE.val(enable as u32));
    }

    pub fn enable_wakeup_pin(&self, pin: WakeupPin, enable: bool) {
        let value = enable as u32;
        match pin {
            WakeupPin::Pin1 => self.registers.csr.modify(CSR::EWUP1.val(value)),
            WakeupPin::Pin2 => self.registers.csr.modify(CSR::EWUP2.val(value)),
            WakeupPin::Pin3 => self.registers.csr.modify(CSR::EWUP3.val(value)),
        }
    }

    pub fn set_wakeup_polarity(&self, pin: WakeupPin, polarity: WakeupPolarity) {
        let falling = (polarity == WakeupPolarity::Falling) as u32;
        match pin {
            WakeupPin::Pin1 => self.registers.wup_pol.modify(WUP_POL::WUPOL1.val(falling)),
            WakeupPin::Pin2 => self.registers.wup_pol.modify(WUP_POL::WUPOL2.val(falling)),
            WakeupPin::Pin3 => self.registers.wup_pol.modify(WUP_POL::WUPOL3.val(falling)),
        }
    }

    /// Let the RTC wake the chip from shutdown.
    pub fn enable_rtc_wakeup(&self, enable: bool) {
        self.registers.csr2.modify(CSR2::EWUP_RTC.val(enable as u32));
    }

    /// Deepsleep with `PDDS` set enters shutdown instead of standby.
    pub fn enable_shutdown(&self, enable: bool) {
        self.registers.csr2.modify(CSR2::SHDS.val(enable as u32));
    }

    /// Remove power from the backup domain and RTC in shutdown.
    pub fn enable_backup_power_down(&self, enable: bool) {
        self.registers.csr2.modify(CSR2::BKPPDS.val(enable as u32));
    }

    /// Keep the DAC output driven in low-power modes instead of high-Z.
    pub fn hold_dac_output(&self, channel: DacChannel, enable: bool) {
        let value = enable as u32;
        match channel {
            DacChannel::Dac1 => self.registers.dac_lp_ctl.modify(DAC_LP_CTL::DAC1_ALP.val(value)),
            DacChannel::Dac2 => self.registers.dac_lp_ctl.modify(DAC_LP_CTL::DAC2_ALP.val(value)),
        }
    }

    /// Switch the power-down reset off in standby and shutdown. The register
    /// only accepts the value after the full key sequence.
    pub fn disable_pdr_in_standby(&self, disable: bool) {
        if disable {
            for key in PORPDR_UNLOCK {
                self.registers.porpdr_cfg.set(key);
            }
        } else {
            self.registers.porpdr_cfg.set(0);
        }
    }

    pub fn is_flag_set(&self, flag: PwrFlag) -> bool {
        match flag {
            PwrFlag::WakeUp => self.registers.csr.is_set(CSR::WUF),
            PwrFlag::Standby => self.registers.csr.is_set(CSR::SBF),
            PwrFlag::PvdOutput => self.registers.csr.is_set(CSR::PVDO),
            PwrFlag::Shutdown => self.registers.csr2.is_set(CSR2::SHUTF),
            PwrFlag::ShutdownWakeUp => self.registers.csr2.is_set(CSR2::SWUF),
        }
    }

    pub fn clear_wakeup_flag(&self) {
        self.registers.cr.modify(CR::CWUF::SET);
    }

    pub fn clear_standby_flag(&self) {
        self.registers.cr.modify(CR::CSBF::SET);
    }

    /// `PVDO` follows the supply and cannot be cleared.
    pub fn clear_flag(&self, flag: PwrFlag) -> Result<(), ErrorCode> {
        match flag {
            PwrFlag::WakeUp => self.clear_wakeup_flag(),
            PwrFlag::Standby => self.clear_standby_flag(),
            PwrFlag::PvdOutput => return Err(ErrorCode::INVAL),
            PwrFlag::Shutdown => self.registers.csr2.modify(CSR2::CSHUTF::SET),
            PwrFlag::ShutdownWakeUp => self.registers.csr2.modify(CSR2::CSWUF::SET),
        }
        Ok(())
    }

    fn prepare_stop(&self, regulator: Regulator) {
        let lpds = match regulator {
            Regulator::On => CR::LPDS::CLEAR,
            Regulator::LowPower => CR::LPDS::SET,
        };
        self.registers.cr.modify(CR::PDDS::CLEAR + lpds);
    }

    fn prepare_standby(&self) {
        self.registers.cr.modify(CR::CWUF::SET);
        self.registers.cr.modify(CR::PDDS::SET);
    }

    fn prepare_shutdown(&self, backup_power_down: bool) {
        self.prepare_standby();
        self.registers.csr2.modify(CSR2::CSWUF::SET);
        self.registers.csr2.modify(CSR2::CSHUTF::SET);
        self.registers.csr2.modify(CSR2::SHDS::SET);
        if backup_power_down {
            self.registers.csr2.modify(CSR2::BKPPDS::SET);
        }
    }

    /// Enter STOP and return after wake-up with SLEEPDEEP cleared again.
    pub fn enter_stop(&self, scb: &Scb, regulator: Regulator, entry: StopEntry) {
        self.prepare_stop(regulator);
        scb.set_sleepdeep();
        debug!("pwr: entering stop");
        unsafe {
            match entry {
                StopEntry::Wfi => support::wfi(),
                StopEntry::Wfe => {
                    // Consume a stale event first so the second wfe sleeps.
                    support::sev();
                    support::wfe();
                    support::wfe();
                }
            }
        }
        scb.unset_sleepdeep();
    }

    /// Enter STANDBY. Wake-up goes through reset.
    pub fn enter_standby(&self, scb: &Scb) {
        self.prepare_standby();
        scb.set_sleepdeep();
        unsafe { support::wfi() }
    }

    /// Enter SHUTDOWN, the lowest power mode. Wake-up goes through reset.
    pub fn enter_shutdown(&self, scb: &Scb, backup_power_down: bool) {
        self.prepare_shutdown(backup_power_down);
        scb.set_sleepdeep();
        unsafe { support::wfi() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;

    fn pwr_regs() -> StaticRef<PwrRegisters> {
        fake_registers()
    }

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(PwrRegisters, csr2), 0x30);
        assert_eq!(core::mem::offset_of!(PwrRegisters, wup_pol), 0x34);
        assert_eq!(core::mem::offset_of!(PwrRegisters, porpdr_cfg), 0x3C);
        assert_eq!(core::mem::offset_of!(PwrRegisters, dac_lp_ctl), 0x40);
        assert_eq!(CR::DBP::SET.value, 0x100);
    }

    #[test]
    fn pvd_and_backup_access() {
        let regs = pwr_regs();
        let rcc = Rcc::with_registers(fake_registers());
        let pwr = Pwr::with_registers(regs, &rcc);

        pwr.enable_backup_access();
        pwr.set_pvd_level(PvdLevel::V2_9);
        pwr.enable_pvd(true);
        assert_eq!(regs.cr.get(), 0x100 | 0xE0 | 0x10);
        pwr.set_pvd_level(PvdLevel::V2_2);
        assert_eq!(regs.cr.read(CR::PLS), 0);
        assert!(regs.cr.is_set(CR::DBP));
    }

    #[test]
    fn wakeup_pins() {
        let regs = pwr_regs();
        let rcc = Rcc::with_registers(fake_registers());
        let pwr = Pwr::with_registers(regs, &rcc);

        pwr.enable_wakeup_pin(WakeupPin::Pin2, true);
        pwr.set_wakeup_polarity(WakeupPin::Pin3, WakeupPolarity::Falling);
        assert_eq!(regs.csr.get(), 1 << 9);
        assert_eq!(regs.wup_pol.get(), 1 << 2);
        pwr.set_wakeup_polarity(WakeupPin::Pin3, WakeupPolarity::Rising);
        assert_eq!(regs.wup_pol.get(), 0);
    }

    #[test]
    fn flags() {
        let regs = pwr_regs();
        let rcc = Rcc::with_registers(fake_registers());
        let pwr = Pwr::with_registers(regs, &rcc);

        regs.csr.write(CSR::SBF::SET);
        assert!(pwr.is_flag_set(PwrFlag::Standby));
        assert!(!pwr.is_flag_set(PwrFlag::WakeUp));
        assert_eq!(pwr.clear_flag(PwrFlag::Standby), Ok(()));
        assert!(regs.cr.is_set(CR::CSBF));
        assert_eq!(pwr.clear_flag(PwrFlag::PvdOutput), Err(ErrorCode::INVAL));
        assert_eq!(pwr.clear_flag(PwrFlag::Shutdown), Ok(()));
        assert!(regs.csr2.is_set(CSR2::CSHUTF));
    }

    #[test]
    fn low_power_preparation() {
        let regs = pwr_regs();
        let rcc = Rcc::with_registers(fake_registers());
        let pwr = Pwr::with_registers(regs, &rcc);

        regs.cr.write(CR::PDDS::SET + CR::DBP::SET);
        pwr.prepare_stop(Regulator::LowPower);
        assert_eq!(regs.cr.get(), 0x101);

        pwr.prepare_shutdown(true);
        assert!(regs.cr.is_set(CR::PDDS));
        assert!(regs.cr.is_set(CR::CWUF));
        assert!(regs.csr2.is_set(CSR2::SHDS));
        assert!(regs.csr2.is_set(CSR2::BKPPDS));
    }

    #[test]
    fn pdr_unlock_ends_on_enable_value() {
        let regs = pwr_regs();
        let rcc = Rcc::with_registers(fake_registers());
        let pwr = Pwr::with_registers(regs, &rcc);

        pwr.disable_pdr_in_standby(true);
        assert_eq!(regs.porpdr_cfg.get(), 0x9601);
        assert_eq!(regs.porpdr_cfg.read(PORPDR_CFG::KEY), 0x96);
        pwr.disable_pdr_in_standby(false);
        assert_eq!(regs.porpdr_cfg.get(), 0);

        pwr.hold_dac_output(DacChannel::Dac2, true);
        assert_eq!(regs.dac_lp_ctl.get(), 0x100);
    }
}
