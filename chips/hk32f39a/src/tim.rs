// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Timer register map.
//!
//! TIM1/TIM8 (advanced), TIM2 to TIM5 (general purpose) and TIM6/TIM7
//! (basic) share one layout. Registers and fields a timer lacks read as
//! zero.

use crate::memory_map;
use hk32_utilities::registers::{register_bitfields, register_structs, ReadWrite};
use hk32_utilities::StaticRef;

register_structs! {
    pub TimRegisters {
        (0x00 => pub cr1: ReadWrite<u32, CR1::Register>),
        (0x04 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// Slave mode control register
        (0x08 => pub smcr: ReadWrite<u32, SMCR::Register>),
        /// DMA/interrupt enable register
        (0x0C => pub dier: ReadWrite<u32, DIER::Register>),
        (0x10 => pub sr: ReadWrite<u32, SR::Register>),
        /// Event generation register
        (0x14 => pub egr: ReadWrite<u32, EGR::Register>),
        /// Capture/compare mode registers, output compare view
        (0x18 => pub ccmr1: ReadWrite<u32, CCMR::Register>),
        (0x1C => pub ccmr2: ReadWrite<u32, CCMR::Register>),
        /// Capture/compare enable register
        (0x20 => pub ccer: ReadWrite<u32, CCER::Register>),
        (0x24 => pub cnt: ReadWrite<u32>),
        (0x28 => pub psc: ReadWrite<u32>),
        /// Auto-reload register
        (0x2C => pub arr: ReadWrite<u32>),
        /// Repetition counter register
        (0x30 => pub rcr: ReadWrite<u32>),
        (0x34 => pub ccr: [ReadWrite<u32>; 4]),
        /// Break and dead-time register
        (0x44 => pub bdtr: ReadWrite<u32, BDTR::Register>),
        /// DMA control register
        (0x48 => pub dcr: ReadWrite<u32, DCR::Register>),
        /// DMA address for full transfer
        (0x4C => pub dmar: ReadWrite<u32>),
        (0x50 => @END),
    }
}

register_bitfields![u32,
    pub CR1 [
        /// Clock division for the dead-time and sampling clock
        CKD OFFSET(8) NUMBITS(2) [
            Div1 = 0b00,
            Div2 = 0b01,
            Div4 = 0b10
        ],
        /// Auto-reload preload enable
        ARPE OFFSET(7) NUMBITS(1) [],
        /// Center-aligned mode
        CMS OFFSET(5) NUMBITS(2) [
            Edge = 0b00,
            Center1 = 0b01,
            Center2 = 0b10,
            Center3 = 0b11
        ],
        /// Set to count down
        DIR OFFSET(4) NUMBITS(1) [],
        /// One pulse mode
        OPM OFFSET(3) NUMBITS(1) [],
        /// Update request source
        URS OFFSET(2) NUMBITS(1) [],
        /// Update disable
        UDIS OFFSET(1) NUMBITS(1) [],
        CEN OFFSET(0) NUMBITS(1) []
    ],
    pub CR2 [
        OIS4 OFFSET(14) NUMBITS(1) [],
        OIS3N OFFSET(13) NUMBITS(1) [],
        OIS3 OFFSET(12) NUMBITS(1) [],
        OIS2N OFFSET(11) NUMBITS(1) [],
        OIS2 OFFSET(10) NUMBITS(1) [],
        OIS1N OFFSET(9) NUMBITS(1) [],
        OIS1 OFFSET(8) NUMBITS(1) [],
        /// TI1 is the XOR of CH1 to CH3
        TI1S OFFSET(7) NUMBITS(1) [],
        /// Master mode selection
        MMS OFFSET(4) NUMBITS(3) [
            Reset = 0b000,
            Enable = 0b001,
            Update = 0b010,
            ComparePulse = 0b011,
            CompareOc1 = 0b100,
            CompareOc2 = 0b101,
            CompareOc3 = 0b110,
            CompareOc4 = 0b111
        ],
        CCDS OFFSET(3) NUMBITS(1) [],
        CCUS OFFSET(2) NUMBITS(1) [],
        CCPC OFFSET(0) NUMBITS(1) []
    ],
    pub SMCR [
        /// External trigger polarity
        ETP OFFSET(15) NUMBITS(1) [],
        /// External clock enable
        ECE OFFSET(14) NUMBITS(1) [],
        ETPS OFFSET(12) NUMBITS(2) [],
        ETF OFFSET(8) NUMBITS(4) [],
        /// Master/slave mode
        MSM OFFSET(7) NUMBITS(1) [],
        /// Trigger selection
        TS OFFSET(4) NUMBITS(3) [],
        /// Slave mode selection
        SMS OFFSET(0) NUMBITS(3) [
            Disabled = 0b000,
            Encoder1 = 0b001,
            Encoder2 = 0b010,
            Encoder3 = 0b011,
            Reset = 0b100,
            Gated = 0b101,
            Trigger = 0b110,
            ExternalClock = 0b111
        ]
    ],
    pub DIER [
        TDE OFFSET(14) NUMBITS(1) [],
        COMDE OFFSET(13) NUMBITS(1) [],
        CC4DE OFFSET(12) NUMBITS(1) [],
        CC3DE OFFSET(11) NUMBITS(1) [],
        CC2DE OFFSET(10) NUMBITS(1) [],
        CC1DE OFFSET(9) NUMBITS(1) [],
        UDE OFFSET(8) NUMBITS(1) [],
        BIE OFFSET(7) NUMBITS(1) [],
        TIE OFFSET(6) NUMBITS(1) [],
        COMIE OFFSET(5) NUMBITS(1) [],
        CC4IE OFFSET(4) NUMBITS(1) [],
        CC3IE OFFSET(3) NUMBITS(1) [],
        CC2IE OFFSET(2) NUMBITS(1) [],
        CC1IE OFFSET(1) NUMBITS(1) [],
        UIE OFFSET(0) NUMBITS(1) []
    ],
    pub SR [
        CC4OF OFFSET(12) NUMBITS(1) [],
        CC3OF OFFSET(11) NUMBITS(1) [],
        CC2OF OFFSET(10) NUMBITS(1) [],
        CC1OF OFFSET(9) NUMBITS(1) [],
        BIF OFFSET(7) NUMBITS(1) [],
        TIF OFFSET(6) NUMBITS(1) [],
        COMIF OFFSET(5) NUMBITS(1) [],
        CC4IF OFFSET(4) NUMBITS(1) [],
        CC3IF OFFSET(3) NUMBITS(1) [],
        CC2IF OFFSET(2) NUMBITS(1) [],
        CC1IF OFFSET(1) NUMBITS(1) [],
        UIF OFFSET(0) NUMBITS(1) []
    ],
    pub EGR [
        BG OFFSET(7) NUMBITS(1) [],
        TG OFFSET(6) NUMBITS(1) [],
        COMG OFFSET(5) NUMBITS(1) [],
        CC4G OFFSET(4) NUMBITS(1) [],
        CC3G OFFSET(3) NUMBITS(1) [],
        CC2G OFFSET(2) NUMBITS(1) [],
        CC1G OFFSET(1) NUMBITS(1) [],
        UG OFFSET(0) NUMBITS(1) []
    ],
    pub CCMR [
        OC2CE OFFSET(15) NUMBITS(1) [],
        OC2M OFFSET(12) NUMBITS(3) [],
        OC2PE OFFSET(11) NUMBITS(1) [],
        OC2FE OFFSET(10) NUMBITS(1) [],
        CC2S OFFSET(8) NUMBITS(2) [],
        OC1CE OFFSET(7) NUMBITS(1) [],
        OC1M OFFSET(4) NUMBITS(3) [
            Frozen = 0b000,
            ActiveOnMatch = 0b001,
            InactiveOnMatch = 0b010,
            Toggle = 0b011,
            ForceInactive = 0b100,
            ForceActive = 0b101,
            Pwm1 = 0b110,
            Pwm2 = 0b111
        ],
        OC1PE OFFSET(3) NUMBITS(1) [],
        OC1FE OFFSET(2) NUMBITS(1) [],
        CC1S OFFSET(0) NUMBITS(2) [
            Output = 0b00,
            InputTi1 = 0b01,
            InputTi2 = 0b10,
            InputTrc = 0b11
        ]
    ],
    pub CCER [
        CC4P OFFSET(13) NUMBITS(1) [],
        CC4E OFFSET(12) NUMBITS(1) [],
        CC3NP OFFSET(11) NUMBITS(1) [],
        CC3NE OFFSET(10) NUMBITS(1) [],
        CC3P OFFSET(9) NUMBITS(1) [],
        CC3E OFFSET(8) NUMBITS(1) [],
        CC2NP OFFSET(7) NUMBITS(1) [],
        CC2NE OFFSET(6) NUMBITS(1) [],
        CC2P OFFSET(5) NUMBITS(1) [],
        CC2E OFFSET(4) NUMBITS(1) [],
        CC1NP OFFSET(3) NUMBITS(1) [],
        CC1NE OFFSET(2) NUMBITS(1) [],
        CC1P OFFSET(1) NUMBITS(1) [],
        CC1E OFFSET(0) NUMBITS(1) []
    ],
    pub BDTR [
        /// Main output enable
        MOE OFFSET(15) NUMBITS(1) [],
        /// Automatic output enable
        AOE OFFSET(14) NUMBITS(1) [],
        /// Break polarity
        BKP OFFSET(13) NUMBITS(1) [],
        BKE OFFSET(12) NUMBITS(1) [],
        OSSR OFFSET(11) NUMBITS(1) [],
        OSSI OFFSET(10) NUMBITS(1) [],
        LOCK OFFSET(8) NUMBITS(2) [],
        /// Dead-time generator setup
        DTG OFFSET(0) NUMBITS(8) []
    ],
    pub DCR [
        /// DMA burst length minus one
        DBL OFFSET(8) NUMBITS(5) [],
        /// DMA base address, in words from `cr1`
        DBA OFFSET(0) NUMBITS(5) []
    ]
];

pub const TIM1_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM1_BASE as *const TimRegisters) };
pub const TIM2_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM2_BASE as *const TimRegisters) };
pub const TIM3_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM3_BASE as *const TimRegisters) };
pub const TIM4_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM4_BASE as *const TimRegisters) };
pub const TIM5_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM5_BASE as *const TimRegisters) };
pub const TIM6_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM6_BASE as *const TimRegisters) };
pub const TIM7_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM7_BASE as *const TimRegisters) };
pub const TIM8_BASE: StaticRef<TimRegisters> =
    unsafe { StaticRef::new(memory_map::TIM8_BASE as *const TimRegisters) };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        assert_eq!(core::mem::offset_of!(TimRegisters, ccer), 0x20);
        assert_eq!(core::mem::offset_of!(TimRegisters, rcr), 0x30);
        assert_eq!(core::mem::offset_of!(TimRegisters, ccr), 0x34);
        assert_eq!(core::mem::offset_of!(TimRegisters, bdtr), 0x44);
        assert_eq!(core::mem::offset_of!(TimRegisters, dmar), 0x4C);
        assert_eq!(CCMR::OC1M::Pwm1.value, 0x60);
        assert_eq!(BDTR::MOE::SET.value, 0x8000);
        assert_eq!(CR2::MMS::Update.value, 0x20);
    }
}
