// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Reset and clock control.
//!
//! The block is a superset of the STM32F103 RCC. The HK32 adds two internal
//! RC oscillators (HSI28M and HSI56M), an external clock pin, a PLL input
//! pre-divider in `CFGR2`, an extended system clock switch in `CFGR5` and
//! second enable/reset registers for the AHB2 and the added APB2 devices.

use crate::config::{CONFIG, SYSCLK_MAX_HZ};
use crate::flash::Flash;
use crate::memory_map;
use hk32_utilities::errorcode::wait_until;
use hk32_utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hk32_utilities::registers::{
    register_bitfields, register_structs, Field, ReadWrite, RegisterLongName,
};
use hk32_utilities::{debug, warn, ErrorCode, StaticRef};

register_structs! {
    /// Reset and clock control
    pub RccRegisters {
        /// Clock control register
        (0x00 => pub cr: ReadWrite<u32, CR::Register>),
        /// Clock configuration register
        (0x04 => pub cfgr: ReadWrite<u32, CFGR::Register>),
        /// Clock interrupt register
        (0x08 => pub cir: ReadWrite<u32, CIR::Register>),
        /// APB2 peripheral reset register
        (0x0C => pub apb2rstr: ReadWrite<u32, APB2ENR::Register>),
        /// APB1 peripheral reset register
        (0x10 => pub apb1rstr: ReadWrite<u32, APB1ENR::Register>),
        /// AHB peripheral clock enable register
        (0x14 => pub ahbenr: ReadWrite<u32, AHBENR::Register>),
        /// APB2 peripheral clock enable register
        (0x18 => pub apb2enr: ReadWrite<u32, APB2ENR::Register>),
        /// APB1 peripheral clock enable register
        (0x1C => pub apb1enr: ReadWrite<u32, APB1ENR::Register>),
        /// Backup domain control register
        (0x20 => pub bdcr: ReadWrite<u32, BDCR::Register>),
        /// Control/status register
        (0x24 => pub csr: ReadWrite<u32, CSR::Register>),
        /// AHB peripheral reset register
        (0x28 => pub ahbrstr: ReadWrite<u32, AHBENR::Register>),
        /// PLL pre-divider
        (0x2C => pub cfgr2: ReadWrite<u32, CFGR2::Register>),
        /// USB clock configuration
        (0x30 => pub cfgr3: ReadWrite<u32, CFGR3::Register>),
        /// Clock control register 2, HSI28M and HSI56M
        (0x34 => pub cr2: ReadWrite<u32, CR2::Register>),
        /// PLL input selection
        (0x38 => pub cfgr4: ReadWrite<u32, CFGR4::Register>),
        /// AHB2 peripheral clock enable register
        (0x3C => pub ahbenr2: ReadWrite<u32, AHBENR2::Register>),
        /// AHB2 peripheral reset register
        (0x40 => pub ahbrstr2: ReadWrite<u32, AHBENR2::Register>),
        /// APB2 second peripheral clock enable register
        (0x44 => pub apb2enr2: ReadWrite<u32, APB2ENR2::Register>),
        /// APB2 second peripheral reset register
        (0x48 => pub apb2rstr2: ReadWrite<u32, APB2ENR2::Register>),
        /// SAI clock selection
        (0x4C => pub cfgr6: ReadWrite<u32, CFGR6::Register>),
        (0x50 => _reserved0),
        /// Extended system clock switch and MCO extension
        (0xEC => pub cfgr5: ReadWrite<u32, CFGR5::Register>),
        (0xF0 => @END),
    }
}

register_bitfields![u32,
    pub CR [
        /// PLL clock ready flag
        PLLRDY OFFSET(25) NUMBITS(1) [],
        /// PLL enable
        PLLON OFFSET(24) NUMBITS(1) [],
        /// Clock security system enable
        CSSON OFFSET(19) NUMBITS(1) [],
        /// HSE clock bypass
        HSEBYP OFFSET(18) NUMBITS(1) [],
        /// HSE clock ready flag
        HSERDY OFFSET(17) NUMBITS(1) [],
        /// HSE clock enable
        HSEON OFFSET(16) NUMBITS(1) [],
        /// Internal high-speed clock calibration
        HSICAL OFFSET(8) NUMBITS(8) [],
        /// Internal high-speed clock trimming
        HSITRIM OFFSET(3) NUMBITS(5) [],
        /// Internal high-speed clock ready flag
        HSIRDY OFFSET(1) NUMBITS(1) [],
        /// Internal high-speed clock enable
        HSION OFFSET(0) NUMBITS(1) []
    ],
    pub CFGR [
        /// PLL input taken from the undivided HSI8M
        PLLHSIPRE OFFSET(31) NUMBITS(1) [],
        /// Microcontroller clock output, low three bits of the selection
        MCO OFFSET(24) NUMBITS(3) [],
        /// USB prescaler, set for PLL/1
        USBPRE OFFSET(22) NUMBITS(1) [],
        /// PLL multiplication factor, value is factor - 2
        PLLMUL OFFSET(18) NUMBITS(4) [],
        /// HSE divider for PLL entry
        PLLXTPRE OFFSET(17) NUMBITS(1) [],
        /// PLL entry clock source
        PLLSRC OFFSET(16) NUMBITS(1) [
            HSI8MDiv2 = 0,
            PREDIV = 1
        ],
        /// ADC prescaler
        ADCPRE OFFSET(14) NUMBITS(2) [],
        /// APB high-speed prescaler (APB2)
        PPRE2 OFFSET(11) NUMBITS(3) [],
        /// APB low-speed prescaler (APB1)
        PPRE1 OFFSET(8) NUMBITS(3) [],
        /// AHB prescaler
        HPRE OFFSET(4) NUMBITS(4) [],
        /// System clock switch status
        SWS OFFSET(2) NUMBITS(2) [],
        /// System clock switch
        SW OFFSET(0) NUMBITS(2) [
            HSI8M = 0b00,
            HSE = 0b01,
            PLL = 0b10
        ]
    ],
    pub CIR [
        CSSC OFFSET(23) NUMBITS(1) [],
        PLLRDYC OFFSET(20) NUMBITS(1) [],
        HSERDYC OFFSET(19) NUMBITS(1) [],
        HSIRDYC OFFSET(18) NUMBITS(1) [],
        LSERDYC OFFSET(17) NUMBITS(1) [],
        LSIRDYC OFFSET(16) NUMBITS(1) [],
        PLLRDYIE OFFSET(12) NUMBITS(1) [],
        HSERDYIE OFFSET(11) NUMBITS(1) [],
        HSIRDYIE OFFSET(10) NUMBITS(1) [],
        LSERDYIE OFFSET(9) NUMBITS(1) [],
        LSIRDYIE OFFSET(8) NUMBITS(1) [],
        CSSF OFFSET(7) NUMBITS(1) [],
        PLLRDYF OFFSET(4) NUMBITS(1) [],
        HSERDYF OFFSET(3) NUMBITS(1) [],
        HSIRDYF OFFSET(2) NUMBITS(1) [],
        LSERDYF OFFSET(1) NUMBITS(1) [],
        LSIRDYF OFFSET(0) NUMBITS(1) []
    ],
    // The reset registers share the layout of the matching enable register.
    pub APB2ENR [
        ADC3EN OFFSET(15) NUMBITS(1) [],
        USART1EN OFFSET(14) NUMBITS(1) [],
        TIM8EN OFFSET(13) NUMBITS(1) [],
        SPI1EN OFFSET(12) NUMBITS(1) [],
        TIM1EN OFFSET(11) NUMBITS(1) [],
        ADC2EN OFFSET(10) NUMBITS(1) [],
        ADC1EN OFFSET(9) NUMBITS(1) [],
        IOPGEN OFFSET(8) NUMBITS(1) [],
        IOPFEN OFFSET(7) NUMBITS(1) [],
        IOPEEN OFFSET(6) NUMBITS(1) [],
        IOPDEN OFFSET(5) NUMBITS(1) [],
        IOPCEN OFFSET(4) NUMBITS(1) [],
        IOPBEN OFFSET(3) NUMBITS(1) [],
        IOPAEN OFFSET(2) NUMBITS(1) [],
        AFIOEN OFFSET(0) NUMBITS(1) []
    ],
    pub APB1ENR [
        DACEN OFFSET(29) NUMBITS(1) [],
        PWREN OFFSET(28) NUMBITS(1) [],
        BKPEN OFFSET(27) NUMBITS(1) [],
        CAN2EN OFFSET(26) NUMBITS(1) [],
        CAN1EN OFFSET(25) NUMBITS(1) [],
        USBEN OFFSET(23) NUMBITS(1) [],
        I2C2EN OFFSET(22) NUMBITS(1) [],
        I2C1EN OFFSET(21) NUMBITS(1) [],
        UART5EN OFFSET(20) NUMBITS(1) [],
        UART4EN OFFSET(19) NUMBITS(1) [],
        USART3EN OFFSET(18) NUMBITS(1) [],
        USART2EN OFFSET(17) NUMBITS(1) [],
        SPI3EN OFFSET(15) NUMBITS(1) [],
        SPI2EN OFFSET(14) NUMBITS(1) [],
        WWDGEN OFFSET(11) NUMBITS(1) [],
        TIM7EN OFFSET(5) NUMBITS(1) [],
        TIM6EN OFFSET(4) NUMBITS(1) [],
        TIM5EN OFFSET(3) NUMBITS(1) [],
        TIM4EN OFFSET(2) NUMBITS(1) [],
        TIM3EN OFFSET(1) NUMBITS(1) [],
        TIM2EN OFFSET(0) NUMBITS(1) []
    ],
    pub AHBENR [
        SDIOEN OFFSET(10) NUMBITS(1) [],
        FSMCEN OFFSET(8) NUMBITS(1) [],
        CRCEN OFFSET(6) NUMBITS(1) [],
        FLITFEN OFFSET(4) NUMBITS(1) [],
        SRAMEN OFFSET(2) NUMBITS(1) [],
        DMA2EN OFFSET(1) NUMBITS(1) [],
        DMA1EN OFFSET(0) NUMBITS(1) []
    ],
    pub BDCR [
        /// Backup domain software reset
        BDRST OFFSET(16) NUMBITS(1) [],
        /// RTC clock enable
        RTCEN OFFSET(15) NUMBITS(1) [],
        /// RTC clock source selection
        RTCSEL OFFSET(8) NUMBITS(2) [
            NoClock = 0b00,
            LSE = 0b01,
            LSI = 0b10,
            HSEDiv128 = 0b11
        ],
        LSEBYP OFFSET(2) NUMBITS(1) [],
        LSERDY OFFSET(1) NUMBITS(1) [],
        LSEON OFFSET(0) NUMBITS(1) []
    ],
    pub CSR [
        LPWRRSTF OFFSET(31) NUMBITS(1) [],
        WWDGRSTF OFFSET(30) NUMBITS(1) [],
        IWDGRSTF OFFSET(29) NUMBITS(1) [],
        SFTRSTF OFFSET(28) NUMBITS(1) [],
        PORRSTF OFFSET(27) NUMBITS(1) [],
        PINRSTF OFFSET(26) NUMBITS(1) [],
        /// Remove reset flags
        RMVF OFFSET(24) NUMBITS(1) [],
        LSIRDY OFFSET(1) NUMBITS(1) [],
        LSION OFFSET(0) NUMBITS(1) []
    ],
    pub CFGR2 [
        /// PLL input pre-divider, value is divider - 1
        PREDIV OFFSET(0) NUMBITS(4) []
    ],
    pub CFGR3 [
        /// USB clock divider for PLL outputs above 72 MHz
        USBSW OFFSET(8) NUMBITS(3) []
    ],
    pub CR2 [
        HSI28RDY OFFSET(19) NUMBITS(1) [],
        HSI28ON OFFSET(18) NUMBITS(1) [],
        HSI56RDY OFFSET(17) NUMBITS(1) [],
        HSI56ON OFFSET(16) NUMBITS(1) []
    ],
    pub CFGR4 [
        /// Extended PLL factor in steps of 16, `CFGR.PLLMUL` then holds the remainder
        PLLMULL OFFSET(4) NUMBITS(3) [],
        /// PREDIV input: HSE when clear, HSI56M when set
        PPSS OFFSET(0) NUMBITS(1) []
    ],
    pub AHBENR2 [
        QSPIEN OFFSET(5) NUMBITS(1) [],
        DCMIEN OFFSET(4) NUMBITS(1) [],
        RNGEN OFFSET(3) NUMBITS(1) [],
        HASHEN OFFSET(2) NUMBITS(1) [],
        AESEN OFFSET(1) NUMBITS(1) [],
        COALUEN OFFSET(0) NUMBITS(1) []
    ],
    pub APB2ENR2 [
        PDMBEN OFFSET(5) NUMBITS(1) [],
        PDMAEN OFFSET(4) NUMBITS(1) [],
        SAIBEN OFFSET(3) NUMBITS(1) [],
        SAIAEN OFFSET(2) NUMBITS(1) [],
        VCEN OFFSET(1) NUMBITS(1) [],
        USART6EN OFFSET(0) NUMBITS(1) []
    ],
    pub CFGR6 [
        SAIB_EXT OFFSET(9) NUMBITS(1) [],
        SAIB_HSE OFFSET(8) NUMBITS(1) [],
        /// SAI block B PCLK2 divider, clock is PCLK2 / ((value + 1) * 2)
        SAIB_DIV OFFSET(5) NUMBITS(3) [],
        SAIA_EXT OFFSET(4) NUMBITS(1) [],
        SAIA_HSE OFFSET(3) NUMBITS(1) [],
        /// SAI block A PCLK2 divider, clock is PCLK2 / ((value + 1) * 2)
        SAIA_DIV OFFSET(0) NUMBITS(3) []
    ],
    pub CFGR5 [
        /// MCO prescaler, output is divided by 2^value
        MCOPRE OFFSET(28) NUMBITS(3) [],
        /// Fourth bit of the MCO selection
        MCO3 OFFSET(27) NUMBITS(1) [],
        /// Pin used as EXTCLK input
        EXTCLK_SEL OFFSET(9) NUMBITS(2) [
            PA1 = 0,
            PB1 = 1,
            PB7 = 2,
            PC7 = 3
        ],
        /// Extended system clock source selected
        ESSS OFFSET(8) NUMBITS(1) [],
        /// Extended system clock switch status
        ESWS OFFSET(4) NUMBITS(3) [],
        /// Extended system clock switch
        ESW OFFSET(0) NUMBITS(3) [
            LSE = 0,
            LSI = 1,
            HSI56M = 2,
            HSI28M = 3,
            EXTCLK = 4
        ]
    ]
];

pub const RCC_BASE: StaticRef<RccRegisters> =
    unsafe { StaticRef::new(memory_map::RCC_BASE as *const RccRegisters) };

/// HCLK/PCLK shift for each HPRE/PPRE encoding.
const APB_AHB_PRESC_TABLE: [u32; 16] = [0, 0, 0, 0, 1, 2, 3, 4, 1, 2, 3, 4, 6, 7, 8, 9];
const ADC_PRESC_TABLE: [u32; 4] = [2, 4, 6, 8];
/// Largest factor the extended PLL encoding reaches, 7 * 16 + 15.
const PLL_MULTIPLIER_MAX: u8 = 127;

/// Write a single bit addressed by position in a register of layout `R`.
fn set_bit<R: RegisterLongName>(register: &ReadWrite<u32, R>, bit: u32, value: bool) {
    register.modify(Field::<u32, R>::new(1, bit as usize).val(value as u32));
}

fn is_bit_set<R: RegisterLongName>(register: &ReadWrite<u32, R>, bit: u32) -> bool {
    register.get() & (1 << bit) != 0
}

/// HSE mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HseMode {
    Crystal,
    Bypass,
}

/// Clock sources for the CPU
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockSource {
    Hsi8m,
    Hse,
    Pll,
    Lse,
    Lsi,
    Hsi56m,
    Hsi28m,
    Extclk,
}

impl SysClockSource {
    /// `CFGR.SW` encoding for the base sources, `CFGR5.ESW` for the others.
    fn switch_value(self) -> (bool, u32) {
        match self {
            SysClockSource::Hsi8m => (false, 0b00),
            SysClockSource::Hse => (false, 0b01),
            SysClockSource::Pll => (false, 0b10),
            SysClockSource::Lse => (true, 0),
            SysClockSource::Lsi => (true, 1),
            SysClockSource::Hsi56m => (true, 2),
            SysClockSource::Hsi28m => (true, 3),
            SysClockSource::Extclk => (true, 4),
        }
    }

    /// Decode `CFGR5.ESSS`, `CFGR5.ESWS` and `CFGR.SWS`. Reserved extended
    /// codes leave the core on HSI8M.
    fn from_status(extended: bool, esws: u32, sws: u32) -> SysClockSource {
        if extended {
            match esws {
                0 => SysClockSource::Lse,
                1 => SysClockSource::Lsi,
                2 => SysClockSource::Hsi56m,
                3 => SysClockSource::Hsi28m,
                4 => SysClockSource::Extclk,
                _ => SysClockSource::Hsi8m,
            }
        } else {
            match sws {
                0b01 => SysClockSource::Hse,
                0b10 => SysClockSource::Pll,
                _ => SysClockSource::Hsi8m,
            }
        }
    }
}

/// PLL input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllSource {
    /// HSI8M divided by two
    HsiDiv2,
    /// HSI8M undivided (`PLLHSIPRE`)
    Hsi,
    /// HSE through `PREDIV`
    Hse,
    /// HSI56M through `PREDIV`
    Hsi56m,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AHBPrescaler {
    DivideBy1 = 0b0000,
    DivideBy2 = 0b1000,
    DivideBy4 = 0b1001,
    DivideBy8 = 0b1010,
    DivideBy16 = 0b1011,
    DivideBy64 = 0b1100,
    DivideBy128 = 0b1101,
    DivideBy256 = 0b1110,
    DivideBy512 = 0b1111,
}

impl From<AHBPrescaler> for usize {
    fn from(item: AHBPrescaler) -> usize {
        match item {
            AHBPrescaler::DivideBy1 => 1,
            AHBPrescaler::DivideBy2 => 2,
            AHBPrescaler::DivideBy4 => 4,
            AHBPrescaler::DivideBy8 => 8,
            AHBPrescaler::DivideBy16 => 16,
            AHBPrescaler::DivideBy64 => 64,
            AHBPrescaler::DivideBy128 => 128,
            AHBPrescaler::DivideBy256 => 256,
            AHBPrescaler::DivideBy512 => 512,
        }
    }
}

impl AHBPrescaler {
    fn from_bits(bits: u32) -> AHBPrescaler {
        match bits {
            0b1000 => AHBPrescaler::DivideBy2,
            0b1001 => AHBPrescaler::DivideBy4,
            0b1010 => AHBPrescaler::DivideBy8,
            0b1011 => AHBPrescaler::DivideBy16,
            0b1100 => AHBPrescaler::DivideBy64,
            0b1101 => AHBPrescaler::DivideBy128,
            0b1110 => AHBPrescaler::DivideBy256,
            0b1111 => AHBPrescaler::DivideBy512,
            _ => AHBPrescaler::DivideBy1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum APBPrescaler {
    DivideBy1 = 0b000, // No division
    DivideBy2 = 0b100,
    DivideBy4 = 0b101,
    DivideBy8 = 0b110,
    DivideBy16 = 0b111,
}

impl From<APBPrescaler> for usize {
    fn from(item: APBPrescaler) -> Self {
        match item {
            APBPrescaler::DivideBy1 => 1,
            APBPrescaler::DivideBy2 => 2,
            APBPrescaler::DivideBy4 => 4,
            APBPrescaler::DivideBy8 => 8,
            APBPrescaler::DivideBy16 => 16,
        }
    }
}

impl APBPrescaler {
    fn from_bits(bits: u32) -> APBPrescaler {
        match bits {
            0b100 => APBPrescaler::DivideBy2,
            0b101 => APBPrescaler::DivideBy4,
            0b110 => APBPrescaler::DivideBy8,
            0b111 => APBPrescaler::DivideBy16,
            _ => APBPrescaler::DivideBy1,
        }
    }
}

/// ADC clock divider applied to PCLK2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ADCPrescaler {
    DivideBy2 = 0b00,
    DivideBy4 = 0b01,
    DivideBy6 = 0b10,
    DivideBy8 = 0b11,
}

/// USB clock divider applied to the PLL output. The USB needs 48 MHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum USBPrescaler {
    DivideBy1_5,
    DivideBy1,
    DivideBy2,
    DivideBy2_5,
    DivideBy3,
    DivideBy3_5,
    DivideBy4,
}

/// Clock routed to the MCO pin. The low three bits go to `CFGR.MCO`, bit
/// three to `CFGR5.MCO3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MCOSource {
    NoClock = 0x0,
    SysClk = 0x4,
    Hsi8m = 0x5,
    Hse = 0x6,
    PllDiv2 = 0x7,
    Lsi = 0xC,
    Lse = 0xD,
    Hsi28m = 0xE,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MCOPrescaler {
    DivideBy1 = 0,
    DivideBy2,
    DivideBy4,
    DivideBy8,
    DivideBy16,
    DivideBy32,
    DivideBy64,
    DivideBy128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RtcClockSource {
    LSE = 0b01,
    LSI = 0b10,
    HSEDiv128 = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaiBlock {
    A,
    B,
}

/// SAI kernel clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaiClockSource {
    External,
    Hse,
    Pclk2DivideBy2,
    Pclk2DivideBy4,
    Pclk2DivideBy6,
    Pclk2DivideBy8,
    Pclk2DivideBy12,
    Pclk2DivideBy16,
}

impl SaiClockSource {
    /// (EXT, HSE, DIV) field values.
    fn fields(self) -> (u32, u32, u32) {
        match self {
            SaiClockSource::External => (1, 0, 0),
            SaiClockSource::Hse => (0, 1, 0),
            SaiClockSource::Pclk2DivideBy2 => (0, 0, 0),
            SaiClockSource::Pclk2DivideBy4 => (0, 0, 1),
            SaiClockSource::Pclk2DivideBy6 => (0, 0, 2),
            SaiClockSource::Pclk2DivideBy8 => (0, 0, 3),
            SaiClockSource::Pclk2DivideBy12 => (0, 0, 5),
            SaiClockSource::Pclk2DivideBy16 => (0, 0, 7),
        }
    }
}

/// Oscillator ready flags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockFlag {
    Hsi8mReady,
    HseReady,
    PllReady,
    LseReady,
    LsiReady,
    Hsi28mReady,
    Hsi56mReady,
}

/// Sources of the RCC interrupt, numbered by their `CIR` flag bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RccInterrupt {
    LsiReady = 0,
    LseReady = 1,
    HsiReady = 2,
    HseReady = 3,
    PllReady = 4,
    ClockSecurity = 7,
}

/// Reset flags latched in `CSR`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResetCause {
    pub pin: bool,
    pub power_on: bool,
    pub software: bool,
    pub independent_watchdog: bool,
    pub window_watchdog: bool,
    pub low_power: bool,
}

/// Frequencies of the main clock tree, Hz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockFrequencies {
    pub sysclk: u32,
    pub hclk: u32,
    pub pclk1: u32,
    pub pclk2: u32,
    pub adcclk: u32,
}

/// Complete system clock setups, the equivalent of the vendor
/// `SetSysClockTo*` routines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemClockConfig {
    Hsi8m,
    Hse(HseMode),
    /// HSE crystal times nine through the PLL
    Hse72m,
    /// HSE / 7 * 79, 90.28 MHz
    Hse90m,
    /// HSE / 4 * 49
    Hse98m,
    /// HSE * 15
    Hse120m,
    Hsi56m,
    Hsi28m,
    Lse,
    Lsi,
    /// External clock on PA1
    Extclk,
    Pll {
        source: PllSource,
        multiplier: u8,
        prediv: u8,
    },
}

/// Output frequency of the PLL for a given setup.
pub fn pll_frequency(source: PllSource, multiplier: u8, prediv: u8) -> u32 {
    let multiplier = u32::from(multiplier);
    let prediv = u32::from(prediv.max(1));
    match source {
        PllSource::HsiDiv2 => (CONFIG.hsi8m_hz >> 1) * multiplier,
        PllSource::Hsi => CONFIG.hsi8m_hz * multiplier,
        PllSource::Hse => CONFIG.hse_hz * multiplier / prediv,
        PllSource::Hsi56m => CONFIG.hsi56m_hz * multiplier / prediv,
    }
}

pub struct Rcc {
    registers: StaticRef<RccRegisters>,
}

impl Rcc {
    pub const fn new() -> Rcc {
        Rcc {
            registers: RCC_BASE,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_registers(registers: StaticRef<RccRegisters>) -> Rcc {
        Rcc { registers }
    }

    /// Put the clock tree back to its reset configuration: HSI8M on and
    /// selected, PLL, HSE and CSS off, all RCC interrupts disabled.
    pub fn deinit(&self) {
        self.registers.cr.modify(CR::HSION::SET);
        // SW, HPRE, PPRE1, PPRE2, ADCPRE and MCO
        self.registers.cfgr.set(self.registers.cfgr.get() & 0xF0FF_0000);
        // HSEON, CSSON and PLLON
        self.registers.cr.set(self.registers.cr.get() & 0xFEF6_FFFF);
        // HSEBYP can only be cleared once HSE is off
        self.registers.cr.set(self.registers.cr.get() & 0xFFFB_FFFF);
        // PLLSRC, PLLXTPRE, PLLMUL and USBPRE
        self.registers.cfgr.set(self.registers.cfgr.get() & 0xFF80_FFFF);
        self.registers.cfgr4.modify(CFGR4::PLLMULL::CLEAR);
        self.registers.cir.set(0x009F_0000);
    }

    /* Oscillators */

    pub fn enable_hsi8m(&self) -> Result<(), ErrorCode> {
        self.registers.cr.modify(CR::HSION::SET);
        self.wait_ready(ClockFlag::Hsi8mReady, CONFIG.hse_startup_timeout)
    }

    // HSI8M must not be the system clock, directly or through the PLL.
    pub fn disable_hsi8m(&self) {
        self.registers.cr.modify(CR::HSION::CLEAR);
    }

    /// Trim the HSI8M oscillator, 0..=0x1F with 0x10 as the neutral value.
    pub fn adjust_hsi_calibration(&self, value: u8) -> Result<(), ErrorCode> {
        if value > 0x1F {
            return Err(ErrorCode::INVAL);
        }
        self.registers.cr.modify(CR::HSITRIM.val(value.into()));
        Ok(())
    }

    pub fn enable_hse(&self, mode: HseMode) -> Result<(), ErrorCode> {
        self.registers.cr.modify(CR::HSEON::CLEAR);
        self.registers.cr.modify(CR::HSEBYP::CLEAR);
        match mode {
            HseMode::Crystal => self.registers.cr.modify(CR::HSEON::SET),
            HseMode::Bypass => self.registers.cr.modify(CR::HSEBYP::SET + CR::HSEON::SET),
        }
        self.wait_ready(ClockFlag::HseReady, CONFIG.hse_startup_timeout)
    }

    pub fn disable_hse(&self) {
        self.registers.cr.modify(CR::HSEON::CLEAR);
        self.registers.cr.modify(CR::HSEBYP::CLEAR);
    }

    pub fn enable_hsi28m(&self) -> Result<(), ErrorCode> {
        self.registers.cr2.modify(CR2::HSI28ON::SET);
        self.wait_ready(ClockFlag::Hsi28mReady, CONFIG.hse_startup_timeout)
    }

    pub fn disable_hsi28m(&self) {
        self.registers.cr2.modify(CR2::HSI28ON::CLEAR);
    }

    pub fn enable_hsi56m(&self) -> Result<(), ErrorCode> {
        self.registers.cr2.modify(CR2::HSI56ON::SET);
        self.wait_ready(ClockFlag::Hsi56mReady, CONFIG.hse_startup_timeout)
    }

    pub fn disable_hsi56m(&self) {
        self.registers.cr2.modify(CR2::HSI56ON::CLEAR);
    }

    /// Start the LSE. Backup domain write access must be enabled in PWR.
    pub fn enable_lse(&self, mode: HseMode) -> Result<(), ErrorCode> {
        self.registers
            .bdcr
            .modify(BDCR::LSEON::CLEAR + BDCR::LSEBYP::CLEAR);
        match mode {
            HseMode::Crystal => self.registers.bdcr.modify(BDCR::LSEON::SET),
            HseMode::Bypass => self
                .registers
                .bdcr
                .modify(BDCR::LSEBYP::SET + BDCR::LSEON::SET),
        }
        self.wait_ready(ClockFlag::LseReady, CONFIG.ls_startup_timeout)
    }

    pub fn disable_lse(&self) {
        self.registers
            .bdcr
            .modify(BDCR::LSEON::CLEAR + BDCR::LSEBYP::CLEAR);
    }

    pub fn enable_lsi(&self) -> Result<(), ErrorCode> {
        self.registers.csr.modify(CSR::LSION::SET);
        self.wait_ready(ClockFlag::LsiReady, CONFIG.ls_startup_timeout)
    }

    pub fn disable_lsi(&self) {
        self.registers.csr.modify(CSR::LSION::CLEAR);
    }

    /// Pick the pin the EXTCLK system clock is taken from.
    pub fn select_extclk_pin(&self, pin: CFGR5::EXTCLK_SEL::Value) {
        self.registers.cfgr5.modify(CFGR5::EXTCLK_SEL.val(pin as u32));
    }

    pub fn enable_clock_security(&self, enable: bool) {
        self.registers.cr.modify(CR::CSSON.val(enable as u32));
    }

    pub fn is_ready(&self, flag: ClockFlag) -> bool {
        match flag {
            ClockFlag::Hsi8mReady => self.registers.cr.is_set(CR::HSIRDY),
            ClockFlag::HseReady => self.registers.cr.is_set(CR::HSERDY),
            ClockFlag::PllReady => self.registers.cr.is_set(CR::PLLRDY),
            ClockFlag::LseReady => self.registers.bdcr.is_set(BDCR::LSERDY),
            ClockFlag::LsiReady => self.registers.csr.is_set(CSR::LSIRDY),
            ClockFlag::Hsi28mReady => self.registers.cr2.is_set(CR2::HSI28RDY),
            ClockFlag::Hsi56mReady => self.registers.cr2.is_set(CR2::HSI56RDY),
        }
    }

    fn wait_ready(&self, flag: ClockFlag, attempts: u32) -> Result<(), ErrorCode> {
        wait_until(attempts, || self.is_ready(flag)).inspect_err(|_| {
            warn!("rcc: oscillator did not become ready");
        })
    }

    /* PLL */

    /// Program the PLL input and factor. The PLL must be off.
    ///
    /// `multiplier` is 2..=127, `prediv` is 1..=16 and only applies to the HSE
    /// and HSI56M inputs. Factors above 16 use the extended `CFGR4.PLLMULL`
    /// encoding.
    pub fn configure_pll(
        &self,
        source: PllSource,
        multiplier: u8,
        prediv: u8,
    ) -> Result<(), ErrorCode> {
        if !(2..=PLL_MULTIPLIER_MAX).contains(&multiplier) || !(1..=16).contains(&prediv) {
            return Err(ErrorCode::INVAL);
        }
        if self.registers.cr.is_set(CR::PLLON) {
            return Err(ErrorCode::BUSY);
        }
        let pllsrc = match source {
            PllSource::HsiDiv2 | PllSource::Hsi => {
                self.registers
                    .cfgr
                    .modify(CFGR::PLLHSIPRE.val((source == PllSource::Hsi) as u32));
                CFGR::PLLSRC::HSI8MDiv2
            }
            PllSource::Hse | PllSource::Hsi56m => {
                self.registers
                    .cfgr4
                    .modify(CFGR4::PPSS.val((source == PllSource::Hsi56m) as u32));
                self.registers
                    .cfgr2
                    .write(CFGR2::PREDIV.val(u32::from(prediv) - 1));
                CFGR::PLLSRC::PREDIV
            }
        };
        let multiplier = u32::from(multiplier);
        let (extended, pllmul) = if multiplier <= 16 {
            (0, multiplier - 2)
        } else {
            (multiplier / 16, multiplier % 16)
        };
        self.registers.cfgr4.modify(CFGR4::PLLMULL.val(extended));
        self.registers
            .cfgr
            .modify(pllsrc + CFGR::PLLXTPRE::CLEAR + CFGR::PLLMUL.val(pllmul));
        Ok(())
    }

    fn pll_multiplier(&self) -> u32 {
        let pllmul = self.registers.cfgr.read(CFGR::PLLMUL);
        match self.registers.cfgr4.read(CFGR4::PLLMULL) {
            0 => pllmul + 2,
            extended => extended * 16 + pllmul,
        }
    }

    pub fn enable_pll(&self) -> Result<(), ErrorCode> {
        self.registers.cr.modify(CR::PLLON::SET);
        self.wait_ready(ClockFlag::PllReady, CONFIG.hse_startup_timeout)
    }

    // The PLL must not be the system clock.
    pub fn disable_pll(&self) {
        self.registers.cr.modify(CR::PLLON::CLEAR);
    }

    pub fn is_enabled_pll(&self) -> bool {
        self.registers.cr.is_set(CR::PLLON)
    }

    /* System clock */

    /// Switch the system clock and wait for the switch status to follow.
    ///
    /// The source must already be running, and the flash latency must suit
    /// the new frequency.
    pub fn set_sys_clock_source(&self, source: SysClockSource) -> Result<(), ErrorCode> {
        let (extended, value) = source.switch_value();
        if extended {
            self.registers.cfgr5.modify(CFGR5::ESW.val(value));
            self.registers.cfgr5.modify(CFGR5::ESSS::SET);
        } else {
            self.registers.cfgr.modify(CFGR::SW.val(value));
            self.registers.cfgr5.modify(CFGR5::ESSS::CLEAR);
        }
        wait_until(CONFIG.flag_timeout, || self.get_sys_clock_source() == source).inspect_err(
            |_| {
                warn!("rcc: system clock switch timed out");
            },
        )?;
        debug!("rcc: system clock source {}", source);
        Ok(())
    }

    pub fn get_sys_clock_source(&self) -> SysClockSource {
        SysClockSource::from_status(
            self.registers.cfgr5.is_set(CFGR5::ESSS),
            self.registers.cfgr5.read(CFGR5::ESWS),
            self.registers.cfgr.read(CFGR::SWS),
        )
    }

    /* Prescalers */

    pub fn set_ahb_prescaler(&self, prescaler: AHBPrescaler) {
        self.registers.cfgr.modify(CFGR::HPRE.val(prescaler as u32));
    }

    pub fn get_ahb_prescaler(&self) -> AHBPrescaler {
        AHBPrescaler::from_bits(self.registers.cfgr.read(CFGR::HPRE))
    }

    pub fn set_apb1_prescaler(&self, prescaler: APBPrescaler) {
        self.registers.cfgr.modify(CFGR::PPRE1.val(prescaler as u32));
    }

    pub fn get_apb1_prescaler(&self) -> APBPrescaler {
        APBPrescaler::from_bits(self.registers.cfgr.read(CFGR::PPRE1))
    }

    pub fn set_apb2_prescaler(&self, prescaler: APBPrescaler) {
        self.registers.cfgr.modify(CFGR::PPRE2.val(prescaler as u32));
    }

    pub fn get_apb2_prescaler(&self) -> APBPrescaler {
        APBPrescaler::from_bits(self.registers.cfgr.read(CFGR::PPRE2))
    }

    pub fn set_adc_prescaler(&self, prescaler: ADCPrescaler) {
        self.registers
            .cfgr
            .modify(CFGR::ADCPRE.val(prescaler as u32));
    }

    pub fn set_usb_prescaler(&self, prescaler: USBPrescaler) {
        let (usbpre, usbsw) = match prescaler {
            USBPrescaler::DivideBy1_5 => (0, 0),
            USBPrescaler::DivideBy1 => (1, 0),
            USBPrescaler::DivideBy2 => (0, 1),
            USBPrescaler::DivideBy2_5 => (0, 2),
            USBPrescaler::DivideBy3 => (0, 3),
            USBPrescaler::DivideBy3_5 => (0, 4),
            USBPrescaler::DivideBy4 => (0, 5),
        };
        self.registers.cfgr.modify(CFGR::USBPRE.val(usbpre));
        self.registers.cfgr3.modify(CFGR3::USBSW.val(usbsw));
    }

    pub fn configure_mco(&self, source: MCOSource, prescaler: MCOPrescaler) {
        let source = source as u32;
        self.registers.cfgr.modify(CFGR::MCO.val(source & 0b111));
        self.registers
            .cfgr5
            .modify(CFGR5::MCO3.val(source >> 3) + CFGR5::MCOPRE.val(prescaler as u32));
    }

    /* RTC and backup domain */

    /// Select the RTC clock. The selection is write-once until the backup
    /// domain is reset, so a different existing choice yields `ALREADY`.
    pub fn set_rtc_clock_source(&self, source: RtcClockSource) -> Result<(), ErrorCode> {
        let current = self.registers.bdcr.read(BDCR::RTCSEL);
        if current != 0 && current != source as u32 {
            return Err(ErrorCode::ALREADY);
        }
        self.registers.bdcr.modify(BDCR::RTCSEL.val(source as u32));
        Ok(())
    }

    pub fn enable_rtc_clock(&self, enable: bool) {
        self.registers.bdcr.modify(BDCR::RTCEN.val(enable as u32));
    }

    pub fn reset_backup_domain(&self) {
        self.registers.bdcr.modify(BDCR::BDRST::SET);
        self.registers.bdcr.modify(BDCR::BDRST::CLEAR);
    }

    /* SAI */

    pub fn set_sai_clock_source(&self, block: SaiBlock, source: SaiClockSource) {
        let (ext, hse, div) = source.fields();
        match block {
            SaiBlock::A => self.registers.cfgr6.modify(
                CFGR6::SAIA_EXT.val(ext) + CFGR6::SAIA_HSE.val(hse) + CFGR6::SAIA_DIV.val(div),
            ),
            SaiBlock::B => self.registers.cfgr6.modify(
                CFGR6::SAIB_EXT.val(ext) + CFGR6::SAIB_HSE.val(hse) + CFGR6::SAIB_DIV.val(div),
            ),
        }
    }

    pub fn get_sai_frequency(&self, block: SaiBlock) -> u32 {
        let (ext, hse, div) = match block {
            SaiBlock::A => (CFGR6::SAIA_EXT, CFGR6::SAIA_HSE, CFGR6::SAIA_DIV),
            SaiBlock::B => (CFGR6::SAIB_EXT, CFGR6::SAIB_HSE, CFGR6::SAIB_DIV),
        };
        if self.registers.cfgr6.is_set(ext) {
            CONFIG.sai_ext_hz
        } else if self.registers.cfgr6.is_set(hse) {
            CONFIG.hse_hz
        } else {
            let presc = (self.registers.cfgr6.read(div) + 1) * 2;
            self.get_clocks_frequency().pclk2 / presc
        }
    }

    /* Frequencies */

    fn sysclk_frequency(&self) -> u32 {
        match self.get_sys_clock_source() {
            SysClockSource::Hsi8m => CONFIG.hsi8m_hz,
            SysClockSource::Hse => CONFIG.hse_hz,
            SysClockSource::Lse => CONFIG.lse_hz,
            SysClockSource::Lsi => CONFIG.lsi_hz,
            SysClockSource::Hsi56m => CONFIG.hsi56m_hz,
            SysClockSource::Hsi28m => CONFIG.hsi28m_hz,
            SysClockSource::Extclk => CONFIG.extclk_hz,
            SysClockSource::Pll => self.pll_output_frequency(),
        }
    }

    fn pll_output_frequency(&self) -> u32 {
        let multiplier = self.pll_multiplier();
        if !self.registers.cfgr.is_set(CFGR::PLLSRC) {
            if self.registers.cfgr.is_set(CFGR::PLLHSIPRE) {
                CONFIG.hsi8m_hz * multiplier
            } else {
                (CONFIG.hsi8m_hz >> 1) * multiplier
            }
        } else {
            let prediv = self.registers.cfgr2.read(CFGR2::PREDIV) + 1;
            let input = if self.registers.cfgr4.is_set(CFGR4::PPSS) {
                CONFIG.hsi56m_hz
            } else {
                CONFIG.hse_hz
            };
            input * multiplier / prediv
        }
    }

    /// Compute the clock tree from the current register state.
    pub fn get_clocks_frequency(&self) -> ClockFrequencies {
        let sysclk = self.sysclk_frequency();
        let cfgr = self.registers.cfgr.extract();
        let hclk = sysclk >> APB_AHB_PRESC_TABLE[cfgr.read(CFGR::HPRE) as usize];
        let pclk1 = hclk >> APB_AHB_PRESC_TABLE[cfgr.read(CFGR::PPRE1) as usize];
        let pclk2 = hclk >> APB_AHB_PRESC_TABLE[cfgr.read(CFGR::PPRE2) as usize];
        let adcclk = pclk2 / ADC_PRESC_TABLE[cfgr.read(CFGR::ADCPRE) as usize];
        ClockFrequencies {
            sysclk,
            hclk,
            pclk1,
            pclk2,
            adcclk,
        }
    }

    /* Flags */

    pub fn reset_cause(&self) -> ResetCause {
        let csr = self.registers.csr.extract();
        ResetCause {
            pin: csr.is_set(CSR::PINRSTF),
            power_on: csr.is_set(CSR::PORRSTF),
            software: csr.is_set(CSR::SFTRSTF),
            independent_watchdog: csr.is_set(CSR::IWDGRSTF),
            window_watchdog: csr.is_set(CSR::WWDGRSTF),
            low_power: csr.is_set(CSR::LPWRRSTF),
        }
    }

    pub fn clear_reset_flags(&self) {
        self.registers.csr.modify(CSR::RMVF::SET);
    }

    pub fn enable_interrupt(&self, interrupt: RccInterrupt) {
        if interrupt != RccInterrupt::ClockSecurity {
            set_bit(&self.registers.cir, interrupt as u32 + 8, true);
        }
    }

    pub fn disable_interrupt(&self, interrupt: RccInterrupt) {
        if interrupt != RccInterrupt::ClockSecurity {
            set_bit(&self.registers.cir, interrupt as u32 + 8, false);
        }
    }

    pub fn is_pending(&self, interrupt: RccInterrupt) -> bool {
        is_bit_set(&self.registers.cir, interrupt as u32)
    }

    pub fn clear_pending(&self, interrupt: RccInterrupt) {
        set_bit(&self.registers.cir, interrupt as u32 + 16, true);
    }

    /* System clock sequences */

    /// Bring up a complete clock configuration: start the source, set the
    /// flash wait states and bus prescalers, then switch.
    pub fn init_system_clock(
        &self,
        flash: &Flash,
        config: SystemClockConfig,
    ) -> Result<(), ErrorCode> {
        let (source, frequency) = match config {
            SystemClockConfig::Hsi8m => {
                self.enable_hsi8m()?;
                (SysClockSource::Hsi8m, CONFIG.hsi8m_hz)
            }
            SystemClockConfig::Hse(mode) => {
                self.enable_hse(mode)?;
                (SysClockSource::Hse, CONFIG.hse_hz)
            }
            SystemClockConfig::Hse72m => return self.init_hse_pll(flash, 9, 1),
            SystemClockConfig::Hse90m => return self.init_hse_pll(flash, 79, 7),
            SystemClockConfig::Hse98m => return self.init_hse_pll(flash, 49, 4),
            SystemClockConfig::Hse120m => return self.init_hse_pll(flash, 15, 1),
            SystemClockConfig::Hsi56m => {
                self.enable_hsi56m()?;
                (SysClockSource::Hsi56m, CONFIG.hsi56m_hz)
            }
            SystemClockConfig::Hsi28m => {
                self.enable_hsi28m()?;
                (SysClockSource::Hsi28m, CONFIG.hsi28m_hz)
            }
            SystemClockConfig::Lse => {
                self.enable_lse(HseMode::Crystal)?;
                (SysClockSource::Lse, CONFIG.lse_hz)
            }
            SystemClockConfig::Lsi => {
                self.enable_lsi()?;
                (SysClockSource::Lsi, CONFIG.lsi_hz)
            }
            SystemClockConfig::Extclk => {
                // PA1 resets to floating input, only the port clock is needed.
                set_bit(
                    &self.registers.apb2enr,
                    PCLK2::GPIOA as u32,
                    true,
                );
                self.select_extclk_pin(CFGR5::EXTCLK_SEL::Value::PA1);
                (SysClockSource::Extclk, CONFIG.extclk_hz)
            }
            SystemClockConfig::Pll {
                source,
                multiplier,
                prediv,
            } => {
                let frequency = pll_frequency(source, multiplier, prediv);
                if frequency > SYSCLK_MAX_HZ {
                    return Err(ErrorCode::INVAL);
                }
                match source {
                    PllSource::HsiDiv2 | PllSource::Hsi => self.enable_hsi8m()?,
                    PllSource::Hse => self.enable_hse(HseMode::Crystal)?,
                    PllSource::Hsi56m => self.enable_hsi56m()?,
                }
                (SysClockSource::Pll, frequency)
            }
        };

        // Wait states go up before a faster clock runs and down only after.
        let raising = frequency > self.sysclk_frequency();
        flash.enable_prefetch_buffer(true);
        if raising {
            flash.set_latency(frequency);
        }
        self.set_ahb_prescaler(AHBPrescaler::DivideBy1);
        self.set_apb2_prescaler(APBPrescaler::DivideBy1);
        if let SystemClockConfig::Pll {
            source,
            multiplier,
            prediv,
        } = config
        {
            // APB1 tops out at half the PLL range.
            self.set_apb1_prescaler(APBPrescaler::DivideBy2);
            self.configure_pll(source, multiplier, prediv)?;
            self.enable_pll()?;
        } else {
            self.set_apb1_prescaler(APBPrescaler::DivideBy1);
        }
        self.set_sys_clock_source(source)?;
        if !raising {
            flash.set_latency(frequency);
        }
        debug!("rcc: system clock at {} Hz", frequency);
        Ok(())
    }

    fn init_hse_pll(&self, flash: &Flash, multiplier: u8, prediv: u8) -> Result<(), ErrorCode> {
        self.init_system_clock(
            flash,
            SystemClockConfig::Pll {
                source: PllSource::Hse,
                multiplier,
                prediv,
            },
        )
    }
}

/// Bus + clock name for the peripherals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralClockType {
    AHB(HCLK),
    AHB2(HCLK2),
    APB1(PCLK1),
    APB2(PCLK2),
    /// Devices in the second APB2 enable register
    APB2EXT(PCLK2EXT),
}

/// Peripherals clocked by HCLK, numbered by their `AHBENR` bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HCLK {
    DMA1 = 0,
    DMA2 = 1,
    SRAM = 2,
    FLITF = 4,
    CRC = 6,
    FSMC = 8,
    SDIO = 10,
}

/// Peripherals on the AHB2, numbered by their `AHBENR2` bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HCLK2 {
    COALU = 0,
    AES = 1,
    HASH = 2,
    RNG = 3,
    DCMI = 4,
    QSPI = 5,
}

/// Peripherals clocked by PCLK1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PCLK1 {
    TIM2 = 0,
    TIM3 = 1,
    TIM4 = 2,
    TIM5 = 3,
    TIM6 = 4,
    TIM7 = 5,
    WWDG = 11,
    SPI2 = 14,
    SPI3 = 15,
    USART2 = 17,
    USART3 = 18,
    UART4 = 19,
    UART5 = 20,
    I2C1 = 21,
    I2C2 = 22,
    USB = 23,
    CAN1 = 25,
    CAN2 = 26,
    BKP = 27,
    PWR = 28,
    DAC = 29,
}

/// Peripherals clocked by PCLK2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PCLK2 {
    AFIO = 0,
    GPIOA = 2,
    GPIOB = 3,
    GPIOC = 4,
    GPIOD = 5,
    GPIOE = 6,
    GPIOF = 7,
    GPIOG = 8,
    ADC1 = 9,
    ADC2 = 10,
    TIM1 = 11,
    SPI1 = 12,
    TIM8 = 13,
    USART1 = 14,
    ADC3 = 15,
}

/// APB2 devices added by the HK32
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PCLK2EXT {
    USART6 = 0,
    VC = 1,
    SAIA = 2,
    SAIB = 3,
    PDMA = 4,
    PDMB = 5,
}

pub struct PeripheralClock<'a> {
    pub clock: PeripheralClockType,
    rcc: &'a Rcc,
}

impl<'a> PeripheralClock<'a> {
    pub const fn new(clock: PeripheralClockType, rcc: &'a Rcc) -> Self {
        Self { clock, rcc }
    }

    pub fn is_enabled(&self) -> bool {
        let regs = &self.rcc.registers;
        match self.clock {
            PeripheralClockType::AHB(v) => is_bit_set(&regs.ahbenr, v as u32),
            PeripheralClockType::AHB2(v) => is_bit_set(&regs.ahbenr2, v as u32),
            PeripheralClockType::APB1(v) => is_bit_set(&regs.apb1enr, v as u32),
            PeripheralClockType::APB2(v) => is_bit_set(&regs.apb2enr, v as u32),
            PeripheralClockType::APB2EXT(v) => is_bit_set(&regs.apb2enr2, v as u32),
        }
    }

    fn set_enable(&self, enable: bool) {
        let regs = &self.rcc.registers;
        match self.clock {
            PeripheralClockType::AHB(v) => set_bit(&regs.ahbenr, v as u32, enable),
            PeripheralClockType::AHB2(v) => set_bit(&regs.ahbenr2, v as u32, enable),
            PeripheralClockType::APB1(v) => set_bit(&regs.apb1enr, v as u32, enable),
            PeripheralClockType::APB2(v) => set_bit(&regs.apb2enr, v as u32, enable),
            PeripheralClockType::APB2EXT(v) => set_bit(&regs.apb2enr2, v as u32, enable),
        }
    }

    pub fn enable(&self) {
        self.set_enable(true);
    }

    pub fn disable(&self) {
        self.set_enable(false);
    }

    fn set_reset(&self, asserted: bool) {
        let regs = &self.rcc.registers;
        match self.clock {
            PeripheralClockType::AHB(v) => set_bit(&regs.ahbrstr, v as u32, asserted),
            PeripheralClockType::AHB2(v) => set_bit(&regs.ahbrstr2, v as u32, asserted),
            PeripheralClockType::APB1(v) => set_bit(&regs.apb1rstr, v as u32, asserted),
            PeripheralClockType::APB2(v) => set_bit(&regs.apb2rstr, v as u32, asserted),
            PeripheralClockType::APB2EXT(v) => set_bit(&regs.apb2rstr2, v as u32, asserted),
        }
    }

    /// Pulse the peripheral reset line.
    pub fn reset(&self) {
        self.set_reset(true);
        self.set_reset(false);
    }

    pub fn get_frequency(&self) -> u32 {
        // Timers on a divided APB run at twice the bus clock.
        fn tim_freq(pclk: u32, prescaler: APBPrescaler) -> u32 {
            match prescaler {
                APBPrescaler::DivideBy1 => pclk,
                _ => pclk * 2,
            }
        }
        let clocks = self.rcc.get_clocks_frequency();
        match self.clock {
            PeripheralClockType::AHB(_) | PeripheralClockType::AHB2(_) => clocks.hclk,
            PeripheralClockType::APB1(v) => match v {
                PCLK1::TIM2
                | PCLK1::TIM3
                | PCLK1::TIM4
                | PCLK1::TIM5
                | PCLK1::TIM6
                | PCLK1::TIM7 => tim_freq(clocks.pclk1, self.rcc.get_apb1_prescaler()),
                _ => clocks.pclk1,
            },
            PeripheralClockType::APB2(v) => match v {
                PCLK2::TIM1 | PCLK2::TIM8 => {
                    tim_freq(clocks.pclk2, self.rcc.get_apb2_prescaler())
                }
                PCLK2::ADC1 | PCLK2::ADC2 | PCLK2::ADC3 => clocks.adcclk,
                _ => clocks.pclk2,
            },
            PeripheralClockType::APB2EXT(_) => clocks.pclk2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_registers;
    use crate::flash::{FlashRegisters, ACR};

    fn rcc() -> (StaticRef<RccRegisters>, Rcc) {
        let regs = fake_registers::<RccRegisters>();
        (regs, Rcc::with_registers(regs))
    }

    #[test]
    fn register_layout() {
        assert_eq!(core::mem::offset_of!(RccRegisters, cr), 0x00);
        assert_eq!(core::mem::offset_of!(RccRegisters, bdcr), 0x20);
        assert_eq!(core::mem::offset_of!(RccRegisters, cfgr2), 0x2C);
        assert_eq!(core::mem::offset_of!(RccRegisters, cfgr6), 0x4C);
        assert_eq!(core::mem::offset_of!(RccRegisters, cfgr5), 0xEC);
        assert_eq!(CR::PLLON::SET.value, 0x0100_0000);
        assert_eq!(CR::HSERDY::SET.value, 0x0002_0000);
        assert_eq!(CFGR::PLLMUL.val(7).value, 0x001C_0000);
        assert_eq!(CFGR::PPRE1.val(0b100).value, 0x0000_0400);
        assert_eq!(CSR::RMVF::SET.value, 0x0100_0000);
    }

    #[test]
    fn deinit_restores_reset_masks() {
        let (regs, rcc) = rcc();
        regs.cr.set(0xFFFF_FFFF);
        regs.cfgr.set(0xFFFF_FFFF);
        rcc.deinit();
        assert_eq!(regs.cr.get(), 0xFEF2_FFFF);
        assert_eq!(regs.cfgr.get(), 0xF080_0000);
        assert_eq!(regs.cir.get(), 0x009F_0000);
    }

    #[test]
    fn oscillator_start_times_out() {
        let (regs, rcc) = rcc();
        assert_eq!(rcc.enable_hse(HseMode::Bypass), Err(ErrorCode::BUSY));
        assert!(regs.cr.is_set(CR::HSEON));
        assert!(regs.cr.is_set(CR::HSEBYP));

        regs.cr2.modify(CR2::HSI56RDY::SET);
        assert_eq!(rcc.enable_hsi56m(), Ok(()));
        assert!(regs.cr2.is_set(CR2::HSI56ON));
    }

    #[test]
    fn hsi_trim_range() {
        let (regs, rcc) = rcc();
        assert_eq!(rcc.adjust_hsi_calibration(0x20), Err(ErrorCode::INVAL));
        assert_eq!(rcc.adjust_hsi_calibration(0x10), Ok(()));
        assert_eq!(regs.cr.get(), 0x10 << 3);
    }

    #[test]
    fn pll_configuration() {
        let (regs, rcc) = rcc();
        assert_eq!(rcc.configure_pll(PllSource::Hse, 1, 1), Err(ErrorCode::INVAL));
        assert_eq!(rcc.configure_pll(PllSource::Hse, 128, 1), Err(ErrorCode::INVAL));
        assert_eq!(rcc.configure_pll(PllSource::Hse, 9, 0), Err(ErrorCode::INVAL));

        assert_eq!(rcc.configure_pll(PllSource::Hsi56m, 4, 2), Ok(()));
        assert!(regs.cfgr4.is_set(CFGR4::PPSS));
        assert_eq!(regs.cfgr2.read(CFGR2::PREDIV), 1);
        assert_eq!(regs.cfgr.read(CFGR::PLLMUL), 2);
        assert!(regs.cfgr.is_set(CFGR::PLLSRC));

        regs.cr.modify(CR::PLLON::SET);
        assert_eq!(rcc.configure_pll(PllSource::Hse, 9, 1), Err(ErrorCode::BUSY));
    }

    #[test]
    fn extended_pll_factor() {
        let (regs, rcc) = rcc();
        regs.cfgr.write(CFGR::SWS.val(0b10));

        assert_eq!(rcc.configure_pll(PllSource::Hse, 79, 7), Ok(()));
        assert_eq!(regs.cfgr4.read(CFGR4::PLLMULL), 4);
        assert_eq!(regs.cfgr.read(CFGR::PLLMUL), 15);
        assert_eq!(regs.cfgr2.read(CFGR2::PREDIV), 6);
        assert_eq!(rcc.get_clocks_frequency().sysclk, 90_285_714);

        assert_eq!(rcc.configure_pll(PllSource::Hse, 16, 1), Ok(()));
        assert_eq!(regs.cfgr4.read(CFGR4::PLLMULL), 0);
        assert_eq!(regs.cfgr.read(CFGR::PLLMUL), 14);
        assert_eq!(rcc.get_clocks_frequency().sysclk, 128_000_000);

        assert_eq!(rcc.configure_pll(PllSource::Hse, 127, 16), Ok(()));
        assert_eq!(regs.cfgr4.read(CFGR4::PLLMULL), 7);
        assert_eq!(regs.cfgr.read(CFGR::PLLMUL), 15);
    }

    #[test]
    fn frequencies_for_72mhz_from_hse() {
        let (regs, rcc) = rcc();
        regs.cfgr.write(
            CFGR::SWS.val(0b10)
                + CFGR::PLLSRC::PREDIV
                + CFGR::PLLMUL.val(7)
                + CFGR::PPRE1.val(0b100)
                + CFGR::ADCPRE.val(0b10),
        );
        assert_eq!(
            rcc.get_clocks_frequency(),
            ClockFrequencies {
                sysclk: 72_000_000,
                hclk: 72_000_000,
                pclk1: 36_000_000,
                pclk2: 72_000_000,
                adcclk: 12_000_000,
            }
        );
    }

    #[test]
    fn frequencies_for_pll_from_hsi() {
        let (regs, rcc) = rcc();
        // HSI8M / 2 * 16
        regs.cfgr.write(CFGR::SWS.val(0b10) + CFGR::PLLMUL.val(14) + CFGR::HPRE.val(0b1000));
        let clocks = rcc.get_clocks_frequency();
        assert_eq!(clocks.sysclk, 64_000_000);
        assert_eq!(clocks.hclk, 32_000_000);
        assert_eq!(clocks.adcclk, 16_000_000);
    }

    #[test]
    fn extended_system_clock() {
        let (regs, rcc) = rcc();
        regs.cfgr5.write(CFGR5::ESWS.val(3));
        assert_eq!(rcc.set_sys_clock_source(SysClockSource::Hsi28m), Ok(()));
        assert_eq!(regs.cfgr5.read(CFGR5::ESW), 3);
        assert!(regs.cfgr5.is_set(CFGR5::ESSS));
        assert_eq!(rcc.get_clocks_frequency().sysclk, 28_000_000);

        // ESWS still reports HSI28M, so the LSI switch never completes.
        assert_eq!(
            rcc.set_sys_clock_source(SysClockSource::Lsi),
            Err(ErrorCode::BUSY)
        );
    }

    #[test]
    fn reserved_extended_status_reads_as_hsi8m() {
        let (regs, rcc) = rcc();
        regs.cfgr.write(CFGR::SWS.val(0b01));
        regs.cfgr5.write(CFGR5::ESSS::SET + CFGR5::ESWS.val(6));
        assert_eq!(rcc.get_sys_clock_source(), SysClockSource::Hsi8m);
        assert_eq!(rcc.get_clocks_frequency().sysclk, CONFIG.hsi8m_hz);

        regs.cfgr5.write(CFGR5::ESSS::SET + CFGR5::ESWS.val(4));
        assert_eq!(rcc.get_sys_clock_source(), SysClockSource::Extclk);
        assert_eq!(rcc.get_clocks_frequency().sysclk, CONFIG.extclk_hz);
    }

    #[test]
    fn base_switch_clears_extended_select() {
        let (regs, rcc) = rcc();
        regs.cfgr5.write(CFGR5::ESSS::SET);
        regs.cfgr.write(CFGR::SWS.val(0b01));
        assert_eq!(rcc.set_sys_clock_source(SysClockSource::Hse), Ok(()));
        assert!(!regs.cfgr5.is_set(CFGR5::ESSS));
        assert_eq!(rcc.get_sys_clock_source(), SysClockSource::Hse);
    }

    #[test]
    fn mco_selection_spans_two_registers() {
        let (regs, rcc) = rcc();
        rcc.configure_mco(MCOSource::Lse, MCOPrescaler::DivideBy4);
        assert_eq!(regs.cfgr.read(CFGR::MCO), 0b101);
        assert!(regs.cfgr5.is_set(CFGR5::MCO3));
        assert_eq!(regs.cfgr5.read(CFGR5::MCOPRE), 2);
    }

    #[test]
    fn usb_prescaler_encoding() {
        let (regs, rcc) = rcc();
        rcc.set_usb_prescaler(USBPrescaler::DivideBy1);
        assert!(regs.cfgr.is_set(CFGR::USBPRE));
        assert_eq!(regs.cfgr3.read(CFGR3::USBSW), 0);
        rcc.set_usb_prescaler(USBPrescaler::DivideBy2_5);
        assert!(!regs.cfgr.is_set(CFGR::USBPRE));
        assert_eq!(regs.cfgr3.get(), 0x200);
    }

    #[test]
    fn rtc_source_is_write_once() {
        let (regs, rcc) = rcc();
        assert_eq!(rcc.set_rtc_clock_source(RtcClockSource::LSE), Ok(()));
        assert_eq!(regs.bdcr.get(), 0x100);
        assert_eq!(
            rcc.set_rtc_clock_source(RtcClockSource::LSI),
            Err(ErrorCode::ALREADY)
        );
    }

    #[test]
    fn sai_clock() {
        let (regs, rcc) = rcc();
        regs.cfgr.write(CFGR::SWS.val(0b01));
        rcc.set_sai_clock_source(SaiBlock::B, SaiClockSource::Pclk2DivideBy8);
        assert_eq!(regs.cfgr6.get(), 3 << 5);
        assert_eq!(rcc.get_sai_frequency(SaiBlock::B), 1_000_000);
        rcc.set_sai_clock_source(SaiBlock::A, SaiClockSource::Hse);
        assert_eq!(rcc.get_sai_frequency(SaiBlock::A), CONFIG.hse_hz);
    }

    #[test]
    fn reset_flags() {
        let (regs, rcc) = rcc();
        regs.csr.write(CSR::PINRSTF::SET + CSR::SFTRSTF::SET);
        let cause = rcc.reset_cause();
        assert!(cause.pin && cause.software);
        assert!(!cause.power_on);
        rcc.clear_reset_flags();
        assert!(regs.csr.is_set(CSR::RMVF));
    }

    #[test]
    fn interrupt_bits() {
        let (regs, rcc) = rcc();
        rcc.enable_interrupt(RccInterrupt::PllReady);
        assert!(regs.cir.is_set(CIR::PLLRDYIE));
        rcc.clear_pending(RccInterrupt::ClockSecurity);
        assert!(regs.cir.is_set(CIR::CSSC));
    }

    #[test]
    fn peripheral_clock_gating() {
        let (regs, rcc) = rcc();
        let usart1 = PeripheralClock::new(PeripheralClockType::APB2(PCLK2::USART1), &rcc);
        usart1.enable();
        assert_eq!(regs.apb2enr.get(), 0x4000);
        assert!(usart1.is_enabled());
        usart1.reset();
        assert_eq!(regs.apb2rstr.get(), 0);
        usart1.disable();
        assert!(!usart1.is_enabled());

        let aes = PeripheralClock::new(PeripheralClockType::AHB2(HCLK2::AES), &rcc);
        aes.enable();
        assert!(regs.ahbenr2.is_set(AHBENR2::AESEN));
        let sai = PeripheralClock::new(PeripheralClockType::APB2EXT(PCLK2EXT::SAIB), &rcc);
        sai.enable();
        assert!(regs.apb2enr2.is_set(APB2ENR2::SAIBEN));
    }

    #[test]
    fn timer_clock_doubles_on_divided_bus() {
        let (regs, rcc) = rcc();
        regs.cfgr.write(
            CFGR::SWS.val(0b10)
                + CFGR::PLLSRC::PREDIV
                + CFGR::PLLMUL.val(7)
                + CFGR::PPRE1.val(0b100),
        );
        let tim2 = PeripheralClock::new(PeripheralClockType::APB1(PCLK1::TIM2), &rcc);
        let usart2 = PeripheralClock::new(PeripheralClockType::APB1(PCLK1::USART2), &rcc);
        assert_eq!(tim2.get_frequency(), 72_000_000);
        assert_eq!(usart2.get_frequency(), 36_000_000);
    }

    #[test]
    fn system_clock_72mhz_sequence() {
        let (regs, rcc) = rcc();
        let flash_regs = fake_registers::<FlashRegisters>();
        let flash = Flash::with_registers(flash_regs);
        regs.cr.write(CR::HSERDY::SET + CR::PLLRDY::SET);
        regs.cfgr.write(CFGR::SWS.val(0b10));

        assert_eq!(rcc.init_system_clock(&flash, SystemClockConfig::Hse72m), Ok(()));
        assert_eq!(regs.cfgr.read(CFGR::SW), 0b10);
        assert!(regs.cr.is_set(CR::PLLON));
        assert_eq!(flash_regs.acr.read(ACR::LATENCY), 2);
        assert!(flash_regs.acr.is_set(ACR::PRFTBE));
        let clocks = rcc.get_clocks_frequency();
        assert_eq!(clocks.sysclk, 72_000_000);
        assert_eq!(clocks.pclk1, 36_000_000);
    }

    #[test]
    fn system_clock_vendor_pll_presets() {
        let presets = [
            (SystemClockConfig::Hse90m, 90_285_714, 3),
            (SystemClockConfig::Hse98m, 98_000_000, 4),
            (SystemClockConfig::Hse120m, 120_000_000, 6),
        ];
        for (config, sysclk, latency) in presets {
            let (regs, rcc) = rcc();
            let flash_regs = fake_registers::<FlashRegisters>();
            let flash = Flash::with_registers(flash_regs);
            regs.cr.write(CR::HSERDY::SET + CR::PLLRDY::SET);
            regs.cfgr.write(CFGR::SWS.val(0b10));

            assert_eq!(rcc.init_system_clock(&flash, config), Ok(()));
            assert_eq!(flash_regs.acr.read(ACR::LATENCY), latency);
            assert_eq!(rcc.get_clocks_frequency().sysclk, sysclk);
        }
    }

    #[test]
    fn wait_states_rise_before_a_faster_clock() {
        let (regs, rcc) = rcc();
        let flash_regs = fake_registers::<FlashRegisters>();
        let flash = Flash::with_registers(flash_regs);
        // PLL ready but SWS stays on HSI8M, so the switch times out.
        regs.cr.write(CR::HSERDY::SET + CR::PLLRDY::SET);

        assert_eq!(
            rcc.init_system_clock(&flash, SystemClockConfig::Hse72m),
            Err(ErrorCode::BUSY)
        );
        assert_eq!(flash_regs.acr.read(ACR::LATENCY), 2);
    }

    #[test]
    fn wait_states_drop_after_a_slower_clock() {
        let (regs, rcc) = rcc();
        let flash_regs = fake_registers::<FlashRegisters>();
        let flash = Flash::with_registers(flash_regs);
        flash_regs.acr.write(ACR::LATENCY::TwoWaitState);
        regs.cfgr.write(CFGR::SWS.val(0b10) + CFGR::PLLSRC::PREDIV + CFGR::PLLMUL.val(7));
        regs.csr.write(CSR::LSIRDY::SET);

        // ESWS does not report LSI yet, the core keeps running at 72 MHz.
        assert_eq!(
            rcc.init_system_clock(&flash, SystemClockConfig::Lsi),
            Err(ErrorCode::BUSY)
        );
        assert_eq!(flash_regs.acr.read(ACR::LATENCY), 2);

        regs.cfgr5.modify(CFGR5::ESWS.val(1));
        assert_eq!(rcc.init_system_clock(&flash, SystemClockConfig::Lsi), Ok(()));
        assert_eq!(flash_regs.acr.read(ACR::LATENCY), 0);
        assert_eq!(rcc.get_clocks_frequency().sysclk, CONFIG.lsi_hz);
    }

    #[test]
    fn pll_above_limit_is_rejected() {
        let (_, rcc) = rcc();
        let flash = Flash::with_registers(fake_registers());
        let config = SystemClockConfig::Pll {
            source: PllSource::Hse,
            multiplier: 16,
            prediv: 1,
        };
        assert_eq!(rcc.init_system_clock(&flash, config), Err(ErrorCode::INVAL));
    }
}
