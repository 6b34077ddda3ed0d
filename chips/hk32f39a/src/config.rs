// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Compile-time chip configuration.
//!
//! Oscillator frequencies and startup timeouts are board facts; they are
//! gathered in one `const` object so that clock code is type-checked for all
//! values. The package is the only item taken from cargo features, and this
//! is the only place where those features are read.

/// Physical package of the part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Package {
    /// LQFP64, ports A to D
    Ret6,
    /// LQFP100, ports A to E
    Vet6,
    /// LQFP144, ports A to G
    Zet6,
}

impl Package {
    /// Number of GPIO ports bonded out.
    pub const fn gpio_ports(self) -> usize {
        match self {
            Package::Ret6 => 4,
            Package::Vet6 => 5,
            Package::Zet6 => 7,
        }
    }
}

/// Data structure holding compile-time configuration options.
pub struct Config {
    pub package: Package,
    /// External high speed crystal or clock, Hz
    pub hse_hz: u32,
    /// Internal 8 MHz RC oscillator, Hz
    pub hsi8m_hz: u32,
    /// Internal 28 MHz RC oscillator, Hz
    pub hsi28m_hz: u32,
    /// Internal 56 MHz RC oscillator, Hz
    pub hsi56m_hz: u32,
    /// External low speed crystal, Hz
    pub lse_hz: u32,
    /// Internal low speed RC oscillator, Hz
    pub lsi_hz: u32,
    /// External clock input on PA1, Hz
    pub extclk_hz: u32,
    /// External SAI master clock input, Hz
    pub sai_ext_hz: u32,
    /// Polls before giving up on HSE, HSI28M, HSI56M and PLL ready flags
    pub hse_startup_timeout: u32,
    /// Polls before giving up on LSE and LSI ready flags
    pub ls_startup_timeout: u32,
    /// Polls for generic peripheral flags (flash, crypto, serial)
    pub flag_timeout: u32,
}

const fn package() -> Package {
    if cfg!(feature = "hk32f39azet6") {
        Package::Zet6
    } else if cfg!(feature = "hk32f39avet6") {
        Package::Vet6
    } else {
        Package::Ret6
    }
}

/// The configuration used by the chip crate.
pub const CONFIG: Config = Config {
    package: package(),
    hse_hz: 8_000_000,
    hsi8m_hz: 8_000_000,
    hsi28m_hz: 28_000_000,
    hsi56m_hz: 56_000_000,
    lse_hz: 32_768,
    lsi_hz: 40_000,
    extclk_hz: 8_000_000,
    sai_ext_hz: 12_288_000,
    hse_startup_timeout: 0x0500,
    ls_startup_timeout: 0xFFFF,
    flag_timeout: 0x000F_FFFF,
};

/// Highest supported system clock, Hz.
pub const SYSCLK_MAX_HZ: u32 = 120_000_000;
