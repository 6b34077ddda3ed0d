// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Peripheral implementations for the HK32F39A MCU.
//!
//! The HK32F39A is an STM32F103 high-density compatible Cortex-M3 with
//! additional crypto, arithmetic, camera, audio and quad-SPI blocks. Each
//! module holds the register layout of one peripheral type, its bit fields,
//! the `StaticRef` instances and, where the part needs more than raw register
//! access, a small driver.

#![no_std]

pub mod config;
pub mod memory_map;
pub mod nvic;

// Peripherals
pub mod adc;
pub mod aes;
pub mod afio;
pub mod bkp;
pub mod can;
pub mod coalu;
pub mod crc;
pub mod dac;
pub mod dbgmcu;
pub mod dcmi;
pub mod dma;
pub mod exti;
pub mod flash;
pub mod fsmc;
pub mod gpio;
pub mod hash;
pub mod i2c;
pub mod iwdg;
pub mod pwr;
pub mod qspi;
pub mod rcc;
pub mod rng;
pub mod rtc;
pub mod sai;
pub mod sdio;
pub mod spi;
pub mod tim;
pub mod usart;
pub mod usb;
pub mod wwdg;

#[cfg(test)]
#[macro_use]
extern crate std;

/// Allocate a zeroed register block on the host heap for unit tests.
#[cfg(test)]
pub(crate) fn fake_registers<T: 'static>() -> hk32_utilities::StaticRef<T> {
    // SAFETY: register blocks are plain integer cells, zero is a valid state.
    let block: &'static mut T = std::boxed::Box::leak(std::boxed::Box::new(unsafe {
        core::mem::zeroed::<T>()
    }));
    unsafe { hk32_utilities::StaticRef::new(block as *const T) }
}
