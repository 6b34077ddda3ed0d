// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Support types shared by the HK32 architecture and chip crates.
//!
//! This crate carries the small set of building blocks every register-level
//! driver needs: a `Copy` pointer to memory-mapped registers, the common
//! error enum, the register macros and the logging macros.

#![no_std]

pub mod errorcode;
pub mod log;
pub mod static_ref;

pub use crate::errorcode::ErrorCode;
pub use crate::static_ref::StaticRef;

/// Re-export the tock-register-interface library so that chip crates name a
/// single register vocabulary.
pub mod registers {
    pub use tock_registers::fields::{Field, FieldValue};
    pub use tock_registers::interfaces;
    pub use tock_registers::registers::{
        Aliased, InMemoryRegister, ReadOnly, ReadWrite, WriteOnly,
    };
    pub use tock_registers::{register_bitfields, register_structs};
    pub use tock_registers::{LocalRegisterCopy, RegisterLongName};
}

// Host tests need the standard library for the harness.
#[cfg(test)]
#[macro_use]
extern crate std;
