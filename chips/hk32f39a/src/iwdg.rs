// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Independent watchdog register map, clocked from LSI.

use crate::memory_map;
use hk32_utilities::registers::{
    register_bitfields, register_structs, ReadOnly, ReadWrite, WriteOnly,
};
use hk32_utilities::StaticRef;

register_structs! {
    pub IwdgRegisters {
        (0x00 => pub kr: WriteOnly<u32, KR::Register>),
        /// Prescaler register
        (0x04 => pub pr: ReadWrite<u32, PR::Register>),
        /// Reload register
        (0x08 => pub rlr: ReadWrite<u32, RLR::Register>),
        (0x0C => pub sr: ReadOnly<u32, SR::Register>),
        (0x10 => @END),
    }
}

register_bitfields![u32,
    pub KR [
        KEY OFFSET(0) NUMBITS(16) [
            /// Reload the counter
            Reload = 0xAAAA,
            /// Unlock `PR` and `RLR`
            Access = 0x5555,
            Start = 0xCCCC
        ]
    ],
    pub PR [
        PR OFFSET(0) NUMBITS(3) [
            Div4 = 0,
            Div8 = 1,
            Div16 = 2,
            Div32 = 3,
            Div64 = 4,
            Div128 = 5,
            Div256 = 6
        ]
    ],
    pub RLR [
        RL OFFSET(0) NUMBITS(12) []
    ],
    pub SR [
        /// Reload value update in progress
        RVU OFFSET(1) NUMBITS(1) [],
        /// Prescaler update in progress
        PVU OFFSET(0) NUMBITS(1) []
    ]
];

pub const IWDG_BASE: StaticRef<IwdgRegisters> =
    unsafe { StaticRef::new(memory_map::IWDG_BASE as *const IwdgRegisters) };
