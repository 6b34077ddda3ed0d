// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Standard error enum for register-level operations.

use core::convert::TryFrom;
use core::fmt;

/// Errors returned by the HK32 drivers.
///
/// Hardware waits are bounded: a flag that never rises yields `BUSY`, a
/// flag that reports a fault yields `FAIL` (or a more specific variant), and
/// an argument outside of what the silicon accepts yields `INVAL`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 1,
    /// Underlying system is busy; retry
    BUSY = 2,
    /// The state requested is already set
    ALREADY = 3,
    /// The component is powered down
    OFF = 4,
    /// Reservation required before use, or the target is write protected
    RESERVE = 5,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Parameter passed was too large
    SIZE = 7,
    /// Operation canceled by a call
    CANCEL = 8,
    /// Memory required not available
    NOMEM = 9,
    /// Operation or command is unsupported
    NOSUPPORT = 10,
    /// Device does not exist
    NODEVICE = 11,
    /// Device is not physically installed
    UNINSTALLED = 12,
    /// Packet transmission not acknowledged
    NOACK = 13,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

impl TryFrom<usize> for ErrorCode {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ErrorCode::FAIL),
            2 => Ok(ErrorCode::BUSY),
            3 => Ok(ErrorCode::ALREADY),
            4 => Ok(ErrorCode::OFF),
            5 => Ok(ErrorCode::RESERVE),
            6 => Ok(ErrorCode::INVAL),
            7 => Ok(ErrorCode::SIZE),
            8 => Ok(ErrorCode::CANCEL),
            9 => Ok(ErrorCode::NOMEM),
            10 => Ok(ErrorCode::NOSUPPORT),
            11 => Ok(ErrorCode::NODEVICE),
            12 => Ok(ErrorCode::UNINSTALLED),
            13 => Ok(ErrorCode::NOACK),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match *self {
            ErrorCode::FAIL => "generic failure",
            ErrorCode::BUSY => "busy",
            ErrorCode::ALREADY => "already set",
            ErrorCode::OFF => "powered down",
            ErrorCode::RESERVE => "reserved or protected",
            ErrorCode::INVAL => "invalid parameter",
            ErrorCode::SIZE => "size",
            ErrorCode::CANCEL => "canceled",
            ErrorCode::NOMEM => "no memory",
            ErrorCode::NOSUPPORT => "not supported",
            ErrorCode::NODEVICE => "no device",
            ErrorCode::UNINSTALLED => "not installed",
            ErrorCode::NOACK => "not acknowledged",
        };
        f.write_str(text)
    }
}

/// Spin until `done` returns true or `attempts` polls have elapsed.
///
/// Every bounded wait in the drivers goes through here so that an absent
/// ready flag always turns into `ErrorCode::BUSY` instead of a hang.
pub fn wait_until<F: FnMut() -> bool>(attempts: u32, mut done: F) -> Result<(), ErrorCode> {
    for _ in 0..attempts {
        if done() {
            return Ok(());
        }
    }
    if done() {
        Ok(())
    } else {
        Err(ErrorCode::BUSY)
    }
}
