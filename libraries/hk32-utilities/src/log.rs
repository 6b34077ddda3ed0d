// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Logging macros for the HK32 crates.
//!
//! With the `defmt` feature enabled the macros forward to the matching
//! `defmt` macro, so the calling crate must depend on `defmt` as well. Without
//! the feature they expand to nothing.

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::__log!(trace, $($arg)*) };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::__log!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__log!(info, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__log!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__log!(error, $($arg)*) };
}

#[doc(hidden)]
#[cfg(feature = "defmt")]
#[macro_export]
macro_rules! __log {
    ($level:ident, $($arg:tt)*) => {
        defmt::$level!($($arg)*)
    };
}

#[doc(hidden)]
#[cfg(not(feature = "defmt"))]
#[macro_export]
macro_rules! __log {
    ($level:ident, $($arg:tt)*) => {
        ()
    };
}

#[cfg(test)]
mod tests {
    use crate::ErrorCode;

    #[test]
    fn macros_are_expressions() {
        let timeout: Result<(), ErrorCode> = Err(ErrorCode::BUSY);
        let res = timeout.inspect_err(|_| crate::warn!("flag timeout"));
        assert_eq!(res, Err(ErrorCode::BUSY));
        let () = crate::debug!("ready");
    }
}
