// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Gridpack.
#[derive(Debug)]
pub enum Error {
    /// An argument or input buffer did not satisfy the preconditions of the operation.
    InvalidInput(&'static str),
    /// An output buffer or stream does not have enough room for the encoding.
    CapacityExceeded(&'static str),
    /// A stream contained malformed data and could not be decoded.
    DecodeError(&'static str),
    /// An unsupported feature or parameter combination was encountered.
    Unsupported(&'static str),
    /// A built-in limit of an encoder or descriptor field was exceeded.
    LimitError(&'static str),
    /// A pipeline chain referenced a filter id that is not registered.
    UnknownFilter(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InvalidInput(msg) => {
                write!(f, "invalid input: {}", msg)
            }
            Error::CapacityExceeded(msg) => {
                write!(f, "capacity exceeded: {}", msg)
            }
            Error::DecodeError(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::LimitError(constraint) => {
                write!(f, "limit reached: {}", constraint)
            }
            Error::UnknownFilter(id) => {
                write!(f, "unknown filter id: {}", id)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an invalid input error.
pub fn invalid_input_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::InvalidInput(msg))
}

/// Convenience function to create a capacity error.
pub fn capacity_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::CapacityExceeded(msg))
}

/// Convenience function to create a decode error.
pub fn decode_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::DecodeError(msg))
}

/// Convenience function to create an unsupported feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a limit error.
pub fn limit_error<T>(constraint: &'static str) -> Result<T> {
    Err(Error::LimitError(constraint))
}

/// Convenience function to create an unknown filter error.
pub fn unknown_filter_error<T>(id: u8) -> Result<T> {
    Err(Error::UnknownFilter(id))
}
