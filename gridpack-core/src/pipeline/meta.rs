// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filter metadata records.
//!
//! Every record starts with a fixed prologue word followed by filter-specific argument words:
//!
//! ```text
//! +-------+----+-------+-- filter-specific fields --+
//! | size  | id | flags |        (size-1 words)      |
//! +-------+----+-------+----------------------------+
//!   16b     8b    8b
//! ```
//!
//! `size` counts the whole record in 32-bit words, prologue included.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::errors::{decode_error, limit_error, Result};
use crate::io::WordStream;

bitflags! {
    /// Option bits carried in the `flags` byte of a metadata record.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct MetaFlags: u8 {
        /// Keep emitting whatever remains of the chain output when a later step fails.
        const BEST_EFFORT = 0x01;
    }
}

/// A filter metadata record: the prologue fields plus the filter-specific argument words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterMeta {
    /// Filter identifier (0 and 255 are reserved for the sentinels).
    pub id: u8,
    /// Option bits.
    pub flags: MetaFlags,
    /// Filter-specific argument words.
    pub args: SmallVec<[u32; 8]>,
}

impl FilterMeta {
    /// A record with no arguments.
    pub fn new(id: u8) -> FilterMeta {
        FilterMeta { id, flags: MetaFlags::empty(), args: SmallVec::new() }
    }

    /// A record with the given argument words.
    pub fn with_args(id: u8, args: &[u32]) -> FilterMeta {
        FilterMeta { id, flags: MetaFlags::empty(), args: SmallVec::from_slice(args) }
    }

    /// Total size of the record in words, prologue included.
    pub fn size_words(&self) -> usize {
        1 + self.args.len()
    }

    /// Append the record to a word stream.
    pub fn write_to(&self, out: &mut WordStream) -> Result<()> {
        let size = self.size_words();
        if size > 0xffff {
            return limit_error("pipeline: metadata record exceeds 65535 words");
        }
        let prologue =
            ((size as u32) << 16) | (u32::from(self.id) << 8) | u32::from(self.flags.bits());
        out.push(prologue)?;
        out.insert(&self.args)
    }

    /// Read the next record from a word stream.
    pub fn read_from(stream: &mut WordStream) -> Result<FilterMeta> {
        let prologue = stream.read()?;
        let size = (prologue >> 16) as usize;
        let id = ((prologue >> 8) & 0xff) as u8;
        let flags = MetaFlags::from_bits_truncate((prologue & 0xff) as u8);
        if size < 1 {
            return decode_error("pipeline: metadata record with zero size");
        }
        let args = SmallVec::from_slice(stream.read_slice(size - 1)?);
        Ok(FilterMeta { id, flags, args })
    }
}
