// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Presence pixmaps with run-length coding, and mask-driven compress/expand of 32-bit arrays.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

mod compress;
mod filter;
mod pixmap;

pub use compress::{
    compress_store, compress_store_n_be, compress_store_n_le, expand_fill, expand_fill_n_le,
    expand_replace, expand_replace_n_le, masked_fill_le, masked_merge_le,
};
pub use filter::{PixmapFilter, FILTER_ID_PIXMAP};
pub use pixmap::{CmpOp, Pixmap, RleHint};
