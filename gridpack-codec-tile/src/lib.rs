// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tile codecs: variable integer tiles of up to 8x8 values with a minimum-bit predictor and a
//! short/full token scheme, and 4x4 float blocks encoded as shared-exponent deltas plus rounded
//! mantissas.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

mod filter;
mod floatblock;
mod tile;

pub use filter::{TileFilter, FILTER_ID_TILE};
pub use floatblock::{
    float_array_decode_4x4, float_array_encode_4x4, float_array_section_4x4,
    float_block_decode_4x4, float_block_encode_4x4, FLOAT_BLOCK_MAX_NBITS, FLOAT_BLOCK_MIN_NBITS,
};
pub use tile::{
    decode_as_tiles, decode_tile, encode_as_tiles, encode_tile, gather_tile_properties,
    Encoding, SignCode, TileHeader, TileProps, MAX_TILE_VALUES,
};
