// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements the bit-granular and word-granular streams every codec packs into.

mod bitstream;
mod wordstream;

pub use bitstream::{BitStream, ByteOrder, StreamMode, StreamState, BITSTREAM_MARKER};
pub use wordstream::{WordStream, WORDSTREAM_MARKER};
