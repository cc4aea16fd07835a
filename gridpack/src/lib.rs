// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Gridpack
//!
//! Gridpack is a 100% pure Rust pack/quantize engine for scientific arrays of 32-bit elements.
//!
//! The core pieces are:
//!
//! * array analysis (extrema and sign properties, missing-value handling),
//! * bit streams buffered in 32-bit words, in both bit orientations,
//! * four float quantizers producing self-describing 64-bit descriptors,
//! * presence pixmaps with run-length coding, and masked compress/expand,
//! * integer tile and 4x4 float block codecs,
//! * a pipeline chaining reversible filters whose metadata round-trips.
//!
//! # Usage
//!
//! 1. Instantiate a [`FilterRegistry`][core::pipeline::FilterRegistry] and register the filters
//!    of interest, or use [`default::get_filters`] to get the default registry with all the
//!    enabled filters pre-registered.
//! 2. Describe the array with an [`ArrayDescriptor`][core::array::ArrayDescriptor] and build a
//!    chain of [`FilterMeta`][core::pipeline::FilterMeta] records.
//! 3. Call [`run_pipe_filters`][core::pipeline::run_pipe_filters] to transform the array into a
//!    self-describing word stream, and
//!    [`reverse_pipe_filters`][core::pipeline::reverse_pipe_filters] to get it back.
//!
//! The codec crates are also usable on their own, without the pipeline, through their direct
//! encode/decode entry points.

pub use gridpack_core as core;

#[cfg(feature = "pixmap")]
pub use gridpack_codec_pixmap as pixmap;
#[cfg(feature = "quant")]
pub use gridpack_codec_quant as quant;
#[cfg(feature = "tile")]
pub use gridpack_codec_tile as tile;

pub mod default {
    //! The `default` module provides convenience functions and registries to get an implementer
    //! up-and-running as quickly as possible, and to reduce boiler-plate. Using the `default`
    //! module is completely optional and incurs no overhead unless actually used.

    use gridpack_core::pipeline::{FilterRegistry, ScaleOffsetFilter};

    use lazy_static::lazy_static;

    lazy_static! {
        static ref FILTER_REGISTRY: FilterRegistry = {
            let mut registry = FilterRegistry::new();
            register_enabled_filters(&mut registry);
            registry
        };
    }

    /// Gets the default `FilterRegistry`. This registry pre-registers all the filters selected
    /// by the feature flags in the includer's `Cargo.toml`.
    pub fn get_filters() -> &'static FilterRegistry {
        &FILTER_REGISTRY
    }

    /// Registers all the filters selected by the feature flags in the includer's `Cargo.toml`
    /// on the provided registry.
    pub fn register_enabled_filters(registry: &mut FilterRegistry) {
        // The default registrations cannot conflict with each other.
        registry.register(Box::new(ScaleOffsetFilter)).unwrap();

        #[cfg(feature = "quant")]
        registry.register(Box::new(gridpack_codec_quant::QuantFilter)).unwrap();

        #[cfg(feature = "tile")]
        registry.register(Box::new(gridpack_codec_tile::TileFilter)).unwrap();

        #[cfg(feature = "pixmap")]
        registry.register(Box::new(gridpack_codec_pixmap::PixmapFilter)).unwrap();
    }
}
