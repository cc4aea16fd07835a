// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `array` module describes the shape and element type of the arrays the codecs operate on.

use smallvec::SmallVec;

use crate::errors::{invalid_input_error, Result};

/// Maximum number of dimensions of an array.
pub const MAX_ARRAY_DIMENSIONS: usize = 5;

/// Largest supported extent along a single dimension.
pub const MAX_ARRAY_EXTENT: u32 = 1 << 24;

/// The extents of an array, innermost dimension first.
pub type ArrayShape = SmallVec<[u32; MAX_ARRAY_DIMENSIONS]>;

/// The semantic kind of a 32-bit array element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// Unsigned integers.
    Unsigned,
    /// Two's complement signed integers.
    Signed,
    /// IEEE-754 binary32 values.
    Float,
    /// Opaque bits.
    Raw,
}

impl ElementKind {
    /// A stable small integer code used on the wire.
    pub fn code(&self) -> u32 {
        match *self {
            ElementKind::Unsigned => 0,
            ElementKind::Signed => 1,
            ElementKind::Float => 2,
            ElementKind::Raw => 3,
        }
    }

    /// The inverse of [`ElementKind::code`].
    pub fn from_code(code: u32) -> Result<ElementKind> {
        match code {
            0 => Ok(ElementKind::Unsigned),
            1 => Ok(ElementKind::Signed),
            2 => Ok(ElementKind::Float),
            3 => Ok(ElementKind::Raw),
            _ => invalid_input_error("array: invalid element kind code"),
        }
    }
}

/// Describes an array handed to the codecs: element type and size, shape, and optional tiling
/// along the first two dimensions.
#[derive(Clone, Debug)]
pub struct ArrayDescriptor {
    /// Element semantic kind.
    pub kind: ElementKind,
    /// Element size in bytes (1, 2, 4, or 8).
    pub elem_size: u32,
    /// Per-dimension extents, innermost first (1..=5 dimensions).
    pub shape: ArrayShape,
    /// Optional tile sizes along the first two dimensions.
    pub tile: Option<(u32, u32)>,
}

impl ArrayDescriptor {
    /// Create a descriptor for a flat array of 32-bit elements.
    pub fn new(kind: ElementKind, shape: &[u32]) -> ArrayDescriptor {
        ArrayDescriptor { kind, elem_size: 4, shape: ArrayShape::from_slice(shape), tile: None }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().map(|&n| n as usize).product()
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check every structural invariant of the descriptor.
    pub fn validate(&self) -> Result<()> {
        if self.shape.is_empty() || self.shape.len() > MAX_ARRAY_DIMENSIONS {
            return invalid_input_error("array: dimension count must be 1..=5");
        }
        if self.shape.iter().any(|&n| n == 0) {
            return invalid_input_error("array: zero extent");
        }
        if self.shape.iter().any(|&n| n > MAX_ARRAY_EXTENT) {
            return invalid_input_error("array: extent exceeds 2^24");
        }
        let total: u64 = self.shape.iter().map(|&n| u64::from(n)).product();
        if total > u64::from(u32::MAX) {
            return invalid_input_error("array: element count exceeds 2^32 - 1");
        }
        if !matches!(self.elem_size, 1 | 2 | 4 | 8) {
            return invalid_input_error("array: element size must be 1, 2, 4 or 8");
        }
        if let Some((tx, ty)) = self.tile {
            if tx < 1 || ty < 1 {
                return invalid_input_error("array: tile sizes must be >= 1");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_descriptor_validation() {
        assert!(ArrayDescriptor::new(ElementKind::Float, &[16, 16]).validate().is_ok());
        assert!(ArrayDescriptor::new(ElementKind::Float, &[]).validate().is_err());
        assert!(ArrayDescriptor::new(ElementKind::Float, &[1, 2, 3, 4, 5, 6]).validate().is_err());
        assert!(ArrayDescriptor::new(ElementKind::Float, &[0]).validate().is_err());
        assert!(ArrayDescriptor::new(ElementKind::Float, &[1 << 25]).validate().is_err());

        let mut d = ArrayDescriptor::new(ElementKind::Raw, &[8, 8]);
        d.tile = Some((0, 4));
        assert!(d.validate().is_err());
        d.tile = Some((4, 4));
        assert!(d.validate().is_ok());

        assert_eq!(ArrayDescriptor::new(ElementKind::Signed, &[3, 4]).len(), 12);
    }

    #[test]
    fn verify_kind_codes() {
        for kind in
            [ElementKind::Unsigned, ElementKind::Signed, ElementKind::Float, ElementKind::Raw]
        {
            assert_eq!(ElementKind::from_code(kind.code()).unwrap(), kind);
        }
        assert!(ElementKind::from_code(4).is_err());
    }
}
