// Gridpack
// Copyright (c) 2024 The Gridpack Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry for pipeline filters to support lookup and dispatch by small integer id.

use std::collections::HashMap;

use log::debug;

use crate::errors::{invalid_input_error, Result};
use crate::pipeline::dims::{FILTER_ID_DIMENSIONS, FILTER_ID_TERMINATOR};
use crate::pipeline::PipeFilter;

/// A `FilterRegistry` allows the registration of pipeline filters, and provides lookup by id for
/// the chain drivers.
///
/// The registry is an ordinary value: create one at application setup, register the filters of
/// interest once, then share it for the lifetime of the process.
#[derive(Default)]
pub struct FilterRegistry {
    table: HashMap<u8, Box<dyn PipeFilter>>,
}

impl FilterRegistry {
    /// Instantiate a new, empty `FilterRegistry`.
    pub fn new() -> FilterRegistry {
        FilterRegistry { table: HashMap::new() }
    }

    /// Register a filter under its own id.
    ///
    /// Ids 0 and 255 are reserved for the dimension and terminator sentinels. Registering the
    /// same id twice is allowed only when the name matches (a repeat of the same registration);
    /// claiming an id owned by a different filter is an error.
    pub fn register(&mut self, filter: Box<dyn PipeFilter>) -> Result<()> {
        let id = filter.id();
        if id == FILTER_ID_DIMENSIONS || id == FILTER_ID_TERMINATOR {
            return invalid_input_error("pipeline: filter id is reserved");
        }
        if let Some(existing) = self.table.get(&id) {
            if existing.name() != filter.name() {
                return invalid_input_error("pipeline: filter id already in use");
            }
        }
        debug!("registering filter '{}' (id {})", filter.name(), id);
        self.table.insert(id, filter);
        Ok(())
    }

    /// Look up the filter registered under `id`.
    pub fn get(&self, id: u8) -> Option<&dyn PipeFilter> {
        self.table.get(&id).map(|f| f.as_ref())
    }

    /// The name of the filter registered under `id`.
    pub fn name(&self, id: u8) -> Option<&'static str> {
        self.table.get(&id).map(|f| f.name())
    }

    /// True when a filter is registered under `id`.
    pub fn is_registered(&self, id: u8) -> bool {
        self.table.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ScaleOffsetFilter;

    struct Impostor;

    impl PipeFilter for Impostor {
        fn id(&self) -> u8 {
            254
        }
        fn name(&self) -> &'static str {
            "impostor"
        }
        fn validate(&self, _: &crate::pipeline::FilterMeta) -> Result<usize> {
            Ok(1)
        }
        fn forward_size(
            &self,
            _: &crate::pipeline::FilterMeta,
            _: &crate::array::ArrayDescriptor,
        ) -> Result<usize> {
            Ok(0)
        }
        fn forward(
            &self,
            _: &crate::pipeline::FilterMeta,
            _: &crate::array::ArrayDescriptor,
            _: &mut crate::pipeline::PipeBuffer,
            _: &mut crate::io::WordStream,
        ) -> Result<usize> {
            Ok(0)
        }
        fn reverse(
            &self,
            _: &crate::pipeline::FilterMeta,
            _: &crate::array::ArrayDescriptor,
            _: &mut crate::pipeline::PipeBuffer,
        ) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn verify_registration_rules() {
        let mut reg = FilterRegistry::new();
        reg.register(Box::new(ScaleOffsetFilter)).unwrap();
        assert!(reg.is_registered(254));
        assert_eq!(reg.name(254), Some("scale-offset"));

        // Re-registering the same filter is idempotent.
        reg.register(Box::new(ScaleOffsetFilter)).unwrap();

        // A different filter may not claim an id in use.
        assert!(reg.register(Box::new(Impostor)).is_err());

        assert!(reg.get(77).is_none());
    }
}
