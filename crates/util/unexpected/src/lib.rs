// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Ember.

// Ember is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ember is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ember.  If not, see <http://www.gnu.org/licenses/>.

//! Error types for reporting values that differ from what a validator
//! expected. Used heavily by header and block verification.

use std::fmt;

/// A value that was different from the one the caller required.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Mismatch<T> {
    /// Value the caller required.
    pub expected: T,
    /// Value found instead.
    pub found: T,
}

impl<T: fmt::Display> fmt::Display for Mismatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Expected {}, found {}", self.expected, self.found)
    }
}

/// A value outside the range the caller required. Unbounded ends are `None`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct OutOfBounds<T> {
    /// Smallest allowed value, if bounded below.
    pub min: Option<T>,
    /// Largest allowed value, if bounded above.
    pub max: Option<T>,
    /// Value found.
    pub found: T,
}

impl<T: fmt::Display> fmt::Display for OutOfBounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bounds = match (&self.min, &self.max) {
            (Some(min), Some(max)) => format!("Value {} out of bounds [{}, {}]", self.found, min, max),
            (Some(min), None) => format!("Value {} below minimum {}", self.found, min),
            (None, Some(max)) => format!("Value {} above maximum {}", self.found, max),
            (None, None) => format!("Value {} out of bounds", self.found),
        };
        f.write_str(&bounds)
    }
}

impl<T> OutOfBounds<T> {
    /// Map the carried values, keeping the bound structure.
    pub fn map<F, U>(self, map: F) -> OutOfBounds<U>
    where
        F: Fn(T) -> U,
    {
        OutOfBounds {
            min: self.min.map(&map),
            max: self.max.map(&map),
            found: map(self.found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mismatch() {
        let m = Mismatch {
            expected: 5u64,
            found: 8u64,
        };
        assert_eq!(format!("{}", m), "Expected 5, found 8");
    }

    #[test]
    fn display_out_of_bounds() {
        let oob = OutOfBounds {
            min: Some(1u64),
            max: None,
            found: 0u64,
        };
        assert_eq!(format!("{}", oob), "Value 0 below minimum 1");
    }
}
