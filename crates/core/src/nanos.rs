// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A `UnixNanos` type for working with timestamps in nanoseconds since the UNIX epoch.
//!
//! Feed messages carry event times as floating-point seconds; those are
//! converted once at the wire boundary via [`UnixNanos::from_secs_f64`] and
//! handled as integer nanoseconds everywhere else.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use std::{
    fmt::Display,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a duration in nanoseconds.
pub type DurationNanos = u64;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Represents a timestamp in nanoseconds since the UNIX epoch.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UnixNanos(u64);

impl UnixNanos {
    /// Creates a new [`UnixNanos`] instance.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Creates a [`UnixNanos`] from floating-point seconds since the UNIX epoch.
    ///
    /// Negative or non-finite inputs saturate to zero (feed timestamps before
    /// the epoch are protocol garbage, not errors worth propagating).
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self(0);
        }
        Self((secs * NANOS_PER_SEC) as u64)
    }

    /// Returns the current wall-clock time.
    ///
    /// Clocks before the UNIX epoch saturate to zero.
    #[must_use]
    pub fn now() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        Self(u64::try_from(nanos).unwrap_or(0))
    }

    /// Returns `true` if the value of this instance is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the underlying value as `u64`.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the value as floating-point seconds since the UNIX epoch.
    #[must_use]
    pub const fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// Converts the underlying value to a datetime (UTC).
    ///
    /// # Panics
    ///
    /// Panics if the value exceeds `i64::MAX` nanoseconds (approximately year 2262).
    #[must_use]
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(
            i64::try_from(self.0).expect("UnixNanos value exceeds i64::MAX"),
        )
    }

    /// Returns the saturating duration since `other`, or zero if `other` is later.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> DurationNanos {
        self.0.saturating_sub(other.0)
    }
}

impl From<u64> for UnixNanos {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<UnixNanos> for u64 {
    fn from(value: UnixNanos) -> Self {
        value.0
    }
}

impl Add for UnixNanos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).expect("UnixNanos overflow on add"))
    }
}

impl Sub for UnixNanos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_sub(rhs.0).expect("UnixNanos underflow on sub"))
    }
}

impl Add<u64> for UnixNanos {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.checked_add(rhs).expect("UnixNanos overflow on add"))
    }
}

impl AddAssign<u64> for UnixNanos {
    fn add_assign(&mut self, rhs: u64) {
        self.0 = self.0.checked_add(rhs).expect("UnixNanos overflow on add");
    }
}

impl SubAssign<u64> for UnixNanos {
    fn sub_assign(&mut self, rhs: u64) {
        self.0 = self.0.checked_sub(rhs).expect("UnixNanos underflow on sub");
    }
}

impl Display for UnixNanos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_new_and_accessors() {
        let ts = UnixNanos::new(1_700_000_000_000_000_000);
        assert_eq!(ts.as_u64(), 1_700_000_000_000_000_000);
        assert!(!ts.is_zero());
        assert!(UnixNanos::default().is_zero());
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(-1.5, 0)]
    #[case(f64::NAN, 0)]
    #[case(1.0, 1_000_000_000)]
    #[case(1_640_995_200.0, 1_640_995_200_000_000_000)]
    fn test_from_secs_f64(#[case] secs: f64, #[case] expected: u64) {
        assert_eq!(UnixNanos::from_secs_f64(secs).as_u64(), expected);
    }

    #[rstest]
    fn test_secs_round_trip() {
        let ts = UnixNanos::from_secs_f64(1_640_995_200.5);
        assert!((ts.as_secs_f64() - 1_640_995_200.5).abs() < 1e-6);
    }

    #[rstest]
    fn test_arithmetic() {
        let ts = UnixNanos::new(100);
        assert_eq!((ts + UnixNanos::new(50)).as_u64(), 150);
        assert_eq!((ts - UnixNanos::new(40)).as_u64(), 60);
        assert_eq!(ts.saturating_sub(UnixNanos::new(200)), 0);
    }

    #[rstest]
    fn test_to_datetime_utc() {
        let ts = UnixNanos::new(1_640_995_200_000_000_000);
        assert_eq!(ts.to_datetime_utc().to_rfc3339(), "2022-01-01T00:00:00+00:00");
    }
}
