// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Closed time intervals.
//!
//! This module provides:
//! - [`TimeInstant`]: points in time an [`Interval`] can be built from
//! - [`Interval<T>`]: an interval whose *both* endpoints are inclusive
//! - [`UtcPeriod`] / [`LocalPeriod`]: aliases for absolute and wall-clock intervals
//!
//! Every interval handed out by this crate is closed: curated offset
//! periods end at `xx:59:59` and tariff windows end one second before the
//! next window begins.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use qtty::{Day, Days, Seconds};
use std::fmt;

/// Trait for types that represent a point in time.
pub trait TimeInstant: Copy + Clone + PartialEq + PartialOrd + Sized {
    /// Compute the signed distance `self - other`.
    fn difference(&self, other: &Self) -> TimeDelta;
}

impl TimeInstant for DateTime<Utc> {
    #[inline]
    fn difference(&self, other: &Self) -> TimeDelta {
        *self - *other
    }
}

impl TimeInstant for NaiveDateTime {
    #[inline]
    fn difference(&self, other: &Self) -> TimeDelta {
        *self - *other
    }
}

/// Represents a closed interval `[start, end]` between two instants.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use hdo_schedule::Interval;
///
/// let start = Utc.with_ymd_and_hms(2024, 4, 3, 4, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 4, 3, 19, 59, 59).unwrap();
/// let window = Interval::new(start, end);
///
/// assert!(window.contains(&end));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval<T: TimeInstant> {
    pub start: T,
    pub end: T,
}

/// Absolute (UTC) interval alias.
pub type UtcPeriod = Interval<DateTime<Utc>>;

/// Wall-clock interval alias, as read off a local clock with no offset attached.
pub type LocalPeriod = Interval<NaiveDateTime>;

impl<T: TimeInstant> Interval<T> {
    /// Creates a new interval between two instants.
    ///
    /// No ordering check is made here; constructors of the domain types
    /// built on top of `Interval` validate `start <= end` themselves.
    pub fn new(start: T, end: T) -> Self {
        Interval { start, end }
    }

    /// Returns the difference between end and start.
    pub fn duration(&self) -> TimeDelta {
        self.end.difference(&self.start)
    }

    /// `true` when `start <= end`.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Whether `instant` lies within the interval, endpoints included.
    pub fn contains(&self, instant: &T) -> bool {
        self.start <= *instant && *instant <= self.end
    }

    /// Whether the two closed intervals share at least one instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.intersection(other).is_some()
    }

    /// Returns the overlapping sub-interval between `self` and `other`.
    ///
    /// Both intervals are closed, so intervals touching at a single instant
    /// intersect in that instant.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = if self.start >= other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end <= other.end {
            self.end
        } else {
            other.end
        };

        if start <= end {
            Some(Self::new(start, end))
        } else {
            None
        }
    }
}

impl<T: TimeInstant + fmt::Display> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl Interval<DateTime<Utc>> {
    /// Returns the duration as a [`Days`] quantity.
    pub fn duration_days(&self) -> Days {
        let duration = self.duration();
        let seconds = match duration.num_nanoseconds() {
            Some(ns) => ns as f64 / 1e9,
            // Durations past ~292 years do not fit in i64 nanoseconds.
            None => duration.num_seconds() as f64,
        };
        Seconds::new(seconds).to::<Day>()
    }
}
