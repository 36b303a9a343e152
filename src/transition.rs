// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Curated UTC offset periods.
//!
//! A [`TransitionTable`] maps a [`Place`] to the ordered list of
//! [`TransitionPeriod`]s during which a fixed UTC offset applied there.
//! The table is finite on purpose: instants outside the curated data are
//! lookup failures, never extrapolated.

use crate::error::{HdoError, Result};
use crate::interval::UtcPeriod;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

/// Text format of curated period boundaries, e.g. `2024-03-31 01:00:00 +0000`.
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Opaque location key, e.g. a country code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Place(String);

impl Place {
    pub fn new(code: impl Into<String>) -> Self {
        Place(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Place {
    fn from(code: &str) -> Self {
        Place::new(code)
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One span of time during which a single UTC offset applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPeriod {
    span: UtcPeriod,
    offset: FixedOffset,
}

impl TransitionPeriod {
    /// Builds a period, rejecting `from > until` and offsets of a day or more.
    pub fn new(from: DateTime<Utc>, until: DateTime<Utc>, offset_seconds: i32) -> Result<Self> {
        let span = UtcPeriod::new(from, until);
        if !span.is_ordered() {
            return Err(HdoError::InvalidTable(format!(
                "period starts at {from} after it ends at {until}"
            )));
        }
        let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
            HdoError::InvalidTable(format!("offset {offset_seconds}s is out of range"))
        })?;
        Ok(Self { span, offset })
    }

    /// Parses boundaries written in [`STORE_DATE_FORMAT`].
    pub fn parse(from: &str, until: &str, offset_seconds: i32) -> Result<Self> {
        Self::new(
            parse_store_date(from)?,
            parse_store_date(until)?,
            offset_seconds,
        )
    }

    /// First instant of the period (inclusive).
    pub fn from(&self) -> DateTime<Utc> {
        self.span.start
    }

    /// Last instant of the period (inclusive).
    pub fn until(&self) -> DateTime<Utc> {
        self.span.end
    }

    pub fn span(&self) -> UtcPeriod {
        self.span
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Signed offset east of UTC, in seconds.
    pub fn offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.span.contains(instant)
    }
}

fn parse_store_date(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(text, STORE_DATE_FORMAT)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| HdoError::TimestampParse {
            text: text.to_owned(),
            format: STORE_DATE_FORMAT.to_owned(),
            source,
        })
}

// Curated Czech periods: CET (+1h) in winter, CEST (+2h) in summer.
#[rustfmt::skip]
const CZ_PERIODS: [(&str, &str, i32); 7] = [
    ("2023-03-26 01:00:00 +0000", "2023-10-29 00:59:59 +0000", 7200),
    ("2023-10-29 01:00:00 +0000", "2024-03-31 00:59:59 +0000", 3600),
    ("2024-03-31 01:00:00 +0000", "2024-10-27 00:59:59 +0000", 7200),
    ("2024-10-27 01:00:00 +0000", "2025-03-30 00:59:59 +0000", 3600),
    ("2025-03-30 01:00:00 +0000", "2025-10-26 00:59:59 +0000", 7200),
    ("2025-10-26 01:00:00 +0000", "2026-03-29 00:59:59 +0000", 3600),
    ("2026-03-29 01:00:00 +0000", "2026-10-25 00:59:59 +0000", 7200),
];

/// Immutable collection of offset periods per place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    places: BTreeMap<Place, Vec<TransitionPeriod>>,
}

impl TransitionTable {
    /// Creates an empty table; add places with [`TransitionTable::with_place`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the periods of `place`.
    ///
    /// Periods must be sorted ascending by `from` and must not overlap.
    /// Gaps between periods are allowed.
    pub fn with_place(
        mut self,
        place: impl Into<Place>,
        periods: Vec<TransitionPeriod>,
    ) -> Result<Self> {
        let place = place.into();
        for pair in periods.windows(2) {
            if pair[1].from() <= pair[0].until() {
                return Err(HdoError::InvalidTable(format!(
                    "{place}: period starting {} does not follow period ending {}",
                    pair[1].from(),
                    pair[0].until()
                )));
            }
        }
        self.places.insert(place, periods);
        Ok(self)
    }

    /// The curated table shipped with the crate.
    pub fn builtin() -> Self {
        let cz = CZ_PERIODS
            .iter()
            .map(|(from, until, offset)| TransitionPeriod::parse(from, until, *offset))
            .collect::<Result<Vec<_>>>()
            .expect("curated CZ periods are well-formed");
        Self::new()
            .with_place("CZ", cz)
            .expect("curated CZ periods are ordered")
    }

    /// Periods configured for `place`, in ascending order.
    pub fn periods(&self, place: &Place) -> Option<&[TransitionPeriod]> {
        self.places.get(place).map(Vec::as_slice)
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.keys()
    }
}

// Serde support mirrors the curated text layout:
// { "CZ": [ { "from": "...", "until": "...", "gmtOffsetSeconds": 7200 }, ... ] }

#[cfg(feature = "serde")]
impl Serialize for TransitionPeriod {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("TransitionPeriod", 3)?;
        s.serialize_field("from", &self.from().format(STORE_DATE_FORMAT).to_string())?;
        s.serialize_field("until", &self.until().format(STORE_DATE_FORMAT).to_string())?;
        s.serialize_field("gmtOffsetSeconds", &self.offset_seconds())?;
        s.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for TransitionPeriod {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            from: String,
            until: String,
            gmt_offset_seconds: i32,
        }

        let raw = Raw::deserialize(deserializer)?;
        TransitionPeriod::parse(&raw.from, &raw.until, raw.gmt_offset_seconds)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
impl Serialize for TransitionTable {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.places.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for TransitionTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<Place, Vec<TransitionPeriod>>::deserialize(deserializer)?;
        raw.into_iter()
            .try_fold(TransitionTable::new(), |table, (place, periods)| {
                table.with_place(place, periods)
            })
            .map_err(serde::de::Error::custom)
    }
}
