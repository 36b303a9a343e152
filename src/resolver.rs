// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Offset lookup and wall-clock localisation.
//!
//! [`OffsetResolver`] answers "at this instant, what UTC offset applied in
//! this place?" from a [`TransitionTable`], and turns naive local
//! timestamps into UTC instants using that answer.

use crate::error::{HdoError, Result};
use crate::transition::{Place, TransitionPeriod, TransitionTable};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Owns the curated offset data; read-only once built.
#[derive(Debug, Clone)]
pub struct OffsetResolver {
    table: TransitionTable,
}

impl Default for OffsetResolver {
    fn default() -> Self {
        Self::new(TransitionTable::builtin())
    }
}

impl OffsetResolver {
    pub fn new(table: TransitionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Returns the period of `place` whose closed range covers `instant`.
    ///
    /// There is no fallback offset: an unknown place or an instant outside
    /// every curated period is an error.
    pub fn resolve(&self, instant: DateTime<Utc>, place: &Place) -> Result<&TransitionPeriod> {
        let periods = self
            .table
            .periods(place)
            .ok_or_else(|| HdoError::UnknownPlace(place.clone()))?;

        periods
            .iter()
            .find(|period| period.contains(&instant))
            .ok_or_else(|| HdoError::NoPeriodDefined {
                instant,
                place: place.clone(),
            })
    }

    /// Reads `text` as a local timestamp seen in `place` at `reference`.
    ///
    /// The offset is the one valid at `reference`, not at the parsed
    /// timestamp, so every timestamp of a short look-ahead shares a single
    /// offset even if a transition falls inside it.
    pub fn localize(
        &self,
        text: &str,
        format: &str,
        reference: DateTime<Utc>,
        place: &Place,
    ) -> Result<DateTime<Utc>> {
        let naive = parse_wall_clock(text, format)?;
        let period = self.resolve(reference, place)?;
        attach_offset(naive, period)
    }
}

/// Parses a naive local timestamp.
pub(crate) fn parse_wall_clock(text: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format).map_err(|source| HdoError::TimestampParse {
        text: text.to_owned(),
        format: format.to_owned(),
        source,
    })
}

/// Interprets `naive` as wall-clock time under `period`'s offset.
pub(crate) fn attach_offset(
    naive: NaiveDateTime,
    period: &TransitionPeriod,
) -> Result<DateTime<Utc>> {
    naive
        .checked_sub_signed(TimeDelta::seconds(i64::from(period.offset_seconds())))
        .map(|shifted| shifted.and_utc())
        .ok_or(HdoError::OutOfRange(naive))
}
