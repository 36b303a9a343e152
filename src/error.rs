// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error type shared by every stage of schedule extraction.

use crate::transition::Place;
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Failures raised while resolving offsets or building tariff intervals.
///
/// None of these are recoverable inside the crate; they travel unchanged
/// up to the caller.
#[derive(Debug, Error)]
pub enum HdoError {
    /// No transition periods are configured for the place.
    #[error("unknown location {0}")]
    UnknownPlace(Place),

    /// The place is known but no curated period covers the instant.
    #[error("UTC offset period not defined for time {instant} in {place}")]
    NoPeriodDefined {
        instant: DateTime<Utc>,
        place: Place,
    },

    /// A wall-clock timestamp did not match its format.
    #[error("cannot parse {text:?} with format {format:?}: {source}")]
    TimestampParse {
        text: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A wall-clock timestamp cannot be shifted to UTC within chrono's range.
    #[error("local time {0} is out of the representable range")]
    OutOfRange(NaiveDateTime),

    /// A tariff window title is not of the form `HH:MM - HH:MM`.
    #[error("malformed tariff window {0:?}")]
    MarkerParse(String),

    /// A bar day label is not a `DD.MM.` date or date range.
    #[error("malformed day label {0:?}")]
    DayLabelParse(String),

    /// A tariff window appeared before any tariff-start marker.
    #[error("tariff window {0:?} has no preceding tariff marker")]
    MissingTariff(String),

    /// Curated transition data violates ordering or range rules.
    #[error("invalid transition table: {0}")]
    InvalidTable(String),

    /// Look-ahead must cover at least one day.
    #[error("day count must be positive, got {0}")]
    InvalidDayCount(u32),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HdoError>;
