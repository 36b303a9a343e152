// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! HDO schedule module
//!
//! This crate turns ripple-control (HDO) tariff bars, as published per day
//! in local wall-clock time, into absolute UTC tariff intervals.
//!
//! # Core types
//!
//! - [`TransitionTable`] — curated periods of fixed UTC offset per [`Place`].
//! - [`OffsetResolver`] — finds the [`TransitionPeriod`] covering an instant
//!   and localises naive timestamps with it.
//! - [`Bar`] — a day or day range with its ordered [`TariffMarker`]s.
//! - [`extract`] — lazily expands a bar into [`TariffInterval`]s.
//! - [`RequestWindow`] — the local days a request should cover.
//! - [`Interval<T>`] — closed interval over any [`TimeInstant`].
//!
//! # Offsets
//!
//! | Place | Coverage | Offsets |
//! |-------|----------|---------|
//! | `CZ` | 2023-03-26 … 2026-10-25 | +01:00 winter, +02:00 summer |
//!
//! Instants outside the curated coverage are errors; no offset is guessed.
//! Every timestamp of a bar is localised with the offset valid at the
//! request's reference instant, so a look-ahead straddling a transition
//! yields intervals on the far side shifted by the offset change.

mod error;
mod interval;
mod request;
mod resolver;
mod schedule;
mod transition;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use error::{HdoError, Result};
pub use interval::{Interval, LocalPeriod, TimeInstant, UtcPeriod};
pub use request::{RequestWindow, HDO_STATUS_URL};
pub use resolver::OffsetResolver;
pub use schedule::{
    extract, Bar, Tariff, TariffInterval, TariffIntervals, TariffMarker, WindowSpan,
};
pub use transition::{Place, TransitionPeriod, TransitionTable, STORE_DATE_FORMAT};
