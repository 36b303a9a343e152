// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Look-ahead window for a schedule request.

use crate::error::{HdoError, Result};
use crate::resolver::OffsetResolver;
use crate::transition::{Place, TransitionPeriod};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

/// Distributor page listing HDO switching times for a command code.
pub const HDO_STATUS_URL: &str =
    "https://www.predistribuce.cz/cs/potrebuji-zaridit/zakaznici/stav-hdo/";

/// Local calendar days to request, both ends inclusive.
///
/// The window never leaves the offset period that is current at the
/// reference instant, nor the reference's calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    pub reference: DateTime<Utc>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: TransitionPeriod,
}

impl RequestWindow {
    /// End date is the earliest of: the day before the current period's
    /// last day, December 31, and `start + days - 1`.
    pub fn compute(
        reference: DateTime<Utc>,
        days: u32,
        resolver: &OffsetResolver,
        place: &Place,
    ) -> Result<Self> {
        if days == 0 {
            return Err(HdoError::InvalidDayCount(days));
        }
        let period = *resolver.resolve(reference, place)?;
        let offset = period.offset();

        let start = reference.with_timezone(&offset).date_naive();
        let period_last = period
            .until()
            .with_timezone(&offset)
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap_or(NaiveDate::MIN);
        let year_last = NaiveDate::from_ymd_opt(start.year(), 12, 31).unwrap_or(NaiveDate::MAX);
        // Past chrono's range the horizon cannot be the binding bound.
        let horizon = start
            .checked_add_days(Days::new(u64::from(days) - 1))
            .unwrap_or(year_last);

        Ok(Self {
            reference,
            start,
            end: period_last.min(year_last).min(horizon),
            period,
        })
    }

    /// Year assumed for `DD.MM.` bar labels.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// `true` when the reference falls on the last day of its offset period.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of days covered.
    pub fn len(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }

    /// Query URL for `command` over this window.
    pub fn url(&self, command: u32) -> String {
        format!(
            "{}?povel={}&den_od={:02}&mesic_od={:02}&rok_od={}&den_do={:02}&mesic_do={:02}&rok_do={}",
            HDO_STATUS_URL,
            command,
            self.start.day(),
            self.start.month(),
            self.start.year(),
            self.end.day(),
            self.end.month(),
            self.end.year(),
        )
    }
}
