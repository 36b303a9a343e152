// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Tariff bars and interval extraction.
//!
//! A [`Bar`] describes one calendar day, or an inclusive run of days, that
//! share the same daily pattern of tariff windows. [`extract`] replays the
//! pattern for every day of the bar and yields one [`TariffInterval`] per
//! window, lazily and in ascending time order.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use hdo_schedule::{extract, Bar, OffsetResolver, Place, Tariff, TariffMarker};
//!
//! let bar = Bar::single_day(
//!     "03.04.",
//!     vec![
//!         TariffMarker::TariffStart(Tariff::Normal),
//!         TariffMarker::window("06:00", "22:00"),
//!         TariffMarker::TariffStart(Tariff::High),
//!         TariffMarker::window("22:00", "00:00"),
//!     ],
//! );
//! let resolver = OffsetResolver::default();
//! let reference = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
//! let place = Place::from("CZ");
//!
//! let lines: Vec<String> = extract(&resolver, &bar, reference, &place, 2024)
//!     .map(|interval| interval.map(|i| i.to_string()))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(lines[0], "2024-04-03T04:00:00Z 2024-04-03T19:59:59Z N");
//! assert_eq!(lines[1], "2024-04-03T20:00:00Z 2024-04-03T21:59:59Z V");
//! ```

use crate::error::{HdoError, Result};
use crate::interval::{LocalPeriod, UtcPeriod};
use crate::resolver::{attach_offset, parse_wall_clock, OffsetResolver};
use crate::transition::{Place, TransitionPeriod};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Utc};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Format of the synthetic day anchors built from bar labels.
const ANCHOR_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Tariff state signalled by the ripple-control receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tariff {
    /// Standard (low) rate.
    #[cfg_attr(feature = "serde", serde(rename = "N", alias = "normal"))]
    Normal,
    /// Elevated rate.
    #[cfg_attr(feature = "serde", serde(rename = "V", alias = "high"))]
    High,
}

impl Tariff {
    /// One-letter code: `N` for normal, `V` for high.
    pub fn letter(self) -> char {
        match self {
            Tariff::Normal => 'N',
            Tariff::High => 'V',
        }
    }
}

impl fmt::Display for Tariff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One element of a bar's daily pattern.
///
/// Window markers keep the raw `HH:MM - HH:MM` title; it is decoded when
/// the bar is replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TariffMarker {
    /// Every following window belongs to this tariff.
    TariffStart(Tariff),
    /// A local time window, e.g. `"06:00 - 22:00"`.
    Window(String),
}

impl TariffMarker {
    /// Builds a window marker from its two `HH:MM` bounds.
    pub fn window(start: &str, end: &str) -> Self {
        TariffMarker::Window(format!("{start} - {end}"))
    }
}

/// Decoded local time window. An `end` of `00:00` means midnight of the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WindowSpan {
    /// Parses `HH:MM - HH:MM`.
    ///
    /// The end must be later than the start unless it is `00:00`.
    pub fn parse(title: &str) -> Result<Self> {
        let malformed = || HdoError::MarkerParse(title.to_owned());

        let (start, end) = title.split_once(" - ").ok_or_else(malformed)?;
        let start = parse_clock(start).ok_or_else(malformed)?;
        let end = parse_clock(end).ok_or_else(malformed)?;

        let span = WindowSpan { start, end };
        if !span.ends_at_midnight() && end <= start {
            return Err(malformed());
        }
        Ok(span)
    }

    pub fn ends_at_midnight(&self) -> bool {
        self.end == NaiveTime::MIN
    }

    /// Wall-clock interval of this window on `day`, closed one second
    /// before the window's end.
    pub fn on_day(&self, day: NaiveDate) -> Result<LocalPeriod> {
        let start = day.and_time(self.start);
        let end = if self.ends_at_midnight() {
            let midnight = day.and_time(NaiveTime::MIN);
            midnight
                .checked_add_signed(TimeDelta::hours(24))
                .ok_or(HdoError::OutOfRange(midnight))?
        } else {
            day.and_time(self.end)
        };
        let last = end
            .checked_sub_signed(TimeDelta::seconds(1))
            .ok_or(HdoError::OutOfRange(end))?;
        Ok(LocalPeriod::new(start, last))
    }
}

impl FromStr for WindowSpan {
    type Err = HdoError;

    fn from_str(s: &str) -> Result<Self> {
        WindowSpan::parse(s)
    }
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    let bytes = text.as_bytes();
    let shaped = bytes.len() == 5
        && bytes[2] == b':'
        && bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit);
    if !shaped {
        return None;
    }
    NaiveTime::parse_from_str(text, "%H:%M").ok()
}

/// A day or inclusive day range with its repeating tariff pattern.
///
/// Day labels are `DD.MM.`; the year comes from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Bar {
    pub start_day_month: String,
    pub end_day_month: String,
    pub markers: Vec<TariffMarker>,
}

impl Bar {
    pub fn new(
        start_day_month: impl Into<String>,
        end_day_month: impl Into<String>,
        markers: Vec<TariffMarker>,
    ) -> Self {
        Bar {
            start_day_month: start_day_month.into(),
            end_day_month: end_day_month.into(),
            markers,
        }
    }

    pub fn single_day(day_month: &str, markers: Vec<TariffMarker>) -> Self {
        Bar::new(day_month, day_month, markers)
    }

    /// Builds a bar from a label such as `03.04. -  07.04.` or `08.04.`.
    ///
    /// The hyphen of a range must have whitespace on both sides.
    pub fn from_label(label: &str, markers: Vec<TariffMarker>) -> Result<Self> {
        let label = label.trim();
        let (start, end) = match label.split_once('-') {
            Some((start, end))
                if start.ends_with(char::is_whitespace) && end.starts_with(char::is_whitespace) =>
            {
                (start.trim(), end.trim())
            }
            Some(_) => return Err(HdoError::DayLabelParse(label.to_owned())),
            None => (label, label),
        };

        let well_formed = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_digit() || c == '.')
        };
        if !well_formed(start) || !well_formed(end) {
            return Err(HdoError::DayLabelParse(label.to_owned()));
        }
        Ok(Bar::new(start, end, markers))
    }
}

/// One tariff window resolved to absolute time; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TariffInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tariff: Tariff,
}

impl TariffInterval {
    pub fn span(&self) -> UtcPeriod {
        UtcPeriod::new(self.start, self.end)
    }
}

/// Renders `<start> <end> <letter>` with RFC 3339 UTC timestamps.
impl fmt::Display for TariffInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.tariff
        )
    }
}

/// Lazily expands `bar` into tariff intervals.
///
/// Both day labels are anchored inside their day (`01:01:00` for the
/// first, `01:01:01` for the last) in `year` and localised with the
/// offset valid at `reference`. Days are then stepped 24 hours at a time
/// from the first anchor while still before the last one.
///
/// Nothing is computed until the iterator is polled. The first error is
/// yielded once and ends the sequence.
pub fn extract<'a>(
    resolver: &'a OffsetResolver,
    bar: &'a Bar,
    reference: DateTime<Utc>,
    place: &'a Place,
    year: i32,
) -> TariffIntervals<'a> {
    TariffIntervals {
        resolver,
        bar,
        reference,
        place,
        year,
        state: State::Pending,
        ready: Vec::new().into_iter(),
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Pending,
    Days {
        day: DateTime<Utc>,
        last: DateTime<Utc>,
        period: TransitionPeriod,
    },
    Done,
}

/// Iterator returned by [`extract`].
#[derive(Debug)]
pub struct TariffIntervals<'a> {
    resolver: &'a OffsetResolver,
    bar: &'a Bar,
    reference: DateTime<Utc>,
    place: &'a Place,
    year: i32,
    state: State,
    ready: std::vec::IntoIter<TariffInterval>,
}

impl TariffIntervals<'_> {
    fn anchors(&self) -> Result<State> {
        let period = *self.resolver.resolve(self.reference, self.place)?;
        let anchor = |day_month: &str, time: &str| -> Result<DateTime<Utc>> {
            let text = format!("{}{} {}", day_month, self.year, time);
            attach_offset(parse_wall_clock(&text, ANCHOR_FORMAT)?, &period)
        };

        Ok(State::Days {
            day: anchor(&self.bar.start_day_month, "01:01:00")?,
            last: anchor(&self.bar.end_day_month, "01:01:01")?,
            period,
        })
    }

    fn replay_day(&self, day: NaiveDate, period: &TransitionPeriod) -> Result<Vec<TariffInterval>> {
        let mut tariff = None;
        let mut intervals = Vec::new();

        for marker in &self.bar.markers {
            match marker {
                TariffMarker::TariffStart(next) => tariff = Some(*next),
                TariffMarker::Window(title) => {
                    let local = WindowSpan::parse(title)?.on_day(day)?;
                    let tariff = tariff.ok_or_else(|| HdoError::MissingTariff(title.clone()))?;
                    intervals.push(TariffInterval {
                        start: attach_offset(local.start, period)?,
                        end: attach_offset(local.end, period)?,
                        tariff,
                    });
                }
            }
        }
        Ok(intervals)
    }
}

impl Iterator for TariffIntervals<'_> {
    type Item = Result<TariffInterval>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(interval) = self.ready.next() {
                return Some(Ok(interval));
            }

            match self.state {
                State::Done => return None,
                State::Pending => match self.anchors() {
                    Ok(state) => self.state = state,
                    Err(err) => {
                        self.state = State::Done;
                        return Some(Err(err));
                    }
                },
                State::Days { day, last, period } => {
                    if day >= last {
                        self.state = State::Done;
                        continue;
                    }
                    // A day that cannot be stepped past has no successor before `last`.
                    self.state = match day.checked_add_signed(TimeDelta::hours(24)) {
                        Some(next) => State::Days {
                            day: next,
                            last,
                            period,
                        },
                        None => State::Done,
                    };

                    let local_day = day.with_timezone(&period.offset()).date_naive();
                    match self.replay_day(local_day, &period) {
                        Ok(intervals) => self.ready = intervals.into_iter(),
                        Err(err) => {
                            self.state = State::Done;
                            return Some(Err(err));
                        }
                    }
                }
            }
        }
    }
}

impl FusedIterator for TariffIntervals<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn cz() -> Place {
        Place::from("CZ")
    }

    fn summer_reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
    }

    fn collect(bar: &Bar) -> Result<Vec<TariffInterval>> {
        let resolver = OffsetResolver::default();
        let place = cz();
        extract(&resolver, bar, summer_reference(), &place, 2024).collect()
    }

    fn utc(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, h, m, s).unwrap()
    }

    #[test]
    fn test_window_span_parse() {
        let span = WindowSpan::parse("06:00 - 22:00").unwrap();
        assert_eq!(span.start, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(span.end, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        assert!(!span.ends_at_midnight());

        let midnight: WindowSpan = "22:00 - 00:00".parse().unwrap();
        assert!(midnight.ends_at_midnight());
    }

    #[test]
    fn test_window_span_rejects_malformed() {
        for title in [
            "6:00 - 22:00",
            "06:00-22:00",
            "06:00 - 22:00 ",
            "06:00 - 24:00",
            "06:61 - 22:00",
            "aa:bb - cc:dd",
            "",
            "22:00 - 06:00",
            "06:00 - 06:00",
        ] {
            assert!(
                matches!(WindowSpan::parse(title), Err(HdoError::MarkerParse(_))),
                "accepted {title:?}"
            );
        }
    }

    #[test]
    fn test_window_span_full_day() {
        let span = WindowSpan::parse("00:00 - 00:00").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();
        let local = span.on_day(day).unwrap();

        assert_eq!(local.start, day.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(local.end, day.and_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn test_bar_from_label_range() {
        let bar = Bar::from_label("03.04. -  07.04.", vec![]).unwrap();
        assert_eq!(bar.start_day_month, "03.04.");
        assert_eq!(bar.end_day_month, "07.04.");
    }

    #[test]
    fn test_bar_from_label_single() {
        let bar = Bar::from_label(" 08.04. ", vec![]).unwrap();
        assert_eq!(bar.start_day_month, "08.04.");
        assert_eq!(bar.end_day_month, "08.04.");
    }

    #[test]
    fn test_bar_from_label_rejects_text() {
        assert!(matches!(
            Bar::from_label("zítra", vec![]),
            Err(HdoError::DayLabelParse(_))
        ));
        assert!(matches!(
            Bar::from_label("03.04. - ", vec![]),
            Err(HdoError::DayLabelParse(_))
        ));
        assert!(matches!(
            Bar::from_label("03.04.-07.04.", vec![]),
            Err(HdoError::DayLabelParse(_))
        ));
        assert!(matches!(
            Bar::from_label("03.04. -07.04.", vec![]),
            Err(HdoError::DayLabelParse(_))
        ));
    }

    #[test]
    fn test_day_window_is_closed_one_second_early() {
        let bar = Bar::single_day(
            "03.04.",
            vec![
                TariffMarker::TariffStart(Tariff::Normal),
                TariffMarker::window("06:00", "22:00"),
            ],
        );
        let intervals = collect(&bar).unwrap();

        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, utc(3, 4, 0, 0));
        assert_eq!(intervals[0].end, utc(3, 19, 59, 59));
        assert_eq!(intervals[0].tariff, Tariff::Normal);
    }

    #[test]
    fn test_midnight_window_rolls_into_next_day() {
        let bar = Bar::single_day(
            "03.04.",
            vec![
                TariffMarker::TariffStart(Tariff::High),
                TariffMarker::window("22:00", "00:00"),
            ],
        );
        let intervals = collect(&bar).unwrap();

        assert_eq!(intervals.len(), 1);
        // 03.04. 23:59:59 local at +02:00
        assert_eq!(intervals[0].end, utc(3, 21, 59, 59));
    }

    #[test]
    fn test_three_day_bar_two_markers() {
        let bar = Bar::new(
            "03.04.",
            "05.04.",
            vec![
                TariffMarker::TariffStart(Tariff::High),
                TariffMarker::window("00:00", "08:00"),
                TariffMarker::TariffStart(Tariff::Normal),
                TariffMarker::window("08:00", "00:00"),
            ],
        );
        let intervals = collect(&bar).unwrap();

        assert_eq!(intervals.len(), 6);
        for (i, interval) in intervals.iter().enumerate() {
            let expected = if i % 2 == 0 { Tariff::High } else { Tariff::Normal };
            assert_eq!(interval.tariff, expected);
            assert!(interval.start <= interval.end);
        }
        for pair in intervals.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(!pair[0].span().overlaps(&pair[1].span()));
            assert_eq!(pair[1].start - pair[0].end, TimeDelta::seconds(1));
        }
        assert_eq!(intervals[0].start, utc(2, 22, 0, 0));
        assert_eq!(intervals[5].end, utc(5, 21, 59, 59));
    }

    #[test]
    fn test_adjacent_same_tariff_not_merged() {
        let bar = Bar::single_day(
            "03.04.",
            vec![
                TariffMarker::TariffStart(Tariff::Normal),
                TariffMarker::window("06:00", "12:00"),
                TariffMarker::window("12:00", "18:00"),
            ],
        );
        let intervals = collect(&bar).unwrap();

        assert_eq!(intervals.len(), 2);
        assert!(intervals.iter().all(|i| i.tariff == Tariff::Normal));
    }

    #[test]
    fn test_extract_is_repeatable() {
        let bar = Bar::new(
            "03.04.",
            "04.04.",
            vec![
                TariffMarker::TariffStart(Tariff::Normal),
                TariffMarker::window("06:00", "22:00"),
            ],
        );
        assert_eq!(collect(&bar).unwrap(), collect(&bar).unwrap());
    }

    #[test]
    fn test_extract_is_lazy() {
        let resolver = OffsetResolver::default();
        let place = Place::from("nowhere");
        let bar = Bar::single_day("03.04.", vec![]);

        // Building the iterator never touches the resolver.
        let mut intervals = extract(&resolver, &bar, summer_reference(), &place, 2024);
        assert!(matches!(intervals.next(), Some(Err(HdoError::UnknownPlace(_)))));
        assert!(intervals.next().is_none());
    }

    #[test]
    fn test_malformed_window_stops_sequence() {
        let bar = Bar::new(
            "03.04.",
            "05.04.",
            vec![
                TariffMarker::TariffStart(Tariff::Normal),
                TariffMarker::window("06:00", "22:00"),
                TariffMarker::Window("22:00 to 00:00".into()),
            ],
        );
        let resolver = OffsetResolver::default();
        let place = cz();
        let items: Vec<_> = extract(&resolver, &bar, summer_reference(), &place, 2024).collect();

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(HdoError::MarkerParse(_))));
    }

    #[test]
    fn test_window_before_tariff_fails() {
        let bar = Bar::single_day("03.04.", vec![TariffMarker::window("06:00", "22:00")]);
        assert!(matches!(collect(&bar), Err(HdoError::MissingTariff(_))));
    }

    #[test]
    fn test_midnight_roll_at_range_edge_fails() {
        let span = WindowSpan::parse("22:00 - 00:00").unwrap();

        assert!(matches!(
            span.on_day(NaiveDate::MAX),
            Err(HdoError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_earliest_year_reports_out_of_range() {
        let bar = Bar::single_day(
            "01.01.",
            vec![
                TariffMarker::TariffStart(Tariff::High),
                TariffMarker::window("22:00", "00:00"),
            ],
        );
        let resolver = OffsetResolver::default();
        let place = cz();
        let items: Vec<_> =
            extract(&resolver, &bar, summer_reference(), &place, NaiveDate::MIN.year()).collect();

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(HdoError::OutOfRange(_)) | Err(HdoError::TimestampParse { .. })
        ));
    }

    #[test]
    fn test_bad_day_label_fails() {
        let bar = Bar::single_day("3/4", vec![]);
        assert!(matches!(collect(&bar), Err(HdoError::TimestampParse { .. })));
    }

    #[test]
    fn test_reversed_bar_is_empty() {
        let bar = Bar::new(
            "05.04.",
            "03.04.",
            vec![
                TariffMarker::TariffStart(Tariff::Normal),
                TariffMarker::window("06:00", "22:00"),
            ],
        );
        assert!(collect(&bar).unwrap().is_empty());
    }

    #[test]
    fn test_display_line() {
        let interval = TariffInterval {
            start: utc(3, 20, 0, 0),
            end: utc(3, 21, 59, 59),
            tariff: Tariff::High,
        };
        assert_eq!(
            interval.to_string(),
            "2024-04-03T20:00:00Z 2024-04-03T21:59:59Z V"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_bar_deserializes() {
        let json = r#"{
            "startDayMonth": "03.04.",
            "endDayMonth": "07.04.",
            "markers": [
                { "tariff_start": "N" },
                { "window": "06:00 - 22:00" },
                { "tariff_start": "high" },
                { "window": "22:00 - 00:00" }
            ]
        }"#;
        let bar: Bar = serde_json::from_str(json).unwrap();

        assert_eq!(bar.end_day_month, "07.04.");
        assert_eq!(bar.markers[2], TariffMarker::TariffStart(Tariff::High));
        assert_eq!(bar.markers[3], TariffMarker::window("22:00", "00:00"));
    }
}
