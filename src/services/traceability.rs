//! Traceability events recorded as order note attributes.
//!
//! Store staff stamp milestones (packed, ready for pickup, ...) as note
//! attributes whose names and timestamp formats vary between tools. Names are
//! matched through an ordered alias table; values go through a tolerant
//! timestamp parser.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::models::order::NoteAttribute;
use crate::models::sheet_row::Column;
use crate::services::coercion::{format_sheet_datetime, parse_iso_datetime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum TraceEvent {
    Packed,
    TransferredToStore,
    ReadyForPickup,
    PickedUp,
    HandedToCarrier,
}

impl TraceEvent {
    pub fn column(self) -> Column {
        match self {
            TraceEvent::Packed => Column::Packed,
            TraceEvent::TransferredToStore => Column::TransferredToStore,
            TraceEvent::ReadyForPickup => Column::ReadyForPickup,
            TraceEvent::PickedUp => Column::PickedUp,
            TraceEvent::HandedToCarrier => Column::HandedToCarrier,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy)]
enum NameMatch {
    Exact(&'static str),
    Contains(&'static str),
}

impl NameMatch {
    fn matches(self, normalized: &str) -> bool {
        match self {
            NameMatch::Exact(alias) => normalized == alias,
            NameMatch::Contains(fragment) => normalized.contains(fragment),
        }
    }
}

/// Alias table, first match wins. Names are compared after [`normalize_name`].
const EVENT_ALIASES: &[(NameMatch, TraceEvent)] = &[
    (NameMatch::Exact("embalado"), TraceEvent::Packed),
    (
        NameMatch::Exact("transferido_a_tienda"),
        TraceEvent::TransferredToStore,
    ),
    (
        NameMatch::Exact("listo_para_retiro"),
        TraceEvent::ReadyForPickup,
    ),
    (NameMatch::Exact("retirado_por_cliente"), TraceEvent::PickedUp),
    (
        NameMatch::Contains("transportista"),
        TraceEvent::HandedToCarrier,
    ),
    (NameMatch::Contains("carrier"), TraceEvent::HandedToCarrier),
];

/// Lowercases and maps `-` and spaces to `_`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

pub fn match_event(name: &str) -> Option<TraceEvent> {
    let normalized = normalize_name(name);
    EVENT_ALIASES
        .iter()
        .find(|(pattern, _)| pattern.matches(&normalized))
        .map(|(_, event)| *event)
}

/// Formatted timestamp per event; empty when the order has no such event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceabilityMap {
    values: [String; TraceEvent::COUNT],
}

impl TraceabilityMap {
    pub fn get(&self, event: TraceEvent) -> &str {
        &self.values[event.index()]
    }

    fn set(&mut self, event: TraceEvent, value: String) {
        self.values[event.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraceEvent, &str)> + '_ {
        TraceEvent::iter().map(move |event| (event, self.get(event)))
    }
}

/// Builds the event map from note attributes. Later attributes overwrite
/// earlier ones for the same event.
pub fn extract_traceability(attributes: &[NoteAttribute]) -> TraceabilityMap {
    let mut trace = TraceabilityMap::default();
    for attribute in attributes {
        let Some(name) = attribute.name.as_deref() else {
            continue;
        };
        if let Some(event) = match_event(name) {
            let value = attribute.value.as_deref().unwrap_or_default();
            trace.set(event, parse_trace_timestamp(value));
        }
    }
    trace
}

static LOCALE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{2})-(\d{2})-(\d{4}).*?(\d{1,2}):(\d{2}):(\d{2})(?:\s*([ap])\s*\.?\s*m\s*\.?)?",
    )
    .unwrap()
});

/// Parses a traceability timestamp into the sheet format.
///
/// Accepts ISO-8601, or `DD-MM-YYYY <anything> H:MM:SS [a.m.|p.m.]` as written
/// by Spanish-locale tools (which use U+00A0 / U+202F around the marker).
/// Input that matches neither is returned trimmed but otherwise unchanged.
pub fn parse_trace_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Some(dt) = parse_iso_datetime(trimmed) {
        return format_sheet_datetime(&dt);
    }

    let lowered = trimmed
        .to_lowercase()
        .replace(['\u{00a0}', '\u{202f}'], " ");

    parse_locale_timestamp(lowered.trim()).unwrap_or_else(|| trimmed.to_string())
}

fn parse_locale_timestamp(text: &str) -> Option<String> {
    let caps = LOCALE_TIMESTAMP.captures(text)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let (day, month, year) = (number(1)?, number(2)?, number(3)?);
    let (mut hour, minute, second) = (number(4)?, number(5)?, number(6)?);

    match caps.get(7).map(|m| m.as_str()) {
        Some("p") if hour != 12 => hour += 12,
        Some("a") if hour == 12 => hour = 0,
        _ => {}
    }

    let dt = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
        .and_hms_opt(hour, minute, second)?;
    Some(format_sheet_datetime(&dt))
}
