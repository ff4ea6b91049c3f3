use chrono::{NaiveDateTime, NaiveTime, Timelike};
use rrule::RRuleSet;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::timezone::truncate_to_seconds;

/// Format of an `UNTIL` value in a floating (naive) rule.
const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Default upper bound on occurrences produced by one expansion.
pub const DEFAULT_MAX_OCCURRENCES: u16 = 1000;

/// Applies `f` to the value of every `UNTIL=` part of a rule, leaving the
/// other parts untouched.
fn map_until_values<F>(rule: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                format!("{}={}", key, f(value))
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn has_part(rule: &str, name: &str) -> bool {
    rule.split(';').any(|part| {
        part.split_once('=')
            .map(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .unwrap_or(false)
    })
}

/// `YYYYMMDD` or `YYYYMMDDTHHMMSS`.
fn is_until_literal(value: &str) -> bool {
    let bytes = value.as_bytes();
    let digits = |range: &[u8]| range.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        8 => digits(bytes),
        15 => digits(&bytes[..8]) && bytes[8] == b'T' && digits(&bytes[9..]),
        _ => false,
    }
}

/// Removes the trailing `Z` of Zulu `UNTIL` values.
///
/// `UNTIL=20240122T000000Z` becomes `UNTIL=20240122T000000`. Only values made
/// of digits and `T` are touched.
pub fn strip_zulu_until(rule: &str) -> String {
    map_until_values(rule, |value| match value.strip_suffix('Z') {
        Some(body) if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit() || b == b'T') => {
            body.to_string()
        }
        _ => value.to_string(),
    })
}

/// Exactly-midnight boundaries are treated as date-only and moved to 23:59:59
/// of the same day. Any other instant is returned as is.
pub fn end_of_day_boundary(until: NaiveDateTime) -> NaiveDateTime {
    if until.time() == NaiveTime::MIN {
        until
            .with_hour(23)
            .and_then(|dt| dt.with_minute(59))
            .and_then(|dt| dt.with_second(59))
            .unwrap_or(until)
    } else {
        until
    }
}

/// Makes the rule's `UNTIL` agree with `until`.
///
/// Every `UNTIL=<8 digits>[T<6 digits>]` value is replaced. A rule without
/// `UNTIL` or `COUNT` gets an `UNTIL` part appended. Rules carrying `COUNT`
/// keep it, and values that are not date literals are left for the parser to
/// reject.
pub fn rewrite_until(rule: &str, until: NaiveDateTime) -> String {
    let formatted = until.format(UNTIL_FORMAT).to_string();

    if has_part(rule, "UNTIL") {
        return map_until_values(rule, |value| {
            if is_until_literal(value) {
                formatted.clone()
            } else {
                value.to_string()
            }
        });
    }
    if has_part(rule, "COUNT") {
        return rule.to_string();
    }
    if rule.is_empty() {
        format!("UNTIL={}", formatted)
    } else {
        format!("{};UNTIL={}", rule, formatted)
    }
}

/// Normalizes a user-supplied rule against an (already normalized) boundary.
///
/// Trims whitespace, drops an optional `RRULE:` prefix and empty parts,
/// strips Zulu markers, then rewrites or inserts `UNTIL`.
pub fn clean_rule(rule: &str, until: NaiveDateTime) -> String {
    let trimmed = rule.trim();
    let body = match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &trimmed[6..],
        _ => trimmed,
    };
    let compact = body
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(";");

    rewrite_until(&strip_zulu_until(&compact), until)
}

/// Expands floating recurrence rules into naive occurrence instants.
///
/// Rules are evaluated in UTC so results never depend on the host zone.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    max_occurrences: u16,
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OCCURRENCES)
    }
}

impl RecurrenceExpander {
    pub fn new(max_occurrences: u16) -> Self {
        Self { max_occurrences }
    }

    /// Produces every occurrence of `rule` from `start` through `until`, inclusive.
    ///
    /// # Arguments
    /// * `start` - The anchor (`DTSTART`), truncated to whole seconds
    /// * `rule` - RRULE body, with or without the `RRULE:` prefix
    /// * `until` - Termination boundary; a midnight value covers the whole day
    ///
    /// # Returns
    /// * `Result<Vec<NaiveDateTime>, CoreError>` - Chronological, duplicate-free
    ///   occurrences, or `CoreError::RecurrenceParse` for malformed rules
    ///
    /// # Behavior
    /// - An `until` earlier than `start` yields no occurrences
    /// - At most `max_occurrences` instants are returned; truncation is logged
    pub fn expand(
        &self,
        start: NaiveDateTime,
        rule: &str,
        until: NaiveDateTime,
    ) -> Result<Vec<NaiveDateTime>, CoreError> {
        let start = truncate_to_seconds(start);
        let until = end_of_day_boundary(until);
        let cleaned = clean_rule(rule, until);

        if until < start {
            debug!(%start, %until, "recurrence boundary precedes anchor");
            return Ok(Vec::new());
        }

        let rule_set = Self::parse(start, &cleaned)?;
        let result = rule_set.all(self.max_occurrences);
        if result.limited {
            warn!(
                rule = %cleaned,
                max_occurrences = self.max_occurrences,
                "recurrence expansion truncated"
            );
        }

        let mut occurrences: Vec<NaiveDateTime> = result
            .dates
            .into_iter()
            .map(|dt| dt.naive_utc())
            .filter(|dt| *dt >= start && *dt <= until)
            .collect();
        occurrences.sort_unstable();
        occurrences.dedup();

        debug!(rule = %cleaned, count = occurrences.len(), "expanded recurrence");
        Ok(occurrences)
    }

    /// Builds the rule set with both anchor and `UNTIL` marked as UTC.
    fn parse(start: NaiveDateTime, cleaned: &str) -> Result<RRuleSet, CoreError> {
        let utc_rule = map_until_values(cleaned, |value| {
            if value.len() == 15 && is_until_literal(value) {
                format!("{}Z", value)
            } else {
                value.to_string()
            }
        });
        let source = format!(
            "DTSTART:{}Z\nRRULE:{}",
            start.format(UNTIL_FORMAT),
            utc_rule
        );

        source
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::RecurrenceParse(format!("'{}': {}", cleaned, e)))
    }
}
