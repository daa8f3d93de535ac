//! Trigger-time arithmetic.
//!
//! All instants are local wall-clock times (`NaiveDateTime`); the platform
//! interprets them in the device's time zone.

use chrono::{Duration, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::models::{Category, TimeOfDay};

/// Next instant at `time` strictly after `now`: today if still ahead,
/// otherwise the same wall-clock time tomorrow.
#[must_use]
pub fn next_occurrence(time: TimeOfDay, now: NaiveDateTime) -> NaiveDateTime {
    let candidate = time.on(now.date());
    if candidate <= now {
        candidate + Duration::days(1)
    } else {
        candidate
    }
}

/// When a scheduled notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Deliver right away.
    Immediate,
    /// Fire once at `at`.
    Once { at: NaiveDateTime },
    /// Fire at `first`, then every day at the same wall-clock time.
    Daily { first: NaiveDateTime },
}

impl Trigger {
    /// Anchor instant, `None` for immediate triggers.
    #[must_use]
    pub fn anchor(&self) -> Option<NaiveDateTime> {
        match *self {
            Trigger::Immediate => None,
            Trigger::Once { at } => Some(at),
            Trigger::Daily { first } => Some(first),
        }
    }

    #[must_use]
    pub fn repeats(&self) -> bool {
        matches!(self, Trigger::Daily { .. })
    }

    /// Next firing at or after `now`. A one-shot whose instant is past has
    /// nothing left to fire.
    #[must_use]
    pub fn next_fire(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            Trigger::Immediate => Some(now),
            Trigger::Once { at } => (at >= now).then_some(at),
            Trigger::Daily { first } => {
                if first >= now {
                    return Some(first);
                }
                let elapsed_days = (now - first).num_days();
                let mut next = first + Duration::days(elapsed_days);
                if next < now {
                    next += Duration::days(1);
                }
                Some(next)
            }
        }
    }
}

/// Milliseconds since the Unix epoch for a local wall-clock instant.
/// Times skipped by a DST jump fall back to reading the instant as UTC.
#[must_use]
pub fn epoch_millis(at: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&at)
        .earliest()
        .map_or_else(|| at.and_utc().timestamp_millis(), |dt| dt.timestamp_millis())
}

/// Identifier of a scheduled notification: `{category}_{entity}_{epochMillis}`.
#[must_use]
pub fn composite_key(category: Category, entity_id: &str, at: NaiveDateTime) -> String {
    format!("{}_{}_{}", category.as_str(), entity_id, epoch_millis(at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    #[test]
    fn test_next_occurrence_later_today() {
        assert_eq!(next_occurrence(t("12:30"), at(15, 8, 0)), at(15, 12, 30));
    }

    #[test]
    fn test_next_occurrence_passed_rolls_one_day() {
        assert_eq!(next_occurrence(t("07:00"), at(15, 8, 0)), at(16, 7, 0));
    }

    #[test]
    fn test_next_occurrence_exactly_now_rolls() {
        assert_eq!(next_occurrence(t("08:00"), at(15, 8, 0)), at(16, 8, 0));
    }

    #[test]
    fn test_next_occurrence_month_boundary() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let next = next_occurrence(t("06:00"), now);
        assert_eq!(next, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_never_in_past_for_every_minute() {
        let now = at(15, 13, 17) + Duration::seconds(42);
        for hour in 0..24 {
            for minute in 0..60 {
                let time = TimeOfDay::from_hm(hour, minute).unwrap();
                let next = next_occurrence(time, now);
                assert!(next > now);
                let same_day = time.on(now.date());
                if same_day <= now {
                    assert_eq!(next - same_day, Duration::hours(24));
                } else {
                    assert_eq!(next, same_day);
                }
            }
        }
    }

    #[test]
    fn test_trigger_anchor_and_repeats() {
        let once = Trigger::Once { at: at(16, 22, 0) };
        assert_eq!(once.anchor(), Some(at(16, 22, 0)));
        assert!(!once.repeats());
        let daily = Trigger::Daily { first: at(15, 23, 30) };
        assert_eq!(daily.anchor(), Some(at(15, 23, 30)));
        assert!(daily.repeats());
        assert!(!Trigger::Immediate.repeats());
        assert!(Trigger::Immediate.anchor().is_none());
    }

    #[test]
    fn test_next_fire() {
        let once = Trigger::Once { at: at(15, 12, 0) };
        assert_eq!(once.next_fire(at(15, 11, 0)), Some(at(15, 12, 0)));
        assert_eq!(once.next_fire(at(15, 13, 0)), None);

        let daily = Trigger::Daily { first: at(15, 22, 0) };
        assert_eq!(daily.next_fire(at(15, 21, 0)), Some(at(15, 22, 0)));
        assert_eq!(daily.next_fire(at(15, 22, 0)), Some(at(15, 22, 0)));
        assert_eq!(daily.next_fire(at(17, 23, 0)), Some(at(18, 22, 0)));
        assert_eq!(daily.next_fire(at(18, 21, 59)), Some(at(18, 22, 0)));
    }

    #[test]
    fn test_trigger_serde_tag() {
        let json = serde_json::to_value(Trigger::Daily { first: at(15, 22, 0) }).unwrap();
        assert_eq!(json["kind"], "daily");
        assert_eq!(json["first"], "2024-06-15T22:00:00");
        let back: Trigger = serde_json::from_value(json).unwrap();
        assert_eq!(back, Trigger::Daily { first: at(15, 22, 0) });
    }

    #[test]
    fn test_composite_key_shape() {
        let key = composite_key(Category::Meal, "monday-lunch", at(17, 12, 30));
        let expected = format!("meal_monday-lunch_{}", epoch_millis(at(17, 12, 30)));
        assert_eq!(key, expected);
        assert!(
            composite_key(Category::Meal, "x", at(17, 12, 30))
                != composite_key(Category::Meal, "x", at(18, 12, 30))
        );
    }
}
