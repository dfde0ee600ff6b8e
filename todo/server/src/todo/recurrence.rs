use crate::entities::sea_orm_active_enums::RecurrenceType;
use chrono::{DateTime, Months, TimeDelta, Utc};
use std::num::NonZeroU32;

/// Interval used when a recurring todo is completed without a usable interval.
pub const DEFAULT_INTERVAL: NonZeroU32 = NonZeroU32::MIN;

/// Computes the next due date by advancing `anchor` by `interval` units of `kind`.
///
/// Month and year steps follow calendar arithmetic: the day of month is clamped to the
/// end of the target month, so Jan 31 + 1 month is the last day of February.
/// Results that would overflow the representable range saturate at its maximum.
pub fn next_due_date(
    anchor: DateTime<Utc>,
    kind: RecurrenceType,
    interval: NonZeroU32,
) -> DateTime<Utc> {
    let n = interval.get();
    let advanced = match kind {
        RecurrenceType::Daily => anchor.checked_add_signed(TimeDelta::days(i64::from(n))),
        RecurrenceType::Weekly => anchor.checked_add_signed(TimeDelta::weeks(i64::from(n))),
        RecurrenceType::Monthly => anchor.checked_add_months(Months::new(n)),
        RecurrenceType::Yearly => n
            .checked_mul(12)
            .and_then(|months| anchor.checked_add_months(Months::new(months))),
    };
    advanced.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Returns the interval as a positive value, or `None` when it is absent or not positive.
pub fn positive_interval(interval: Option<i32>) -> Option<NonZeroU32> {
    interval
        .and_then(|value| u32::try_from(value).ok())
        .and_then(NonZeroU32::new)
}

/// Computes the next due date only when both a recurrence kind and a positive interval exist.
pub fn schedule(
    anchor: DateTime<Utc>,
    kind: Option<RecurrenceType>,
    interval: Option<i32>,
) -> Option<DateTime<Utc>> {
    let kind = kind?;
    let interval = positive_interval(interval)?;
    Some(next_due_date(anchor, kind, interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::Iterable;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 30, 0).unwrap()
    }

    fn n(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap()
    }

    #[test]
    fn can_advance_daily_by_interval_days() {
        assert_eq!(
            next_due_date(at(2024, 1, 1), RecurrenceType::Daily, n(2)),
            at(2024, 1, 3)
        );
    }

    #[test]
    fn can_advance_weekly_by_seven_day_multiples() {
        assert_eq!(
            next_due_date(at(2024, 1, 1), RecurrenceType::Weekly, n(3)),
            at(2024, 1, 22)
        );
    }

    #[test]
    fn can_clamp_monthly_to_end_of_shorter_month() {
        assert_eq!(
            next_due_date(at(2024, 1, 31), RecurrenceType::Monthly, n(1)),
            at(2024, 2, 29)
        );
        assert_eq!(
            next_due_date(at(2023, 11, 15), RecurrenceType::Monthly, n(3)),
            at(2024, 2, 15)
        );
    }

    #[test]
    fn can_clamp_yearly_from_leap_day() {
        assert_eq!(
            next_due_date(at(2024, 2, 29), RecurrenceType::Yearly, n(1)),
            at(2025, 2, 28)
        );
        assert_eq!(
            next_due_date(at(2024, 2, 29), RecurrenceType::Yearly, n(4)),
            at(2028, 2, 29)
        );
    }

    #[test]
    fn next_due_date_always_exceeds_anchor() {
        let anchors = [at(2020, 2, 29), at(2023, 12, 31), at(2024, 6, 15)];
        for anchor in anchors {
            for kind in RecurrenceType::iter() {
                for interval in [1, 2, 7, 13, 400] {
                    let next = next_due_date(anchor, kind, n(interval));
                    assert!(
                        next > anchor,
                        "{kind:?} x{interval} from {anchor} gave {next}"
                    );
                }
            }
        }
    }

    #[test]
    fn can_saturate_on_overflow() {
        let next = next_due_date(at(2024, 1, 1), RecurrenceType::Yearly, n(u32::MAX));
        assert_eq!(next, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn can_reject_non_positive_intervals() {
        assert_eq!(positive_interval(None), None);
        assert_eq!(positive_interval(Some(0)), None);
        assert_eq!(positive_interval(Some(-3)), None);
        assert_eq!(positive_interval(Some(5)), Some(n(5)));
    }

    #[test]
    fn can_schedule_only_with_kind_and_positive_interval() {
        let anchor = at(2024, 1, 1);
        assert_eq!(schedule(anchor, None, Some(2)), None);
        assert_eq!(schedule(anchor, Some(RecurrenceType::Daily), None), None);
        assert_eq!(schedule(anchor, Some(RecurrenceType::Daily), Some(0)), None);
        assert_eq!(
            schedule(anchor, Some(RecurrenceType::Daily), Some(2)),
            Some(at(2024, 1, 3))
        );
    }
}
