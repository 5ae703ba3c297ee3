use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::datetime::{days_between_dates, parse_date};
use crate::format::format_offset;
use crate::resolve::{DateInfo, extract_date_from_task};
use crate::severity::{Severity, classify};
use crate::task::TaskSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    #[serde(flatten)]
    pub source: DateInfo,
    pub days: i64,
    pub text: String,
    pub severity: Severity,
    pub color: &'static str,
    pub background: String,
}

impl Badge {
    #[must_use]
    pub fn from_offset(source: DateInfo, days: i64, settings: &Settings) -> Self {
        let severity = classify(days);
        Self {
            source,
            days,
            text: format_offset(days, settings),
            severity,
            color: severity.color(),
            background: severity.background(),
        }
    }
}

#[instrument(skip(settings), fields(date = %info.date, source = %info.provenance))]
pub fn compute_badge(info: DateInfo, settings: &Settings, today: NaiveDate) -> Option<Badge> {
    let Some(target) = parse_date(Some(&info.date)) else {
        debug!("date value has no YYYY-MM-DD part");
        return None;
    };
    let Some(days) = days_between_dates(target, today) else {
        debug!(%target, "date outside the supported calendar range");
        return None;
    };

    let badge = Badge::from_offset(info, days, settings);
    debug!(days, text = %badge.text, severity = badge.severity.as_str(), "computed badge");
    Some(badge)
}

/// `None` means the row has nothing to show: no date, or one that does not
/// parse.
#[instrument(skip_all, fields(task = snapshot.display_id()))]
pub fn badge_for_task(
    snapshot: &TaskSnapshot,
    settings: &Settings,
    today: NaiveDate,
) -> Option<Badge> {
    let Some(info) = extract_date_from_task(snapshot, settings, today) else {
        debug!("no date found for task");
        return None;
    };
    compute_badge(info, settings, today)
}

/// A badge tied back to the row it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskBadge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub badge: Badge,
}

/// Rows without a usable date are skipped.
#[instrument(skip_all, fields(count = snapshots.len()))]
pub fn badges_for_tasks(
    snapshots: &[TaskSnapshot],
    settings: &Settings,
    today: NaiveDate,
) -> Vec<TaskBadge> {
    snapshots
        .iter()
        .filter_map(|snapshot| {
            badge_for_task(snapshot, settings, today).map(|badge| TaskBadge {
                id: snapshot.id.clone(),
                badge,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{badge_for_task, badges_for_tasks, compute_badge};
    use crate::config::{DisplayMode, Settings};
    use crate::locale::LocaleTag;
    use crate::resolve::{DateInfo, Provenance};
    use crate::severity::Severity;
    use crate::task::TaskSnapshot;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn due_attribute_badge() {
        let badge = compute_badge(
            DateInfo::new("2026-03-08", Provenance::Due),
            &Settings::default(),
            ymd(2026, 3, 1),
        )
        .expect("badge");
        assert_eq!(badge.days, 7);
        assert_eq!(badge.text, "7日後");
        assert_eq!(badge.severity, Severity::Soon);
        assert_eq!(badge.color, "#246fe0");
        assert_eq!(badge.background, "#246fe015");
    }

    #[test]
    fn datetime_with_time_part_uses_date_only() {
        let badge = compute_badge(
            DateInfo::new("2026-03-02T23:59:00+09:00", Provenance::Datetime),
            &Settings::default(),
            ymd(2026, 3, 1),
        )
        .expect("badge");
        assert_eq!(badge.days, 1);
        assert_eq!(badge.text, "明日");
        assert_eq!(badge.severity, Severity::Urgent);
    }

    #[test]
    fn unparseable_value_has_no_badge() {
        assert_eq!(
            compute_badge(
                DateInfo::new("next week", Provenance::Due),
                &Settings::default(),
                ymd(2026, 3, 1)
            ),
            None
        );
    }

    #[test]
    fn task_without_date_has_no_badge() {
        let snapshot = TaskSnapshot::from_text("Buy milk").with_id("7");
        let settings = Settings::new(LocaleTag::En, DisplayMode::After);
        assert_eq!(badge_for_task(&snapshot, &settings, ymd(2026, 3, 1)), None);
    }

    #[test]
    fn serializes_flat_record() {
        let badge = compute_badge(
            DateInfo::new("2026-03-05", Provenance::Deadline),
            &Settings::new(LocaleTag::En, DisplayMode::After),
            ymd(2026, 3, 10),
        )
        .expect("badge");
        let value = serde_json::to_value(&badge).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "date": "2026-03-05",
                "provenance": "deadline",
                "days": -5,
                "text": "5d ago",
                "severity": "overdue",
                "color": "#d1453b",
                "background": "#d1453b15"
            })
        );
    }

    #[test]
    fn batch_skips_rows_without_dates() {
        let rows = vec![
            TaskSnapshot::from_text("Review PR - Due Mar 5").with_id("1"),
            TaskSnapshot::from_text("Someday maybe").with_id("2"),
            TaskSnapshot::from_due_date("2026-03-01").with_id("3"),
        ];
        let settings = Settings::new(LocaleTag::En, DisplayMode::After);
        let badges = badges_for_tasks(&rows, &settings, ymd(2026, 3, 1));
        let summary: Vec<_> = badges
            .iter()
            .map(|row| (row.id.as_deref(), row.badge.text.as_str()))
            .collect();
        assert_eq!(summary, vec![(Some("1"), "4d left"), (Some("3"), "Today")]);
    }
}
