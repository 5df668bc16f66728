//! Monthly event queries.
//!
//! Calendar events come from the schedule table and are recognized by
//! their schedule-key prefix; one-off mail campaigns come from the mail
//! table. An event belongs to a month when it starts or ends in that month
//! and has not already finished.

use anyhow::{bail, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

use crate::data::Snapshot;
use crate::models::Reply;
use crate::render;

const SCHEDULE_PREFIXES: &[(&str, &str)] = &[
    ("Calender_PickUp_", "卡池"),
    ("Calender_SingleRaid_", "单人突袭"),
    ("Calender_EdenAlliance_", "伊甸联合作战"),
    ("Calender_WorldBoss_", "世界Boss"),
    ("Calender_GuildRaid_", "公会突袭"),
];

/// One event inside the requested month.
#[derive(Debug, Clone)]
pub struct EventEntry {
    pub name: String,
    pub kind: &'static str,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Event kind for a schedule key, or `None` for keys the frontend never
/// shows (shop rotations, maintenance windows, ...).
fn schedule_kind(key: &str) -> Option<&'static str> {
    for &(prefix, kind) in SCHEDULE_PREFIXES {
        if key.starts_with(prefix) {
            return Some(kind);
        }
    }
    if key.ends_with("_Main") {
        return Some("主要活动");
    }
    None
}

fn in_month(date: NaiveDateTime, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// Calendar events overlapping the given month and not yet over.
pub fn collect_events(
    snapshot: &Snapshot,
    year: i32,
    month: u32,
    now: NaiveDateTime,
) -> Vec<EventEntry> {
    let mut events: Vec<EventEntry> = snapshot
        .event_calenders
        .iter()
        .filter_map(|row| {
            let kind = schedule_kind(&row.schedule_key)?;
            let start =
                NaiveDateTime::parse_from_str(&row.start_date, "%Y-%m-%d %H:%M:%S").ok()?;
            let end = NaiveDateTime::parse_from_str(&row.end_date, "%Y-%m-%d %H:%M:%S").ok()?;

            if !(in_month(start, year, month) || in_month(end, year, month)) {
                return None;
            }
            if end < now {
                return None;
            }

            let name = snapshot
                .strings
                .try_get(row.name_sno)
                .unwrap_or_else(|| row.schedule_key.clone());
            Some(EventEntry {
                name,
                kind,
                start,
                end,
            })
        })
        .collect();

    events.sort_by(|a, b| a.start.cmp(&b.start).then(a.name.cmp(&b.name)));
    events
}

/// `events <month>` — calendar and mail events for a month of the current
/// year, with a timeline page attached.
pub fn query_events(snapshot: &Snapshot, month: u32) -> Result<Reply> {
    let now = Local::now().naive_local();
    query_events_at(snapshot, month, now)
}

pub fn query_events_at(snapshot: &Snapshot, month: u32, now: NaiveDateTime) -> Result<Reply> {
    if !(1..=12).contains(&month) {
        bail!("invalid month: {}. Use 1 to 12.", month);
    }
    let year = now.year();

    let events = collect_events(snapshot, year, month, now);

    let mut reply = Reply::new();

    let body = if events.is_empty() {
        format!("{}月暂无进行中或即将开始的活动", month)
    } else {
        events
            .iter()
            .map(|e| {
                format!(
                    "[{}] {}\n{} ~ {}",
                    e.kind,
                    e.name,
                    e.start.format("%m-%d %H:%M"),
                    e.end.format("%m-%d %H:%M")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    reply = reply.section(format!("{}月活动", month), body);

    let mails = collect_mail_events(snapshot, year, month, now);
    if !mails.is_empty() {
        reply = reply.section(format!("{}月邮件", month), mails.join("\n\n"));
    }

    if !events.is_empty() {
        reply = reply.with_html(render::timeline_page(year, month, &events));
    }
    Ok(reply)
}

/// Mail campaigns in the month: sender, title, and reward lines. Mail dates
/// are day-granular, so an end date today still counts.
fn collect_mail_events(
    snapshot: &Snapshot,
    year: i32,
    month: u32,
    now: NaiveDateTime,
) -> Vec<String> {
    let mut mails: Vec<(NaiveDate, String)> = snapshot
        .message_mails
        .iter()
        .filter_map(|row| {
            let start = NaiveDate::parse_from_str(&row.start_date, "%Y-%m-%d").ok()?;
            let end = NaiveDate::parse_from_str(&row.end_date, "%Y-%m-%d").ok()?;

            let start_in = start.year() == year && start.month() == month;
            let end_in = end.year() == year && end.month() == month;
            if !(start_in || end_in) {
                return None;
            }
            if end < now.date() {
                return None;
            }

            let mut lines = vec![
                format!(
                    "{} ({} ~ {})",
                    snapshot.strings.get(row.title_sno),
                    start.format("%m-%d"),
                    end.format("%m-%d")
                ),
                format!("发件人: {}", snapshot.hero_name(row.sender_sno)),
            ];
            if let Some(desc) = snapshot.strings.try_get(row.desc_sno) {
                lines.push(desc);
            }
            for (item_no, amount) in row.rewards() {
                lines.push(format!("{} x{}", snapshot.item_name(item_no), amount));
            }
            Some((start, lines.join("\n")))
        })
        .collect();

    mails.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    mails.into_iter().map(|(_, text)| text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::EventCalenderRow;

    fn event(key: &str, start: &str, end: &str) -> EventCalenderRow {
        EventCalenderRow {
            schedule_key: key.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            name_sno: 0,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_schedule_kind_filtering() {
        assert_eq!(schedule_kind("Calender_PickUp_Mica"), Some("卡池"));
        assert_eq!(schedule_kind("Calender_WorldBoss_June"), Some("世界Boss"));
        assert_eq!(schedule_kind("Summer2024_Main"), Some("主要活动"));
        assert_eq!(schedule_kind("Shop_Rotation_12"), None);
    }

    #[test]
    fn test_schedule_kind_requires_full_calender_prefix() {
        // Exporter keys all start with Calender_; bare kind names are noise
        assert_eq!(schedule_kind("Calender_SingleRaid_Mica"), Some("单人突袭"));
        assert_eq!(schedule_kind("Calender_EdenAlliance_07"), Some("伊甸联合作战"));
        assert_eq!(schedule_kind("Calender_GuildRaid_S3"), Some("公会突袭"));
        assert_eq!(schedule_kind("SingleRaid_Mica"), None);
        assert_eq!(schedule_kind("WorldBoss_June"), None);
    }

    #[test]
    fn test_collect_events_matches_exporter_keys() {
        let mut snapshot = Snapshot::default();
        snapshot.event_calenders = vec![event(
            "Calender_SingleRaid_Mica",
            "2024-06-12 05:00:00",
            "2024-06-26 04:59:59",
        )];
        let events = collect_events(&snapshot, 2024, 6, now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "单人突袭");
    }

    #[test]
    fn test_event_in_month_by_start_or_end() {
        let mut snapshot = Snapshot::default();
        snapshot.event_calenders = vec![
            event("Calender_PickUp_A", "2024-06-15 05:00:00", "2024-06-29 04:59:59"),
            event("Calender_PickUp_B", "2024-05-20 05:00:00", "2024-06-03 04:59:59"),
            event("Calender_PickUp_C", "2024-07-01 05:00:00", "2024-07-15 04:59:59"),
        ];

        let events = collect_events(&snapshot, 2024, 6, now());
        // B ended June 3rd, before "now" June 10th; C is July-only
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Calender_PickUp_A");
    }

    #[test]
    fn test_ended_events_excluded() {
        let mut snapshot = Snapshot::default();
        snapshot.event_calenders = vec![event(
            "Calender_WorldBoss_Spring",
            "2024-06-01 05:00:00",
            "2024-06-08 04:59:59",
        )];
        assert!(collect_events(&snapshot, 2024, 6, now()).is_empty());
    }

    #[test]
    fn test_unparsable_dates_skipped() {
        let mut snapshot = Snapshot::default();
        snapshot.event_calenders =
            vec![event("Calender_GuildRaid_X", "soon", "2024-06-30 00:00:00")];
        assert!(collect_events(&snapshot, 2024, 6, now()).is_empty());
    }

    #[test]
    fn test_events_sorted_by_start() {
        let mut snapshot = Snapshot::default();
        snapshot.event_calenders = vec![
            event("Calender_SingleRaid_B", "2024-06-20 05:00:00", "2024-06-30 04:59:59"),
            event("Calender_SingleRaid_A", "2024-06-12 05:00:00", "2024-06-26 04:59:59"),
        ];
        let events = collect_events(&snapshot, 2024, 6, now());
        assert_eq!(events[0].name, "Calender_SingleRaid_A");
        assert_eq!(events[1].name, "Calender_SingleRaid_B");
    }

    #[test]
    fn test_month_validation() {
        let snapshot = Snapshot::default();
        assert!(query_events_at(&snapshot, 0, now()).is_err());
        assert!(query_events_at(&snapshot, 13, now()).is_err());
        assert!(query_events_at(&snapshot, 6, now()).is_ok());
    }

    #[test]
    fn test_timeline_attached_only_with_events() {
        let mut snapshot = Snapshot::default();
        assert!(query_events_at(&snapshot, 6, now()).unwrap().html.is_none());

        snapshot.event_calenders = vec![event(
            "Calender_PickUp_A",
            "2024-06-15 05:00:00",
            "2024-06-29 04:59:59",
        )];
        assert!(query_events_at(&snapshot, 6, now()).unwrap().html.is_some());
    }
}
