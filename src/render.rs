//! HTML page generation.
//!
//! The chat frontend rasterizes these pages into images before posting
//! them, so the markup stays self-contained: inline CSS, no scripts, no
//! external assets.

use chrono::Datelike;

use crate::events::EventEntry;
use crate::potential::PotentialRow;

const PAGE_STYLE: &str = "\
body { font-family: 'Noto Sans SC', sans-serif; background: #1e2127; color: #e6e6e6; margin: 24px; }\n\
h1 { font-size: 22px; border-bottom: 2px solid #5a8dee; padding-bottom: 8px; }\n\
table { border-collapse: collapse; width: 100%; }\n\
th, td { border: 1px solid #3a3f4b; padding: 6px 10px; text-align: left; font-size: 14px; }\n\
th { background: #2a2f3a; }\n\
.bar { position: relative; height: 18px; background: #2a2f3a; border-radius: 4px; margin: 4px 0; }\n\
.bar span { position: absolute; height: 100%; background: #5a8dee; border-radius: 4px; }\n\
.label { font-size: 13px; margin-top: 10px; }";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{}\n</style>\n</head>\n<body>\n<h1>{}</h1>\n{}\n</body>\n</html>\n",
        PAGE_STYLE,
        escape(title),
        body
    )
}

/// Month timeline: one bar per event, positioned by day of month.
pub fn timeline_page(year: i32, month: u32, events: &[EventEntry]) -> String {
    let days_in_month = days_in_month(year, month) as f64;

    let mut body = String::new();
    for event in events {
        // Clamp the bar to the displayed month
        let start_day = if event.start.month() == month && event.start.year() == year {
            event.start.day() as f64
        } else {
            1.0
        };
        let end_day = if event.end.month() == month && event.end.year() == year {
            event.end.day() as f64
        } else {
            days_in_month
        };

        let left = (start_day - 1.0) / days_in_month * 100.0;
        let width = ((end_day - start_day + 1.0) / days_in_month * 100.0).max(1.0);

        body.push_str(&format!(
            "<div class=\"label\">[{}] {} ({} ~ {})</div>\n<div class=\"bar\"><span style=\"left: {:.1}%; width: {:.1}%;\"></span></div>\n",
            escape(event.kind),
            escape(&event.name),
            event.start.format("%m-%d"),
            event.end.format("%m-%d"),
            left,
            width
        ));
    }

    page(&format!("{}年{}月活动", year, month), &body)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
                29
            } else {
                28
            }
        }
    }
}

/// Potential value table: one row per slot/level.
pub fn potential_page(rows: &[PotentialRow]) -> String {
    let mut body = String::from("<table>\n<tr><th>槽位</th><th>等级</th><th>效果</th></tr>\n");
    for row in rows {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.slot,
            row.level,
            escape(&row.value)
        ));
    }
    body.push_str("</table>");
    page("潜能一览", &body)
}

/// Static command reference.
pub fn help_page() -> String {
    let commands = [
        ("hero <名称>", "角色详情：属性、技能、魔灵武器"),
        ("heroes", "角色列表（按种族分组）"),
        ("ranking <height|weight>", "身高 / 体重排行"),
        ("stage <N-M>", "主线关卡信息"),
        ("gate <种族>", "传送门信息"),
        ("gear <查询>", "装备查询，如 粉3力量攻击力"),
        ("packs <目标>", "礼包查询：主线N / 传送门 / 起源塔 / 升阶"),
        ("events <月份>", "当月活动与邮件"),
        ("affinity <名称>", "好感度攻略：礼物、关键词、剧情选项"),
        ("levels <from> <to>", "升级花费"),
        ("ark", "方舟强化一览"),
        ("potential", "潜能一览"),
    ];

    let mut body = String::from("<table>\n<tr><th>指令</th><th>说明</th></tr>\n");
    for (cmd, desc) in commands {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(cmd),
            escape(desc)
        ));
    }
    body.push_str("</table>");
    page("指令一览", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(name: &str, start: (u32, u32), end: (u32, u32)) -> EventEntry {
        EventEntry {
            name: name.to_string(),
            kind: "卡池",
            start: NaiveDate::from_ymd_opt(2024, start.0, start.1)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap(),
            end: NaiveDate::from_ymd_opt(2024, end.0, end.1)
                .unwrap()
                .and_hms_opt(4, 59, 59)
                .unwrap(),
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(2024, 6), 30);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn test_timeline_contains_events() {
        let html = timeline_page(2024, 6, &[entry("米卡 卡池", (6, 15), (6, 29))]);
        assert!(html.contains("2024年6月活动"));
        assert!(html.contains("米卡 卡池"));
        assert!(html.contains("06-15"));
    }

    #[test]
    fn test_timeline_clamps_overlapping_months() {
        let html = timeline_page(2024, 6, &[entry("跨月活动", (5, 20), (6, 3))]);
        // Starts before the month → bar starts at the left edge
        assert!(html.contains("left: 0.0%"));
    }

    #[test]
    fn test_potential_page_rows() {
        let rows = vec![PotentialRow {
            slot: 1,
            level: 3,
            value: "攻击力 120".to_string(),
        }];
        let html = potential_page(&rows);
        assert!(html.contains("<td>1</td><td>3</td><td>攻击力 120</td>"));
    }

    #[test]
    fn test_help_page_lists_commands() {
        let html = help_page();
        assert!(html.contains("affinity"));
        assert!(html.contains("粉3力量攻击力"));
    }
}
