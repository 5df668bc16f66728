//! Equipment tier queries.
//!
//! Players ask for gear with a compact query like `粉3力量攻击力`: color
//! grade, optional enhancement step, stat class, and the gear's special
//! effect. 粉 (pink) is the 不朽 grade, 红 (red) is 永恆＋.

use anyhow::{bail, Result};
use regex::Regex;
use std::sync::OnceLock;

use crate::data::{stat_class_sno, stat_display_name, Snapshot};
use crate::models::Reply;
use crate::strings::format_stat_value;
use crate::tables::ItemRow;

/// Immortal-grade equipment category.
const CATEGORY_IMMORTAL: i64 = 110002;
/// Eternal-plus-grade equipment category.
const CATEGORY_ETERNAL: i64 = 110078;

/// Stat slots 1..=3 are base rolls; later slots are extra.
const BASE_SLOTS: i64 = 3;

/// A parsed gear query.
#[derive(Debug, Clone, PartialEq)]
pub struct GearQuery {
    pub category_sno: i64,
    pub grade_level: i64,
    pub class_sno: i64,
    pub effect_sno: i64,
    pub grade_label: String,
}

/// Gear special-effect name → effect sno.
fn effect_sno(name: &str) -> Option<i64> {
    match name {
        "攻击力" => Some(14101),
        "防御力" => Some(14102),
        "体力" => Some(14103),
        "暴击率" => Some(14104),
        "暴击威力" => Some(14105),
        "回避" => Some(14107),
        "加速" => Some(14111),
        _ => None,
    }
}

/// Parse a query like `粉3力量攻击力` or `红智力加速`.
pub fn parse_gear_query(query: &str) -> Result<GearQuery> {
    static QUERY_RE: OnceLock<Regex> = OnceLock::new();
    let re = QUERY_RE.get_or_init(|| {
        Regex::new(
            r"^(粉|红\+?)(\d*)(智力|敏捷|力量|共用)(加速|暴击率|防御力|体力|攻击力|回避|暴击威力)$",
        )
        .unwrap()
    });

    let caps = match re.captures(query.trim()) {
        Some(caps) => caps,
        None => bail!(
            "invalid gear query: {}. Expected e.g. 粉3力量攻击力 or 红智力加速.",
            query
        ),
    };

    let (category_sno, grade_name) = match &caps[1] {
        "粉" => (CATEGORY_IMMORTAL, "不朽"),
        _ => (CATEGORY_ETERNAL, "永恆＋"),
    };
    let grade_level: i64 = if caps[2].is_empty() {
        0
    } else {
        caps[2].parse()?
    };
    let grade_label = if grade_level > 0 {
        format!("{}+{}", grade_name, grade_level)
    } else {
        grade_name.to_string()
    };

    // Both alternatives are closed name lists, so these lookups always hit.
    let class_sno = match stat_class_sno(&caps[3]) {
        Some(sno) => sno,
        None => bail!("invalid stat class: {}", &caps[3]),
    };
    let effect = match effect_sno(&caps[4]) {
        Some(sno) => sno,
        None => bail!("invalid gear effect: {}", &caps[4]),
    };

    Ok(GearQuery {
        category_sno,
        grade_level,
        class_sno,
        effect_sno: effect,
        grade_label,
    })
}

/// `gear <query>` — matching equipment with stats and set effects.
pub fn query_gear(snapshot: &Snapshot, query: &str) -> Result<Reply> {
    let parsed = parse_gear_query(query)?;

    let matches: Vec<&ItemRow> = snapshot
        .items
        .iter()
        .filter(|i| {
            i.category_sno == parsed.category_sno
                && i.grade_level == parsed.grade_level
                && i.class_sno == parsed.class_sno
                && i.effect_no == parsed.effect_sno
        })
        .collect();

    if matches.is_empty() {
        bail!("no equipment found for: {}", query);
    }

    let mut reply = Reply::new();
    for item in matches {
        let title = format!("{} {}", parsed.grade_label, snapshot.strings.get(item.name_sno));
        let mut lines = Vec::new();

        let (base, extra) = item_stat_lines(snapshot, item.no);
        if !base.is_empty() {
            lines.push(format!("基础属性:\n{}", base.join("\n")));
        }
        if !extra.is_empty() {
            lines.push(format!("附加属性:\n{}", extra.join("\n")));
        }
        if let Some(sets) = set_effect_lines(snapshot, item.set_no) {
            lines.push(sets);
        }
        if lines.is_empty() {
            lines.push("（无属性数据）".to_string());
        }

        reply = reply.section(title, lines.join("\n"));
    }
    Ok(reply)
}

/// Stat lines split into base (first three slots) and extra rolls.
fn item_stat_lines(snapshot: &Snapshot, item_no: i64) -> (Vec<String>, Vec<String>) {
    let mut stats: Vec<_> = snapshot
        .item_stats
        .iter()
        .filter(|s| s.item_no == item_no)
        .collect();
    stats.sort_by_key(|s| s.slot);

    let mut base = Vec::new();
    let mut extra = Vec::new();
    for stat in stats {
        let name = stat_display_name(&stat.stat_type).unwrap_or(&stat.stat_type);
        let line = format!("{}: {}", name, format_stat_value(stat.stat_value));
        if stat.slot <= BASE_SLOTS {
            base.push(line);
        } else {
            extra.push(line);
        }
    }
    (base, extra)
}

/// 2-piece and 4-piece set effect lines.
fn set_effect_lines(snapshot: &Snapshot, set_no: i64) -> Option<String> {
    if set_no == 0 {
        return None;
    }

    let mut effects: Vec<_> = snapshot
        .item_set_effects
        .iter()
        .filter(|e| e.set_no == set_no)
        .collect();
    effects.sort_by_key(|e| e.count);

    if effects.is_empty() {
        return None;
    }

    let mut lines = Vec::new();
    for effect in effects {
        let stats: Vec<String> = effect
            .stats
            .iter()
            .filter_map(|(column, value)| {
                let name = stat_display_name(column)?;
                let value = value.as_f64()?;
                Some(format!("{} {}", name, format_stat_value(value)))
            })
            .collect();
        if !stats.is_empty() {
            lines.push(format!("{}件套: {}", effect.count, stats.join("、")));
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{ItemSetEffectRow, ItemStatRow, StringRow};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_pink_with_step() {
        let q = parse_gear_query("粉3力量攻击力").unwrap();
        assert_eq!(q.category_sno, CATEGORY_IMMORTAL);
        assert_eq!(q.grade_level, 3);
        assert_eq!(q.class_sno, 110042);
        assert_eq!(q.effect_sno, 14101);
        assert_eq!(q.grade_label, "不朽+3");
    }

    #[test]
    fn test_parse_red_without_step() {
        let q = parse_gear_query("红智力加速").unwrap();
        assert_eq!(q.category_sno, CATEGORY_ETERNAL);
        assert_eq!(q.grade_level, 0);
        assert_eq!(q.class_sno, 110044);
        assert_eq!(q.effect_sno, 14111);
        assert_eq!(q.grade_label, "永恆＋");
    }

    #[test]
    fn test_parse_red_plus() {
        let q = parse_gear_query("红+2共用暴击威力").unwrap();
        assert_eq!(q.category_sno, CATEGORY_ETERNAL);
        assert_eq!(q.grade_level, 2);
        assert_eq!(q.effect_sno, 14105);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_gear_query("蓝3力量攻击力").is_err());
        assert!(parse_gear_query("粉3攻击力").is_err());
        assert!(parse_gear_query("粉3力量").is_err());
        assert!(parse_gear_query("").is_err());
    }

    #[test]
    fn test_query_gear_splits_base_and_extra() {
        let mut snapshot = Snapshot::default();
        snapshot.strings.merge(&[StringRow {
            no: 70,
            zh_cn: Some("猎手之弓".to_string()),
            kr: None,
            en: None,
        }]);
        snapshot.items = vec![ItemRow {
            no: 500,
            name_sno: 70,
            category_sno: CATEGORY_IMMORTAL,
            class_sno: 110042,
            grade_level: 3,
            effect_no: 14101,
            set_no: 9,
        }];
        snapshot.item_stats = vec![
            ItemStatRow {
                item_no: 500,
                slot: 1,
                stat_type: "attack".to_string(),
                stat_value: 1200.0,
            },
            ItemStatRow {
                item_no: 500,
                slot: 4,
                stat_type: "critical_rate".to_string(),
                stat_value: 0.08,
            },
        ];
        let mut set_stats = BTreeMap::new();
        set_stats.insert("attack_speed".to_string(), json!(0.12));
        snapshot.item_set_effects = vec![ItemSetEffectRow {
            set_no: 9,
            count: 2,
            stats: set_stats,
        }];

        let reply = query_gear(&snapshot, "粉3力量攻击力").unwrap();
        assert_eq!(reply.sections.len(), 1);
        assert_eq!(reply.sections[0].title, "不朽+3 猎手之弓");
        let body = &reply.sections[0].body;
        assert!(body.contains("基础属性:\n攻击力: 1200"));
        assert!(body.contains("附加属性:\n暴击率: 8%"));
        assert!(body.contains("2件套: 攻击速度 12%"));
    }

    #[test]
    fn test_query_gear_no_match() {
        let snapshot = Snapshot::default();
        let err = query_gear(&snapshot, "粉3力量攻击力").unwrap_err().to_string();
        assert!(err.contains("no equipment found"));
    }
}
