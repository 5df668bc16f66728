//! Potential buff table.
//!
//! Potential options are slot/level rows whose `effect_no` indirects into
//! one of two buff tables: effect numbers starting with `4` are contents
//! buffs (stat bundles), everything else is a plain skill buff.

use anyhow::{bail, Result};

use crate::data::{stat_display_name, Snapshot};
use crate::models::Reply;
use crate::render;
use crate::strings::{format_stat_value, trim_decimal};

/// Bookkeeping columns of a contents buff, never displayed.
const BUFF_SKIP_COLUMNS: &[&str] = &["no", "battle_power_per", "hero_level_base"];

/// One resolved potential row for display.
#[derive(Debug, Clone)]
pub struct PotentialRow {
    pub slot: i64,
    pub level: i64,
    pub value: String,
}

/// Resolve one effect number to its display text.
///
/// Contents-buff values below 1 are fractions and render as percentages,
/// except on the flat attack and defence columns.
pub fn resolve_effect(snapshot: &Snapshot, effect_no: i64) -> String {
    if effect_no.to_string().starts_with('4') {
        let Some(buff) = snapshot.contents_buff(effect_no) else {
            return "???".to_string();
        };

        let parts: Vec<String> = buff
            .stats
            .iter()
            .filter_map(|(column, value)| {
                if BUFF_SKIP_COLUMNS.contains(&column.as_str()) {
                    return None;
                }
                let value = value.as_f64()?;
                if value == 0.0 {
                    return None;
                }
                let name = stat_display_name(column).unwrap_or(column);
                let flat = column == "attack" || column == "defence";
                let rendered = if value.abs() < 1.0 && !flat {
                    format!("{}%", trim_decimal((value * 1000.0).round() / 10.0))
                } else {
                    trim_decimal(value)
                };
                Some(format!("{} {}", name, rendered))
            })
            .collect();

        if parts.is_empty() {
            "???".to_string()
        } else {
            parts.join("、")
        }
    } else {
        match snapshot.skill_buff(effect_no) {
            Some(buff) => format_stat_value(buff.value),
            None => "???".to_string(),
        }
    }
}

/// All potential rows, resolved and ordered by slot then level.
pub fn collect_rows(snapshot: &Snapshot) -> Vec<PotentialRow> {
    let mut rows: Vec<PotentialRow> = snapshot
        .hero_options
        .iter()
        .map(|opt| PotentialRow {
            slot: opt.slot,
            level: opt.level,
            value: resolve_effect(snapshot, opt.effect_no),
        })
        .collect();
    rows.sort_by_key(|r| (r.slot, r.level));
    rows
}

/// `potential` — the full potential table as an HTML page plus a short
/// text summary.
pub fn query_potential(snapshot: &Snapshot) -> Result<Reply> {
    let rows = collect_rows(snapshot);
    if rows.is_empty() {
        bail!("no potential data in this snapshot");
    }

    let slots = rows.iter().map(|r| r.slot).max().unwrap_or(0);
    let max_level = rows.iter().map(|r| r.level).max().unwrap_or(0);
    let summary = format!("潜能槽位: {}\n最高等级: {}", slots, max_level);

    Ok(Reply::new()
        .section("潜能", summary)
        .with_html(render::potential_page(&rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{ContentsBuffRow, HeroOptionRow, SkillBuffRow};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_skill_buff_effect() {
        let mut snapshot = Snapshot::default();
        snapshot.skill_buffs = vec![SkillBuffRow {
            no: 14104,
            value: 0.15,
            extra: BTreeMap::new(),
        }];
        assert_eq!(resolve_effect(&snapshot, 14104), "15%");
    }

    #[test]
    fn test_contents_buff_effect() {
        let mut snapshot = Snapshot::default();
        let mut stats = BTreeMap::new();
        stats.insert("attack".to_string(), json!(120.0));
        stats.insert("critical_rate".to_string(), json!(0.035));
        stats.insert("battle_power_per".to_string(), json!(0.5));
        snapshot.contents_buffs = vec![ContentsBuffRow { no: 40010, stats }];

        let text = resolve_effect(&snapshot, 40010);
        assert!(text.contains("攻击力 120"));
        assert!(text.contains("暴击率 3.5%"));
        assert!(!text.contains("0.5"));
    }

    #[test]
    fn test_missing_effect_is_question_marks() {
        let snapshot = Snapshot::default();
        assert_eq!(resolve_effect(&snapshot, 40010), "???");
        assert_eq!(resolve_effect(&snapshot, 14104), "???");
    }

    #[test]
    fn test_rows_sorted_by_slot_then_level() {
        let mut snapshot = Snapshot::default();
        snapshot.skill_buffs = vec![SkillBuffRow {
            no: 14101,
            value: 10.0,
            extra: BTreeMap::new(),
        }];
        snapshot.hero_options = vec![
            HeroOptionRow {
                slot: 2,
                level: 1,
                effect_no: 14101,
            },
            HeroOptionRow {
                slot: 1,
                level: 2,
                effect_no: 14101,
            },
            HeroOptionRow {
                slot: 1,
                level: 1,
                effect_no: 14101,
            },
        ];

        let rows = collect_rows(&snapshot);
        assert_eq!(
            rows.iter().map(|r| (r.slot, r.level)).collect::<Vec<_>>(),
            vec![(1, 1), (1, 2), (2, 1)]
        );
    }

    #[test]
    fn test_query_potential_empty_fails() {
        let snapshot = Snapshot::default();
        assert!(query_potential(&snapshot).is_err());
    }
}
