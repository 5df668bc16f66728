//! Progression cost queries: character level-up and ark enhancement.

use anyhow::{bail, Result};

use crate::data::{stat_display_name, Snapshot};
use crate::models::Reply;
use crate::strings::{format_number, trim_decimal};

/// Ark main enhancement line.
const ARK_MAIN_SNO: i64 = 110051;
/// Ark class enhancement lines.
const ARK_CLASS_SNOS: std::ops::RangeInclusive<i64> = 110101..=110106;

/// Contents-buff columns that are bookkeeping, not stats.
const BUFF_SKIP_COLUMNS: &[&str] = &["no", "battle_power_per", "hero_level_base"];

/// `levels <from> <to>` — total and next-step level-up costs.
///
/// A level row holds the cost of reaching that level and the cumulative
/// cost up to it, so the range total is a difference of the two cumulative
/// columns and the marginal cost comes from the `from + 1` row. Requests
/// beyond the table clamp to the max level.
pub fn query_levels(snapshot: &Snapshot, from: i64, to: i64) -> Result<Reply> {
    let max_level = match snapshot.levels.iter().map(|l| l.level).max() {
        Some(max) => max,
        None => bail!("no level data in this snapshot"),
    };

    if from < 1 || to < 1 {
        bail!("invalid level range: {} to {}", from, to);
    }
    let from = from.min(max_level);
    let to = to.min(max_level);
    if from >= to {
        bail!("invalid level range: {} to {} (max level {})", from, to, max_level);
    }

    let row = |level: i64| snapshot.levels.iter().find(|l| l.level == level);
    let (start, end) = match (row(from), row(to)) {
        (Some(s), Some(e)) => (s, e),
        _ => bail!("level data incomplete between {} and {}", from, to),
    };

    let body = format!(
        "金币: {}\n魔力粉尘: {}\n魔力水晶: {}",
        format_number((end.sum_gold - start.sum_gold) as f64),
        format_number((end.sum_mana_dust - start.sum_mana_dust) as f64),
        format_number((end.sum_mana_crystal - start.sum_mana_crystal) as f64),
    );

    let mut reply = Reply::new().section(format!("等级花费 {} → {}", from, to), body);

    if let Some(next) = row(from + 1) {
        let body = format!(
            "金币: {}\n魔力粉尘: {}\n魔力水晶: {}",
            format_number(next.gold as f64),
            format_number(next.mana_dust as f64),
            format_number(next.mana_crystal as f64),
        );
        reply = reply.section(format!("升至 {} 级", from + 1), body);
    }

    Ok(reply)
}

/// `ark` — ark enhancement summary: per-line max level, total costs, and
/// max-level buffs, plus the overclock crystal total.
pub fn query_ark(snapshot: &Snapshot) -> Result<Reply> {
    let mut type_snos: Vec<i64> = snapshot
        .ark_enhances
        .iter()
        .map(|a| a.type_sno)
        .filter(|&sno| sno == ARK_MAIN_SNO || ARK_CLASS_SNOS.contains(&sno))
        .collect();
    type_snos.sort_unstable();
    type_snos.dedup();
    // Main line first
    type_snos.sort_by_key(|&sno| (sno != ARK_MAIN_SNO, sno));

    if type_snos.is_empty() {
        bail!("no ark enhancement data in this snapshot");
    }

    let mut reply = Reply::new();
    for type_sno in type_snos {
        let mut rows: Vec<_> = snapshot
            .ark_enhances
            .iter()
            .filter(|a| a.type_sno == type_sno)
            .collect();
        rows.sort_by_key(|a| a.level);

        let max_row = match rows.last() {
            Some(row) => *row,
            None => continue,
        };

        let mut lines = vec![format!("满级: {}", max_row.level)];

        // Total cost per pay item
        let mut costs: Vec<(i64, i64)> = Vec::new();
        for row in &rows {
            if row.pay_item_no == 0 {
                continue;
            }
            match costs.iter_mut().find(|(no, _)| *no == row.pay_item_no) {
                Some(entry) => entry.1 += row.pay_amount,
                None => costs.push((row.pay_item_no, row.pay_amount)),
            }
        }
        for (item_no, amount) in costs {
            lines.push(format!(
                "总消耗: {} x{}",
                snapshot.item_name(item_no),
                format_number(amount as f64)
            ));
        }

        if let Some(buff) = snapshot.contents_buff(max_row.contents_buff_no) {
            for (column, value) in &buff.stats {
                if BUFF_SKIP_COLUMNS.contains(&column.as_str()) {
                    continue;
                }
                let Some(value) = value.as_f64() else { continue };
                if value == 0.0 {
                    continue;
                }
                let name = stat_display_name(column).unwrap_or(column);
                let rendered = if column.ends_with("_rate") {
                    format!("{:.2}%", value * 100.0)
                } else {
                    trim_decimal(value)
                };
                lines.push(format!("满级加成: {} {}", name, rendered));
            }
        }

        if let Some(sp) = max_row.sp_buff_value02 {
            if sp != 0.0 {
                lines.push(format!("特殊加成: {}", trim_decimal(sp)));
            }
        }

        reply = reply.section(snapshot.strings.get(type_sno), lines.join("\n"));
    }

    if let Some(body) = overclock_summary(snapshot) {
        reply = reply.section("超频", body);
    }

    Ok(reply)
}

/// Total overclock crystal cost up to the configured max level.
fn overclock_summary(snapshot: &Snapshot) -> Option<String> {
    if snapshot.ark_overclocks.is_empty() {
        return None;
    }

    let table_max = snapshot
        .ark_overclocks
        .iter()
        .map(|o| o.level)
        .max()
        .unwrap_or(0);
    let max_level = snapshot.key_value_i64("OVERCLOCK_MAX_LEVEL", table_max);

    let total: i64 = snapshot
        .ark_overclocks
        .iter()
        .filter(|o| o.level <= max_level)
        .map(|o| o.mana_crystal)
        .sum();

    Some(format!(
        "满级: {}\n魔力水晶总消耗: {}",
        max_level,
        format_number(total as f64)
    ))
}
