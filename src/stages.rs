//! Stage, gate, and cash-pack queries.

use anyhow::{bail, Result};
use regex::Regex;
use std::sync::OnceLock;

use crate::data::{formation_name, race_name, race_sno, Snapshot};
use crate::models::Reply;
use crate::strings::{format_number, trim_decimal};
use crate::tables::StageBattleRow;

/// `stage <N-M>` — main-story stage details.
pub fn query_stage(snapshot: &Snapshot, code: &str) -> Result<Reply> {
    let code = code.trim();
    let stage = snapshot
        .stages
        .iter()
        .find(|s| s.exp.is_some() && s.stage_no == code);

    let stage = match stage {
        Some(s) => s,
        None => bail!("stage not found: {}", code),
    };

    let title = format!("主线 {} {}", stage.stage_no, snapshot.strings.get(stage.name_sno));
    let battle = snapshot
        .stage_battles
        .iter()
        .find(|b| b.no == stage.stage_battle_no);

    let mut reply = Reply::new();
    match battle {
        Some(battle) => {
            reply = reply
                .section(title, battle_overview(snapshot, battle))
                .section("敌方阵容", enemy_lineup(snapshot, battle));
        }
        None => {
            reply = reply.section(title, "（无战斗数据）".to_string());
        }
    }

    if let Some(drops) = format_drops(snapshot, stage.drop_group_no) {
        reply = reply.section("掉落", drops);
    }

    Ok(reply)
}

/// `gate <race>` — the daily gate of one race, every level.
pub fn query_gate(snapshot: &Snapshot, race: &str) -> Result<Reply> {
    let sno = match race_sno(race.trim()) {
        Some(sno) => sno,
        None => bail!(
            "unknown gate: {}. Use 自由, 人类, 野兽, 妖精, or 不死.",
            race
        ),
    };

    let mut barriers: Vec<_> = snapshot
        .barriers
        .iter()
        .filter(|b| b.race_sno == sno)
        .collect();
    barriers.sort_by_key(|b| b.level);

    if barriers.is_empty() {
        bail!("gate not found: {}", race);
    }

    let gate_name = race_name(sno).unwrap_or(race);
    let mut reply = Reply::new();

    for barrier in barriers {
        let title = format!("{}之门 Lv.{}", gate_name, barrier.level);
        let battle = snapshot
            .stage_battles
            .iter()
            .find(|b| b.no == barrier.stage_battle_no);

        let mut body = match battle {
            Some(battle) => format!(
                "{}\n{}",
                battle_overview(snapshot, battle),
                enemy_lineup(snapshot, battle)
            ),
            None => "（无战斗数据）".to_string(),
        };

        if let Some(drops) = format_drops(snapshot, barrier.drop_group_no) {
            body.push_str("\n掉落:\n");
            body.push_str(&drops);
        }

        reply = reply.section(title, body);
    }

    Ok(reply)
}

fn battle_overview(snapshot: &Snapshot, battle: &StageBattleRow) -> String {
    let formation_type = snapshot
        .formations
        .iter()
        .find(|f| f.no == battle.formation_no)
        .map(|f| f.formation_type)
        .unwrap_or(0);

    format!(
        "战斗力: {}\n敌方等级: {}\n阵型: {}",
        format_number(battle.battle_power as f64),
        battle.level,
        formation_name(formation_type)
    )
}

fn enemy_lineup(snapshot: &Snapshot, battle: &StageBattleRow) -> String {
    let names: Vec<String> = battle
        .hero_nos()
        .iter()
        .map(|&no| snapshot.hero_name(no))
        .collect();
    if names.is_empty() {
        "（空）".to_string()
    } else {
        names.join("、")
    }
}

/// Drop list for a drop group. Duplicate items keep their highest rate;
/// the stored rate is per-mille-of-percent, so display is `rate * 0.001` %.
/// Sorted by rate descending, then name.
pub fn format_drops(snapshot: &Snapshot, group_no: i64) -> Option<String> {
    if group_no == 0 {
        return None;
    }

    let mut best: Vec<(String, f64)> = Vec::new();
    for drop in snapshot
        .item_drop_groups
        .iter()
        .filter(|d| d.group_no == group_no)
    {
        let name = snapshot.item_name(drop.item_no);
        let rate = drop.drop_rate * 0.001;
        match best.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => {
                if rate > entry.1 {
                    entry.1 = rate;
                }
            }
            None => best.push((name, rate)),
        }
    }

    if best.is_empty() {
        return None;
    }

    best.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    Some(
        best.iter()
            .map(|(name, rate)| format!("{} {}%", name, trim_decimal(*rate)))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

// ============ Cash packs ============

/// `packs <target>` — cash packs unlocked by game progress.
///
/// Targets: `主线N` (chapter N stage clears), `传送门` (gates), `起源塔`
/// (origin tower floors), `升阶` (eternal-grade promotion).
pub fn query_packs(snapshot: &Snapshot, target: &str) -> Result<Reply> {
    let target = target.trim();

    let matches: Vec<_> = if let Some(chapter) = target.strip_prefix("主线") {
        let chapter = chapter.trim();
        if chapter.is_empty() || !chapter.chars().all(|c| c.is_ascii_digit()) {
            bail!("invalid pack target: {}. Use 主线N with a chapter number.", target);
        }
        let prefix = format!("{}-", chapter);
        let stage_nos: Vec<i64> = snapshot
            .stages
            .iter()
            .filter(|s| s.exp.is_some() && s.stage_no.starts_with(&prefix))
            .map(|s| s.no)
            .collect();
        packs_for(snapshot, "stage", &stage_nos)
    } else if target == "传送门" {
        let nos: Vec<i64> = snapshot.barriers.iter().map(|b| b.no).collect();
        packs_for(snapshot, "barrier", &nos)
    } else if target == "起源塔" {
        let nos: Vec<i64> = snapshot.towers.iter().map(|t| t.no).collect();
        packs_for(snapshot, "tower", &nos)
    } else if target == "升阶" {
        snapshot
            .cash_shop_items
            .iter()
            .filter(|p| p.pack_type == "grade_eternal")
            .collect()
    } else {
        bail!(
            "unknown pack target: {}. Use 主线N, 传送门, 起源塔, or 升阶.",
            target
        );
    };

    if matches.is_empty() {
        bail!("no cash packs found for: {}", target);
    }

    let mut reply = Reply::new();
    for pack in matches {
        let mut lines = Vec::new();
        if pack.price > 0.0 {
            lines.push(format!("价格: {}", trim_decimal(pack.price)));
        }
        for (item_no, amount) in parse_item_infos(&pack.item_infos) {
            lines.push(format!("{} x{}", snapshot.item_name(item_no), amount));
        }
        if lines.is_empty() {
            lines.push("（无内容数据）".to_string());
        }
        reply = reply.section(snapshot.strings.get(pack.name_sno), lines.join("\n"));
    }
    Ok(reply)
}

fn packs_for<'a>(
    snapshot: &'a Snapshot,
    pack_type: &str,
    content_nos: &[i64],
) -> Vec<&'a crate::tables::CashShopItemRow> {
    snapshot
        .cash_shop_items
        .iter()
        .filter(|p| {
            p.pack_type == pack_type
                && p.type_value
                    .parse::<i64>()
                    .map(|no| content_nos.contains(&no))
                    .unwrap_or(false)
        })
        .collect()
}

/// Parse the exporter's literal pack contents, e.g.
/// `"[(110011, 100), (110021, 5)]"` → `[(110011, 100), (110021, 5)]`.
pub fn parse_item_infos(raw: &str) -> Vec<(i64, i64)> {
    static PAIR_RE: OnceLock<Regex> = OnceLock::new();
    let re = PAIR_RE.get_or_init(|| Regex::new(r"\(\s*(\d+)\s*,\s*(\d+)\s*\)").unwrap());

    re.captures_iter(raw)
        .filter_map(|caps| {
            let no = caps[1].parse().ok()?;
            let amount = caps[2].parse().ok()?;
            Some((no, amount))
        })
        .collect()
}
