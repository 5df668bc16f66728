//! Character queries: profile, roster, and body-stat rankings.

use anyhow::{bail, Result};

use crate::aliases::{AliasStore, NameMatch};
use crate::data::{race_name, stat_class_name, Snapshot, STAT_DISPLAY};
use crate::models::Reply;
use crate::skills;
use crate::strings::{format_stat_value, trim_decimal};
use crate::tables::HeroRow;

/// Resolve a user-typed name to a hero row, or fail with suggestions.
pub fn resolve_hero<'a>(
    snapshot: &'a Snapshot,
    aliases: &AliasStore,
    query: &str,
) -> Result<&'a HeroRow> {
    let hero_id = match aliases.find(query) {
        NameMatch::Hit(id) => id,
        NameMatch::Suggestions(names) => {
            bail!(
                "character not found: {} (did you mean: {}?)",
                query,
                names.join(" / ")
            )
        }
        NameMatch::Miss => bail!("character not found: {}", query),
    };

    match snapshot.hero_by_id(hero_id) {
        Some(hero) => Ok(hero),
        None => bail!("character not found in this snapshot: {}", query),
    }
}

/// `hero <name>` — full character profile.
pub fn query_hero(snapshot: &Snapshot, aliases: &AliasStore, name: &str) -> Result<Reply> {
    let hero = resolve_hero(snapshot, aliases, name)?;
    let display_name = snapshot.strings.get(hero.name_sno);

    let mut profile = Vec::new();
    profile.push(format!("名称: {}", display_name));
    if let Some(title) = snapshot.strings.try_get(hero.desc_sno) {
        profile.push(format!("称号: {}", title));
    }
    profile.push(format!("品质: {}", snapshot.strings.get(hero.grade_sno)));
    if let Some(race) = race_name(hero.race_sno) {
        profile.push(format!("种族: {}", race));
    }
    if let Some(class) = stat_class_name(hero.stat_type_sno) {
        profile.push(format!("属性: {}", class));
    }
    if let Some(desc) = snapshot.hero_descs.iter().find(|d| d.hero_id == hero.hero_id) {
        if !desc.birthday.is_empty() {
            profile.push(format!("生日: {}", desc.birthday));
        }
        if !desc.height.is_empty() {
            profile.push(format!("身高: {}", desc.height));
        }
        if !desc.weight.is_empty() {
            profile.push(format!("体重: {}", desc.weight));
        }
    }

    let mut reply = Reply::new()
        .section(display_name.clone(), profile.join("\n"))
        .section("属性", format_base_stats(hero));

    // Skills, in slot order
    let mut hero_skills: Vec<_> = snapshot
        .skills
        .iter()
        .filter(|s| s.hero_id == hero.hero_id)
        .collect();
    hero_skills.sort_by_key(|s| s.slot);

    for skill in hero_skills {
        let title = format!("技能 {}", snapshot.strings.get(skill.name_sno));
        reply = reply.section(title, skills::render_description(snapshot, skill));
    }

    if let Some(body) = signature_summary(snapshot, hero.hero_id) {
        reply = reply.section("魔灵武器", body);
    }

    Ok(reply)
}

/// Base stat block from the hero row's stat columns, in display order.
/// Alias columns (`attack` vs `attack_rate`) collapse to one line.
fn format_base_stats(hero: &HeroRow) -> String {
    let mut lines = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for &(column, display) in STAT_DISPLAY {
        if seen.contains(&display) {
            continue;
        }
        if let Some(value) = hero.extra.get(column).and_then(|v| v.as_f64()) {
            lines.push(format!("{}: {}", display, format_stat_value(value)));
            seen.push(display);
        }
    }

    if lines.is_empty() {
        "（无属性数据）".to_string()
    } else {
        lines.join("\n")
    }
}

/// Signature weapon block: name, description, and max-level stats.
/// Accuracy and dodge are flat amounts; every other column is a rate.
fn signature_summary(snapshot: &Snapshot, hero_id: i64) -> Option<String> {
    let signature = snapshot.signatures.iter().find(|s| s.hero_id == hero_id)?;

    let max_level = snapshot
        .signature_levels
        .iter()
        .filter(|l| l.group_no == signature.group_no)
        .max_by_key(|l| l.signature_level)?;

    let mut lines = vec![
        format!("名称: {}", snapshot.strings.get(signature.name_sno)),
        format!("满级: {}", max_level.signature_level),
    ];
    if let Some(desc) = snapshot.strings.try_get(signature.desc_sno) {
        lines.push(desc);
    }

    let mut seen: Vec<&str> = Vec::new();
    for &(column, display) in STAT_DISPLAY {
        if seen.contains(&display) {
            continue;
        }
        if let Some(value) = max_level.stats.get(column).and_then(|v| v.as_f64()) {
            let rendered = if column == "hit" || column == "dodge" {
                trim_decimal(value.round())
            } else {
                format!("{}%", trim_decimal((value * 1000.0).round() / 10.0))
            };
            lines.push(format!("{}: {}", display, rendered));
            seen.push(display);
        }
    }

    Some(lines.join("\n"))
}

/// `heroes` — the playable roster grouped by race, aliases in parentheses.
pub fn query_hero_list(snapshot: &Snapshot, aliases: &AliasStore) -> Result<Reply> {
    let mut reply = Reply::new();

    for race_sno in [4, 5, 6, 7, 8] {
        let race = race_name(race_sno).unwrap_or("未知");

        let mut names: Vec<String> = snapshot
            .heroes
            .iter()
            .filter(|h| !h.is_monster() && h.race_sno == race_sno)
            .map(|h| {
                let name = snapshot.strings.get(h.name_sno);
                match aliases.heroes.get(&h.hero_id) {
                    Some(entry) if !entry.aliases.is_empty() => {
                        format!("{}（{}）", name, entry.aliases.join("、"))
                    }
                    _ => name,
                }
            })
            .collect();
        names.sort();

        if !names.is_empty() {
            reply = reply.section(race, names.join("\n"));
        }
    }

    if reply.sections.is_empty() {
        bail!("no playable characters in this snapshot");
    }
    Ok(reply)
}

/// `ranking <height|weight>` — descending body-stat ranking. Characters
/// whose field does not parse go to a separate unknown list.
pub fn query_ranking(snapshot: &Snapshot, field: &str) -> Result<Reply> {
    let (title, unit) = match field {
        "height" => ("身高排行", "cm"),
        "weight" => ("体重排行", "kg"),
        other => bail!("Unknown ranking field: {}. Use height or weight.", other),
    };

    let mut ranked: Vec<(String, f64)> = Vec::new();
    let mut unknown: Vec<String> = Vec::new();

    for hero in snapshot.heroes.iter().filter(|h| !h.is_monster()) {
        let name = snapshot.strings.get(hero.name_sno);
        let raw = snapshot
            .hero_descs
            .iter()
            .find(|d| d.hero_id == hero.hero_id)
            .map(|d| match field {
                "height" => d.height.as_str(),
                _ => d.weight.as_str(),
            })
            .unwrap_or("");

        match parse_measure(raw) {
            Some(value) => ranked.push((name, value)),
            None => unknown.push(name),
        }
    }

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    unknown.sort();

    let body = ranked
        .iter()
        .enumerate()
        .map(|(i, (name, value))| format!("{}. {} {}{}", i + 1, name, trim_decimal(*value), unit))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reply = Reply::new().section(title, body);
    if !unknown.is_empty() {
        reply = reply.section("数据未知", unknown.join("、"));
    }
    Ok(reply)
}

/// Leading number of a measure string like `"165cm"` or `"48.5kg"`.
fn parse_measure(raw: &str) -> Option<f64> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
