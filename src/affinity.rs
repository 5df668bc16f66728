//! Affinity guide: preferred gifts, date traits, keywords, and the
//! love-story choice planner.
//!
//! Love stories live in the story table with the hero id as the act and a
//! `Story/Love` bundle path. Episodes 8, 9, and 10 carry the affinity
//! thresholds for the bad, normal, and good endings. Dialogue choices come
//! in groups; within a group the highest-favor option is the good pick.

use anyhow::{bail, Result};

use crate::aliases::AliasStore;
use crate::data::Snapshot;
use crate::heroes::resolve_hero;
use crate::models::Reply;

const GRADE_RARE: i64 = 110012;
const GRADE_EPIC: i64 = 110014;

const BAD_EPISODE: i64 = 8;
const NORMAL_EPISODE: i64 = 9;
const GOOD_EPISODE: i64 = 10;

/// Keyword favor points per grade (normal, rare, epic), from the
/// key-values table with the long-standing defaults.
fn grade_points(snapshot: &Snapshot, key: &str) -> [i64; 3] {
    let defaults = [20, 40, 60];
    match snapshot.key_values.iter().find(|kv| kv.key_name == key) {
        Some(kv) => {
            let parsed: Vec<i64> = kv
                .value
                .as_array()
                .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
                .unwrap_or_default();
            if parsed.len() == 3 {
                [parsed[0], parsed[1], parsed[2]]
            } else {
                defaults
            }
        }
        None => defaults,
    }
}

fn grade_index(grade_sno: i64) -> usize {
    match grade_sno {
        GRADE_RARE => 1,
        GRADE_EPIC => 2,
        _ => 0,
    }
}

/// `affinity <name>` — the full affinity guide for a character.
pub fn query_affinity(snapshot: &Snapshot, aliases: &AliasStore, name: &str) -> Result<Reply> {
    let hero = resolve_hero(snapshot, aliases, name)?;
    let display_name = snapshot.strings.get(hero.name_sno);

    let mut reply = Reply::new();

    // Preferred gifts, highest favor first
    let mut gifts: Vec<_> = snapshot
        .hero_gifts
        .iter()
        .filter(|g| g.hero_id == hero.hero_id)
        .collect();
    gifts.sort_by(|a, b| b.favor_point.cmp(&a.favor_point).then(a.item_no.cmp(&b.item_no)));
    if !gifts.is_empty() {
        let body = gifts
            .iter()
            .map(|g| format!("{} +{}好感", snapshot.item_name(g.item_no), g.favor_point))
            .collect::<Vec<_>>()
            .join("\n");
        reply = reply.section(format!("{} 喜好礼物", display_name), body);
    }

    // Date traits
    if let Some(traits) = snapshot
        .trip_heroes
        .iter()
        .find(|t| t.hero_id == hero.hero_id)
    {
        let body = [
            ("口才", traits.conversation),
            ("教养", traits.culture),
            ("胆量", traits.courage),
            ("知识", traits.knowledge),
            ("毅力", traits.guts),
            ("才艺", traits.handicraft),
        ]
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n");
        reply = reply.section("特性", body);
    }

    if let Some(body) = keyword_summary(snapshot, hero.hero_id) {
        reply = reply.section("关键词", body);
    }

    for section in story_guide(snapshot, hero.hero_id) {
        reply = reply.section(section.0, section.1);
    }

    if reply.sections.is_empty() {
        bail!("no affinity data for: {}", name);
    }
    Ok(reply)
}

/// Keywords grouped by reaction. A keyword with no favor point is
/// disliked; a favor point of 2 is loved; anything else is neutral.
fn keyword_summary(snapshot: &Snapshot, hero_id: i64) -> Option<String> {
    let good_points = grade_points(snapshot, "TRIP_KEYWORD_GRADE_POINT_GOOD");
    let normal_points = grade_points(snapshot, "TRIP_KEYWORD_GRADE_POINT");
    let bad_points = grade_points(snapshot, "TRIP_KEYWORD_GRADE_POINT_BAD");

    let mut good = Vec::new();
    let mut normal = Vec::new();
    let mut bad = Vec::new();

    for keyword in snapshot
        .trip_keywords
        .iter()
        .filter(|k| k.hero_id == hero_id)
    {
        let name = snapshot.strings.get(keyword.keyword_sno);
        let idx = grade_index(keyword.grade_sno);
        match keyword.favor_point {
            Some(2) => good.push(format!("{} +{}", name, good_points[idx])),
            Some(_) => normal.push(format!("{} +{}", name, normal_points[idx])),
            None => bad.push(format!("{} +{}", name, bad_points[idx])),
        }
    }

    if good.is_empty() && normal.is_empty() && bad.is_empty() {
        return None;
    }

    for list in [&mut good, &mut normal, &mut bad] {
        list.sort();
    }

    let mut lines = Vec::new();
    if !good.is_empty() {
        lines.push(format!("喜爱: {}", good.join("、")));
    }
    if !normal.is_empty() {
        lines.push(format!("普通: {}", normal.join("、")));
    }
    if !bad.is_empty() {
        lines.push(format!("反感: {}", bad.join("、")));
    }
    Some(lines.join("\n"))
}

/// A dialogue choice group, reduced to its good and bad options.
#[derive(Debug, Clone)]
struct ChoicePair {
    episode: i64,
    group: i64,
    good_sno: i64,
    good_point: i64,
    bad_sno: i64,
    bad_point: i64,
}

/// Story guide sections: thresholds plus the good- and normal-ending
/// choice plans.
fn story_guide(snapshot: &Snapshot, hero_id: i64) -> Vec<(String, String)> {
    let mut stories: Vec<_> = snapshot
        .story_infos
        .iter()
        .filter(|s| s.act == hero_id && s.bundle_path.contains("Story/Love"))
        .collect();
    stories.sort_by_key(|s| s.episode);

    if stories.is_empty() {
        return Vec::new();
    }

    let threshold = |episode: i64| {
        stories
            .iter()
            .find(|s| s.episode == episode)
            .map(|s| s.ending_affinity)
    };
    let (bad_thr, normal_thr, good_thr) = match (
        threshold(BAD_EPISODE),
        threshold(NORMAL_EPISODE),
        threshold(GOOD_EPISODE),
    ) {
        (Some(b), Some(n), Some(g)) => (b, n, g),
        _ => return Vec::new(),
    };

    // Collect choice pairs across all episodes
    let mut pairs: Vec<ChoicePair> = Vec::new();
    for story in &stories {
        let mut groups: Vec<i64> = snapshot
            .talks
            .iter()
            .filter(|t| t.story_no == story.no)
            .map(|t| t.choice_group)
            .collect();
        groups.sort_unstable();
        groups.dedup();

        for group in groups {
            let options: Vec<_> = snapshot
                .talks
                .iter()
                .filter(|t| t.story_no == story.no && t.choice_group == group)
                .collect();
            let good = options.iter().max_by_key(|t| t.favor_point);
            let bad = options.iter().min_by_key(|t| t.favor_point);
            if let (Some(good), Some(bad)) = (good, bad) {
                pairs.push(ChoicePair {
                    episode: story.episode,
                    group,
                    good_sno: good.text_sno,
                    good_point: good.favor_point,
                    bad_sno: bad.text_sno,
                    bad_point: bad.favor_point,
                });
            }
        }
    }

    let mut sections = Vec::new();
    sections.push((
        "结局攻略".to_string(),
        format!(
            "坏结局 < {}\n普通结局 {} ~ {}\n好结局 >= {}",
            bad_thr,
            bad_thr,
            normal_thr - 1,
            good_thr
        ),
    ));

    if pairs.is_empty() {
        return sections;
    }

    let good_plan = pairs
        .iter()
        .map(|p| {
            format!(
                "EP{} 选项{}: {} (+{})",
                p.episode,
                p.group,
                snapshot.strings.get(p.good_sno),
                p.good_point
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(("好结局选项".to_string(), good_plan));

    let picks = plan_normal_ending(
        &pairs
            .iter()
            .map(|p| (p.good_point, p.bad_point))
            .collect::<Vec<_>>(),
        bad_thr,
        normal_thr,
    );
    let normal_plan = pairs
        .iter()
        .zip(&picks)
        .map(|(p, &pick_good)| {
            let (sno, point) = if pick_good {
                (p.good_sno, p.good_point)
            } else {
                (p.bad_sno, p.bad_point)
            };
            format!(
                "EP{} 选项{}: {} (+{})",
                p.episode,
                p.group,
                snapshot.strings.get(sno),
                point
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(("普通结局选项".to_string(), normal_plan));

    sections
}

/// Choose which groups keep their good option so the total lands in the
/// normal-ending band `[bad, normal)`, aiming for the middle of the band.
///
/// Starts from all-good and downgrades the choices with the largest
/// good/bad difference first; a downgrade that would fall below the bad
/// threshold is skipped.
fn plan_normal_ending(pairs: &[(i64, i64)], bad_thr: i64, normal_thr: i64) -> Vec<bool> {
    let mut picks = vec![true; pairs.len()];
    let mut total: i64 = pairs.iter().map(|&(good, _)| good).sum();
    let target = (bad_thr + normal_thr) / 2;

    let mut order: Vec<usize> = (0..pairs.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(pairs[i].0 - pairs[i].1));

    for i in order {
        let diff = pairs[i].0 - pairs[i].1;
        if diff <= 0 {
            continue;
        }
        let after = total - diff;
        if after < bad_thr {
            continue;
        }
        // Downgrade while above the band, then keep closing in on the middle
        if total >= normal_thr || (after - target).abs() < (total - target).abs() {
            picks[i] = false;
            total = after;
        }
    }

    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{KeyValuesRow, TripKeywordRow};
    use serde_json::json;

    #[test]
    fn test_grade_points_defaults() {
        let snapshot = Snapshot::default();
        assert_eq!(grade_points(&snapshot, "TRIP_KEYWORD_GRADE_POINT"), [20, 40, 60]);
    }

    #[test]
    fn test_grade_points_from_key_values() {
        let mut snapshot = Snapshot::default();
        snapshot.key_values = vec![KeyValuesRow {
            key_name: "TRIP_KEYWORD_GRADE_POINT".to_string(),
            value: json!([10, 30, 50]),
        }];
        assert_eq!(grade_points(&snapshot, "TRIP_KEYWORD_GRADE_POINT"), [10, 30, 50]);
        // Wrong arity falls back
        snapshot.key_values[0].value = json!([10]);
        assert_eq!(grade_points(&snapshot, "TRIP_KEYWORD_GRADE_POINT"), [20, 40, 60]);
    }

    #[test]
    fn test_keyword_grouping() {
        let mut snapshot = Snapshot::default();
        snapshot.trip_keywords = vec![
            TripKeywordRow {
                hero_id: 1,
                keyword_sno: 0,
                grade_sno: GRADE_EPIC,
                favor_point: Some(2),
            },
            TripKeywordRow {
                hero_id: 1,
                keyword_sno: 0,
                grade_sno: 0,
                favor_point: Some(1),
            },
            TripKeywordRow {
                hero_id: 1,
                keyword_sno: 0,
                grade_sno: GRADE_RARE,
                favor_point: None,
            },
        ];

        let summary = keyword_summary(&snapshot, 1).unwrap();
        assert!(summary.contains("喜爱: ?0? +60"));
        assert!(summary.contains("普通: ?0? +20"));
        assert!(summary.contains("反感: ?0? +40"));
    }

    #[test]
    fn test_plan_normal_all_good_already_in_band() {
        // Total 50 with band [40, 60): good total already normal
        let picks = plan_normal_ending(&[(30, 10), (20, 15)], 40, 60);
        let total: i64 = picks
            .iter()
            .zip(&[(30i64, 10i64), (20, 15)])
            .map(|(&g, &(good, bad))| if g { good } else { bad })
            .sum();
        assert!((40..60).contains(&total));
    }

    #[test]
    fn test_plan_normal_downgrades_largest_diff_first() {
        // All-good total 100, band [40, 70). Largest diff (40) goes first.
        let pairs = [(50, 10), (30, 20), (20, 10)];
        let picks = plan_normal_ending(&pairs, 40, 70);
        assert!(!picks[0], "largest-diff choice should be downgraded");
        let total: i64 = picks
            .iter()
            .zip(&pairs)
            .map(|(&g, &(good, bad))| if g { good } else { bad })
            .sum();
        assert!((40..70).contains(&total), "total {} out of band", total);
    }

    #[test]
    fn test_plan_normal_never_falls_below_bad() {
        // Any single downgrade would land below the bad threshold
        let pairs = [(50, 0), (50, 0)];
        let picks = plan_normal_ending(&pairs, 90, 95);
        let total: i64 = picks
            .iter()
            .zip(&pairs)
            .map(|(&g, &(good, bad))| if g { good } else { bad })
            .sum();
        assert!(total >= 90);
    }
}
