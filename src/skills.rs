//! Skill description rendering.
//!
//! Skill text contains `<N.VALUE>` and `<N.DURATION>` placeholders that
//! refer to the skill's Nth code slot. Slot values with magnitude 10000 or
//! more are not literal numbers but skill-buff references and resolve
//! through the buff's own value. Small resolved values are fractions and
//! display as percentages; larger ones are flat amounts.

use regex::Regex;
use std::sync::OnceLock;

use crate::data::Snapshot;
use crate::strings::trim_decimal;
use crate::tables::{SkillCodeRow, SkillRow};

/// Flat-amount threshold: below this magnitude a value is a fraction.
const PERCENT_LIMIT: f64 = 20.0;
/// At or above this magnitude a slot value is a skill-buff reference.
const BUFF_REF_LIMIT: f64 = 10_000.0;

/// All code slots belonging to a skill, in slot order.
pub fn codes_for(snapshot: &Snapshot, skill_no: i64) -> Vec<&SkillCodeRow> {
    let mut codes: Vec<&SkillCodeRow> = snapshot
        .skill_codes
        .iter()
        .filter(|c| c.skill_no == skill_no)
        .collect();
    codes.sort_by_key(|c| c.code_slot);
    codes
}

/// Resolve a skill's description with all placeholders substituted.
pub fn render_description(snapshot: &Snapshot, skill: &SkillRow) -> String {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"(?i)<(\d+)\.(VALUE|DURATION)>").unwrap());

    let desc = snapshot.strings.get(skill.desc_sno);
    let codes = codes_for(snapshot, skill.no);

    re.replace_all(&desc, |caps: &regex::Captures| {
        let slot: i64 = match caps[1].parse() {
            Ok(n) => n,
            Err(_) => return "???".to_string(),
        };
        let code = codes.iter().find(|c| c.code_slot == slot);

        match (code, caps[2].to_ascii_uppercase().as_str()) {
            (Some(code), "VALUE") => format_code_value(snapshot, code.value),
            (Some(code), "DURATION") => trim_decimal(code.duration),
            _ => "???".to_string(),
        }
    })
    .into_owned()
}

/// Render one slot value, following buff references first.
fn format_code_value(snapshot: &Snapshot, value: f64) -> String {
    let value = if value.abs() >= BUFF_REF_LIMIT && value.fract() == 0.0 {
        match snapshot.skill_buff(value as i64) {
            Some(buff) => buff.value,
            None => return "???".to_string(),
        }
    } else {
        value
    };

    if value.abs() < PERCENT_LIMIT {
        format!("{}%", trim_decimal((value * 1000.0).round() / 10.0))
    } else {
        format!("{}", value.round() as i64)
    }
}
