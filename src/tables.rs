//! Row types for the game's denormalized JSON tables.
//!
//! Every table file has the shape `{ "json": [ {row}, ... ] }`. Rows carry
//! far more columns than the queries need; unknown fields are ignored and
//! absent fields fall back to defaults so a snapshot from a different game
//! build still loads.
//!
//! Stat-bearing rows (heroes, signature levels, contents buffs, set effects)
//! keep their stat columns in a flattened map because the column set varies
//! by row and the display layer walks it through a name mapping.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Wrapper matching the on-disk table shape.
#[derive(Debug, Deserialize)]
pub struct TableFile<T> {
    #[serde(default = "Vec::new")]
    pub json: Vec<T>,
}

// ============ Characters ============

#[derive(Debug, Clone, Deserialize)]
pub struct HeroRow {
    pub hero_id: i64,
    #[serde(default)]
    pub name_sno: i64,
    #[serde(default)]
    pub desc_sno: i64,
    #[serde(default)]
    pub grade_sno: i64,
    #[serde(default)]
    pub race_sno: i64,
    #[serde(default)]
    pub stat_type_sno: i64,
    /// Remaining columns, including the base stat columns
    /// (`attack`, `defence`, `max_hp`, `critical_rate`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl HeroRow {
    pub fn is_monster(&self) -> bool {
        self.hero_id >= 7000
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroDescRow {
    pub hero_id: i64,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub birthday: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroGiftRow {
    pub hero_id: i64,
    #[serde(default)]
    pub item_no: i64,
    #[serde(default)]
    pub favor_point: i64,
}

/// A potential option slot. `effect_no` resolves through either the
/// contents-buff or skill-buff table, see [`crate::potential`].
#[derive(Debug, Clone, Deserialize)]
pub struct HeroOptionRow {
    #[serde(default)]
    pub slot: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub effect_no: i64,
}

// ============ Skills ============

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRow {
    pub no: i64,
    #[serde(default)]
    pub hero_id: i64,
    #[serde(default)]
    pub slot: i64,
    #[serde(default)]
    pub name_sno: i64,
    #[serde(default)]
    pub desc_sno: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillCodeRow {
    #[serde(default)]
    pub skill_no: i64,
    /// 1-based slot referenced by `<N.VALUE>` placeholders.
    #[serde(default)]
    pub code_slot: i64,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillBuffRow {
    pub no: i64,
    #[serde(default)]
    pub value: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureRow {
    pub no: i64,
    #[serde(default)]
    pub hero_id: i64,
    #[serde(default)]
    pub name_sno: i64,
    #[serde(default)]
    pub desc_sno: i64,
    #[serde(default)]
    pub group_no: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureLevelRow {
    #[serde(default)]
    pub group_no: i64,
    #[serde(default)]
    pub signature_level: i64,
    #[serde(flatten)]
    pub stats: BTreeMap<String, Value>,
}

// ============ Items and gear ============

#[derive(Debug, Clone, Deserialize)]
pub struct ItemRow {
    pub no: i64,
    #[serde(default)]
    pub name_sno: i64,
    #[serde(default)]
    pub category_sno: i64,
    #[serde(default)]
    pub class_sno: i64,
    /// Enhancement step within the grade (the `N` in `不朽+N`).
    #[serde(default)]
    pub grade_level: i64,
    #[serde(default)]
    pub effect_no: i64,
    #[serde(default)]
    pub set_no: i64,
}

/// One stat slot on a piece of equipment. The first three slots are the
/// base stats; later slots are extra rolls.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemStatRow {
    #[serde(default)]
    pub item_no: i64,
    #[serde(default)]
    pub slot: i64,
    #[serde(default)]
    pub stat_type: String,
    #[serde(default)]
    pub stat_value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSetEffectRow {
    #[serde(default)]
    pub set_no: i64,
    /// Pieces required for the effect to kick in (2 or 4).
    #[serde(default)]
    pub count: i64,
    #[serde(flatten)]
    pub stats: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDropGroupRow {
    #[serde(default)]
    pub group_no: i64,
    #[serde(default)]
    pub item_no: i64,
    /// Per-mille-of-percent units; display rate is `drop_rate * 0.001` %.
    #[serde(default)]
    pub drop_rate: f64,
}

// ============ Stages ============

#[derive(Debug, Clone, Deserialize)]
pub struct StageRow {
    pub no: i64,
    #[serde(default)]
    pub name_sno: i64,
    /// Main-story code like `"3-10"`. Only main stages carry `exp`.
    #[serde(default)]
    pub stage_no: String,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub stage_battle_no: i64,
    #[serde(default)]
    pub drop_group_no: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageBattleRow {
    pub no: i64,
    #[serde(default)]
    pub formation_no: i64,
    #[serde(default)]
    pub battle_power: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub hero_no1: i64,
    #[serde(default)]
    pub hero_no2: i64,
    #[serde(default)]
    pub hero_no3: i64,
    #[serde(default)]
    pub hero_no4: i64,
    #[serde(default)]
    pub hero_no5: i64,
}

impl StageBattleRow {
    /// Occupied enemy slots, in formation order.
    pub fn hero_nos(&self) -> Vec<i64> {
        [
            self.hero_no1,
            self.hero_no2,
            self.hero_no3,
            self.hero_no4,
            self.hero_no5,
        ]
        .into_iter()
        .filter(|&n| n != 0)
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormationRow {
    pub no: i64,
    #[serde(default)]
    pub formation_type: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BarrierRow {
    pub no: i64,
    #[serde(default)]
    pub race_sno: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub name_sno: i64,
    #[serde(default)]
    pub stage_battle_no: i64,
    #[serde(default)]
    pub drop_group_no: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TowerRow {
    pub no: i64,
    #[serde(default)]
    pub floor: i64,
}

// ============ Progression ============

#[derive(Debug, Clone, Deserialize)]
pub struct LevelRow {
    pub level: i64,
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub mana_dust: i64,
    #[serde(default)]
    pub mana_crystal: i64,
    #[serde(default)]
    pub sum_gold: i64,
    #[serde(default)]
    pub sum_mana_dust: i64,
    #[serde(default)]
    pub sum_mana_crystal: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArkEnhanceRow {
    pub no: i64,
    #[serde(default)]
    pub type_sno: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub pay_item_no: i64,
    #[serde(default)]
    pub pay_amount: i64,
    #[serde(default)]
    pub contents_buff_no: i64,
    #[serde(default)]
    pub sp_buff_value02: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArkOverclockRow {
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub mana_crystal: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentsBuffRow {
    pub no: i64,
    #[serde(flatten)]
    pub stats: BTreeMap<String, Value>,
}

// ============ Events and shop ============

#[derive(Debug, Clone, Deserialize)]
pub struct EventCalenderRow {
    #[serde(default)]
    pub schedule_key: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub name_sno: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageMailRow {
    pub no: i64,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub sender_sno: i64,
    #[serde(default)]
    pub title_sno: i64,
    #[serde(default)]
    pub desc_sno: i64,
    #[serde(default)]
    pub reward_no1: i64,
    #[serde(default)]
    pub reward_amount1: i64,
    #[serde(default)]
    pub reward_no2: i64,
    #[serde(default)]
    pub reward_amount2: i64,
    #[serde(default)]
    pub reward_no3: i64,
    #[serde(default)]
    pub reward_amount3: i64,
    #[serde(default)]
    pub reward_no4: i64,
    #[serde(default)]
    pub reward_amount4: i64,
}

impl MessageMailRow {
    /// Non-empty reward pairs in slot order.
    pub fn rewards(&self) -> Vec<(i64, i64)> {
        [
            (self.reward_no1, self.reward_amount1),
            (self.reward_no2, self.reward_amount2),
            (self.reward_no3, self.reward_amount3),
            (self.reward_no4, self.reward_amount4),
        ]
        .into_iter()
        .filter(|&(no, _)| no != 0)
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CashShopItemRow {
    pub no: i64,
    #[serde(default)]
    pub name_sno: i64,
    /// Unlock kind: `stage`, `barrier`, `tower`, or `grade_eternal`.
    #[serde(default, rename = "type")]
    pub pack_type: String,
    #[serde(default)]
    pub type_value: String,
    /// Literal list of `(item_no, amount)` pairs, e.g. `"[(110011, 100)]"`.
    #[serde(default)]
    pub item_infos: String,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyValuesRow {
    #[serde(default)]
    pub key_name: String,
    #[serde(default)]
    pub value: Value,
}

// ============ Affinity ============

#[derive(Debug, Clone, Deserialize)]
pub struct TripHeroRow {
    pub hero_id: i64,
    #[serde(default)]
    pub conversation: i64,
    #[serde(default)]
    pub culture: i64,
    #[serde(default)]
    pub courage: i64,
    #[serde(default)]
    pub knowledge: i64,
    #[serde(default)]
    pub guts: i64,
    #[serde(default)]
    pub handicraft: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripKeywordRow {
    #[serde(default)]
    pub hero_id: i64,
    #[serde(default)]
    pub keyword_sno: i64,
    #[serde(default)]
    pub grade_sno: i64,
    /// Absent means the keyword is disliked; `2` means loved.
    #[serde(default)]
    pub favor_point: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryInfoRow {
    pub no: i64,
    /// For love stories this is the hero id.
    #[serde(default)]
    pub act: i64,
    #[serde(default)]
    pub episode: i64,
    #[serde(default)]
    pub bundle_path: String,
    #[serde(default)]
    pub ending_affinity: i64,
}

/// A dialogue choice inside a love story. Choices come in groups; within a
/// group the highest favor option is the "good" pick.
#[derive(Debug, Clone, Deserialize)]
pub struct TalkRow {
    #[serde(default)]
    pub story_no: i64,
    #[serde(default)]
    pub choice_group: i64,
    #[serde(default)]
    pub text_sno: i64,
    #[serde(default)]
    pub favor_point: i64,
}

// ============ Strings ============

#[derive(Debug, Clone, Deserialize)]
pub struct StringRow {
    pub no: i64,
    #[serde(default)]
    pub zh_cn: Option<String>,
    #[serde(default)]
    pub kr: Option<String>,
    #[serde(default)]
    pub en: Option<String>,
}
