//! Snapshot loading and shared lookups.
//!
//! A snapshot is a directory of JSON table files, one per game table. Both
//! snapshots (live and review) are loaded eagerly at startup and shared
//! immutably; per-group source switching only changes which one a request
//! sees. A missing or unparsable table logs a warning and loads as empty so
//! one bad export never takes the whole service down.

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::sources::SourceKind;
use crate::strings::LocalizedStrings;
use crate::tables::*;

/// All tables of one data snapshot, plus the merged string lookup.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub heroes: Vec<HeroRow>,
    pub hero_descs: Vec<HeroDescRow>,
    pub hero_gifts: Vec<HeroGiftRow>,
    pub hero_options: Vec<HeroOptionRow>,
    pub skills: Vec<SkillRow>,
    pub skill_codes: Vec<SkillCodeRow>,
    pub skill_buffs: Vec<SkillBuffRow>,
    pub signatures: Vec<SignatureRow>,
    pub signature_levels: Vec<SignatureLevelRow>,
    pub items: Vec<ItemRow>,
    pub item_stats: Vec<ItemStatRow>,
    pub item_set_effects: Vec<ItemSetEffectRow>,
    pub item_drop_groups: Vec<ItemDropGroupRow>,
    pub stages: Vec<StageRow>,
    pub stage_battles: Vec<StageBattleRow>,
    pub formations: Vec<FormationRow>,
    pub barriers: Vec<BarrierRow>,
    pub towers: Vec<TowerRow>,
    pub levels: Vec<LevelRow>,
    pub ark_enhances: Vec<ArkEnhanceRow>,
    pub ark_overclocks: Vec<ArkOverclockRow>,
    pub contents_buffs: Vec<ContentsBuffRow>,
    pub event_calenders: Vec<EventCalenderRow>,
    pub message_mails: Vec<MessageMailRow>,
    pub cash_shop_items: Vec<CashShopItemRow>,
    pub key_values: Vec<KeyValuesRow>,
    pub trip_heroes: Vec<TripHeroRow>,
    pub trip_keywords: Vec<TripKeywordRow>,
    pub story_infos: Vec<StoryInfoRow>,
    pub talks: Vec<TalkRow>,
    pub strings: LocalizedStrings,
}

impl Snapshot {
    /// Load every table from a snapshot directory.
    pub fn load(dir: &Path) -> Snapshot {
        let mut strings = LocalizedStrings::new();
        for file in [
            "StringCharacter.json",
            "StringSystem.json",
            "StringSkill.json",
            "StringItem.json",
            "StringUI.json",
            "StringStage.json",
            "StringTown.json",
            "StringTalk.json",
        ] {
            let rows: Vec<StringRow> = load_table(dir, file);
            strings.merge(&rows);
        }

        Snapshot {
            heroes: load_table(dir, "Hero.json"),
            hero_descs: load_table(dir, "HeroDesc.json"),
            hero_gifts: load_table(dir, "HeroGift.json"),
            hero_options: load_table(dir, "HeroOption.json"),
            skills: load_table(dir, "Skill.json"),
            skill_codes: load_table(dir, "SkillCode.json"),
            skill_buffs: load_table(dir, "SkillBuff.json"),
            signatures: load_table(dir, "Signature.json"),
            signature_levels: load_table(dir, "SignatureLevel.json"),
            items: load_table(dir, "Item.json"),
            item_stats: load_table(dir, "ItemStat.json"),
            item_set_effects: load_table(dir, "ItemSetEffect.json"),
            item_drop_groups: load_table(dir, "ItemDropGroup.json"),
            stages: load_table(dir, "Stage.json"),
            stage_battles: load_table(dir, "StageBattle.json"),
            formations: load_table(dir, "Formation.json"),
            barriers: load_table(dir, "Barrier.json"),
            towers: load_table(dir, "Tower.json"),
            levels: load_table(dir, "Level.json"),
            ark_enhances: load_table(dir, "ArkEnhance.json"),
            ark_overclocks: load_table(dir, "ArkOverClock.json"),
            contents_buffs: load_table(dir, "ContentsBuff.json"),
            event_calenders: load_table(dir, "EventCalender.json"),
            message_mails: load_table(dir, "MessageMail.json"),
            cash_shop_items: load_table(dir, "CashShopItem.json"),
            key_values: load_table(dir, "KeyValues.json"),
            trip_heroes: load_table(dir, "TripHero.json"),
            trip_keywords: load_table(dir, "TripKeyword.json"),
            story_infos: load_table(dir, "StoryInfo.json"),
            talks: load_table(dir, "Talk.json"),
            strings,
        }
    }

    pub fn hero_by_id(&self, hero_id: i64) -> Option<&HeroRow> {
        self.heroes.iter().find(|h| h.hero_id == hero_id)
    }

    /// Localized hero name, or a placeholder for unknown ids.
    pub fn hero_name(&self, hero_id: i64) -> String {
        match self.hero_by_id(hero_id) {
            Some(hero) => self.strings.get(hero.name_sno),
            None => format!("?hero {}?", hero_id),
        }
    }

    pub fn item_by_no(&self, no: i64) -> Option<&ItemRow> {
        self.items.iter().find(|i| i.no == no)
    }

    /// Localized item name, or a placeholder for unknown numbers.
    pub fn item_name(&self, no: i64) -> String {
        match self.item_by_no(no) {
            Some(item) => self.strings.get(item.name_sno),
            None => format!("?item {}?", no),
        }
    }

    pub fn skill_buff(&self, no: i64) -> Option<&SkillBuffRow> {
        self.skill_buffs.iter().find(|b| b.no == no)
    }

    pub fn contents_buff(&self, no: i64) -> Option<&ContentsBuffRow> {
        self.contents_buffs.iter().find(|b| b.no == no)
    }

    /// Integer setting from the key-values table, with a default for
    /// snapshots that predate the key.
    pub fn key_value_i64(&self, key: &str, default: i64) -> i64 {
        self.key_values
            .iter()
            .find(|kv| kv.key_name == key)
            .and_then(|kv| kv.value.as_i64())
            .unwrap_or(default)
    }
}

/// Read one table file; missing or malformed files degrade to empty.
fn load_table<T: DeserializeOwned>(dir: &Path, file: &str) -> Vec<T> {
    let path = dir.join(file);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            warn!(table = file, path = %path.display(), error = %e, "table file missing, loading empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<TableFile<T>>(&content) {
        Ok(table) => table.json,
        Err(e) => {
            warn!(table = file, path = %path.display(), error = %e, "table file unparsable, loading empty");
            Vec::new()
        }
    }
}

/// Both snapshots, loaded once and shared.
#[derive(Clone)]
pub struct GameData {
    pub live: Arc<Snapshot>,
    pub review: Arc<Snapshot>,
}

impl GameData {
    pub fn load(config: &Config) -> Result<GameData> {
        let live = Snapshot::load(&config.data.live_path);
        let review = Snapshot::load(&config.data.review_path);
        Ok(GameData {
            live: Arc::new(live),
            review: Arc::new(review),
        })
    }

    pub fn snapshot(&self, source: SourceKind) -> Arc<Snapshot> {
        match source {
            SourceKind::Live => self.live.clone(),
            SourceKind::Review => self.review.clone(),
        }
    }
}

// ============ Enumeration constants ============

/// Gate/race sno → display name.
pub fn race_name(sno: i64) -> Option<&'static str> {
    match sno {
        4 => Some("自由"),
        5 => Some("人类"),
        6 => Some("野兽"),
        7 => Some("妖精"),
        8 => Some("不死"),
        _ => None,
    }
}

/// Display name → gate/race sno.
pub fn race_sno(name: &str) -> Option<i64> {
    match name {
        "自由" => Some(4),
        "人类" => Some(5),
        "野兽" => Some(6),
        "妖精" => Some(7),
        "不死" => Some(8),
        _ => None,
    }
}

/// Stat columns in display order, mapped to their Chinese names. Columns
/// not listed here are internal and never shown.
pub const STAT_DISPLAY: &[(&str, &str)] = &[
    ("attack_rate", "攻击力"),
    ("attack", "攻击力"),
    ("defence", "防御力"),
    ("max_hp", "体力"),
    ("hp", "体力"),
    ("critical_rate", "暴击率"),
    ("critical_power", "暴击威力"),
    ("hit", "命中"),
    ("dodge", "闪避"),
    ("physical_resist", "物理抗性"),
    ("magic_resist", "魔法抗性"),
    ("life_leech", "吸血"),
    ("attack_speed", "攻击速度"),
];

pub fn stat_display_name(column: &str) -> Option<&'static str> {
    STAT_DISPLAY
        .iter()
        .find(|(col, _)| *col == column)
        .map(|(_, name)| *name)
}

/// Stat class sno → display name (hero stat archetypes).
pub fn stat_class_name(sno: i64) -> Option<&'static str> {
    match sno {
        110041 => Some("共用"),
        110042 => Some("力量"),
        110043 => Some("敏捷"),
        110044 => Some("智力"),
        _ => None,
    }
}

/// Display name → stat class sno.
pub fn stat_class_sno(name: &str) -> Option<i64> {
    match name {
        "共用" => Some(110041),
        "力量" => Some(110042),
        "敏捷" => Some(110043),
        "智力" => Some(110044),
        _ => None,
    }
}

/// Formation type → display name.
pub fn formation_name(formation_type: i64) -> &'static str {
    match formation_type {
        1 => "基本阵型",
        2 => "狙击型",
        3 => "防守阵型",
        4 => "突击型",
        _ => "未知阵型",
    }
}
