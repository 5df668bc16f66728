//! Character name resolution.
//!
//! Players rarely type a character's exact display name, so lookups go
//! through two JSON alias stores (`hero_aliases.json` for playable
//! characters, `monster_aliases.json` for ids 7000 and up), each mapping
//! hero id to the canonical Chinese name plus community aliases.
//!
//! Matching is exact first (ASCII case-insensitive), then similarity
//! ranked: a single confident match needs ratio >= 0.6, otherwise up to
//! three suggestions with ratio >= 0.4 come back for the frontend to offer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::data::Snapshot;

const LOOKUP_CUTOFF: f64 = 0.6;
const SUGGEST_CUTOFF: f64 = 0.4;
const SUGGEST_LIMIT: usize = 3;

/// One character's names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasEntry {
    #[serde(default)]
    pub zh_cn: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Both alias files, loaded together.
#[derive(Debug, Default)]
pub struct AliasStore {
    dir: PathBuf,
    pub heroes: BTreeMap<i64, AliasEntry>,
    pub monsters: BTreeMap<i64, AliasEntry>,
}

/// Outcome of a name lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum NameMatch {
    /// Confident single match.
    Hit(i64),
    /// No confident match; candidate names worth offering.
    Suggestions(Vec<String>),
    /// Nothing even close.
    Miss,
}

impl AliasStore {
    /// Load both alias files from a directory. Missing files load empty.
    pub fn load(dir: &Path) -> Result<AliasStore> {
        Ok(AliasStore {
            dir: dir.to_path_buf(),
            heroes: load_alias_file(&dir.join("hero_aliases.json"))?,
            monsters: load_alias_file(&dir.join("monster_aliases.json"))?,
        })
    }

    /// All (id, name) pairs a query can match, canonical names and aliases.
    fn candidates(&self) -> Vec<(i64, &str)> {
        let mut out = Vec::new();
        for map in [&self.heroes, &self.monsters] {
            for (&id, entry) in map {
                if !entry.zh_cn.is_empty() {
                    out.push((id, entry.zh_cn.as_str()));
                }
                for alias in &entry.aliases {
                    out.push((id, alias.as_str()));
                }
            }
        }
        out
    }

    /// Resolve a user-typed name to a hero id.
    pub fn find(&self, query: &str) -> NameMatch {
        let query = normalize(query);
        if query.is_empty() {
            return NameMatch::Miss;
        }

        let candidates = self.candidates();

        for (id, name) in &candidates {
            if normalize(name) == query {
                return NameMatch::Hit(*id);
            }
        }

        // Rank by similarity, keeping the best ratio per name
        let mut scored: Vec<(i64, &str, f64)> = candidates
            .iter()
            .map(|&(id, name)| (id, name, similarity(&query, &normalize(name))))
            .filter(|&(_, _, ratio)| ratio >= SUGGEST_CUTOFF)
            .collect();

        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(b.1))
        });

        match scored.first() {
            Some(&(id, _, ratio)) if ratio >= LOOKUP_CUTOFF => NameMatch::Hit(id),
            Some(_) => {
                let mut names: Vec<String> = Vec::new();
                for (_, name, _) in &scored {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                    if names.len() == SUGGEST_LIMIT {
                        break;
                    }
                }
                NameMatch::Suggestions(names)
            }
            None => NameMatch::Miss,
        }
    }

    /// Regenerate both alias files from a snapshot's hero table.
    ///
    /// Existing aliases are always preserved. If an id somehow has entries
    /// in both files, the one with more aliases wins before the id is filed
    /// under the correct store again.
    pub fn sync(&mut self, snapshot: &Snapshot) -> Result<(usize, usize)> {
        let mut merged: BTreeMap<i64, AliasEntry> = BTreeMap::new();
        for (id, entry) in self.heroes.iter().chain(self.monsters.iter()) {
            match merged.get(id) {
                Some(existing) if existing.aliases.len() >= entry.aliases.len() => {}
                _ => {
                    merged.insert(*id, entry.clone());
                }
            }
        }

        let mut heroes = BTreeMap::new();
        let mut monsters = BTreeMap::new();

        for hero in &snapshot.heroes {
            let mut entry = merged.remove(&hero.hero_id).unwrap_or_default();
            if entry.zh_cn.is_empty() {
                if let Some(name) = snapshot.strings.try_get(hero.name_sno) {
                    entry.zh_cn = name;
                }
            }
            if hero.is_monster() {
                monsters.insert(hero.hero_id, entry);
            } else {
                heroes.insert(hero.hero_id, entry);
            }
        }

        self.heroes = heroes;
        self.monsters = monsters;
        self.save()?;
        Ok((self.heroes.len(), self.monsters.len()))
    }

    fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        save_alias_file(&self.dir.join("hero_aliases.json"), &self.heroes)?;
        save_alias_file(&self.dir.join("monster_aliases.json"), &self.monsters)?;
        Ok(())
    }
}

fn load_alias_file(path: &Path) -> Result<BTreeMap<i64, AliasEntry>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read alias file: {}", path.display()))?;
    let raw: BTreeMap<String, AliasEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse alias file: {}", path.display()))?;

    Ok(raw
        .into_iter()
        .filter_map(|(id, entry)| Some((id.parse().ok()?, entry)))
        .collect())
}

fn save_alias_file(path: &Path, entries: &BTreeMap<i64, AliasEntry>) -> Result<()> {
    let raw: BTreeMap<String, &AliasEntry> = entries
        .iter()
        .map(|(id, entry)| (id.to_string(), entry))
        .collect();
    let json = serde_json::to_string_pretty(&raw)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write alias file: {}", path.display()))?;
    Ok(())
}

/// Trim and ASCII-lowercase. CJK text passes through unchanged.
fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Similarity ratio in [0, 1]: twice the longest common subsequence length
/// over the combined length, the classic diff ratio.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Rolling-row LCS table
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    2.0 * prev[b.len()] as f64 / (a.len() + b.len()) as f64
}

/// `esdex aliases sync` — regenerate the alias stores from a snapshot.
pub fn run_alias_sync(alias_dir: &Path, snapshot: &Snapshot) -> Result<()> {
    let mut store = AliasStore::load(alias_dir)?;
    let (heroes, monsters) = store.sync(snapshot)?;
    println!(
        "Alias stores synced: {} heroes, {} monsters.",
        heroes, monsters
    );
    Ok(())
}
