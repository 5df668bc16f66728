//! Per-chat-group data source selection.
//!
//! Every chat group is pinned to one of two snapshots: `live` (the shipped
//! game build) or `review` (the preview build). The mapping persists in a
//! small TOML state file so it survives restarts. Groups without an entry
//! see `live`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which snapshot a group reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Live,
    Review,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Live => write!(f, "live"),
            SourceKind::Review => write!(f, "review"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "live" => Ok(SourceKind::Live),
            "review" => Ok(SourceKind::Review),
            other => bail!("Unknown data source: '{}'. Use live or review.", other),
        }
    }
}

/// On-disk shape of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    groups: BTreeMap<String, String>,
}

/// The group → snapshot mapping plus its backing file.
#[derive(Debug)]
pub struct GroupSources {
    path: PathBuf,
    groups: BTreeMap<i64, SourceKind>,
}

impl GroupSources {
    /// Load the mapping. A missing state file is an empty mapping; entries
    /// with an unknown source value are dropped with the default applying.
    pub fn load(path: &Path) -> Result<GroupSources> {
        let groups = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            let state: StateFile =
                toml::from_str(&content).with_context(|| "Failed to parse state file")?;

            state
                .groups
                .iter()
                .filter_map(|(group, source)| {
                    let group: i64 = group.parse().ok()?;
                    let source: SourceKind = source.parse().ok()?;
                    Some((group, source))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        Ok(GroupSources {
            path: path.to_path_buf(),
            groups,
        })
    }

    /// The snapshot a group reads from. Unknown groups default to live.
    pub fn resolve(&self, group_id: i64) -> SourceKind {
        self.groups
            .get(&group_id)
            .copied()
            .unwrap_or(SourceKind::Live)
    }

    /// Pin a group to a snapshot and persist the mapping.
    pub fn switch(&mut self, group_id: i64, source: SourceKind) -> Result<()> {
        self.groups.insert(group_id, source);
        self.save()
    }

    fn save(&self) -> Result<()> {
        let state = StateFile {
            groups: self
                .groups
                .iter()
                .map(|(group, source)| (group.to_string(), source.to_string()))
                .collect(),
        };

        let content = toml::to_string_pretty(&state)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (i64, SourceKind)> + '_ {
        self.groups.iter().map(|(&g, &s)| (g, s))
    }
}

/// `esdex source list` — print the persisted mapping.
pub fn run_source_list(state_file: &Path) -> Result<()> {
    let sources = GroupSources::load(state_file)?;

    println!("Group data sources (default: live)");
    println!("==================================");
    let mut any = false;
    for (group, source) in sources.entries() {
        println!("  {:<16} {}", group, source);
        any = true;
    }
    if !any {
        println!("  (no overrides)");
    }
    Ok(())
}

/// `esdex source switch` — pin a group and persist.
pub fn run_source_switch(state_file: &Path, group_id: i64, source: &str) -> Result<()> {
    let source: SourceKind = source.parse()?;
    let mut sources = GroupSources::load(state_file)?;
    sources.switch(group_id, source)?;
    println!("Group {} now reads from {}.", group_id, source);
    Ok(())
}
