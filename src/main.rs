//! # Eversoul Dex CLI (`esdex`)
//!
//! The `esdex` binary exposes every query operation of the service on the
//! command line, plus alias-store maintenance, per-group data source
//! management, and the HTTP server used by the chat frontend.
//!
//! ## Usage
//!
//! ```bash
//! esdex --config ./config/esdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `esdex hero <name>` | Character profile: stats, skills, signature |
//! | `esdex heroes` | Playable roster grouped by race |
//! | `esdex ranking <height\|weight>` | Body-stat rankings |
//! | `esdex stage <N-M>` | Main-story stage details |
//! | `esdex gate <race>` | Gate details for one race |
//! | `esdex gear <query>` | Equipment lookup, e.g. `粉3力量攻击力` |
//! | `esdex packs <target>` | Cash packs: `主线N`, `传送门`, `起源塔`, `升阶` |
//! | `esdex events <month>` | Month events + timeline page |
//! | `esdex affinity <name>` | Gift / keyword / story guide |
//! | `esdex levels <from> <to>` | Level-up costs |
//! | `esdex ark` | Ark enhancement summary |
//! | `esdex potential` | Potential table page |
//! | `esdex guide` | Command reference page |
//! | `esdex aliases sync` | Regenerate the name alias stores |
//! | `esdex source list\|switch` | Per-group data source management |
//! | `esdex serve` | Start the HTTP server |
//!
//! Query commands accept `--group <id>` to run against the snapshot that
//! chat group is pinned to; without it they read the live snapshot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use eversoul_dex::aliases::{run_alias_sync, AliasStore};
use eversoul_dex::config::{load_config, Config};
use eversoul_dex::data::{GameData, Snapshot};
use eversoul_dex::models::Reply;
use eversoul_dex::sources::{run_source_list, run_source_switch, GroupSources};
use eversoul_dex::{affinity, events, gear, heroes, levels, potential, render, server, stages};

/// Eversoul Dex — a game-data query service for chat frontends.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/esdex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "esdex",
    about = "Eversoul Dex — game-data queries over the live and review snapshots",
    version,
    long_about = "Eversoul Dex loads the game's denormalized JSON table exports and answers \
    the queries a chat bot forwards: character profiles, stages, monthly events, gear tiers, \
    cash packs, progression costs, and affinity guides."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/esdex.toml")]
    config: PathBuf,

    /// Run the query against the snapshot this chat group is pinned to.
    /// Without it, queries read the live snapshot.
    #[arg(long, global = true)]
    group: Option<i64>,

    /// Write the attached HTML page (timeline, potential, guide) to this
    /// path instead of only noting it.
    #[arg(long, global = true)]
    html_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Character profile: stats, skills, and signature weapon.
    Hero {
        /// Character name or alias. Close misses get suggestions.
        name: String,
    },

    /// Playable roster grouped by race, with aliases.
    Heroes,

    /// Body-stat ranking.
    Ranking {
        /// `height` or `weight`.
        field: String,
    },

    /// Main-story stage details: enemies, battle power, drops.
    Stage {
        /// Stage code like `3-10`.
        code: String,
    },

    /// Gate details for one race, every level.
    Gate {
        /// 自由, 人类, 野兽, 妖精, or 不死.
        race: String,
    },

    /// Equipment tier lookup.
    ///
    /// Query grammar: color grade (粉 / 红), optional enhancement step,
    /// stat class, and effect. Example: `粉3力量攻击力`.
    Gear {
        query: String,
    },

    /// Cash packs unlocked by game progress.
    Packs {
        /// `主线N`, `传送门`, `起源塔`, or `升阶`.
        target: String,
    },

    /// Calendar and mail events for a month of the current year.
    Events {
        /// Month, 1 to 12.
        month: u32,
    },

    /// Affinity guide: gifts, date traits, keywords, story choices.
    Affinity {
        name: String,
    },

    /// Level-up costs between two levels (clamped to the level cap).
    Levels {
        from: i64,
        to: i64,
    },

    /// Ark enhancement summary, including overclock totals.
    Ark,

    /// Potential buff table as an HTML page.
    Potential,

    /// Command reference page.
    Guide,

    /// Manage the name alias stores.
    Aliases {
        #[command(subcommand)]
        action: AliasAction,
    },

    /// Manage per-group data sources.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Start the HTTP server for the chat frontend.
    Serve,
}

/// Alias store subcommands.
#[derive(Subcommand)]
enum AliasAction {
    /// Regenerate both alias files from the live snapshot's hero table.
    ///
    /// Existing aliases and canonical names are preserved; new characters
    /// get entries with their current localized names.
    Sync,
}

/// Data source subcommands.
#[derive(Subcommand)]
enum SourceAction {
    /// Print the persisted group → snapshot mapping.
    List,
    /// Pin a group to a snapshot and persist the mapping.
    Switch {
        group_id: i64,
        /// `live` or `review`.
        source: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match &cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
            return Ok(());
        }
        Commands::Source { action } => {
            match action {
                SourceAction::List => run_source_list(&cfg.data.state_file)?,
                SourceAction::Switch { group_id, source } => {
                    run_source_switch(&cfg.data.state_file, *group_id, source)?
                }
            }
            return Ok(());
        }
        _ => {}
    }

    // Everything else reads a snapshot
    let snapshot = resolve_snapshot(&cfg, cli.group)?;
    let aliases = AliasStore::load(&cfg.data.alias_dir)?;

    let reply = match cli.command {
        Commands::Hero { name } => heroes::query_hero(&snapshot, &aliases, &name)?,
        Commands::Heroes => heroes::query_hero_list(&snapshot, &aliases)?,
        Commands::Ranking { field } => heroes::query_ranking(&snapshot, &field)?,
        Commands::Stage { code } => stages::query_stage(&snapshot, &code)?,
        Commands::Gate { race } => stages::query_gate(&snapshot, &race)?,
        Commands::Gear { query } => gear::query_gear(&snapshot, &query)?,
        Commands::Packs { target } => stages::query_packs(&snapshot, &target)?,
        Commands::Events { month } => events::query_events(&snapshot, month)?,
        Commands::Affinity { name } => affinity::query_affinity(&snapshot, &aliases, &name)?,
        Commands::Levels { from, to } => levels::query_levels(&snapshot, from, to)?,
        Commands::Ark => levels::query_ark(&snapshot)?,
        Commands::Potential => potential::query_potential(&snapshot)?,
        Commands::Guide => Reply::new()
            .section("指令一览", "见附带页面")
            .with_html(render::help_page()),
        Commands::Aliases { action } => {
            match action {
                AliasAction::Sync => run_alias_sync(&cfg.data.alias_dir, &snapshot)?,
            }
            return Ok(());
        }
        Commands::Serve | Commands::Source { .. } => unreachable!(),
    };

    reply.print();

    if let (Some(path), Some(html)) = (&cli.html_out, &reply.html) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, html)?;
        eprintln!("Wrote HTML page to {}", path.display());
    }

    Ok(())
}

/// Load the snapshot a CLI invocation should read: the one its group is
/// pinned to, or live when no group is given.
fn resolve_snapshot(cfg: &Config, group: Option<i64>) -> anyhow::Result<std::sync::Arc<Snapshot>> {
    let data = GameData::load(cfg)?;
    let source = match group {
        Some(group_id) => GroupSources::load(&cfg.data.state_file)?.resolve(group_id),
        None => eversoul_dex::sources::SourceKind::Live,
    };
    Ok(data.snapshot(source))
}
