//! # Eversoul Dex
//!
//! A game-data query service for Eversoul chat frontends.
//!
//! Eversoul Dex loads the game's denormalized JSON table exports (two
//! snapshots: the shipped `live` build and the `review` preview build),
//! joins them through their numeric identifiers, and answers the queries a
//! chat bot forwards: character profiles, stages, monthly events, gear
//! tiers, cash packs, progression costs, and affinity guides.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │ JSON tables  │──▶│   Snapshot    │──▶│  Queries  │
//! │ live/review  │   │ rows+strings │   │ 13 ops    │
//! └──────────────┘   └──────────────┘   └────┬──────┘
//!                                            │
//!                        ┌───────────────────┤
//!                        ▼                   ▼
//!                   ┌──────────┐       ┌──────────┐
//!                   │   CLI    │       │   HTTP   │
//!                   │ (esdex)  │       │ (axum)   │
//!                   └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! esdex aliases sync            # build the name alias stores
//! esdex hero 米卡               # character profile
//! esdex stage 3-10              # main-story stage
//! esdex events 6                # June events + timeline page
//! esdex serve                   # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`data`] | Snapshot loading and shared lookups |
//! | [`tables`] | Typed rows for the JSON tables |
//! | [`strings`] | Localized string resolution |
//! | [`aliases`] | Name aliases and fuzzy matching |
//! | [`heroes`] | Character profile, roster, rankings |
//! | [`skills`] | Skill description rendering |
//! | [`stages`] | Stage, gate, and cash-pack queries |
//! | [`gear`] | Equipment tier queries |
//! | [`events`] | Monthly event queries |
//! | [`affinity`] | Gift / keyword / story guides |
//! | [`levels`] | Level-up and ark enhancement costs |
//! | [`potential`] | Potential buff table |
//! | [`render`] | HTML page generation |
//! | [`sources`] | Per-group snapshot switching |
//! | [`server`] | HTTP server |

pub mod affinity;
pub mod aliases;
pub mod config;
pub mod data;
pub mod events;
pub mod gear;
pub mod heroes;
pub mod levels;
pub mod models;
pub mod potential;
pub mod render;
pub mod server;
pub mod skills;
pub mod sources;
pub mod stages;
pub mod strings;
pub mod tables;
