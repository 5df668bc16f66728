use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn esdex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("esdex");
    path
}

fn write_table(dir: &Path, file: &str, rows: &str) {
    fs::write(dir.join(file), format!("{{\"json\": {}}}", rows)).unwrap();
}

/// Build a miniature live snapshot: one hero with a skill, one monster,
/// one main stage with drops, equipment, and level costs.
fn write_live_snapshot(dir: &Path) {
    fs::create_dir_all(dir).unwrap();

    write_table(
        dir,
        "Hero.json",
        r#"[
            {"hero_id": 1001, "name_sno": 100, "desc_sno": 101, "grade_sno": 102,
             "race_sno": 5, "stat_type_sno": 110042,
             "attack": 1520.0, "defence": 830.0, "max_hp": 10400.0, "critical_rate": 0.15},
            {"hero_id": 7001, "name_sno": 130, "grade_sno": 0, "race_sno": 6}
        ]"#,
    );
    write_table(
        dir,
        "StringCharacter.json",
        r#"[
            {"no": 100, "zh_cn": "米卡"},
            {"no": 101, "zh_cn": "晨曦圣女"},
            {"no": 130, "zh_cn": "史莱姆"}
        ]"#,
    );
    write_table(dir, "StringSystem.json", r#"[{"no": 102, "zh_cn": "史诗"}]"#);
    write_table(
        dir,
        "StringSkill.json",
        r#"[
            {"no": 110, "zh_cn": "圣光斩"},
            {"no": 111, "zh_cn": "造成<1.VALUE>伤害"}
        ]"#,
    );
    write_table(
        dir,
        "Skill.json",
        r#"[{"no": 90, "hero_id": 1001, "slot": 1, "name_sno": 110, "desc_sno": 111}]"#,
    );
    write_table(
        dir,
        "SkillCode.json",
        r#"[{"skill_no": 90, "code_slot": 1, "value": 1.8, "duration": 0.0}]"#,
    );

    write_table(
        dir,
        "Stage.json",
        r#"[{"no": 301, "name_sno": 120, "stage_no": "1-1", "exp": 100,
             "stage_battle_no": 401, "drop_group_no": 9}]"#,
    );
    write_table(dir, "StringStage.json", r#"[{"no": 120, "zh_cn": "森林边境"}]"#);
    write_table(
        dir,
        "StageBattle.json",
        r#"[{"no": 401, "formation_no": 501, "battle_power": 1234567,
             "level": 10, "hero_no1": 7001}]"#,
    );
    write_table(dir, "Formation.json", r#"[{"no": 501, "formation_type": 2}]"#);

    write_table(
        dir,
        "Item.json",
        r#"[
            {"no": 100, "name_sno": 140},
            {"no": 500, "name_sno": 141, "category_sno": 110002, "class_sno": 110042,
             "grade_level": 3, "effect_no": 14101, "set_no": 0}
        ]"#,
    );
    write_table(
        dir,
        "StringItem.json",
        r#"[
            {"no": 140, "zh_cn": "金币"},
            {"no": 141, "zh_cn": "猎手之弓"}
        ]"#,
    );
    write_table(
        dir,
        "ItemDropGroup.json",
        r#"[{"group_no": 9, "item_no": 100, "drop_rate": 35000.0}]"#,
    );
    write_table(
        dir,
        "ItemStat.json",
        r#"[{"item_no": 500, "slot": 1, "stat_type": "attack", "stat_value": 1200.0}]"#,
    );

    write_table(
        dir,
        "Level.json",
        r#"[
            {"level": 1, "gold": 0, "sum_gold": 0},
            {"level": 2, "gold": 100, "sum_gold": 100},
            {"level": 3, "gold": 200, "sum_gold": 300},
            {"level": 4, "gold": 400, "sum_gold": 700}
        ]"#,
    );
}

/// The review snapshot carries a character the live one does not have.
fn write_review_snapshot(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    write_table(
        dir,
        "Hero.json",
        r#"[{"hero_id": 2001, "name_sno": 200, "race_sno": 7, "attack": 999.0}]"#,
    );
    write_table(dir, "StringCharacter.json", r#"[{"no": 200, "zh_cn": "测试者"}]"#);
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    write_live_snapshot(&root.join("live"));
    write_review_snapshot(&root.join("review"));

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[data]
live_path = "{root}/live"
review_path = "{root}/review"
state_file = "{root}/state/group_sources.toml"
alias_dir = "{root}/aliases"

[server]
bind = "127.0.0.1:7342"
admin_users = [9000]
"#,
        root = root.display()
    );

    let config_path = config_dir.join("esdex.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_esdex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = esdex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run esdex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_alias_sync_creates_stores() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_esdex(&config_path, &["aliases", "sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("1 heroes"));
    assert!(stdout.contains("1 monsters"));
    assert!(tmp.path().join("aliases/hero_aliases.json").exists());
    assert!(tmp.path().join("aliases/monster_aliases.json").exists());
}

#[test]
fn test_hero_profile() {
    let (_tmp, config_path) = setup_test_env();
    run_esdex(&config_path, &["aliases", "sync"]);

    let (stdout, stderr, success) = run_esdex(&config_path, &["hero", "米卡"]);
    assert!(success, "hero failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("米卡"));
    assert!(stdout.contains("称号: 晨曦圣女"));
    assert!(stdout.contains("品质: 史诗"));
    assert!(stdout.contains("攻击力: 1520"));
    assert!(stdout.contains("暴击率: 15%"));
    // Skill placeholder resolved: 1.8 → 180%
    assert!(stdout.contains("造成180%伤害"));
}

#[test]
fn test_hero_not_found_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_esdex(&config_path, &["aliases", "sync"]);

    let (_, stderr, success) = run_esdex(&config_path, &["hero", "不存在的人"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_heroes_roster() {
    let (_tmp, config_path) = setup_test_env();
    run_esdex(&config_path, &["aliases", "sync"]);

    let (stdout, _, success) = run_esdex(&config_path, &["heroes"]);
    assert!(success);
    assert!(stdout.contains("人类"));
    assert!(stdout.contains("米卡"));
    // Monsters never appear in the roster
    assert!(!stdout.contains("史莱姆"));
}

#[test]
fn test_stage_lookup() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_esdex(&config_path, &["stage", "1-1"]);
    assert!(success);
    assert!(stdout.contains("主线 1-1 森林边境"));
    assert!(stdout.contains("战斗力: 123.5万"));
    assert!(stdout.contains("狙击型"));
    assert!(stdout.contains("史莱姆"));
    assert!(stdout.contains("金币 35%"));
}

#[test]
fn test_stage_not_found() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_esdex(&config_path, &["stage", "99-99"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_gear_lookup() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_esdex(&config_path, &["gear", "粉3力量攻击力"]);
    assert!(success);
    assert!(stdout.contains("不朽+3 猎手之弓"));
    assert!(stdout.contains("攻击力: 1200"));
}

#[test]
fn test_levels_cost() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_esdex(&config_path, &["levels", "1", "3"]);
    assert!(success);
    assert!(stdout.contains("等级花费 1 → 3"));
    assert!(stdout.contains("金币: 300"));
    // Marginal cost comes from the level-2 row
    assert!(stdout.contains("升至 2 级"));
    assert!(stdout.contains("金币: 100"));
}

#[test]
fn test_events_month_validation() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_esdex(&config_path, &["events", "13"]);
    assert!(!success);
    assert!(stderr.contains("invalid month"));

    let (stdout, _, success) = run_esdex(&config_path, &["events", "12"]);
    assert!(success);
    assert!(stdout.contains("12月"));
}

#[test]
fn test_source_switch_and_group_resolution() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_esdex(&config_path, &["source", "switch", "777", "review"]);
    assert!(success);
    assert!(stdout.contains("777"));
    assert!(stdout.contains("review"));
    assert!(tmp.path().join("state/group_sources.toml").exists());

    let (stdout, _, success) = run_esdex(&config_path, &["source", "list"]);
    assert!(success);
    assert!(stdout.contains("777"));

    // Sync aliases from the review snapshot, then query through the group
    run_esdex(&config_path, &["aliases", "sync", "--group", "777"]);
    let (stdout, stderr, success) =
        run_esdex(&config_path, &["hero", "测试者", "--group", "777"]);
    assert!(success, "review hero failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("测试者"));
}

#[test]
fn test_guide_html_out() {
    let (tmp, config_path) = setup_test_env();
    let html_path = tmp.path().join("out/guide.html");

    let (_, _, success) = run_esdex(
        &config_path,
        &["guide", "--html-out", html_path.to_str().unwrap()],
    );
    assert!(success);
    let html = fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("指令一览"));
    assert!(html.contains("affinity"));
}

#[test]
fn test_server_endpoints() {
    let (_tmp, config_path) = setup_test_env();
    run_esdex(&config_path, &["aliases", "sync"]);

    let binary = esdex_binary();
    let mut child = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("serve")
        .spawn()
        .expect("failed to spawn server");

    let base = "http://127.0.0.1:7342";
    let client = reqwest::blocking::Client::new();

    // Wait for the server to come up
    let mut healthy = false;
    for _ in 0..50 {
        std::thread::sleep(std::time::Duration::from_millis(100));
        if let Ok(resp) = client.get(format!("{}/health", base)).send() {
            if resp.status().is_success() {
                healthy = true;
                break;
            }
        }
    }
    assert!(healthy, "server did not become healthy");

    // Query a hero through the API
    let resp = client
        .post(format!("{}/query/hero", base))
        .json(&serde_json::json!({ "group_id": 1, "name": "米卡" }))
        .send()
        .unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().unwrap();
    let sections = body["result"]["sections"].as_array().unwrap();
    assert!(!sections.is_empty());

    // Unknown hero → 404 with the error contract
    let resp = client
        .post(format!("{}/query/hero", base))
        .json(&serde_json::json!({ "group_id": 1, "name": "不存在的人" }))
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    // Source switch requires an admin user
    let resp = client
        .post(format!("{}/source/switch", base))
        .json(&serde_json::json!({ "group_id": 1, "user_id": 1234, "source": "review" }))
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = client
        .post(format!("{}/source/switch", base))
        .json(&serde_json::json!({ "group_id": 1, "user_id": 9000, "source": "review" }))
        .send()
        .unwrap();
    assert!(resp.status().is_success());

    child.kill().unwrap();
    let _ = child.wait();
}
