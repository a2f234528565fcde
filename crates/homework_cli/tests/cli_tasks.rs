use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("homework-{nanos}-{file_name}"))
}

fn run_cli(store_path: &PathBuf, args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_homework");
    Command::new(exe)
        .args(args)
        .env("HOMEWORK_STORE_PATH", store_path)
        .env("HOMEWORK_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("HOMEWORK_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run homework")
}

fn board(store_path: &PathBuf, name: &str) -> serde_json::Value {
    let output = run_cli(store_path, &["show", name, "--json"]);
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("show output is JSON")
}

#[test]
fn show_renders_both_sections() {
    let store_path = temp_path("cli-show.json");

    let output = run_cli(&store_path, &["show"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("== 캐릭터1 =="));
    assert!(stdout.contains("DAILY"));
    assert!(stdout.contains("WEEKLY"));
    assert!(stdout.contains("검은 구멍"));
    assert!(stdout.contains("3/3 left"));
}

#[test]
fn show_without_characters_reports_empty_roster() {
    let store_path = temp_path("cli-show-empty.json");

    assert!(run_cli(&store_path, &["remove", "캐릭터1"]).status.success());
    let plain = run_cli(&store_path, &["show"]);
    let json = run_cli(&store_path, &["show", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(String::from_utf8_lossy(&plain.stdout).contains("No characters"));
    assert_eq!(String::from_utf8_lossy(&json.stdout).trim(), "null");
}

#[test]
fn use_and_undo_stay_within_bounds() {
    let store_path = temp_path("cli-counted.json");

    for _ in 0..3 {
        assert!(run_cli(&store_path, &["use", "summoningBarrier"]).status.success());
    }
    let after_use = board(&store_path, "캐릭터1");
    for _ in 0..4 {
        assert!(run_cli(&store_path, &["undo", "summoningBarrier"]).status.success());
    }
    let after_undo = board(&store_path, "캐릭터1");
    std::fs::remove_file(&store_path).ok();

    assert_eq!(after_use["dailyTasks"]["summoningBarrier"], 0);
    assert_eq!(after_undo["dailyTasks"]["summoningBarrier"], 2);
}

#[test]
fn toggle_accepts_id_or_label() {
    let store_path = temp_path("cli-toggle.json");

    assert!(run_cli(&store_path, &["toggle", "dayDungeon"]).status.success());
    assert!(run_cli(&store_path, &["toggle", "필드보스 - 페리"]).status.success());
    let state = board(&store_path, "캐릭터1");
    std::fs::remove_file(&store_path).ok();

    assert_eq!(state["dailyTasks"]["dayDungeon"], true);
    assert_eq!(state["weeklyTasks"]["fieldBossPeri"], true);
}

#[test]
fn toggle_on_counted_task_is_invalid_task_kind() {
    let store_path = temp_path("cli-toggle-kind.json");

    let output = run_cli(&store_path, &["toggle", "blackHole"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_task_kind"));
}

#[test]
fn unknown_task_is_not_found() {
    let store_path = temp_path("cli-unknown-task.json");

    let output = run_cli(&store_path, &["use", "moonWalk"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: not_found"));
}

#[test]
fn guild_attendance_is_shared_across_characters() {
    let store_path = temp_path("cli-guild.json");

    assert!(run_cli(&store_path, &["add", "부캐"]).status.success());
    assert!(run_cli(&store_path, &["guild", "on"]).status.success());
    let main = board(&store_path, "캐릭터1");
    let alt = board(&store_path, "부캐");
    std::fs::remove_file(&store_path).ok();

    assert_eq!(main["dailyTasks"]["guildAttendance"], true);
    assert_eq!(alt["dailyTasks"]["guildAttendance"], true);
}

#[test]
fn tower_flags_are_set_independently() {
    let store_path = temp_path("cli-tower.json");

    assert!(run_cli(&store_path, &["add", "부캐"]).status.success());
    let output = run_cli(&store_path, &["tower", "weekly", "on", "-c", "부캐", "--json"]);
    let alt = board(&store_path, "부캐");
    let main = board(&store_path, "캐릭터1");
    std::fs::remove_file(&store_path).ok();

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["weeklyComplete"], true);
    assert_eq!(payload["dailyDone"], false);
    assert_eq!(
        alt["dailyTasks"]["spectralTower"],
        serde_json::json!({ "dailyDone": false, "weeklyComplete": true })
    );
    assert_eq!(main["dailyTasks"]["spectralTower"]["weeklyComplete"], false);
}
