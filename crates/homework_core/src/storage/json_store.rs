use crate::error::AppError;
use crate::model::catalog::{self, TaskKind};
use crate::model::{Character, DailyState, DualState};
use crate::schedule::ResetSchedule;
use crate::store::TaskStore;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const SCHEMA_VERSION: u64 = 1;
const STORE_FILE_NAME: &str = "store.json";
const STORE_ENV_VAR: &str = "HOMEWORK_STORE_PATH";

/// A store read from disk, or a fresh one plus the reason the file was unusable.
#[derive(Debug, Clone)]
pub struct StoreLoad {
    pub store: TaskStore,
    pub error: Option<AppError>,
}

impl TaskStore {
    pub fn serialize(&self) -> Value {
        encode(self)
    }

    /// Rebuilds a store from an imported document. Only a non-object document
    /// (or one from a newer schema) is rejected; every other defect is coerced
    /// to catalog defaults.
    pub fn deserialize(value: &Value, schedule: ResetSchedule) -> Result<Self, AppError> {
        decode(value, schedule)
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::io("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("homework").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::io("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("homework")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_store(
    path: &Path,
    schedule: ResetSchedule,
    now: OffsetDateTime,
) -> Result<TaskStore, AppError> {
    if !path.exists() {
        return Ok(TaskStore::seeded(schedule, now));
    }

    let document = read_document(path)?;
    TaskStore::deserialize(&document, schedule)
}

/// Falls back to a seeded store when the file holds malformed data. I/O
/// failures are still returned as errors.
pub fn load_store_with_fallback(
    path: &Path,
    schedule: ResetSchedule,
    now: OffsetDateTime,
) -> Result<StoreLoad, AppError> {
    match load_store(path, schedule, now) {
        Ok(store) => Ok(StoreLoad { store, error: None }),
        Err(err @ AppError::MalformedData(_)) => Ok(StoreLoad {
            store: TaskStore::seeded(schedule, now),
            error: Some(err),
        }),
        Err(err) => Err(err),
    }
}

pub fn save_store(path: &Path, store: &TaskStore) -> Result<(), AppError> {
    write_document(path, &store.serialize())
}

pub fn read_document(path: &Path) -> Result<Value, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::malformed_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn write_document(path: &Path, document: &Value) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let content = serde_json::to_string_pretty(document)
        .map_err(|err| AppError::malformed_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}

/// The JSON shape of a single character, also used for CLI output.
pub fn character_json(character: &Character) -> Value {
    let mut daily = Map::new();
    for (def, state) in character.daily_tasks() {
        let value = match state {
            DailyState::Counted { remaining, .. } => json!(remaining),
            DailyState::Done(done) | DailyState::Shared(done) => json!(done),
            DailyState::DualState(tower) => json!({
                "dailyDone": tower.daily_done,
                "weeklyComplete": tower.weekly_complete,
            }),
        };
        daily.insert(def.id.to_string(), value);
    }

    let mut weekly = Map::new();
    for (def, done) in character.weekly_tasks() {
        weekly.insert(def.id.to_string(), json!(done));
    }

    json!({
        "name": character.name(),
        "dailyTasks": daily,
        "weeklyTasks": weekly,
    })
}

fn encode(store: &TaskStore) -> Value {
    let characters: Vec<Value> = store.characters.iter().map(character_json).collect();
    json!({
        "schemaVersion": SCHEMA_VERSION,
        "characters": characters,
        "selectedCharacter": store.selected,
        "sharedGuildAttendance": store.shared_guild_attendance,
        "lastDailyReset": format_timestamp(store.last_daily_reset),
        "lastWeeklyReset": format_timestamp(store.last_weekly_reset),
    })
}

fn decode(value: &Value, schedule: ResetSchedule) -> Result<TaskStore, AppError> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::malformed_data("store document must be a JSON object"))?;

    if let Some(version) = object.get("schemaVersion").and_then(Value::as_u64)
        && version > SCHEMA_VERSION
    {
        return Err(AppError::malformed_data(format!(
            "schemaVersion {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }

    if object.contains_key("char_data") {
        return Ok(decode_legacy(object, schedule));
    }

    let shared = object
        .get("sharedGuildAttendance")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut characters: Vec<Character> = Vec::new();
    let entries = object.get("characters").and_then(Value::as_array);
    for entry in entries.into_iter().flatten() {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let Some(name) = usable_name(entry.get("name"), &characters) else {
            continue;
        };

        let mut character = Character::fresh(name, shared);
        if let Some(daily) = entry.get("dailyTasks").and_then(Value::as_object) {
            for (key, raw) in daily {
                coerce_daily(&mut character, key, raw);
            }
        }
        if let Some(weekly) = entry.get("weeklyTasks").and_then(Value::as_object) {
            for (key, raw) in weekly {
                coerce_weekly(&mut character, key, raw.as_bool().unwrap_or(false));
            }
        }
        characters.push(character);
    }

    Ok(TaskStore {
        selected: selected_name(object.get("selectedCharacter"), &characters),
        characters,
        shared_guild_attendance: shared,
        last_daily_reset: parse_timestamp(object.get("lastDailyReset"), schedule.offset()),
        last_weekly_reset: parse_timestamp(object.get("lastWeeklyReset"), schedule.offset()),
        schedule,
    })
}

/// Documents exported by the first web version: names in `characters`,
/// per-character state under `char_data`, tasks keyed by in-game label.
fn decode_legacy(object: &Map<String, Value>, schedule: ResetSchedule) -> TaskStore {
    let char_data = object.get("char_data").and_then(Value::as_object);
    let mut shared = false;
    let mut characters: Vec<Character> = Vec::new();

    let names = object.get("characters").and_then(Value::as_array);
    for raw_name in names.into_iter().flatten() {
        let Some(name) = usable_name(Some(raw_name), &characters) else {
            continue;
        };
        let mut character = Character::fresh(name, false);
        let data = char_data
            .and_then(|data| data.get(name))
            .and_then(Value::as_object);

        let daily = data
            .and_then(|data| data.get("daily"))
            .and_then(Value::as_object);
        for (label, entry) in daily.into_iter().flatten() {
            let checked = legacy_flag(entry, "checked");
            let Some(def) = catalog::find_task(label) else {
                continue;
            };
            match (def.kind, character.daily_mut(def.id)) {
                (TaskKind::Shared, _) => shared |= checked,
                (_, Some(DailyState::Counted { remaining, max })) => {
                    *remaining = if checked { 0 } else { *max };
                }
                (_, Some(DailyState::Done(done))) => *done = checked,
                (_, Some(DailyState::DualState(tower))) => {
                    *tower = DualState {
                        daily_done: checked,
                        weekly_complete: legacy_flag(entry, "completed"),
                    };
                }
                _ => {}
            }
        }

        let weekly = data
            .and_then(|data| data.get("weekly"))
            .and_then(Value::as_object);
        for (label, raw) in weekly.into_iter().flatten() {
            coerce_weekly(&mut character, label, raw.as_bool().unwrap_or(false));
        }
        characters.push(character);
    }

    for character in &mut characters {
        character.set_shared(shared);
    }

    TaskStore {
        selected: selected_name(object.get("selected_character"), &characters),
        characters,
        shared_guild_attendance: shared,
        last_daily_reset: parse_timestamp(object.get("last_daily_reset"), schedule.offset()),
        last_weekly_reset: parse_timestamp(object.get("last_weekly_reset"), schedule.offset()),
        schedule,
    }
}

fn usable_name<'a>(raw: Option<&'a Value>, loaded: &[Character]) -> Option<&'a str> {
    let name = raw.and_then(Value::as_str).map(str::trim)?;
    if name.is_empty() || loaded.iter().any(|character| character.name() == name) {
        return None;
    }
    Some(name)
}

fn selected_name(raw: Option<&Value>, characters: &[Character]) -> Option<String> {
    let requested = raw.and_then(Value::as_str).map(str::trim);
    characters
        .iter()
        .find(|character| Some(character.name()) == requested)
        .or_else(|| characters.first())
        .map(|character| character.name().to_string())
}

fn coerce_daily(character: &mut Character, key: &str, raw: &Value) {
    let Some(def) = catalog::find_task(key) else {
        return;
    };
    match character.daily_mut(def.id) {
        Some(DailyState::Counted { remaining, max }) => {
            *remaining = raw
                .as_i64()
                .and_then(|value| u32::try_from(value.clamp(0, i64::from(*max))).ok())
                .unwrap_or(*max);
        }
        Some(DailyState::Done(done)) => *done = raw.as_bool().unwrap_or(false),
        Some(DailyState::DualState(tower)) => {
            *tower = DualState {
                daily_done: legacy_flag(raw, "dailyDone"),
                weekly_complete: legacy_flag(raw, "weeklyComplete"),
            };
        }
        Some(DailyState::Shared(_)) | None => {}
    }
}

fn coerce_weekly(character: &mut Character, key: &str, value: bool) {
    if let Some(def) = catalog::find_task(key)
        && let Some(done) = character.weekly_mut(def.id)
    {
        *done = value;
    }
}

fn legacy_flag(entry: &Value, field: &str) -> bool {
    entry
        .get(field)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn format_timestamp(value: Option<OffsetDateTime>) -> Option<String> {
    value.and_then(|timestamp| timestamp.format(&Rfc3339).ok())
}

/// RFC 3339 first, then a naive ISO datetime read in the reference offset.
/// Anything else counts as "never reset".
fn parse_timestamp(raw: Option<&Value>, offset: UtcOffset) -> Option<OffsetDateTime> {
    let raw = raw.and_then(Value::as_str)?.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }

    PrimitiveDateTime::parse(
        raw,
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
        ),
    )
    .ok()
    .map(|naive| naive.assume_offset(offset))
}

#[cfg(test)]
mod tests {
    use super::{
        SCHEMA_VERSION, load_store, load_store_with_fallback, read_document, save_store,
    };
    use crate::model::{DailyState, DualField};
    use crate::schedule::ResetSchedule;
    use crate::store::{DEFAULT_CHARACTER, TaskStore};
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::OffsetDateTime;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-06-04 12:00:00 +9);

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("homework-{nanos}-{file_name}"))
    }

    fn busy_store() -> TaskStore {
        let mut store = TaskStore::new(ResetSchedule::default(), NOW);
        store.add_character("A").unwrap();
        store.add_character("B").unwrap();
        store.select_character("B").unwrap();
        store.decrement_counted_task("A", "blackHole").unwrap();
        store.toggle_bool_task("B", "partTimeJob").unwrap();
        store.toggle_bool_task("A", "abyssHallOfRuin").unwrap();
        store.set_shared_task(true);
        store
            .set_dual_state("B", DualField::WeeklyComplete, true)
            .unwrap();
        store
    }

    #[test]
    fn round_trip_preserves_observable_state() {
        let store = busy_store();

        let restored = TaskStore::deserialize(&store.serialize(), ResetSchedule::default()).unwrap();

        assert_eq!(restored, store);
    }

    #[test]
    fn serialize_uses_documented_shape() {
        let document = busy_store().serialize();

        assert_eq!(document["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(document["selectedCharacter"], "B");
        assert_eq!(document["sharedGuildAttendance"], true);
        assert_eq!(document["lastDailyReset"], "2025-06-04T12:00:00+09:00");
        assert_eq!(document["characters"][0]["name"], "A");
        assert_eq!(document["characters"][0]["dailyTasks"]["blackHole"], 2);
        assert_eq!(document["characters"][0]["dailyTasks"]["guildAttendance"], true);
        assert_eq!(
            document["characters"][1]["dailyTasks"]["spectralTower"],
            json!({ "dailyDone": false, "weeklyComplete": true })
        );
        assert_eq!(
            document["characters"][0]["weeklyTasks"]["abyssHallOfRuin"],
            true
        );
    }

    #[test]
    fn deserialize_rejects_non_object_document() {
        for document in [json!([]), json!("store"), json!(42), json!(null)] {
            let err = TaskStore::deserialize(&document, ResetSchedule::default()).unwrap_err();
            assert_eq!(err.code(), "malformed_data");
        }
    }

    #[test]
    fn deserialize_rejects_newer_schema() {
        let document = json!({ "schemaVersion": SCHEMA_VERSION + 1, "characters": [] });

        let err = TaskStore::deserialize(&document, ResetSchedule::default()).unwrap_err();

        assert_eq!(err.code(), "malformed_data");
    }

    #[test]
    fn deserialize_coerces_invalid_fields_to_defaults() {
        let document = json!({
            "characters": [
                {
                    "name": " A ",
                    "dailyTasks": {
                        "blackHole": 99,
                        "summoningBarrier": -4,
                        "dayDungeon": "yes",
                        "partTimeJob": true,
                        "guildAttendance": true,
                        "spectralTower": { "dailyDone": 1, "weeklyComplete": true },
                        "unknownTask": true
                    },
                    "weeklyTasks": { "fieldBossPeri": "done", "abyssRewardClaim": true }
                },
                { "name": "A" },
                { "name": "   " },
                "not an object",
                { "name": "B", "dailyTasks": [] }
            ],
            "sharedGuildAttendance": "true",
            "selectedCharacter": "missing",
            "lastDailyReset": "yesterday",
            "lastWeeklyReset": 12
        });

        let store = TaskStore::deserialize(&document, ResetSchedule::default()).unwrap();
        let a = store.character("A").unwrap();
        let b = store.character("B").unwrap();

        assert_eq!(store.characters().len(), 2);
        assert_eq!(a.remaining("blackHole"), Some(3));
        assert_eq!(a.remaining("summoningBarrier"), Some(0));
        assert_eq!(a.daily("dayDungeon"), Some(DailyState::Done(false)));
        assert_eq!(a.daily("partTimeJob"), Some(DailyState::Done(true)));
        assert!(!a.guild_attendance());
        assert!(!a.spectral_tower().daily_done);
        assert!(a.spectral_tower().weekly_complete);
        assert_eq!(a.weekly("fieldBossPeri"), Some(false));
        assert_eq!(a.weekly("abyssRewardClaim"), Some(true));
        assert_eq!(b.remaining("blackHole"), Some(3));
        assert!(!store.shared_guild_attendance());
        assert_eq!(store.selected_character().unwrap().name(), "A");
        assert_eq!(store.last_daily_reset(), None);
        assert_eq!(store.last_weekly_reset(), None);
    }

    #[test]
    fn deserialize_accepts_empty_object() {
        let store = TaskStore::deserialize(&json!({}), ResetSchedule::default()).unwrap();

        assert!(store.characters().is_empty());
        assert!(store.selected_character().is_none());
        assert_eq!(store.last_daily_reset(), None);
    }

    #[test]
    fn deserialize_reads_naive_timestamps_in_reference_offset() {
        let document = json!({
            "characters": [],
            "lastDailyReset": "2025-06-04T07:30:00.123456",
            "lastWeeklyReset": "2025-06-02T06:00:00"
        });

        let store = TaskStore::deserialize(&document, ResetSchedule::default()).unwrap();

        assert_eq!(
            store.last_daily_reset(),
            Some(datetime!(2025-06-04 07:30:00.123456 +9))
        );
        assert_eq!(
            store.last_weekly_reset(),
            Some(datetime!(2025-06-02 06:00:00 +9))
        );
    }

    #[test]
    fn deserialize_converts_legacy_documents() {
        let document = json!({
            "version": "0.001",
            "last_daily_reset": "2025-06-04T07:00:00",
            "last_weekly_reset": "2025-06-02T06:10:00",
            "characters": ["캐릭터1", "부캐"],
            "selected_character": "부캐",
            "char_data": {
                "캐릭터1": {
                    "daily": {
                        "불길한 소환의 결계": { "limit": 2, "checked": true },
                        "검은 구멍": { "limit": 3, "checked": false },
                        "요일던전": { "limit": 1, "checked": true },
                        "길드 출석": { "limit": 1, "checked": true, "shared": true },
                        "망령의 탑": { "limit": 1, "checked": true, "completed": true }
                    },
                    "weekly": { "레이드 - 글라스기브넨": true }
                },
                "부캐": {
                    "daily": {
                        "길드 출석": { "limit": 1, "checked": true, "shared": true }
                    }
                }
            }
        });

        let store = TaskStore::deserialize(&document, ResetSchedule::default()).unwrap();
        let main = store.character("캐릭터1").unwrap();
        let alt = store.character("부캐").unwrap();

        assert_eq!(main.remaining("summoningBarrier"), Some(0));
        assert_eq!(main.remaining("blackHole"), Some(3));
        assert_eq!(main.daily("dayDungeon"), Some(DailyState::Done(true)));
        assert!(main.spectral_tower().daily_done);
        assert!(main.spectral_tower().weekly_complete);
        assert_eq!(main.weekly("raidGlasGhaibhleann"), Some(true));
        assert!(store.shared_guild_attendance());
        assert!(alt.guild_attendance());
        assert_eq!(alt.remaining("summoningBarrier"), Some(2));
        assert_eq!(store.selected_character().unwrap().name(), "부캐");
        assert_eq!(
            store.last_daily_reset(),
            Some(datetime!(2025-06-04 07:00:00 +9))
        );
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("store.json");
        let store = busy_store();

        save_store(&path, &store).unwrap();
        let loaded = load_store(&path, ResetSchedule::default(), NOW).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, store);
    }

    #[test]
    fn load_store_missing_file_returns_seeded_store() {
        let path = temp_path("missing-store.json");

        let store = load_store(&path, ResetSchedule::default(), NOW).unwrap();

        assert_eq!(store.characters().len(), 1);
        assert_eq!(store.characters()[0].name(), DEFAULT_CHARACTER);
    }

    #[test]
    fn load_store_rejects_invalid_json() {
        let path = temp_path("invalid-store.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_store(&path, ResetSchedule::default(), NOW).unwrap_err();
        let fallback = load_store_with_fallback(&path, ResetSchedule::default(), NOW).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "malformed_data");
        assert_eq!(fallback.error.map(|err| err.code()), Some("malformed_data"));
        assert_eq!(
            fallback.store,
            TaskStore::seeded(ResetSchedule::default(), NOW)
        );
    }

    #[test]
    fn read_document_reports_missing_file_as_io_error() {
        let path = temp_path("absent.json");

        let err = read_document(&path).unwrap_err();

        assert_eq!(err.code(), "io_error");
    }
}
