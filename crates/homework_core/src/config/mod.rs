use crate::error::AppError;
use crate::schedule::ResetSchedule;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{UtcOffset, Weekday};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "HOMEWORK_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daily_reset_hour: u8,
    pub weekly_reset_weekday: String,
    pub weekly_reset_hour: u8,
    pub utc_offset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_reset_hour: 6,
            weekly_reset_weekday: "monday".to_string(),
            weekly_reset_hour: 6,
            utc_offset: "+09:00".to_string(),
        }
    }
}

impl Config {
    pub fn schedule(&self) -> Result<ResetSchedule, AppError> {
        let weekday = canonical_weekday(&self.weekly_reset_weekday).ok_or_else(|| {
            AppError::invalid_input(format!(
                "unknown weekday '{}'",
                self.weekly_reset_weekday
            ))
        })?;
        let offset = parse_utc_offset(&self.utc_offset)?;
        ResetSchedule::new(
            self.daily_reset_hour,
            weekday,
            self.weekly_reset_hour,
            offset,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub daily_reset_hour: Option<u8>,
    pub weekly_reset_weekday: Option<String>,
    pub weekly_reset_hour: Option<u8>,
    pub utc_offset: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::io("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("homework")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::io("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("homework")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_input(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config
        .schedule()
        .map_err(|err| AppError::invalid_input(format!("{}: {}", path.display(), err.message())))?;
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(hour) = overrides.daily_reset_hour {
        merged.daily_reset_hour = hour;
    }
    if let Some(weekday) = overrides.weekly_reset_weekday.as_ref() {
        merged.weekly_reset_weekday = weekday.clone();
    }
    if let Some(hour) = overrides.weekly_reset_hour {
        merged.weekly_reset_hour = hour;
    }
    if let Some(offset) = overrides.utc_offset.as_ref() {
        merged.utc_offset = offset.clone();
    }
    merged
}

pub fn canonical_weekday(raw: &str) -> Option<Weekday> {
    let cleaned = raw.trim().to_lowercase();
    let weekday = match cleaned.as_str() {
        "monday" | "mon" | "월" | "월요일" => Weekday::Monday,
        "tuesday" | "tue" | "화" | "화요일" => Weekday::Tuesday,
        "wednesday" | "wed" | "수" | "수요일" => Weekday::Wednesday,
        "thursday" | "thu" | "목" | "목요일" => Weekday::Thursday,
        "friday" | "fri" | "금" | "금요일" => Weekday::Friday,
        "saturday" | "sat" | "토" | "토요일" => Weekday::Saturday,
        "sunday" | "sun" | "일" | "일요일" => Weekday::Sunday,
        _ => return None,
    };
    Some(weekday)
}

/// Accepts `+09:00`-style offsets, `+9`, `UTC`/`Z`, or `local` for the
/// machine's current offset.
pub fn parse_utc_offset(raw: &str) -> Result<UtcOffset, AppError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(UtcOffset::UTC);
    }
    if trimmed.eq_ignore_ascii_case("local") {
        return local_offset(UtcOffset::current_local_offset().ok());
    }

    UtcOffset::parse(
        trimmed,
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .or_else(|_| {
        UtcOffset::parse(
            trimmed,
            format_description!("[offset_hour sign:mandatory padding:none]"),
        )
    })
    .map_err(|_| AppError::invalid_input(format!("invalid utc offset '{trimmed}'")))
}

fn local_offset(detected: Option<UtcOffset>) -> Result<UtcOffset, AppError> {
    detected.ok_or_else(|| {
        AppError::invalid_input(
            "local utc offset cannot be determined, set utc_offset explicitly",
        )
    })
}
