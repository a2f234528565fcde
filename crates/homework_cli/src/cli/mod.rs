use clap::{Parser, Subcommand, ValueEnum};
use homework_core::config::ConfigOverrides;
use homework_core::error::AppError;
use homework_core::model::DualField;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new character
    ///
    /// Example: homework add "부캐"
    Add { name: Option<String> },
    /// Rename a character, keeping its checklist
    ///
    /// Example: homework rename "캐릭터1" "본캐"
    Rename { old_name: String, new_name: String },
    /// Remove a character and its checklist
    ///
    /// Example: homework remove "부캐"
    Remove { name: String },
    /// Choose the character commands act on by default
    ///
    /// Example: homework select "본캐"
    Select { name: String },
    /// List all characters
    ///
    /// Example: homework roster
    Roster,
    /// Show a character's daily and weekly checklist
    ///
    /// Example: homework show
    /// Example: homework show "부캐"
    Show { name: Option<String> },
    /// Flip a daily or weekly done/not-done task
    ///
    /// Example: homework toggle dayDungeon
    /// Example: homework toggle "필드보스 - 페리" -c "부캐"
    Toggle {
        task: String,
        #[arg(short = 'c', long)]
        character: Option<String>,
    },
    /// Use one run of a counted task
    ///
    /// Example: homework use blackHole
    Use {
        task: String,
        #[arg(short = 'c', long)]
        character: Option<String>,
    },
    /// Give back one run of a counted task
    ///
    /// Example: homework undo blackHole
    Undo {
        task: String,
        #[arg(short = 'c', long)]
        character: Option<String>,
    },
    /// Set guild attendance for every character
    ///
    /// Example: homework guild on
    Guild { state: Switch },
    /// Set the spectral tower's daily or weekly flag
    ///
    /// Example: homework tower weekly on
    /// Example: homework tower daily off -c "부캐"
    Tower {
        field: TowerField,
        state: Switch,
        #[arg(short = 'c', long)]
        character: Option<String>,
    },
    /// Reset daily or weekly tasks now
    ///
    /// Example: homework reset daily
    Reset { kind: ResetKind },
    /// Apply any scheduled resets that are due
    ///
    /// Example: homework check
    Check,
    /// Write the whole roster as JSON
    ///
    /// Example: homework export -o backup.json
    Export {
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Replace the roster with a previously exported JSON file
    ///
    /// Example: homework import backup.json
    Import { path: PathBuf },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowerField {
    Daily,
    Weekly,
}

impl From<TowerField> for DualField {
    fn from(field: TowerField) -> Self {
        match field {
            TowerField::Daily => DualField::DailyDone,
            TowerField::Weekly => DualField::WeeklyComplete,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Daily,
    Weekly,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    DailyResetHour,
    WeeklyResetWeekday,
    WeeklyResetHour,
    UtcOffset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    if value.is_empty() {
        return Err("override value cannot be empty".to_string());
    }

    let canonical_field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "daily_reset_hour" | "daily_hour" => ConfigOverrideTarget::DailyResetHour,
        "weekly_reset_weekday" | "weekly_weekday" | "weekday" => {
            ConfigOverrideTarget::WeeklyResetWeekday
        }
        "weekly_reset_hour" | "weekly_hour" => ConfigOverrideTarget::WeeklyResetHour,
        "utc_offset" | "offset" => ConfigOverrideTarget::UtcOffset,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Collects every `--config-override` into typed overrides. Later values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)
            .map_err(|message| AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: {message}")))?;
        match parsed.target {
            ConfigOverrideTarget::DailyResetHour => {
                overrides.daily_reset_hour = Some(parse_hour(&parsed.value)?);
            }
            ConfigOverrideTarget::WeeklyResetWeekday => {
                overrides.weekly_reset_weekday = Some(parsed.value);
            }
            ConfigOverrideTarget::WeeklyResetHour => {
                overrides.weekly_reset_hour = Some(parse_hour(&parsed.value)?);
            }
            ConfigOverrideTarget::UtcOffset => overrides.utc_offset = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn parse_hour(value: &str) -> Result<u8, AppError> {
    value.parse::<u8>().map_err(|_| {
        AppError::invalid_input(format!("{CONFIG_OVERRIDE_FLAG}: '{value}' is not an hour"))
    })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
