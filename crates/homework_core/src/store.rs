use crate::error::AppError;
use crate::model::catalog::{self, Cadence, TaskDef, TaskKind};
use crate::model::{Character, DailyState, DualField, DualState};
use crate::schedule::ResetSchedule;
use time::OffsetDateTime;

pub const DEFAULT_CHARACTER: &str = "캐릭터1";

/// Which resets a call applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    pub daily: bool,
    pub weekly: bool,
}

impl ResetOutcome {
    pub fn fired(&self) -> bool {
        self.daily || self.weekly
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskView<'a> {
    NoCharacters,
    Board(&'a Character),
}

/// The whole roster plus roster-level reset bookkeeping.
///
/// Every mutating method validates its inputs before touching state, so a
/// returned error always means nothing changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStore {
    pub(crate) schedule: ResetSchedule,
    pub(crate) characters: Vec<Character>,
    pub(crate) selected: Option<String>,
    pub(crate) shared_guild_attendance: bool,
    pub(crate) last_daily_reset: Option<OffsetDateTime>,
    pub(crate) last_weekly_reset: Option<OffsetDateTime>,
}

impl TaskStore {
    pub fn new(schedule: ResetSchedule, now: OffsetDateTime) -> Self {
        Self {
            schedule,
            characters: Vec::new(),
            selected: None,
            shared_guild_attendance: false,
            last_daily_reset: Some(now),
            last_weekly_reset: Some(now),
        }
    }

    /// A new store holding the default starter character.
    pub fn seeded(schedule: ResetSchedule, now: OffsetDateTime) -> Self {
        let mut store = Self::new(schedule, now);
        store
            .characters
            .push(Character::fresh(DEFAULT_CHARACTER, false));
        store.selected = Some(DEFAULT_CHARACTER.to_string());
        store
    }

    pub fn schedule(&self) -> &ResetSchedule {
        &self.schedule
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn shared_guild_attendance(&self) -> bool {
        self.shared_guild_attendance
    }

    pub fn last_daily_reset(&self) -> Option<OffsetDateTime> {
        self.last_daily_reset
    }

    pub fn last_weekly_reset(&self) -> Option<OffsetDateTime> {
        self.last_weekly_reset
    }

    pub fn character(&self, name: &str) -> Result<&Character, AppError> {
        let index = self.index_of(name)?;
        Ok(&self.characters[index])
    }

    pub fn selected_character(&self) -> Option<&Character> {
        let selected = self.selected.as_deref()?;
        self.characters
            .iter()
            .find(|character| character.name() == selected)
    }

    /// Resolves the checklist to show. `None` means the selected character.
    pub fn board(&self, name: Option<&str>) -> Result<TaskView<'_>, AppError> {
        if self.characters.is_empty() {
            return Ok(TaskView::NoCharacters);
        }

        match name {
            Some(name) => Ok(TaskView::Board(self.character(name)?)),
            None => Ok(self
                .selected_character()
                .or_else(|| self.characters.first())
                .map_or(TaskView::NoCharacters, TaskView::Board)),
        }
    }

    pub fn add_character(&mut self, name: &str) -> Result<String, AppError> {
        let trimmed = validated_name(name)?;
        if self.position(trimmed).is_some() {
            return Err(AppError::duplicate_name(format!(
                "character '{trimmed}' already exists"
            )));
        }

        self.characters
            .push(Character::fresh(trimmed, self.shared_guild_attendance));
        self.selected = Some(trimmed.to_string());

        Ok(trimmed.to_string())
    }

    pub fn rename_character(&mut self, old_name: &str, new_name: &str) -> Result<String, AppError> {
        let index = self.index_of(old_name)?;
        let trimmed = validated_name(new_name)?;
        let current = self.characters[index].name().to_string();
        if current == trimmed {
            return Ok(current);
        }
        if self.position(trimmed).is_some() {
            return Err(AppError::duplicate_name(format!(
                "character '{trimmed}' already exists"
            )));
        }

        self.characters[index].set_name(trimmed);
        if self.selected.as_deref() == Some(current.as_str()) {
            self.selected = Some(trimmed.to_string());
        }

        Ok(trimmed.to_string())
    }

    pub fn remove_character(&mut self, name: &str) -> Result<Character, AppError> {
        let index = self.index_of(name)?;
        let removed = self.characters.remove(index);

        if self.selected.as_deref() == Some(removed.name()) {
            self.selected = self
                .characters
                .first()
                .map(|character| character.name().to_string());
        }

        Ok(removed)
    }

    pub fn select_character(&mut self, name: &str) -> Result<&Character, AppError> {
        let index = self.index_of(name)?;
        self.selected = Some(self.characters[index].name().to_string());
        Ok(&self.characters[index])
    }

    /// Flips a boolean task and returns its new value. Writing the shared task
    /// through any character flips the roster-level flag for everyone.
    pub fn toggle_bool_task(&mut self, character: &str, task: &str) -> Result<bool, AppError> {
        let index = self.index_of(character)?;
        let def = resolve_task(task)?;

        match (def.cadence, def.kind) {
            (Cadence::Weekly, _) => {
                let done = self.characters[index]
                    .weekly_mut(def.id)
                    .ok_or_else(|| wrong_kind(def, "boolean"))?;
                *done = !*done;
                Ok(*done)
            }
            (Cadence::Daily, TaskKind::Shared) => {
                let value = !self.shared_guild_attendance;
                self.set_shared_task(value);
                Ok(value)
            }
            (Cadence::Daily, _) => match self.characters[index].daily_mut(def.id) {
                Some(DailyState::Done(done)) => {
                    *done = !*done;
                    Ok(*done)
                }
                _ => Err(wrong_kind(def, "boolean")),
            },
        }
    }

    /// Uses one completion of a counted task. Already exhausted tasks stay at 0.
    pub fn decrement_counted_task(&mut self, character: &str, task: &str) -> Result<u32, AppError> {
        let (remaining, _) = self.counted_mut(character, task)?;
        *remaining = remaining.saturating_sub(1);
        Ok(*remaining)
    }

    /// Gives back one completion, never exceeding the task's maximum.
    pub fn increment_counted_task(&mut self, character: &str, task: &str) -> Result<u32, AppError> {
        let (remaining, max) = self.counted_mut(character, task)?;
        *remaining = (*remaining + 1).min(max);
        Ok(*remaining)
    }

    pub fn set_shared_task(&mut self, value: bool) {
        self.shared_guild_attendance = value;
        for character in &mut self.characters {
            character.set_shared(value);
        }
    }

    pub fn set_dual_state(
        &mut self,
        character: &str,
        field: DualField,
        value: bool,
    ) -> Result<DualState, AppError> {
        let index = self.index_of(character)?;
        match self.characters[index].daily_mut(catalog::SPECTRAL_TOWER) {
            Some(DailyState::DualState(state)) => {
                match field {
                    DualField::DailyDone => state.daily_done = value,
                    DualField::WeeklyComplete => state.weekly_complete = value,
                }
                Ok(*state)
            }
            _ => Err(AppError::invalid_task_kind(format!(
                "'{}' is not a dual-state task",
                catalog::SPECTRAL_TOWER
            ))),
        }
    }

    /// Applies whichever scheduled resets are due. Daily runs before weekly, so
    /// a tower cleared on the same call keeps its daily flag until the next day.
    pub fn check_and_apply_resets(&mut self, now: OffsetDateTime) -> ResetOutcome {
        let outcome = ResetOutcome {
            daily: self
                .schedule
                .is_daily_reset_due(now, self.last_daily_reset),
            weekly: self
                .schedule
                .is_weekly_reset_due(now, self.last_weekly_reset),
        };

        if outcome.daily {
            self.manual_daily_reset(now);
        }
        if outcome.weekly {
            self.manual_weekly_reset(now);
        }

        outcome
    }

    pub fn manual_daily_reset(&mut self, now: OffsetDateTime) {
        self.shared_guild_attendance = false;
        for character in &mut self.characters {
            character.apply_daily_reset();
        }
        self.last_daily_reset = advance(self.last_daily_reset, now);
    }

    pub fn manual_weekly_reset(&mut self, now: OffsetDateTime) {
        for character in &mut self.characters {
            character.apply_weekly_reset();
        }
        self.last_weekly_reset = advance(self.last_weekly_reset, now);
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.characters
            .iter()
            .position(|character| character.name() == name)
    }

    fn index_of(&self, name: &str) -> Result<usize, AppError> {
        self.position(name)
            .ok_or_else(|| AppError::not_found(format!("character '{}' not found", name.trim())))
    }

    fn counted_mut(&mut self, character: &str, task: &str) -> Result<(&mut u32, u32), AppError> {
        let index = self.index_of(character)?;
        let def = resolve_task(task)?;
        match self.characters[index].daily_mut(def.id) {
            Some(DailyState::Counted { remaining, max }) => Ok((remaining, *max)),
            _ => Err(wrong_kind(def, "counted")),
        }
    }
}

fn validated_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::duplicate_name("character name is required"));
    }
    Ok(trimmed)
}

fn resolve_task(task: &str) -> Result<&'static TaskDef, AppError> {
    catalog::find_task(task)
        .ok_or_else(|| AppError::not_found(format!("task '{}' not found", task.trim())))
}

fn wrong_kind(def: &TaskDef, expected: &str) -> AppError {
    AppError::invalid_task_kind(format!(
        "'{}' is a {} task, not {expected}",
        def.id,
        def.kind.name()
    ))
}

fn advance(last: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<OffsetDateTime> {
    match last {
        Some(last) if last > now => Some(last),
        _ => Some(now),
    }
}
