use crate::model::catalog::{
    DAILY_TASKS, GUILD_ATTENDANCE, SPECTRAL_TOWER, TaskDef, TaskKind, WEEKLY_TASKS,
};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DualState {
    pub daily_done: bool,
    pub weekly_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualField {
    DailyDone,
    WeeklyComplete,
}

impl DualField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::DailyDone => "dailyDone",
            Self::WeeklyComplete => "weeklyComplete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyState {
    Counted { remaining: u32, max: u32 },
    Done(bool),
    Shared(bool),
    DualState(DualState),
}

impl DailyState {
    pub fn fresh(kind: TaskKind, shared: bool) -> Self {
        match kind {
            TaskKind::Counted { max } => Self::Counted { remaining: max, max },
            TaskKind::Boolean => Self::Done(false),
            TaskKind::Shared => Self::Shared(shared),
            TaskKind::DualState => Self::DualState(DualState::default()),
        }
    }

    fn reset_daily(&mut self) {
        match self {
            Self::Counted { remaining, max } => *remaining = *max,
            Self::Done(done) | Self::Shared(done) => *done = false,
            Self::DualState(state) => {
                if !state.weekly_complete {
                    state.daily_done = false;
                }
            }
        }
    }
}

/// One player character and its checklist. Every catalog task always has an
/// entry, so lookups by catalog id never miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    name: String,
    daily: BTreeMap<&'static str, DailyState>,
    weekly: BTreeMap<&'static str, bool>,
}

impl Character {
    pub(crate) fn fresh(name: &str, shared: bool) -> Self {
        Self {
            name: name.to_string(),
            daily: DAILY_TASKS
                .iter()
                .map(|def| (def.id, DailyState::fresh(def.kind, shared)))
                .collect(),
            weekly: WEEKLY_TASKS.iter().map(|def| (def.id, false)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn daily(&self, id: &str) -> Option<DailyState> {
        self.daily.get(id).copied()
    }

    pub fn weekly(&self, id: &str) -> Option<bool> {
        self.weekly.get(id).copied()
    }

    /// Daily tasks in catalog order.
    pub fn daily_tasks(&self) -> impl Iterator<Item = (&'static TaskDef, DailyState)> + '_ {
        DAILY_TASKS
            .iter()
            .filter_map(|def| self.daily(def.id).map(|state| (def, state)))
    }

    /// Weekly tasks in catalog order.
    pub fn weekly_tasks(&self) -> impl Iterator<Item = (&'static TaskDef, bool)> + '_ {
        WEEKLY_TASKS
            .iter()
            .filter_map(|def| self.weekly(def.id).map(|done| (def, done)))
    }

    pub fn remaining(&self, id: &str) -> Option<u32> {
        match self.daily(id)? {
            DailyState::Counted { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    pub fn spectral_tower(&self) -> DualState {
        match self.daily(SPECTRAL_TOWER) {
            Some(DailyState::DualState(state)) => state,
            _ => DualState::default(),
        }
    }

    pub fn guild_attendance(&self) -> bool {
        matches!(self.daily(GUILD_ATTENDANCE), Some(DailyState::Shared(true)))
    }

    pub(crate) fn daily_mut(&mut self, id: &str) -> Option<&mut DailyState> {
        self.daily.get_mut(id)
    }

    pub(crate) fn weekly_mut(&mut self, id: &str) -> Option<&mut bool> {
        self.weekly.get_mut(id)
    }

    pub(crate) fn set_shared(&mut self, value: bool) {
        for state in self.daily.values_mut() {
            if let DailyState::Shared(done) = state {
                *done = value;
            }
        }
    }

    pub(crate) fn apply_daily_reset(&mut self) {
        for state in self.daily.values_mut() {
            state.reset_daily();
        }
    }

    pub(crate) fn apply_weekly_reset(&mut self) {
        for done in self.weekly.values_mut() {
            *done = false;
        }
        if let Some(DailyState::DualState(state)) = self.daily.get_mut(SPECTRAL_TOWER) {
            state.weekly_complete = false;
        }
    }
}
