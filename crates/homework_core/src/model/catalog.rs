//! The fixed task catalog. Ids are stable storage keys; labels are the
//! in-game names shown to players.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Counted { max: u32 },
    Boolean,
    Shared,
    DualState,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Counted { .. } => "counted",
            Self::Boolean => "boolean",
            Self::Shared => "shared",
            Self::DualState => "dual-state",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDef {
    pub id: &'static str,
    pub label: &'static str,
    pub cadence: Cadence,
    pub kind: TaskKind,
}

impl TaskDef {
    const fn daily(id: &'static str, label: &'static str, kind: TaskKind) -> Self {
        Self {
            id,
            label,
            cadence: Cadence::Daily,
            kind,
        }
    }

    const fn weekly(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            cadence: Cadence::Weekly,
            kind: TaskKind::Boolean,
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim();
        self.id.eq_ignore_ascii_case(key) || self.label == key
    }
}

pub const GUILD_ATTENDANCE: &str = "guildAttendance";
pub const SPECTRAL_TOWER: &str = "spectralTower";

pub static DAILY_TASKS: [TaskDef; 6] = [
    TaskDef::daily(
        "summoningBarrier",
        "불길한 소환의 결계",
        TaskKind::Counted { max: 2 },
    ),
    TaskDef::daily("blackHole", "검은 구멍", TaskKind::Counted { max: 3 }),
    TaskDef::daily("dayDungeon", "요일던전", TaskKind::Boolean),
    TaskDef::daily("partTimeJob", "아르바이트[오후]", TaskKind::Boolean),
    TaskDef::daily(GUILD_ATTENDANCE, "길드 출석", TaskKind::Shared),
    TaskDef::daily(SPECTRAL_TOWER, "망령의 탑", TaskKind::DualState),
];

pub static WEEKLY_TASKS: [TaskDef; 9] = [
    TaskDef::weekly("abyssSunkenRuins", "어비스 - 가라앉은 유적"),
    TaskDef::weekly("abyssCollapsedAltar", "어비스 - 무너진 제단"),
    TaskDef::weekly("abyssHallOfRuin", "어비스 - 파멸의 전당"),
    TaskDef::weekly("raidGlasGhaibhleann", "레이드 - 글라스기브넨"),
    TaskDef::weekly("fieldBossPeri", "필드보스 - 페리"),
    TaskDef::weekly("fieldBossCrabbachair", "필드보스 - 크라브네흐"),
    TaskDef::weekly("fieldBossCrama", "필드보스 - 크라마"),
    TaskDef::weekly("fieldBossExchange", "필드보스 재화 교환"),
    TaskDef::weekly("abyssRewardClaim", "어비스 보상 수령"),
];

/// Looks a task up by id (case-insensitive) or by its in-game label.
pub fn find_task(key: &str) -> Option<&'static TaskDef> {
    DAILY_TASKS
        .iter()
        .chain(WEEKLY_TASKS.iter())
        .find(|def| def.matches(key))
}

#[cfg(test)]
mod tests {
    use super::{
        Cadence, DAILY_TASKS, GUILD_ATTENDANCE, SPECTRAL_TOWER, TaskKind, WEEKLY_TASKS, find_task,
    };
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_are_unique() {
        let ids: HashSet<&str> = DAILY_TASKS
            .iter()
            .chain(WEEKLY_TASKS.iter())
            .map(|def| def.id)
            .collect();

        assert_eq!(ids.len(), DAILY_TASKS.len() + WEEKLY_TASKS.len());
    }

    #[test]
    fn catalog_has_exactly_one_shared_and_one_dual_state_task() {
        let shared: Vec<_> = DAILY_TASKS
            .iter()
            .filter(|def| def.kind == TaskKind::Shared)
            .collect();
        let dual: Vec<_> = DAILY_TASKS
            .iter()
            .filter(|def| def.kind == TaskKind::DualState)
            .collect();

        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].id, GUILD_ATTENDANCE);
        assert_eq!(dual.len(), 1);
        assert_eq!(dual[0].id, SPECTRAL_TOWER);
    }

    #[test]
    fn find_task_accepts_ids_and_labels() {
        let by_id = find_task("blackhole").unwrap();
        let by_label = find_task("검은 구멍").unwrap();

        assert_eq!(by_id.id, "blackHole");
        assert_eq!(by_id, by_label);
        assert_eq!(by_id.kind, TaskKind::Counted { max: 3 });

        let weekly = find_task(" 필드보스 - 페리 ").unwrap();
        assert_eq!(weekly.cadence, Cadence::Weekly);
        assert!(find_task("unknown").is_none());
    }
}
