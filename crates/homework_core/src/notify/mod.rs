use crate::error::AppError;
use crate::store::ResetOutcome;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "HOMEWORK_DISABLE_NOTIFICATIONS";
pub const NOTICE_TITLE: &str = "homework";

/// The user-facing text for a reset that just happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetNotice {
    pub title: &'static str,
    pub lines: Vec<&'static str>,
}

impl ResetNotice {
    pub fn from_outcome(outcome: ResetOutcome) -> Option<Self> {
        if !outcome.fired() {
            return None;
        }

        let mut lines = Vec::new();
        if outcome.daily {
            lines.push("일일 숙제가 초기화되었습니다.");
        }
        if outcome.weekly {
            lines.push("주간 숙제가 초기화되었습니다.");
        }

        Some(Self {
            title: NOTICE_TITLE,
            lines,
        })
    }

    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

pub trait Notifier {
    fn notify(&self, notice: &ResetNotice) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notice: &ResetNotice) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidInput(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_input(
        "notifications are not supported on this platform",
    ))
}
