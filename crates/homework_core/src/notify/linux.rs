use crate::error::AppError;
use crate::notify::{Notifier, ResetNotice};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, notice: &ResetNotice) -> Result<(), AppError> {
        Notification::new()
            .summary(notice.title)
            .body(&notice.body())
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
