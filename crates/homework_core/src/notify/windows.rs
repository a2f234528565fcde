use crate::error::AppError;
use crate::notify::{Notifier, ResetNotice};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, notice: &ResetNotice) -> Result<(), AppError> {
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID).title(notice.title);
        if let Some(first) = notice.lines.first() {
            toast = toast.text1(first);
        }
        if let Some(second) = notice.lines.get(1) {
            toast = toast.text2(second);
        }

        toast.show().map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
