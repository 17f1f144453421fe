//! Call table rows

use chrono::Local;

use crate::api::{CallRecord, CallStatus};

/// Visual status indicator class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeClass {
    Success,
    Danger,
    Warning,
}

impl BadgeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
        }
    }
}

/// `completed` is success, `failed` is danger, everything else is warning.
pub fn badge_class(status: &CallStatus) -> BadgeClass {
    match status {
        CallStatus::Completed => BadgeClass::Success,
        CallStatus::Failed => BadgeClass::Danger,
        _ => BadgeClass::Warning,
    }
}

/// Action offered on a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Retry,
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Retry => "Retry",
        }
    }
}

/// One rendered call row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub call_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub created_at: String,
    pub status: String,
    pub duration: String,
    pub badge: BadgeClass,
    pub actions: Vec<RowAction>,
}

impl RowView {
    pub fn can_retry(&self) -> bool {
        self.actions.contains(&RowAction::Retry)
    }
}

/// Render calls to rows, preserving the server's order.
pub fn render(calls: &[CallRecord]) -> Vec<RowView> {
    calls.iter().map(render_row).collect()
}

fn render_row(call: &CallRecord) -> RowView {
    let mut actions = vec![RowAction::View];
    if call.status.is_failed() {
        actions.push(RowAction::Retry);
    }

    RowView {
        call_id: call.call_id.clone(),
        customer_name: call.customer_name.clone(),
        customer_phone: call.customer_phone.clone(),
        created_at: call
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        status: call.status.label(),
        duration: format_duration(call.duration_or_zero()),
        badge: badge_class(&call.status),
        actions,
    }
}

pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn call(id: &str, status: CallStatus) -> CallRecord {
        CallRecord {
            call_id: id.to_string(),
            customer_name: "Ada".to_string(),
            customer_phone: "+15550100".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap(),
            status,
            duration_seconds: None,
        }
    }

    #[test]
    fn retry_is_offered_only_for_failed_calls() {
        let statuses = [
            CallStatus::Initiated,
            CallStatus::Connected,
            CallStatus::Completed,
            CallStatus::Failed,
            CallStatus::Other("ended".to_string()),
        ];

        for status in statuses {
            let expect_retry = status == CallStatus::Failed;
            let row = &render(&[call("c", status.clone())])[0];
            assert_eq!(row.can_retry(), expect_retry, "status {}", status);
            assert_eq!(row.actions[0], RowAction::View);
        }
    }

    #[test]
    fn unlisted_statuses_fall_into_the_warning_bucket() {
        assert_eq!(badge_class(&CallStatus::Completed), BadgeClass::Success);
        assert_eq!(badge_class(&CallStatus::Failed), BadgeClass::Danger);
        assert_eq!(badge_class(&CallStatus::Initiated), BadgeClass::Warning);
        assert_eq!(badge_class(&CallStatus::Connected), BadgeClass::Warning);
        assert_eq!(
            badge_class(&CallStatus::Other("ended".to_string())),
            BadgeClass::Warning
        );
        assert_eq!(BadgeClass::Warning.as_str(), "warning");
    }

    #[test]
    fn rows_keep_input_order() {
        let calls = vec![
            call("z", CallStatus::Completed),
            call("a", CallStatus::Failed),
            call("m", CallStatus::Connected),
        ];
        let ids: Vec<_> = render(&calls).into_iter().map(|r| r.call_id).collect();
        assert_eq!(ids, ["z", "a", "m"]);
    }

    #[test]
    fn missing_duration_displays_as_zero() {
        let row = &render(&[call("c", CallStatus::Completed)])[0];
        assert_eq!(row.duration, "0:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }
}
