//! Single-call detail view

use chrono::{DateTime, Local, Utc};

use crate::api::{CallApi, CallRecordDetail};
use crate::view::table::{badge_class, format_duration, BadgeClass};
use crate::Result;

/// Shown in place of any missing optional value
pub const PLACEHOLDER: &str = "-";

/// A labelled value in the detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub label: &'static str,
    pub value: String,
}

/// Two-section detail layout plus optional summary, transcript and event timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub call_id: String,
    pub badge: BadgeClass,
    pub basic: Vec<DetailField>,
    pub additional: Vec<DetailField>,
    pub summary: Option<String>,
    pub transcript: Option<String>,
    pub timeline: Vec<DetailField>,
}

/// Fetch a call and build its detail view.
///
/// On failure no view is produced, so callers cannot open an empty modal.
pub async fn load_detail<A: CallApi + ?Sized>(api: &A, call_id: &str) -> Result<DetailView> {
    let detail = api.fetch_call_detail(call_id).await?;
    Ok(DetailView::from_detail(&detail))
}

impl DetailView {
    pub fn from_detail(detail: &CallRecordDetail) -> Self {
        let record = &detail.record;

        let basic = vec![
            field("Call ID", Some(record.call_id.as_str())),
            field("Customer", Some(record.customer_name.as_str())),
            field("Phone", Some(record.customer_phone.as_str())),
            field("Email", detail.email.as_deref()),
            field("Status", Some(record.status.label().as_str())),
            field(
                "Duration",
                Some(format_duration(record.duration_or_zero()).as_str()),
            ),
        ];

        let additional = vec![
            field("Room Name", detail.room_name.as_deref()),
            field("Dispatch ID", detail.dispatch_id.as_deref()),
            field("Query", detail.query.as_deref()),
            field("Created", Some(localized(record.created_at).as_str())),
            field("Started", detail.call_started_at.map(localized).as_deref()),
            field("Ended", detail.call_ended_at.map(localized).as_deref()),
            field("Recording", detail.recording_url.as_deref()),
        ];

        let timeline = detail
            .events
            .iter()
            .map(|event| DetailField {
                label: "Event",
                value: match event.created_at {
                    Some(at) => format!("{}  {}", localized(at), event.event_type),
                    None => event.event_type.clone(),
                },
            })
            .collect();

        Self {
            call_id: record.call_id.clone(),
            badge: badge_class(&record.status),
            basic,
            additional,
            summary: non_blank(detail.summary.as_deref()).map(str::to_string),
            transcript: non_blank(detail.transcript.as_deref()).map(str::to_string),
            timeline,
        }
    }

    /// Look up a value in either section by label
    pub fn value(&self, label: &str) -> Option<&str> {
        self.basic
            .iter()
            .chain(self.additional.iter())
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

fn field(label: &'static str, value: Option<&str>) -> DetailField {
    DetailField {
        label,
        value: non_blank(value).unwrap_or(PLACEHOLDER).to_string(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn localized(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
