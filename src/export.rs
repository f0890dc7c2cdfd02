use async_trait::async_trait;

use crate::store::ParticipantDb;

/// Consumer of participant rows in an external tabular store
///
/// Fire-and-report-boolean; the spreadsheet protocol itself lives outside
/// this crate.
#[async_trait]
pub trait RowExporter: Send + Sync {
    async fn export(&self, db: &ParticipantDb) -> bool;
}

/// Exporter wired in when no external tabular store is configured
pub struct NoopExporter;

#[async_trait]
impl RowExporter for NoopExporter {
    async fn export(&self, _db: &ParticipantDb) -> bool {
        false
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the participant list as a CSV document, header included
pub fn participants_csv(db: &ParticipantDb) -> String {
    let mut out = String::from("Chat ID,Username,First Name,Last Name,Registration Date,Active\n");
    for participant in db.participants.values() {
        let row = [
            participant.chat_id.to_string(),
            participant.username.clone().unwrap_or_default(),
            participant.first_name.clone().unwrap_or_default(),
            participant.last_name.clone().unwrap_or_default(),
            participant.registration_date.clone(),
            participant.active.to_string(),
        ];
        let line: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}
