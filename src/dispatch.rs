use chrono::Utc;
use tracing::{error, info};

use crate::config::TemplateKind;
use crate::schedule::types::ReminderKind;
use crate::store::JsonStore;
use crate::transport::Transport;
use crate::utils::messages::{WebinarDate, render_schedule_placeholders};

/// Aggregate result of one reminder or broadcast batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

fn template_kind(kind: ReminderKind) -> TemplateKind {
    match kind {
        ReminderKind::Day => TemplateKind::ReminderDay,
        ReminderKind::PreEvent => TemplateKind::Reminder15Min,
    }
}

/// Send the reminder of the given kind to every active participant
///
/// Loads configuration and participants fresh, renders the template with the
/// next webinar occurrence, and delivers per recipient. Never raises upward:
/// load failures are logged and yield an empty report, delivery failures are
/// counted. Used identically by timer firings and /sendreminder.
pub async fn send_reminder_to_all(
    kind: ReminderKind,
    store: &JsonStore,
    transport: &dyn Transport,
) -> DispatchReport {
    let config = match store.load_config().await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration for {} reminder: {}", kind.as_str(), e);
            return DispatchReport::default();
        }
    };
    let db = store.load_database().await;

    let webinar = match WebinarDate::compute(&config, Utc::now()) {
        Ok(webinar) => webinar,
        Err(e) => {
            error!("Failed to compute next webinar date: {}", e);
            return DispatchReport::default();
        }
    };

    let template = config.messages.get(template_kind(kind));
    let text = render_schedule_placeholders(template, &webinar);

    let report = deliver_to_all(transport, &db.active_chat_ids(), &text).await;
    info!(
        "Dispatched {} reminder: {} sent, {} failed",
        kind.as_str(),
        report.sent,
        report.failed
    );
    report
}

/// Deliver one text to each recipient independently
///
/// A failure for one recipient never prevents attempts to the rest; there is
/// no retry within a batch.
pub async fn deliver_to_all(
    transport: &dyn Transport,
    chat_ids: &[i64],
    text: &str,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for &chat_id in chat_ids {
        match transport.deliver(chat_id, text).await {
            Ok(()) => {
                info!("Delivered to {}", chat_id);
                report.sent += 1;
            }
            Err(e) => {
                error!("Failed to deliver to {}: {}", chat_id, e);
                report.failed += 1;
            }
        }
    }
    report
}


#[cfg(test)]
mod tests {
    use super::test_support::MockTransport;
    use super::*;
    use crate::config::BotConfig;
    use crate::store::{Participant, ParticipantDb};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    fn temp_store() -> JsonStore {
        let dir = std::env::temp_dir().join(format!(
            "webibot_dispatch_test_{}_{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        JsonStore::new(&dir)
    }

    fn participant(chat_id: i64, active: bool) -> Participant {
        Participant {
            chat_id,
            username: None,
            first_name: None,
            last_name: None,
            registration_date: String::new(),
            active,
        }
    }

    #[tokio::test]
    async fn test_deliver_to_all_isolates_failures() {
        let transport = MockTransport::new(vec![2]);
        let report = deliver_to_all(&transport, &[1, 2, 3, 4], "salut").await;
        assert_eq!(report, DispatchReport { sent: 3, failed: 1 });

        let delivered: Vec<i64> = transport
            .delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(delivered, vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn test_deliver_to_all_empty() {
        let transport = MockTransport::new(vec![]);
        let report = deliver_to_all(&transport, &[], "salut").await;
        assert_eq!(report, DispatchReport::default());
    }

    #[tokio::test]
    async fn test_send_reminder_skips_inactive_and_renders_template() {
        let store = temp_store();
        let mut config = BotConfig::default();
        config.messages.reminder_day = "Webinar {webinar_day} la {webinar_time}".to_string();
        store.save_config(&config).await.unwrap();

        let mut db = ParticipantDb::default();
        db.upsert(participant(10, true));
        db.upsert(participant(11, false));
        db.upsert(participant(12, true));
        store.save_database(&db).await.unwrap();

        let transport = MockTransport::new(vec![]);
        let report = send_reminder_to_all(ReminderKind::Day, &store, &transport).await;
        assert_eq!(report, DispatchReport { sent: 2, failed: 0 });

        let delivered = transport.delivered.lock().unwrap();
        // Default config is Tuesday 15:00, so the rendered text is stable
        assert!(delivered.iter().all(|(_, text)| text == "Webinar marți la 15:00"));
    }

    #[tokio::test]
    async fn test_send_reminder_with_missing_config_reports_zero() {
        let store = temp_store();
        let transport = MockTransport::new(vec![]);
        let report = send_reminder_to_all(ReminderKind::PreEvent, &store, &transport).await;
        assert_eq!(report, DispatchReport::default());
    }
}
