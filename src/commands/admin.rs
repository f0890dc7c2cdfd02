use chrono::Utc;
use tracing::{error, info};

use super::{reply, require_admin};
use crate::config::TemplateKind;
use crate::dispatch::{deliver_to_all, send_reminder_to_all};
use crate::export::participants_csv;
use crate::models::{Data, PendingInput};
use crate::schedule::types::ReminderKind;

/// /sendreminder — manual dispatch through the same path as timer firings
pub async fn send_reminder(data: &Data, chat_id: i64, user_id: i64, arg: Option<&str>) {
    if require_admin(data, chat_id, user_id).await.is_none() {
        return;
    }
    let Some(kind) = arg.and_then(ReminderKind::parse) else {
        reply(data, chat_id, "Utilizare: /sendreminder [day|15min]").await;
        return;
    };
    let report = send_reminder_to_all(kind, &data.store, data.transport.as_ref()).await;
    reply(
        data,
        chat_id,
        &format!(
            "Reminder de tip '{}' a fost trimis: {} livrate, {} eșuate.",
            kind.as_str(),
            report.sent,
            report.failed
        ),
    )
    .await;
}

/// /broadcast — ask for the message text; the next message sends it
pub async fn broadcast(data: &Data, chat_id: i64, user_id: i64) {
    if require_admin(data, chat_id, user_id).await.is_none() {
        return;
    }
    data.pending_inputs
        .insert(chat_id, PendingInput::BroadcastMessage);
    reply(
        data,
        chat_id,
        "Vă rugăm să introduceți mesajul pe care doriți să îl transmiteți tuturor participanților:",
    )
    .await;
}

/// /setmessage — ask for the template text; the next message stores it
pub async fn set_message(data: &Data, chat_id: i64, user_id: i64, arg: Option<&str>) {
    if require_admin(data, chat_id, user_id).await.is_none() {
        return;
    }
    let Some(kind) = arg.and_then(TemplateKind::parse) else {
        reply(
            data,
            chat_id,
            "Utilizare: /setmessage <welcome|info|reminder_day|reminder_15min>",
        )
        .await;
        return;
    };
    data.pending_inputs
        .insert(chat_id, PendingInput::MessageTemplate(kind));
    reply(
        data,
        chat_id,
        &format!(
            "Trimiteți noul text pentru mesajul '{}'. Placeholdere disponibile: \
             {{first_name}}, {{last_name}}, {{next_webinar_date}}, {{webinar_day}}, {{webinar_time}}.",
            kind.as_str()
        ),
    )
    .await;
}

/// Complete a pending two-step flow with the given message text
///
/// Returns true when the message was consumed by a pending input.
pub async fn handle_pending_input(data: &Data, chat_id: i64, text: &str) -> bool {
    let Some((_, pending)) = data.pending_inputs.remove(&chat_id) else {
        return false;
    };
    match pending {
        PendingInput::BroadcastMessage => {
            let db = data.store.load_database().await;
            let report = deliver_to_all(data.transport.as_ref(), &db.active_chat_ids(), text).await;
            info!("Broadcast finished: {} sent, {} failed", report.sent, report.failed);
            reply(
                data,
                chat_id,
                &format!(
                    "📢 Mesajul a fost transmis: {} livrate, {} eșuate.",
                    report.sent, report.failed
                ),
            )
            .await;
        }
        PendingInput::MessageTemplate(kind) => {
            let mut config = match data.store.load_config().await {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to load configuration: {}", e);
                    reply(data, chat_id, "❌ Nu s-a putut încărca configurația.").await;
                    return true;
                }
            };
            config.messages.set(kind, text.to_string());
            match data.store.save_config(&config).await {
                Ok(()) => {
                    reply(
                        data,
                        chat_id,
                        &format!("✅ Mesajul '{}' a fost actualizat.", kind.as_str()),
                    )
                    .await;
                }
                Err(e) => {
                    error!("Failed to save configuration: {}", e);
                    reply(data, chat_id, "❌ Eroare la salvarea configurației.").await;
                }
            }
        }
    }
    true
}

/// /addadmin <id>
pub async fn add_admin(data: &Data, chat_id: i64, user_id: i64, arg: Option<&str>) {
    let Some(mut config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    let Some(new_id) = arg.and_then(|value| value.parse::<i64>().ok()) else {
        reply(data, chat_id, "Utilizare: /addadmin <chat_id>").await;
        return;
    };
    if config.admin_ids.contains(&new_id) {
        reply(data, chat_id, "Utilizatorul este deja administrator.").await;
        return;
    }
    config.admin_ids.push(new_id);
    match data.store.save_config(&config).await {
        Ok(()) => {
            reply(
                data,
                chat_id,
                &format!("✅ {} a fost adăugat ca administrator.", new_id),
            )
            .await;
        }
        Err(e) => {
            error!("Failed to save configuration: {}", e);
            reply(data, chat_id, "❌ Eroare la salvarea configurației.").await;
        }
    }
}

/// /deladmin <id> — the last admin cannot be removed
pub async fn del_admin(data: &Data, chat_id: i64, user_id: i64, arg: Option<&str>) {
    let Some(mut config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    let Some(target) = arg.and_then(|value| value.parse::<i64>().ok()) else {
        reply(data, chat_id, "Utilizare: /deladmin <chat_id>").await;
        return;
    };
    if !config.admin_ids.contains(&target) {
        reply(data, chat_id, "Utilizatorul nu este administrator.").await;
        return;
    }
    if config.admin_ids.len() == 1 {
        reply(data, chat_id, "❌ Nu puteți elimina ultimul administrator.").await;
        return;
    }
    config.admin_ids.retain(|id| *id != target);
    match data.store.save_config(&config).await {
        Ok(()) => {
            reply(
                data,
                chat_id,
                &format!("✅ {} nu mai este administrator.", target),
            )
            .await;
        }
        Err(e) => {
            error!("Failed to save configuration: {}", e);
            reply(data, chat_id, "❌ Eroare la salvarea configurației.").await;
        }
    }
}

/// /listadmins
pub async fn list_admins(data: &Data, chat_id: i64, user_id: i64) {
    let Some(config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    let ids: Vec<String> = config.admin_ids.iter().map(|id| id.to_string()).collect();
    reply(
        data,
        chat_id,
        &format!("👥 Administratori: {}", ids.join(", ")),
    )
    .await;
}

/// /exportcsv — write the participant list into the data directory
pub async fn export_csv(data: &Data, chat_id: i64, user_id: i64) {
    if require_admin(data, chat_id, user_id).await.is_none() {
        return;
    }
    let db = data.store.load_database().await;
    let csv = participants_csv(&db);
    let filename = format!("participants_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
    let path = data.data_dir.join(&filename);
    match tokio::fs::write(&path, csv).await {
        Ok(()) => {
            info!("Exported {} participants to {}", db.participants.len(), path.display());
            reply(
                data,
                chat_id,
                &format!(
                    "📊 Export finalizat: {} participanți în {}.",
                    db.participants.len(),
                    filename
                ),
            )
            .await;
        }
        Err(e) => {
            error!("Failed to write CSV export: {}", e);
            reply(data, chat_id, "❌ Eroare la exportul CSV.").await;
        }
    }
}

/// /syncsheet — push the participant list to the external tabular store
pub async fn sync_sheet(data: &Data, chat_id: i64, user_id: i64) {
    let Some(config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    if !config.google_sheets.enabled {
        reply(data, chat_id, "Google Sheets nu este configurat.").await;
        return;
    }
    let db = data.store.load_database().await;
    if data.exporter.export(&db).await {
        reply(data, chat_id, "✅ Sincronizare reușită către Google Sheets.").await;
    } else {
        reply(data, chat_id, "❌ Sincronizarea către Google Sheets a eșuat.").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::make_data;
    use crate::config::BotConfig;
    use crate::store::{Participant, ParticipantDb};

    fn admin_config() -> BotConfig {
        let mut config = BotConfig::default();
        config.admin_ids = vec![1, 2];
        config
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
    async fn test_broadcast_two_step_flow() {
        let (data, transport) = make_data(vec![20]);
        data.store.save_config(&admin_config()).await.unwrap();
        let mut db = ParticipantDb::default();
        db.upsert(participant(10, true));
        db.upsert(participant(20, true));
        db.upsert(participant(30, false));
        data.store.save_database(&db).await.unwrap();

        broadcast(&data, 1, 1).await;
        assert!(handle_pending_input(&data, 1, "Anunț important").await);

        let delivered = transport.delivered.lock().unwrap();
        let broadcast_hits: Vec<i64> = delivered
            .iter()
            .filter(|(_, text)| text == "Anunț important")
            .map(|(id, _)| *id)
            .collect();
        // Active participant 10 got it, 20 failed, inactive 30 was skipped
        assert_eq!(broadcast_hits, vec![10]);
        let ack = &delivered.last().unwrap().1;
        assert!(ack.contains("1 livrate"));
        assert!(ack.contains("1 eșuate"));
    }

    #[tokio::test]
    async fn test_pending_input_is_consumed_once() {
        let (data, _transport) = make_data(vec![]);
        data.store.save_config(&admin_config()).await.unwrap();

        broadcast(&data, 1, 1).await;
        assert!(handle_pending_input(&data, 1, "o dată").await);
        assert!(!handle_pending_input(&data, 1, "de două ori").await);
    }

    #[tokio::test]
    async fn test_set_message_flow_updates_template() {
        let (data, _transport) = make_data(vec![]);
        data.store.save_config(&admin_config()).await.unwrap();

        set_message(&data, 1, 1, Some("info")).await;
        handle_pending_input(&data, 1, "Info nou {webinar_day}").await;

        let config = data.store.load_config().await.unwrap();
        assert_eq!(config.messages.info, "Info nou {webinar_day}");
    }

    #[tokio::test]
    async fn test_del_admin_keeps_last_admin() {
        let (data, transport) = make_data(vec![]);
        let mut config = BotConfig::default();
        config.admin_ids = vec![1];
        data.store.save_config(&config).await.unwrap();

        del_admin(&data, 1, 1, Some("1")).await;

        assert_eq!(data.store.load_config().await.unwrap().admin_ids, vec![1]);
        let delivered = transport.delivered.lock().unwrap();
        assert!(delivered[0].1.contains("ultimul administrator"));
    }

    #[tokio::test]
    async fn test_add_and_del_admin() {
        let (data, _transport) = make_data(vec![]);
        data.store.save_config(&admin_config()).await.unwrap();

        add_admin(&data, 1, 1, Some("3")).await;
        assert_eq!(
            data.store.load_config().await.unwrap().admin_ids,
            vec![1, 2, 3]
        );

        del_admin(&data, 1, 1, Some("2")).await;
        assert_eq!(data.store.load_config().await.unwrap().admin_ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_send_reminder_requires_valid_kind() {
        let (data, transport) = make_data(vec![]);
        data.store.save_config(&admin_config()).await.unwrap();

        send_reminder(&data, 1, 1, Some("hourly")).await;
        let delivered = transport.delivered.lock().unwrap();
        assert!(delivered[0].1.starts_with("Utilizare"));
    }

    #[tokio::test]
    async fn test_export_csv_writes_file() {
        let (data, transport) = make_data(vec![]);
        data.store.save_config(&admin_config()).await.unwrap();
        let mut db = ParticipantDb::default();
        db.upsert(participant(10, true));
        data.store.save_database(&db).await.unwrap();

        export_csv(&data, 1, 1).await;

        let delivered = transport.delivered.lock().unwrap();
        assert!(delivered[0].1.contains("1 participanți"));
        let exported = std::fs::read_dir(&data.data_dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name().to_string_lossy().starts_with("participants_"));
        assert!(exported);
    }

    #[tokio::test]
    async fn test_sync_sheet_reports_when_disabled() {
        let (data, transport) = make_data(vec![]);
        data.store.save_config(&admin_config()).await.unwrap();

        sync_sheet(&data, 1, 1).await;
        let delivered = transport.delivered.lock().unwrap();
        assert!(delivered[0].1.contains("nu este configurat"));
    }
}
