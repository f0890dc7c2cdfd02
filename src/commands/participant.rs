use chrono::Utc;
use tracing::{error, info, warn};

use super::reply;
use crate::models::Data;
use crate::store::Participant;
use crate::transport::TgUser;
use crate::utils::messages::{WebinarDate, render_schedule_placeholders, render_welcome};

/// Register the sender and send the personalized welcome message
pub async fn start(data: &Data, chat_id: i64, from: Option<&TgUser>) {
    let mut db = data.store.load_database().await;

    if db.get(chat_id).is_none() {
        let participant = Participant {
            chat_id,
            username: from.and_then(|u| u.username.clone()),
            first_name: from.and_then(|u| u.first_name.clone()),
            last_name: from.and_then(|u| u.last_name.clone()),
            registration_date: Utc::now().to_rfc3339(),
            active: true,
        };
        db.upsert(participant);
        db.touch();
        if let Err(e) = data.store.save_database(&db).await {
            error!("Failed to save new participant {}: {}", chat_id, e);
            reply(
                data,
                chat_id,
                "A apărut o eroare la înregistrare. Vă rugăm încercați din nou mai târziu.",
            )
            .await;
            return;
        }
        info!("New user registered: {}", chat_id);
    }

    let config = match data.store.load_config().await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };

    let webinar = match WebinarDate::compute(&config, Utc::now()) {
        Ok(webinar) => webinar,
        Err(e) => {
            error!("Failed to compute next webinar date: {}", e);
            return;
        }
    };

    // Push the updated participant list to the external tabular store
    if config.google_sheets.enabled && !data.exporter.export(&db).await {
        warn!("Tabular-store export failed after registration of {}", chat_id);
    }

    let first_name = from.and_then(|u| u.first_name.as_deref()).unwrap_or("");
    let last_name = from.and_then(|u| u.last_name.as_deref()).unwrap_or("");
    let welcome = render_welcome(&config.messages.welcome, first_name, last_name, &webinar);
    reply(data, chat_id, &welcome).await;
    reply(
        data,
        chat_id,
        "Pentru a accesa meniul de comenzi în orice moment, folosiți comanda /menu.",
    )
    .await;
}

/// Send the webinar info message with the next occurrence date
pub async fn info(data: &Data, chat_id: i64) {
    let config = match data.store.load_config().await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    let webinar = match WebinarDate::compute(&config, Utc::now()) {
        Ok(webinar) => webinar,
        Err(e) => {
            error!("Failed to compute next webinar date: {}", e);
            return;
        }
    };
    let text = render_schedule_placeholders(&config.messages.info, &webinar);
    reply(data, chat_id, &text).await;
}

const USER_HELP: &str = "📋 Comenzi disponibile:\n\
    /start — Înscriere la webinar\n\
    /info — Informații despre următorul webinar\n\
    /help — Acest mesaj";

const ADMIN_HELP: &str = "\n\n👤 Comenzi administrator:\n\
    /setwebinar <Zi> <HH:MM> — Programează webinarul (și: day, time, timezone, link)\n\
    /setreminder day <Zi> <HH:MM> — Programează reminderul din ziua aleasă\n\
    /viewschedule — Programarea curentă și următoarele trimiteri\n\
    /sendreminder <day|15min> — Trimite un reminder acum\n\
    /broadcast — Trimite un mesaj tuturor participanților\n\
    /setmessage <welcome|info|reminder_day|reminder_15min> — Setează un mesaj\n\
    /exportcsv — Exportă lista participanților\n\
    /syncsheet — Sincronizează participanții cu Google Sheets\n\
    /addadmin, /deladmin, /listadmins — Administratori";

/// Command overview; admins get the extended section
pub async fn help(data: &Data, chat_id: i64, user_id: i64) {
    let is_admin = match data.store.load_config().await {
        Ok(config) => config.is_admin(user_id),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            false
        }
    };
    let text = if is_admin {
        format!("{}{}", USER_HELP, ADMIN_HELP)
    } else {
        USER_HELP.to_string()
    };
    reply(data, chat_id, &text).await;
}
