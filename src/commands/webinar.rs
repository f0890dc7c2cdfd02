use chrono::{DateTime, Utc};
use tracing::error;

use super::{reply, require_admin};
use crate::config::{BotConfig, DayReminderOverride};
use crate::models::Data;
use crate::schedule::{SchedulePreview, preview};
use crate::utils::locale::{day_name_en, parse_day_name};
use crate::utils::messages::format_relative;
use crate::utils::timezone::{format_hhmm, parse_hour_minute, parse_timezone};

const SET_WEBINAR_USAGE: &str = "Utilizare:\n\
    • /setwebinar <Zi> <HH:MM>\n\
    • /setwebinar datetime <Zi> <HH:MM>\n\
    • /setwebinar day <Zi>\n\
    • /setwebinar time <HH:MM>\n\
    • /setwebinar timezone <Continent/City>\n\
    • /setwebinar link <URL>";

const SET_REMINDER_USAGE: &str = "Utilizare: /setreminder day <Zi> <HH:MM>\n\
    Exemplu: /setreminder day Tuesday 09:00\n\
    Notă: reminderul '15min' se trimite automat cu 15 minute înainte de webinar.";

/// Normalize a HH:MM argument, rejecting anything unparseable
fn normalize_time(value: &str) -> Option<String> {
    parse_hour_minute(value)
        .ok()
        .map(|(hour, minute)| format_hhmm(hour, minute))
}

/// Apply a /setwebinar argument list to the webinar section
///
/// Returns an error message for the admin when the input is invalid.
fn apply_webinar_args(config: &mut BotConfig, args: &[String]) -> Result<(), &'static str> {
    if args.is_empty() {
        return Err(SET_WEBINAR_USAGE);
    }

    // Short form: /setwebinar <Day> <HH:MM>
    if args.len() == 2 {
        if let (Some(day), Some(time)) = (parse_day_name(&args[0]), normalize_time(&args[1])) {
            config.webinar.day = day_name_en(day).to_string();
            config.webinar.time = time;
            return Ok(());
        }
    }

    match args[0].to_lowercase().as_str() {
        "datetime" if args.len() >= 3 => {
            let day = parse_day_name(&args[1]).ok_or("Zi invalidă.")?;
            let time = normalize_time(&args[2]).ok_or("Oră invalidă.")?;
            config.webinar.day = day_name_en(day).to_string();
            config.webinar.time = time;
            Ok(())
        }
        "day" if args.len() >= 2 => {
            let day = parse_day_name(&args[1]).ok_or("Zi invalidă.")?;
            config.webinar.day = day_name_en(day).to_string();
            Ok(())
        }
        "time" if args.len() >= 2 => {
            config.webinar.time = normalize_time(&args[1]).ok_or("Oră invalidă.")?;
            Ok(())
        }
        "timezone" if args.len() >= 2 => {
            parse_timezone(&args[1])
                .map_err(|_| "Timezone invalid. Exemplu: Europe/Bucharest")?;
            config.webinar.timezone = args[1].clone();
            Ok(())
        }
        "link" if args.len() >= 2 => {
            let link = args[1..].join(" ");
            if !link.starts_with("http") {
                return Err("URL invalid. Vă rugăm să furnizați un link complet (http/https).");
            }
            config.webinar.link = link;
            Ok(())
        }
        _ => Err(SET_WEBINAR_USAGE),
    }
}

/// Persist an edited configuration and resync the scheduler
async fn save_and_resync(data: &Data, chat_id: i64, config: &BotConfig, ack: &str) {
    if let Err(e) = data.store.save_config(config).await {
        error!("Failed to save configuration: {}", e);
        reply(data, chat_id, "❌ Eroare la salvarea configurației.").await;
        return;
    }
    match data.registry.resync(config).await {
        Ok(()) => reply(data, chat_id, ack).await,
        Err(e) => {
            error!("Failed to resync scheduler: {}", e);
            reply(
                data,
                chat_id,
                &format!("❌ Configurația a fost salvată, dar reprogramarea a eșuat: {}", e),
            )
            .await;
        }
    }
}

/// /setwebinar — configure the webinar day, time, timezone, or link
pub async fn set_webinar(data: &Data, chat_id: i64, user_id: i64, args: &[String]) {
    let Some(mut config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    if let Err(msg) = apply_webinar_args(&mut config, args) {
        reply(data, chat_id, msg).await;
        return;
    }
    save_and_resync(
        data,
        chat_id,
        &config,
        "✅ Setările webinarului au fost actualizate.",
    )
    .await;
}

/// /setreminder — configure the day-reminder override
///
/// Only the 'day' reminder is configurable; the pre-event reminder is always
/// derived from the webinar time.
pub async fn set_reminder(data: &Data, chat_id: i64, user_id: i64, args: &[String]) {
    let Some(mut config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    if args.len() < 3 || args[0].to_lowercase() != "day" {
        reply(data, chat_id, SET_REMINDER_USAGE).await;
        return;
    }
    let (Some(day), Some(time)) = (parse_day_name(&args[1]), normalize_time(&args[2])) else {
        reply(data, chat_id, "Zi sau oră invalidă.").await;
        return;
    };
    config.reminders.day = Some(DayReminderOverride {
        day: day_name_en(day).to_string(),
        time,
    });
    save_and_resync(
        data,
        chat_id,
        &config,
        "✅ Programarea reminderelor a fost actualizată.",
    )
    .await;
}

/// Render the schedule preview for admin display
fn render_schedule_preview(p: &SchedulePreview, now: DateTime<Utc>) -> String {
    let fmt = |occ: &crate::schedule::Occurrence| {
        let delta = (occ.next.with_timezone(&Utc) - now).num_seconds();
        format!(
            "{}  • {}",
            occ.next.format("%a, %d %b %Y %H:%M %Z"),
            format_relative(delta)
        )
    };
    format!(
        "⏰ Programare curentă\n\n\
         • Webinar: {} la {} ({})\n  Următorul: {}\n\n\
         • Reminder 'day': {} la {}\n  Următorul: {}\n\n\
         • Reminder '15min': {} la {}\n  Următorul: {}",
        day_name_en(p.event.day),
        p.event.time,
        p.timezone,
        fmt(&p.event),
        day_name_en(p.day_reminder.day),
        p.day_reminder.time,
        fmt(&p.day_reminder),
        day_name_en(p.pre_event_reminder.day),
        p.pre_event_reminder.time,
        fmt(&p.pre_event_reminder),
    )
}

/// /viewschedule — show the effective schedule and next fire times
pub async fn view_schedule(data: &Data, chat_id: i64, user_id: i64) {
    let Some(config) = require_admin(data, chat_id, user_id).await else {
        return;
    };
    let now = Utc::now();
    match preview(&config, now) {
        Ok(p) => reply(data, chat_id, &render_schedule_preview(&p, now)).await,
        Err(e) => {
            error!("Failed to compute schedule preview: {}", e);
            reply(data, chat_id, "A apărut o eroare la afișarea programării.").await;
        }
    }
}
