// Command modules
mod admin;
mod participant;
mod webinar;

use std::sync::Arc;

use tracing::{error, warn};

use crate::config::BotConfig;
use crate::models::Data;
use crate::transport::TgMessage;

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Info,
    Help,
    Menu,
    SetWebinar(Vec<String>),
    SetReminder(Vec<String>),
    ViewSchedule,
    SendReminder(Option<String>),
    Broadcast,
    SetMessage(Option<String>),
    AddAdmin(Option<String>),
    DelAdmin(Option<String>),
    ListAdmins,
    ExportCsv,
    SyncSheet,
}

/// Parse a leading /command, tolerating the @botname suffix
pub fn parse_command(text: &str) -> Option<Command> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next()?;
    if !head.starts_with('/') {
        return None;
    }
    let name = head[1..].split('@').next().unwrap_or("");
    let mut args = tokens.map(|s| s.to_string());

    match name {
        "start" => Some(Command::Start),
        "info" => Some(Command::Info),
        "help" => Some(Command::Help),
        "menu" | "adminmenu" => Some(Command::Menu),
        "setwebinar" => Some(Command::SetWebinar(args.collect())),
        "setreminder" => Some(Command::SetReminder(args.collect())),
        "viewschedule" => Some(Command::ViewSchedule),
        "sendreminder" => Some(Command::SendReminder(args.next())),
        "broadcast" => Some(Command::Broadcast),
        "setmessage" => Some(Command::SetMessage(args.next())),
        "addadmin" => Some(Command::AddAdmin(args.next())),
        "deladmin" => Some(Command::DelAdmin(args.next())),
        "listadmins" => Some(Command::ListAdmins),
        "exportcsv" => Some(Command::ExportCsv),
        "syncsheet" => Some(Command::SyncSheet),
        _ => None,
    }
}

/// Deliver a reply, logging failures (there is nowhere else to report them)
pub(crate) async fn reply(data: &Data, chat_id: i64, text: &str) {
    if let Err(e) = data.transport.deliver(chat_id, text).await {
        error!("Failed to reply to {}: {}", chat_id, e);
    }
}

/// Load the configuration and require `user_id` to be an admin
///
/// Replies to the chat and returns None when the requirement fails.
pub(crate) async fn require_admin(data: &Data, chat_id: i64, user_id: i64) -> Option<BotConfig> {
    let config = match data.store.load_config().await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            reply(data, chat_id, "❌ Nu s-a putut încărca configurația.").await;
            return None;
        }
    };
    if !config.is_admin(user_id) {
        warn!("Non-admin user {} tried to use an admin command", user_id);
        reply(
            data,
            chat_id,
            "⛔ Acces interzis! Doar administratorii pot folosi această comandă.",
        )
        .await;
        return None;
    }
    Some(config)
}

/// Entry point for every inbound chat message
pub async fn handle_message(data: &Arc<Data>, msg: &TgMessage) {
    let Some(text) = msg.text.as_deref() else {
        return;
    };
    let chat_id = msg.chat.id;
    let user_id = msg.from.as_ref().map(|u| u.id).unwrap_or(chat_id);

    if let Some(command) = parse_command(text) {
        // A fresh command cancels any pending two-step input
        data.pending_inputs.remove(&chat_id);
        route_command(data, command, chat_id, user_id, msg).await;
    } else {
        admin::handle_pending_input(data, chat_id, text).await;
    }
}

async fn route_command(
    data: &Arc<Data>,
    command: Command,
    chat_id: i64,
    user_id: i64,
    msg: &TgMessage,
) {
    match command {
        Command::Start => participant::start(data, chat_id, msg.from.as_ref()).await,
        Command::Info => participant::info(data, chat_id).await,
        Command::Help | Command::Menu => participant::help(data, chat_id, user_id).await,
        Command::SetWebinar(args) => webinar::set_webinar(data, chat_id, user_id, &args).await,
        Command::SetReminder(args) => webinar::set_reminder(data, chat_id, user_id, &args).await,
        Command::ViewSchedule => webinar::view_schedule(data, chat_id, user_id).await,
        Command::SendReminder(arg) => {
            admin::send_reminder(data, chat_id, user_id, arg.as_deref()).await
        }
        Command::Broadcast => admin::broadcast(data, chat_id, user_id).await,
        Command::SetMessage(arg) => admin::set_message(data, chat_id, user_id, arg.as_deref()).await,
        Command::AddAdmin(arg) => admin::add_admin(data, chat_id, user_id, arg.as_deref()).await,
        Command::DelAdmin(arg) => admin::del_admin(data, chat_id, user_id, arg.as_deref()).await,
        Command::ListAdmins => admin::list_admins(data, chat_id, user_id).await,
        Command::ExportCsv => admin::export_csv(data, chat_id, user_id).await,
        Command::SyncSheet => admin::sync_sheet(data, chat_id, user_id).await,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::dispatch::test_support::MockTransport;
    use crate::export::NoopExporter;
    use crate::schedule::JobRegistry;
    use crate::store::JsonStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    /// Build a Data instance backed by a temp store and a recording transport
    pub(crate) fn make_data(fail_for: Vec<i64>) -> (Arc<Data>, Arc<MockTransport>) {
        let dir = std::env::temp_dir().join(format!(
            "webibot_commands_test_{}_{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let store = Arc::new(JsonStore::new(&dir));
        let transport = Arc::new(MockTransport::new(fail_for));
        let registry = JobRegistry::new(store.clone(), transport.clone());
        let data = Arc::new(Data::new(
            store,
            transport.clone(),
            registry,
            Arc::new(NoopExporter),
            dir,
        ));
        (data, transport)
    }
}
