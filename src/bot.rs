//! Telegram gateway: long polling in, one reply message out per update.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardButton, KeyboardMarkup};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::constants::KEYBOARD_LAYOUT;
use crate::engine::Engine;
use crate::models::{InboundEvent, Reply};
use crate::store::{LibsqlStore, Logged};

pub type BotEngine = Engine<Logged<LibsqlStore>>;

/// Commands advertised in the Telegram command menu.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum MenuCommand {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "show help")]
    Help,
}

pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(
        KEYBOARD_LAYOUT
            .iter()
            .map(|label| vec![KeyboardButton::new(*label)]),
    )
    .resize_keyboard()
}

/// Extracts sender, chat and text; `None` for non-text or anonymous messages.
pub fn to_inbound_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;
    Some(InboundEvent {
        external_id: i64::try_from(user.id.0).ok()?,
        delivery_address: msg.chat.id.0,
        text: text.to_string(),
    })
}

async fn handle_message(bot: Bot, msg: Message, engine: Arc<BotEngine>) -> ResponseResult<()> {
    let Some(event) = to_inbound_event(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let reply = engine.handle(&event).await;
    deliver(&bot, ChatId(event.delivery_address), reply).await;
    Ok(())
}

async fn deliver(bot: &Bot, chat_id: ChatId, reply: Reply) {
    let request = bot.send_message(chat_id, reply.text);
    let result = if reply.keyboard {
        request.reply_markup(main_menu()).await
    } else {
        request.await
    };

    if let Err(e) = result {
        error!(chat_id = chat_id.0, error = %e, "failed to deliver reply");
    }
}

/// Polls Telegram until Ctrl-C.
pub async fn run(bot: Bot, engine: Arc<BotEngine>) {
    if let Err(e) = bot.set_my_commands(MenuCommand::bot_commands()).await {
        warn!(error = %e, "failed to register bot commands");
    }

    let handler = Update::filter_message().endpoint(handle_message);

    info!("dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
