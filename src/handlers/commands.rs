use teloxide::prelude::*;

use std::error::Error;

use crate::bot_state::BotState;
use crate::config::WELCOME_MESSAGE;
use crate::handlers::utils::main_menu_keyboard;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await?,
        Command::Help => handle_help(bot, msg, state).await?,
        Command::Done => handle_done(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_start(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    state.reset(chat_id).await;
    log::info!("🚀 Chat {}: session started", chat_id);

    let sent = bot
        .send_message(chat_id, WELCOME_MESSAGE)
        .reply_markup(main_menu_keyboard())
        .await?;
    state.track_sent(chat_id, sent.id).await;

    Ok(())
}

/// /done — подчистить всё, что бот наотправлял в чат, и начать заново
async fn handle_done(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;

    let session = state.session(chat_id).await;
    let tracked = {
        let mut session = session.lock().await;
        session.cancel_flush_timer();
        std::mem::take(&mut session.sent_message_ids)
    };

    log::info!("🗑️ Chat {}: cleaning up {} bot messages", chat_id, tracked.len());
    for message_id in tracked {
        if let Err(e) = bot.delete_message(chat_id, message_id).await {
            log::warn!(
                "⚠️ Chat {}: could not delete message {}: {}",
                chat_id,
                message_id.0,
                e
            );
        }
    }

    state.reset(chat_id).await;

    let sent = bot
        .send_message(chat_id, WELCOME_MESSAGE)
        .reply_markup(main_menu_keyboard())
        .await?;
    state.track_sent(chat_id, sent.id).await;

    Ok(())
}

async fn handle_help(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let sent = bot
        .send_message(
            msg.chat.id,
            "Помощь по боту\n\n\
             /start - начать работу\n\
             /done - очистить чат и начать заново\n\n\
             Отправьте до 10 фото, видео или документов - бот перешлёт их с подписями \
             и удалит оригиналы. Чтобы использовать свои подписи, нажмите кнопку Json \
             и пришлите файл со списком (не менее 10 строк).",
        )
        .await?;
    state.track_sent(msg.chat.id, sent.id).await;

    Ok(())
}
