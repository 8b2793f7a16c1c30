use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};

use std::error::Error;

use crate::bot_state::BotState;
use crate::config::{COLLECT_TIMEOUT, SEND_DELAY};
use crate::models::{CollectOutcome, MediaItem, MediaKind, SessionState, TimeoutAction};

/// Принимает очередной файл пользователя в пачку
pub async fn collect_media(
    bot: Bot,
    state: BotState,
    chat_id: ChatId,
    item: MediaItem,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let session = state.session(chat_id).await;

    let outcome = {
        let mut session = session.lock().await;
        let outcome = session.accept_media(item);

        match outcome {
            CollectOutcome::Rearm => {
                session.cancel_flush_timer();
                session.flush_timer =
                    Some(spawn_flush_timer(bot.clone(), state.clone(), chat_id));
            }
            CollectOutcome::BatchFull | CollectOutcome::Overflow => {
                session.cancel_flush_timer();
            }
            CollectOutcome::Ignored => {}
        }

        outcome
    };

    match outcome {
        CollectOutcome::BatchFull => dispatch_batch(bot, state, chat_id).await?,
        CollectOutcome::Overflow => discard_overflow(&bot, &state, chat_id).await,
        CollectOutcome::Ignored => {
            log::info!(
                "📥 Chat {}: media received while batch is dispatching, ignored",
                chat_id
            );
        }
        CollectOutcome::Rearm => {}
    }

    Ok(())
}

/// Взводит таймер досылки неполной пачки
fn spawn_flush_timer(bot: Bot, state: BotState, chat_id: ChatId) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(COLLECT_TIMEOUT).await;
        on_flush_timeout(bot, state, chat_id).await;
    })
}

/// Срабатывание таймера. Таймер мог пережить отправку или сброс,
/// поэтому решение принимается по текущему состоянию сессии.
async fn on_flush_timeout(bot: Bot, state: BotState, chat_id: ChatId) {
    let session = state.session(chat_id).await;
    let (action, pending) = {
        let session = session.lock().await;
        (session.timeout_action(), session.pending_count)
    };

    match action {
        TimeoutAction::Skip => {}
        TimeoutAction::Discard => discard_overflow(&bot, &state, chat_id).await,
        TimeoutAction::Flush => {
            log::info!(
                "⏰ Chat {}: collect timeout reached, dispatching {} files",
                chat_id,
                pending
            );
            if let Err(e) = dispatch_batch(bot, state, chat_id).await {
                log::error!("❌ Chat {}: timeout dispatch failed: {}", chat_id, e);
            }
        }
    }
}

/// Переотправляет пачку с подписями и удаляет оригиналы
pub async fn dispatch_batch(
    bot: Bot,
    state: BotState,
    chat_id: ChatId,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let session = state.session(chat_id).await;

    let batch = {
        let mut session = session.lock().await;
        if session.state == SessionState::Dispatching {
            // Гонка таймера с десятым файлом, второй вызов лишний
            log::warn!(
                "⚠️ Chat {}: dispatch requested while already dispatching, skipping",
                chat_id
            );
            return Ok(());
        }
        match session.begin_dispatch() {
            Some(batch) => batch,
            None => return Ok(()),
        }
    };

    log::info!("📤 Chat {}: dispatching batch of {} files", chat_id, batch.len());

    let originals: Vec<MessageId> = batch.iter().map(|(item, _)| item.message_id).collect();
    let mut sent = Vec::with_capacity(batch.len());

    for (index, (item, caption)) in batch.into_iter().enumerate() {
        let input = InputFile::file_id(item.file_id);
        let result = match item.kind {
            MediaKind::Photo => bot.send_photo(chat_id, input).caption(caption).await,
            MediaKind::Video => bot.send_video(chat_id, input).caption(caption).await,
            MediaKind::Document => bot.send_document(chat_id, input).caption(caption).await,
        };

        match result {
            Ok(message) => sent.push(message.id),
            Err(e) => {
                // Неудача одного файла не роняет остальную пачку
                log::error!(
                    "❌ Chat {}: failed to send file {} of the batch: {}",
                    chat_id,
                    index + 1,
                    e
                );
            }
        }

        tokio::time::sleep(SEND_DELAY).await;
    }

    // Убираем оригиналы, неудачи не критичны
    for message_id in originals {
        if let Err(e) = bot.delete_message(chat_id, message_id).await {
            log::warn!(
                "⚠️ Chat {}: could not delete original message {}: {}",
                chat_id,
                message_id.0,
                e
            );
        }
    }

    {
        let mut session = session.lock().await;
        session.finish_dispatch(sent);
    }

    log::info!("✅ Chat {}: batch dispatched, collecting again", chat_id);
    Ok(())
}

/// Политика переполнения: пачка отбрасывается целиком, оригиналы удаляются
pub async fn discard_overflow(bot: &Bot, state: &BotState, chat_id: ChatId) {
    let session = state.session(chat_id).await;
    let items = session.lock().await.discard_batch();

    log::warn!(
        "⚠️ Chat {}: batch limit exceeded, discarding all {} files",
        chat_id,
        items.len()
    );

    for item in items {
        if let Err(e) = bot.delete_message(chat_id, item.message_id).await {
            log::warn!(
                "⚠️ Chat {}: could not delete discarded message {}: {}",
                chat_id,
                item.message_id.0,
                e
            );
        }
    }
}
