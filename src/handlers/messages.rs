use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::Document;

use std::error::Error;
use std::io::Cursor;

use crate::bot_state::BotState;
use crate::captions::{parse_caption_file, CaptionFileError};
use crate::config::{MAX_FILE_SIZE_MB, MIN_CAPTIONS_REQUIRED};
use crate::handlers::media::collect_media;
use crate::models::{MediaItem, MediaKind, SessionState};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;

    if let Some(document) = msg.document() {
        handle_document(bot, &msg, document, state).await?;
    } else if let Some(photos) = msg.photo() {
        // Последний вариант в списке — самый крупный
        if let Some(photo) = photos.last() {
            let item = MediaItem {
                kind: MediaKind::Photo,
                file_id: photo.file.id.clone(),
                message_id: msg.id,
            };
            collect_media(bot, state, chat_id, item).await?;
        }
    } else if let Some(video) = msg.video() {
        let item = MediaItem {
            kind: MediaKind::Video,
            file_id: video.file.id.clone(),
            message_id: msg.id,
        };
        collect_media(bot, state, chat_id, item).await?;
    } else if let Some(text) = msg.text() {
        // Команды уже разобраны отдельной веткой диспетчера
        if text.starts_with('/') {
            return Ok(());
        }

        let session = state.session(chat_id).await;
        let session_state = session.lock().await.state;
        if session_state == SessionState::AwaitingCaptionFile {
            let sent = bot
                .send_message(chat_id, "Отправьте файл JSON со своими подписями.")
                .await?;
            state.track_sent(chat_id, sent.id).await;
        }
        // В остальных состояниях молча ждём файлы
    }

    Ok(())
}

/// Документ — это либо файл с подписями, либо обычный файл в пачку,
/// в зависимости от текущего состояния сессии
async fn handle_document(
    bot: Bot,
    msg: &Message,
    document: &Document,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    let session = state.session(chat_id).await;
    let session_state = session.lock().await.state;

    if session_state != SessionState::AwaitingCaptionFile {
        let item = MediaItem {
            kind: MediaKind::Document,
            file_id: document.file.id.clone(),
            message_id: msg.id,
        };
        return collect_media(bot, state, chat_id, item).await;
    }

    let file_name = document.file_name.clone().unwrap_or_default();
    let lowered = file_name.to_lowercase();

    // Расширение проверяем до скачивания
    if !(lowered.ends_with(".json") || lowered.ends_with(".txt")) {
        let sent = bot
            .send_message(chat_id, "Пожалуйста, отправьте корректный JSON- или TXT-файл.")
            .await?;
        state.track_sent(chat_id, sent.id).await;
        return Ok(());
    }

    if document.file.size > MAX_FILE_SIZE_MB * 1024 * 1024 {
        let sent = bot
            .send_message(
                chat_id,
                format!(
                    "Файл слишком большой. Максимальный размер — {} МБ.",
                    MAX_FILE_SIZE_MB
                ),
            )
            .await?;
        state.track_sent(chat_id, sent.id).await;
        return Ok(());
    }

    let bytes = match fetch_file_bytes(&bot, document).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("❌ Chat {}: failed to fetch caption file: {}", chat_id, e);
            let sent = bot
                .send_message(chat_id, "Ошибка при обработке файла с подписями. Попробуйте еще раз.")
                .await?;
            state.track_sent(chat_id, sent.id).await;
            return Ok(());
        }
    };

    match parse_caption_file(&bytes, &file_name) {
        Ok(captions) => {
            let count = captions.len();
            session.lock().await.load_captions(captions);
            log::info!(
                "📋 Chat {}: loaded {} captions from {}",
                chat_id,
                count,
                file_name
            );

            let sent = bot
                .send_message(
                    chat_id,
                    format!(
                        "Файл обработан! Загружено подписей: {}. Теперь отправьте свои файлы.",
                        count
                    ),
                )
                .await?;
            state.track_sent(chat_id, sent.id).await;
        }
        Err(CaptionFileError::NotEnough(found)) => {
            let sent = bot
                .send_message(
                    chat_id,
                    format!(
                        "В файле должно быть не менее {} подписей. Найдено только {}.",
                        MIN_CAPTIONS_REQUIRED, found
                    ),
                )
                .await?;
            state.track_sent(chat_id, sent.id).await;
        }
        Err(CaptionFileError::Unreadable) => {
            let sent = bot
                .send_message(
                    chat_id,
                    "Не удалось прочитать файл с подписями. Убедитесь, что это корректный \
                     JSON- или TXT-файл и он не пустой.",
                )
                .await?;
            state.track_sent(chat_id, sent.id).await;
        }
    }

    Ok(())
}

async fn fetch_file_bytes(
    bot: &Bot,
    document: &Document,
) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
    let file = bot.get_file(document.file.id.clone()).await?;
    let mut buffer = Cursor::new(Vec::new());
    bot.download_file(&file.path, &mut buffer).await?;
    Ok(buffer.into_inner())
}
