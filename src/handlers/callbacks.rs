use teloxide::prelude::*;

use std::error::Error;

use crate::bot_state::BotState;
use crate::models::SessionState;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(data) = q.data.as_deref() {
        if let Some(ref message) = q.message {
            let chat_id = message.chat().id;
            let message_id = message.id();

            if data == "mode_json" {
                let session = state.session(chat_id).await;
                session.lock().await.state = SessionState::AwaitingCaptionFile;
                log::info!("📋 Chat {}: awaiting caption file", chat_id);

                bot.edit_message_text(
                    chat_id,
                    message_id,
                    "Отправьте файл JSON со своими подписями.",
                )
                .await?;
            }
        }
    }

    bot.answer_callback_query(q.id).await?;

    Ok(())
}
