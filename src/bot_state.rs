use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::{Mutex, RwLock};

use crate::models::Session;

type SessionMap = Arc<RwLock<HashMap<ChatId, Arc<Mutex<Session>>>>>;

#[derive(Clone)]
pub struct BotState {
    sessions: SessionMap,
}

impl BotState {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Возвращает сессию пользователя, создавая новую при первом обращении.
    /// Мьютекс сессии — единственная точка синхронизации между потоком
    /// обработки событий и колбэком таймера.
    pub async fn session(&self, chat_id: ChatId) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&chat_id) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::default())))
            .clone()
    }

    /// Полный сброс: гасит таймер старой сессии и подменяет запись новой,
    /// чтобы запоздавший таймер не сработал по следующему поколению
    pub async fn reset(&self, chat_id: ChatId) -> Arc<Mutex<Session>> {
        let fresh = Arc::new(Mutex::new(Session::default()));
        let old = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(chat_id, fresh.clone())
        };

        if let Some(old) = old {
            old.lock().await.cancel_flush_timer();
        }

        log::debug!("🧹 Chat {}: session reset", chat_id);
        fresh
    }

    /// Запоминает отправленное ботом сообщение для последующей уборки
    pub async fn track_sent(&self, chat_id: ChatId, message_id: MessageId) {
        let session = self.session(chat_id).await;
        session.lock().await.sent_message_ids.push(message_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionState;
    use std::time::Duration;

    #[tokio::test]
    async fn creates_default_session_on_first_access() {
        let state = BotState::new();
        let session = state.session(ChatId(1)).await;
        let session = session.lock().await;

        assert_eq!(session.state, SessionState::AwaitingModeSelection);
        assert_eq!(session.pending_count, 0);
        assert!(session.captions.is_empty());
        assert!(session.flush_timer.is_none());
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_chat() {
        let state = BotState::new();
        {
            let session = state.session(ChatId(1)).await;
            session.lock().await.caption_cursor = 5;
        }

        let other = state.session(ChatId(2)).await;
        assert_eq!(other.lock().await.caption_cursor, 0);

        let original = state.session(ChatId(1)).await;
        assert_eq!(original.lock().await.caption_cursor, 5);
    }

    #[tokio::test]
    async fn reset_replaces_record_and_cancels_timer() {
        let state = BotState::new();
        let old = state.session(ChatId(1)).await;
        {
            let mut session = old.lock().await;
            session.caption_cursor = 3;
            session.flush_timer = Some(tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(600)).await;
            }));
        }

        state.reset(ChatId(1)).await;

        assert!(old.lock().await.flush_timer.is_none());
        let fresh = state.session(ChatId(1)).await;
        assert_eq!(fresh.lock().await.caption_cursor, 0);
    }

    #[tokio::test]
    async fn track_sent_accumulates_message_ids() {
        let state = BotState::new();
        state.track_sent(ChatId(1), MessageId(10)).await;
        state.track_sent(ChatId(1), MessageId(11)).await;

        let session = state.session(ChatId(1)).await;
        assert_eq!(
            session.lock().await.sent_message_ids,
            vec![MessageId(10), MessageId(11)]
        );
    }
}
