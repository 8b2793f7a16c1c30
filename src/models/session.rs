use teloxide::types::MessageId;
use tokio::task::JoinHandle;

use crate::config::MAX_FILES_PER_BATCH;

/// Этапы работы с пользователем
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    AwaitingModeSelection,
    AwaitingCaptionFile,
    CollectingMedia,
    Dispatching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

/// Принятый от пользователя файл, ожидающий переотправки с подписью
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub file_id: String,
    pub message_id: MessageId,
}

/// Результат приёма очередного файла в пачку
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Идёт отправка пачки, файл отброшен
    Ignored,
    /// Пачка не заполнена, таймер нужно перезапустить
    Rearm,
    /// Пачка заполнена, отправлять немедленно
    BatchFull,
    /// Лимит превышен, пачка отбрасывается целиком
    Overflow,
}

/// Решение при срабатывании таймера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutAction {
    Skip,
    Flush,
    Discard,
}

#[derive(Debug, Default)]
pub struct Session {
    pub state: SessionState,
    pub captions: Vec<String>,
    pub caption_cursor: usize,
    pub pending_items: Vec<MediaItem>,
    pub pending_count: usize,
    pub flush_timer: Option<JoinHandle<()>>,
    pub sent_message_ids: Vec<MessageId>,
}

impl Session {
    /// Принимает файл в пачку и сообщает, что делать дальше
    pub fn accept_media(&mut self, item: MediaItem) -> CollectOutcome {
        match self.state {
            SessionState::Dispatching => return CollectOutcome::Ignored,
            SessionState::CollectingMedia => {}
            // Первый файл без выбора режима сразу переводит в сбор
            _ => self.state = SessionState::CollectingMedia,
        }

        self.pending_items.push(item);
        self.pending_count += 1;

        if self.pending_count > MAX_FILES_PER_BATCH {
            CollectOutcome::Overflow
        } else if self.pending_count == MAX_FILES_PER_BATCH {
            CollectOutcome::BatchFull
        } else {
            CollectOutcome::Rearm
        }
    }

    /// Забирает пачку на отправку, назначая каждому файлу подпись.
    /// None — отправка уже идёт или забирать нечего.
    pub fn begin_dispatch(&mut self) -> Option<Vec<(MediaItem, String)>> {
        if self.state == SessionState::Dispatching || self.pending_count == 0 {
            return None;
        }

        self.state = SessionState::Dispatching;
        self.cancel_flush_timer();

        let items = std::mem::take(&mut self.pending_items);
        self.pending_count = 0;

        let batch = items
            .into_iter()
            .map(|item| {
                let caption = self.next_caption();
                (item, caption)
            })
            .collect();

        Some(batch)
    }

    /// Своя подпись, пока они не кончились, дальше сквозная нумерация.
    /// Курсор общий для обеих веток и не откатывается после отправки пачки.
    fn next_caption(&mut self) -> String {
        let caption = if self.caption_cursor < self.captions.len() {
            self.captions[self.caption_cursor].clone()
        } else {
            format!("{}.", self.caption_cursor + 1)
        };
        self.caption_cursor += 1;
        caption
    }

    /// Завершает цикл отправки и возвращает сессию к сбору файлов
    pub fn finish_dispatch(&mut self, sent: Vec<MessageId>) {
        self.sent_message_ids.extend(sent);
        self.pending_items.clear();
        self.pending_count = 0;
        self.state = SessionState::CollectingMedia;
    }

    /// Сбрасывает переполненную пачку целиком, подписи и курсор не трогает
    pub fn discard_batch(&mut self) -> Vec<MediaItem> {
        self.cancel_flush_timer();
        self.pending_count = 0;
        self.state = SessionState::CollectingMedia;
        std::mem::take(&mut self.pending_items)
    }

    /// Перепроверка при срабатывании таймера: состояние могло измениться
    /// между постановкой и срабатыванием
    pub fn timeout_action(&self) -> TimeoutAction {
        if self.state != SessionState::CollectingMedia || self.pending_count == 0 {
            TimeoutAction::Skip
        } else if self.pending_count > MAX_FILES_PER_BATCH {
            TimeoutAction::Discard
        } else {
            TimeoutAction::Flush
        }
    }

    pub fn cancel_flush_timer(&mut self) {
        if let Some(timer) = self.flush_timer.take() {
            timer.abort();
        }
    }

    /// Сохраняет загруженный список подписей и начинает сбор файлов
    pub fn load_captions(&mut self, captions: Vec<String>) {
        self.captions = captions;
        self.caption_cursor = 0;
        self.state = SessionState::CollectingMedia;
    }
}
