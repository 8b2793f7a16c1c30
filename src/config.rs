use std::time::Duration;

/// Максимум файлов в одной пачке
pub const MAX_FILES_PER_BATCH: usize = 10;

/// Минимум подписей в загружаемом файле
pub const MIN_CAPTIONS_REQUIRED: usize = 10;

/// Окно ожидания новых файлов перед отправкой неполной пачки
pub const COLLECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Пауза между отправками, чтобы не нарушать порядок и лимиты Telegram
pub const SEND_DELAY: Duration = Duration::from_millis(500);

/// Максимальный размер файла с подписями
pub const MAX_FILE_SIZE_MB: u32 = 20;

pub const WELCOME_MESSAGE: &str =
    "Отправьте свои файлы для переименования или воспользуйтесь кнопкой ниже, \
     чтобы добавить JSON-файл с подписями.";
