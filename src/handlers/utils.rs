use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Главное меню с кнопкой загрузки файла подписей
pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Json", "mode_json",
    )]])
}
