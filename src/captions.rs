use std::fmt;

use crate::config::MIN_CAPTIONS_REQUIRED;

/// Ошибка разбора файла с подписями
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFileError {
    /// Файл не читается или не содержит ни одной подписи
    Unreadable,
    /// Подписей меньше обязательного минимума
    NotEnough(usize),
}

impl fmt::Display for CaptionFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionFileError::Unreadable => write!(f, "caption file is unreadable or empty"),
            CaptionFileError::NotEnough(found) => write!(
                f,
                "caption file has only {} captions, {} required",
                found, MIN_CAPTIONS_REQUIRED
            ),
        }
    }
}

impl std::error::Error for CaptionFileError {}

/// Разбирает файл с подписями (JSON или TXT) и возвращает список подписей
pub fn parse_caption_file(bytes: &[u8], file_name: &str) -> Result<Vec<String>, CaptionFileError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CaptionFileError::Unreadable)?;
    let name = file_name.to_lowercase();

    let captions = if name.ends_with(".json") {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Array(values)) => values
                .iter()
                .map(caption_from_value)
                .filter(|caption| !caption.is_empty())
                .collect(),
            // JSON корректен, но это не список
            Ok(_) => return Err(CaptionFileError::Unreadable),
            // Битый JSON пробуем прочитать построчно
            Err(_) => parse_lines(text),
        }
    } else if name.ends_with(".txt") {
        parse_lines(text)
    } else {
        return Err(CaptionFileError::Unreadable);
    };

    if captions.is_empty() {
        Err(CaptionFileError::Unreadable)
    } else if captions.len() < MIN_CAPTIONS_REQUIRED {
        Err(CaptionFileError::NotEnough(captions.len()))
    } else {
        Ok(captions)
    }
}

fn caption_from_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Строки как есть: только обрезка пробелов, нумерацию в начале не вычищаем
fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(count: usize) -> String {
        (1..=count)
            .map(|n| format!("строка {}", n))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn rejects_nine_lines_with_count() {
        let text = lines(9);
        assert_eq!(
            parse_caption_file(text.as_bytes(), "captions.txt"),
            Err(CaptionFileError::NotEnough(9))
        );
    }

    #[test]
    fn accepts_exactly_ten_lines() {
        let text = lines(10);
        let captions = parse_caption_file(text.as_bytes(), "captions.txt").unwrap();
        assert_eq!(captions.len(), 10);
        assert_eq!(captions[0], "строка 1");
        assert_eq!(captions[9], "строка 10");
    }

    #[test]
    fn json_array_preserves_order() {
        let text = r#"["a","b","c","d","e","f","g","h","i","j"]"#;
        let captions = parse_caption_file(text.as_bytes(), "captions.json").unwrap();
        assert_eq!(
            captions,
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]
        );
    }

    #[test]
    fn txt_drops_blank_lines_and_trims() {
        let text = "  один  \nдва\n\n   \nтри\nчетыре\nпять\nшесть\nсемь\nвосемь\nдевять\nдесять\n";
        let captions = parse_caption_file(text.as_bytes(), "captions.txt").unwrap();
        assert_eq!(captions.len(), 10);
        assert_eq!(captions[0], "один");
        assert_eq!(captions[1], "два");
        assert_eq!(captions[2], "три");
    }

    #[test]
    fn enumeration_markers_are_kept_verbatim() {
        let text = (1..=10)
            .map(|n| format!("{}. подпись", n))
            .collect::<Vec<_>>()
            .join("\n");
        let captions = parse_caption_file(text.as_bytes(), "captions.txt").unwrap();
        assert_eq!(captions[0], "1. подпись");
        assert_eq!(captions[9], "10. подпись");
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let bytes = [0xff, 0xfe, 0xfd];
        assert_eq!(
            parse_caption_file(&bytes, "captions.txt"),
            Err(CaptionFileError::Unreadable)
        );
    }

    #[test]
    fn empty_file_is_unreadable() {
        assert_eq!(
            parse_caption_file(b"", "captions.txt"),
            Err(CaptionFileError::Unreadable)
        );
        assert_eq!(
            parse_caption_file(b"\n\n  \n", "captions.txt"),
            Err(CaptionFileError::Unreadable)
        );
    }

    #[test]
    fn json_that_is_not_an_array_is_unreadable() {
        let text = r#"{"captions": ["a", "b"]}"#;
        assert_eq!(
            parse_caption_file(text.as_bytes(), "captions.json"),
            Err(CaptionFileError::Unreadable)
        );
    }

    #[test]
    fn malformed_json_falls_back_to_lines() {
        // Запятой не хватает, но построчно файл читается
        let text = "первая строка\nвторая строка\n[не json\nа\nб\nв\nг\nд\nе\nж";
        let captions = parse_caption_file(text.as_bytes(), "captions.json").unwrap();
        assert_eq!(captions.len(), 10);
        assert_eq!(captions[0], "первая строка");
        assert_eq!(captions[2], "[не json");
    }

    #[test]
    fn json_values_are_stringified() {
        let text = r#"["a", 2, true, null, "b", "c", "d", "e", "f", "g", "h"]"#;
        let captions = parse_caption_file(text.as_bytes(), "captions.json").unwrap();
        assert_eq!(captions[1], "2");
        assert_eq!(captions[2], "true");
        assert_eq!(captions[3], "null");
    }

    #[test]
    fn whitespace_only_json_entries_are_dropped() {
        let text = r#"["a", "   ", "b", "c", "d", "e", "f", "g", "h", "i", "j"]"#;
        let captions = parse_caption_file(text.as_bytes(), "captions.json").unwrap();
        assert_eq!(captions.len(), 10);
        assert!(!captions.contains(&String::new()));
    }

    #[test]
    fn unknown_extension_is_unreadable() {
        assert_eq!(
            parse_caption_file(b"whatever", "captions.csv"),
            Err(CaptionFileError::Unreadable)
        );
    }
}
