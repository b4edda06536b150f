//! Inline keyboard (button grid) builder.

use serde::{Deserialize, Serialize};

/// Buttons beyond this many in one row are silently refused.
pub const MAX_BUTTONS_PER_ROW: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

/// The request-ready `reply_markup` structure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboardMarkup {
    pub fn rows(&self) -> usize {
        self.inline_keyboard.len()
    }
}

/// Builds a button grid row by row. Buttons are appended to the last row.
#[derive(Clone, Debug)]
pub struct InlineKeyboardBuilder {
    rows: Vec<Vec<InlineButton>>,
}

impl Default for InlineKeyboardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InlineKeyboardBuilder {
    pub fn new() -> Self {
        Self {
            rows: vec![Vec::new()],
        }
    }

    pub fn new_row(mut self) -> Self {
        self.rows.push(Vec::new());
        self
    }

    pub fn button(self, text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        self.push(InlineButton::callback(text, callback_data))
    }

    pub fn url_button(self, text: impl Into<String>, url: impl Into<String>) -> Self {
        self.push(InlineButton::url(text, url))
    }

    /// No-op once the current row holds [`MAX_BUTTONS_PER_ROW`] buttons.
    pub fn push(mut self, button: InlineButton) -> Self {
        if let Some(row) = self.rows.last_mut() {
            if row.len() < MAX_BUTTONS_PER_ROW {
                row.push(button);
            }
        }
        self
    }

    /// Render the grid. Rows left empty (e.g. a trailing `new_row`) are dropped.
    pub fn build(&self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup {
            inline_keyboard: self
                .rows
                .iter()
                .filter(|r| !r.is_empty())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ninth_button_is_refused() {
        let mut kb = InlineKeyboardBuilder::new();
        for i in 0..12 {
            kb = kb.button(format!("b{i}"), format!("pick_{i}"));
        }
        let markup = kb.build();
        assert_eq!(markup.rows(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), MAX_BUTTONS_PER_ROW);
        assert_eq!(markup.inline_keyboard[0][7].text, "b7");
    }

    #[test]
    fn rows_keep_their_order_and_lengths() {
        let markup = InlineKeyboardBuilder::new()
            .button("one", "r1_a")
            .new_row()
            .button("two", "r2_a")
            .url_button("site", "https://example.org")
            .build();
        let lens: Vec<usize> = markup.inline_keyboard.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![1, 2]);
        assert_eq!(markup.inline_keyboard[0][0].text, "one");
        assert_eq!(
            markup.inline_keyboard[1][1].url.as_deref(),
            Some("https://example.org")
        );
    }

    #[test]
    fn cap_applies_per_row() {
        let mut kb = InlineKeyboardBuilder::new();
        for i in 0..9 {
            kb = kb.button(i.to_string(), i.to_string());
        }
        kb = kb.new_row().button("next", "n");
        let markup = kb.build();
        assert_eq!(markup.inline_keyboard[0].len(), 8);
        assert_eq!(markup.inline_keyboard[1].len(), 1);
    }

    #[test]
    fn empty_rows_are_not_rendered() {
        let markup = InlineKeyboardBuilder::new()
            .new_row()
            .button("a", "a")
            .new_row()
            .build();
        assert_eq!(markup.rows(), 1);
    }

    #[test]
    fn buttons_omit_unused_fields() {
        let json = serde_json::to_value(InlineButton::callback("Yes", "vote_yes")).unwrap();
        assert_eq!(json.get("callback_data").and_then(|v| v.as_str()), Some("vote_yes"));
        assert!(json.get("url").is_none());
    }
}
