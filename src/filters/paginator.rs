//! Paginated filter listing and its navigation callbacks.

use std::fmt;
use std::str::FromStr;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::filters::FilterError;
use crate::utils::html_escape;

/// Keywords shown per page.
pub const PAGE_SIZE: usize = 10;

/// Prefix shared by every listing callback.
pub const CALLBACK_PREFIX: &str = "filters_";

/// Page requested by `/filters [page]`. Anything unparsable, zero or
/// negative means the first page.
pub fn parse_page_arg(arg: Option<&str>) -> usize {
    arg.and_then(|a| a.trim().parse::<i64>().ok())
        .filter(|p| *p > 0)
        .map_or(1, |p| p as usize)
}

/// One page of a chat's keyword list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPage<'a> {
    /// 1-based, already clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    /// Index of `items[0]` in the full list.
    pub start_index: usize,
    pub items: &'a [String],
}

/// Slice out `page` of `keywords`, clamping out-of-range pages.
///
/// Returns `None` when the chat has no filters at all.
pub fn paginate(keywords: &[String], page: usize) -> Option<FilterPage<'_>> {
    if keywords.is_empty() {
        return None;
    }

    let total_pages = keywords.len().div_ceil(PAGE_SIZE);
    let page = page.clamp(1, total_pages);
    let start_index = (page - 1) * PAGE_SIZE;
    let end = (start_index + PAGE_SIZE).min(keywords.len());

    Some(FilterPage {
        page,
        total_pages,
        start_index,
        items: &keywords[start_index..end],
    })
}

impl FilterPage<'_> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// HTML listing with numbering continued across pages.
    pub fn render(&self, chat_name: &str) -> String {
        let mut text = format!(
            "<b>Filters in {} (Page {}/{}):</b>\n",
            html_escape(chat_name),
            self.page,
            self.total_pages
        );

        for (i, keyword) in self.items.iter().enumerate() {
            text.push_str(&format!(
                "{}. <code>{}</code>\n",
                self.start_index + i + 1,
                html_escape(keyword)
            ));
        }

        text
    }

    /// Previous/Next buttons, `None` for a single page.
    pub fn keyboard(&self, chat_id: i64) -> Option<InlineKeyboardMarkup> {
        let mut row = vec![];

        let index = self.page - 1;

        if self.has_prev() {
            let token = CallbackToken::new(NavDirection::Prev, chat_id, index);
            row.push(InlineKeyboardButton::callback("◀️ Previous", token.to_string()));
        }
        if self.has_next() {
            let token = CallbackToken::new(NavDirection::Next, chat_id, index);
            row.push(InlineKeyboardButton::callback("Next ▶️", token.to_string()));
        }

        (!row.is_empty()).then(|| InlineKeyboardMarkup::new(vec![row]))
    }
}

/// Direction of a navigation button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Prev,
    Next,
}

impl NavDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Next => "next",
        }
    }
}

/// Callback data of a navigation button: `filters_<prev|next>_<chat_id>_<page>`.
///
/// `page_index` is the 0-based index of the page the button was shown on,
/// not the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackToken {
    pub direction: NavDirection,
    pub chat_id: i64,
    pub page_index: usize,
}

impl CallbackToken {
    pub fn new(direction: NavDirection, chat_id: i64, page_index: usize) -> Self {
        Self {
            direction,
            chat_id,
            page_index,
        }
    }

    /// 1-based page to show after the button press, before clamping.
    pub fn target_page(&self) -> usize {
        match self.direction {
            NavDirection::Prev => self.page_index.max(1),
            NavDirection::Next => self.page_index.saturating_add(2),
        }
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}_{}",
            CALLBACK_PREFIX,
            self.direction.as_str(),
            self.chat_id,
            self.page_index
        )
    }
}

impl FromStr for CallbackToken {
    type Err = FilterError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        // Chat ids are negative for groups, so split from the left
        // and keep the minus sign attached to the id field.
        let parts: Vec<&str> = data.splitn(4, '_').collect();
        let [_, action, chat_id, page] = parts.as_slice() else {
            return Err(FilterError::MalformedCallback);
        };

        let direction = match *action {
            "prev" => NavDirection::Prev,
            "next" => NavDirection::Next,
            _ => return Err(FilterError::UnknownCallbackAction),
        };
        let chat_id = chat_id.parse().map_err(|_| FilterError::MalformedCallback)?;
        let page_index = page.parse().map_err(|_| FilterError::MalformedCallback)?;

        Ok(Self::new(direction, chat_id, page_index))
    }
}
