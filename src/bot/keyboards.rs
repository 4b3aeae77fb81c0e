//! Inline keyboards for picking a currency
//!
//! The popular keyboard is fixed; the full list is paged, with the page
//! number carried in the callback data of the navigation buttons.

use super::commands::CallbackAction;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Currencies shown on the first keyboard, as `(code, label)`.
pub const POPULAR: [(&str, &str); 6] = [
    ("USD", "USD - Доллар США"),
    ("EUR", "EUR - Евро"),
    ("CNY", "CNY - Юань"),
    ("GBP", "GBP - Фунт стерлингов"),
    ("JPY", "JPY - Иен"),
    ("CHF", "CHF - Швейцарский франк"),
];

fn btn(text: &str, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), action.to_string())
}

/// Code part of a `"CODE - Name"` label.
pub fn code_of(label: &str) -> &str {
    label.split(" - ").next().unwrap_or(label).trim()
}

fn is_popular(code: &str) -> bool {
    POPULAR.iter().any(|(popular, _)| *popular == code)
}

/// Listed currencies that are not already on the popular keyboard.
pub fn extra_currencies(all: &[String]) -> Vec<String> {
    all.iter()
        .filter(|label| !is_popular(code_of(label)))
        .cloned()
        .collect()
}

pub fn page_count(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1)).max(1)
}

/// Items on the 1-based `page`; empty past the end.
pub fn page_items(items: &[String], page: usize, per_page: usize) -> &[String] {
    let per_page = per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

pub fn popular_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = POPULAR
        .iter()
        .map(|(code, label)| vec![btn(label, CallbackAction::Currency(code.to_string()))])
        .collect();
    rows.push(vec![btn("Показать еще", CallbackAction::More)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn all_currencies_keyboard(items: &[String], page: usize, per_page: usize) -> InlineKeyboardMarkup {
    let total_pages = page_count(items.len(), per_page);
    let page = page.clamp(1, total_pages);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = page_items(items, page, per_page)
        .iter()
        .map(|label| {
            vec![btn(
                label,
                CallbackAction::Currency(code_of(label).to_string()),
            )]
        })
        .collect();

    let previous = if page > 1 {
        CallbackAction::Page(page - 1)
    } else {
        CallbackAction::Noop
    };
    let next = if page < total_pages {
        CallbackAction::Page(page + 1)
    } else {
        CallbackAction::Noop
    };

    rows.push(vec![
        btn("<-", previous),
        btn(&format!("Назад {page}/{total_pages}"), CallbackAction::Back),
        btn("->", next),
    ]);

    InlineKeyboardMarkup::new(rows)
}
