use chrono::{DateTime, TimeZone, Utc};
use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::html,
};

use crate::domain::entities::chapter::{ChapterPage, SortMode};

const CALLBACK_PREFIX: &str = "list_page";

pub const ERROR_MESSAGE: &str = "An error occurred. Please try again.";

pub const HELP_MESSAGE: &str = "<b>🤖 Available Commands</b>\n\n\
<b>/list</b> - Show chapters sorted by chapter number\n\
Usage: <code>/list</code>\n\n\
<b>/list sort=updated</b> - Show chapters sorted by last update\n\
Usage: <code>/list sort=updated</code> (any value other than <code>chapter</code> sorts by last update)\n\n\
<b>/get &lt;number&gt;</b> - Download a chapter from the last listed page\n\
Example: <code>/get 1</code> (gets the first chapter from the current list)\n\n\
<b>🔄 Pagination:</b>\n\
Use the inline buttons <b>« Prev</b> and <b>Next »</b> to scroll through chapters.\n\
Sorting will persist as you navigate.\n\n\
<b>ℹ️ Tip:</b> Always use <code>/list</code> before <code>/get</code> to refresh your chapter list.";

/// Sort mode from `/list` arguments, the last `sort=` wins. Without one the
/// list is sorted by chapter, any `sort=` value other than `chapter` sorts by
/// last update.
pub fn parse_list_args(args: &str) -> SortMode {
    match args
        .split_whitespace()
        .filter_map(|arg| arg.strip_prefix("sort="))
        .last()
    {
        None => SortMode::default(),
        Some(mode) if mode.eq_ignore_ascii_case("chapter") => SortMode::Chapter,
        Some(_) => SortMode::Updated,
    }
}

pub fn callback_data(page: usize, sort: SortMode) -> String {
    format!("{CALLBACK_PREFIX}:{page}:{sort}")
}

/// Parses `list_page:<page>:<sort>`.
pub fn parse_callback_data(data: &str) -> Option<(usize, SortMode)> {
    let mut parts = data.split(':');
    if parts.next()? != CALLBACK_PREFIX {
        return None;
    }

    let page = parts.next()?.trim().parse().ok()?;
    let sort = parts.next()?.parse().ok()?;

    match parts.next() {
        Some(_) => None,
        None => Some((page, sort)),
    }
}

/// `YYYY-MM-DD HH:MM` in `tz`, `unknown` for a missing or zero timestamp.
pub fn format_timestamp<Tz: TimeZone>(ts: Option<f64>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.filter(|ts| *ts != 0.0 && ts.is_finite())
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.trunc() as i64, 0))
        .map(|dt| dt.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn format_page<Tz: TimeZone>(page: &ChapterPage, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if page.chapters.is_empty() {
        return format!("No chapters found for page {}.", page.page);
    }

    let mut message = format!(
        "<b>📚 Chapters (Page {}/{})</b>\n\n",
        page.page, page.total_pages
    );

    for (idx, chapter) in page.chapters.iter().enumerate() {
        message.push_str(&format!(
            "<b>{}.</b> {} <i>(⏱️ {})</i>\n",
            idx + 1,
            html::escape(&chapter.title),
            format_timestamp(chapter.last_updated, tz)
        ));
    }

    message.push_str("\nUse <code>/get &lt;number&gt;</code> to download a chapter.");
    message.push_str("\n\n<code>/list sort=chapter</code> or <code>/list sort=updated</code>");

    message
}

pub fn keyboard(page: &ChapterPage) -> Option<InlineKeyboardMarkup> {
    let mut buttons = vec![];
    if page.has_prev() {
        buttons.push(InlineKeyboardButton::callback(
            "« Prev",
            callback_data(page.page - 1, page.sort),
        ));
    }
    if page.has_next() {
        buttons.push(InlineKeyboardButton::callback(
            "Next »",
            callback_data(page.page + 1, page.sort),
        ));
    }

    (!buttons.is_empty()).then(|| InlineKeyboardMarkup::new(vec![buttons]))
}
