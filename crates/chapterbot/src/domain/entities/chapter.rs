use std::{cmp::Ordering, collections::BTreeMap, fmt::Display, str::FromStr};

use serde::Deserialize;

pub const DEFAULT_CHAPTER_TITLE: &str = "Untitled Chapter";

/// Volume as published by the feed, which uses both strings and numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Volume {
    Number(f64),
    Text(String),
}

impl Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Volume::Number(n) => write!(f, "{n}"),
            Volume::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A group entry is normally the ordered page list of a scanlation source,
/// anything else (proxy links, nested objects) carries no pages for us.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GroupPages {
    Urls(Vec<String>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedChapter {
    pub title: Option<String>,
    pub volume: Option<Volume>,
    pub last_updated: Option<f64>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupPages>,
}

/// Raw feed document. Chapters are kept in key order so that every walk over
/// them, and therefore every tie-break, is deterministic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feed {
    pub title: Option<String>,
    #[serde(default)]
    pub chapters: BTreeMap<String, FeedChapter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub volume: Option<Volume>,
    pub last_updated: Option<f64>,
    pub pages: Vec<String>,
}

impl Chapter {
    pub fn from_feed(id: &str, chapter: &FeedChapter, group: &str) -> Self {
        let pages = match chapter.groups.get(group) {
            Some(GroupPages::Urls(urls)) => urls.clone(),
            _ => vec![],
        };

        Self {
            id: id.to_string(),
            title: chapter
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAPTER_TITLE.to_string()),
            volume: chapter.volume.clone(),
            last_updated: chapter.last_updated,
            pages,
        }
    }

    /// Timestamp used for ordering, absent means 0.
    pub fn updated_at(&self) -> f64 {
        self.last_updated.unwrap_or_default()
    }

    /// Numeric value of the chapter key, `None` for keys like `"extra"`.
    pub fn number(&self) -> Option<f64> {
        self.id.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

impl Feed {
    /// Flattens the feed into chapters, picking pages from `group`.
    pub fn chapters(&self, group: &str) -> Vec<Chapter> {
        self.chapters
            .iter()
            .map(|(id, chapter)| Chapter::from_feed(id, chapter, group))
            .collect()
    }
}

/// Picks the chapter with the greatest `last_updated`. On ties the first one
/// in iteration order wins.
pub fn latest_chapter(chapters: &[Chapter]) -> Option<&Chapter> {
    chapters.iter().reduce(|latest, chapter| {
        if chapter.updated_at().total_cmp(&latest.updated_at()) == Ordering::Greater {
            chapter
        } else {
            latest
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Chapter,
    Updated,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Chapter => "chapter",
            SortMode::Updated => "updated",
        }
    }
}

impl Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chapter" => Ok(SortMode::Chapter),
            "updated" => Ok(SortMode::Updated),
            other => Err(anyhow::anyhow!("unknown sort mode {other}")),
        }
    }
}

/// Sorts descending by the given key. Chapter keys compare by numeric value,
/// non-numeric keys go after every numeric one.
pub fn sort_chapters(chapters: &mut [Chapter], mode: SortMode) {
    match mode {
        SortMode::Chapter => chapters.sort_by(|a, b| match (a.number(), b.number()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.id.cmp(&a.id),
        }),
        SortMode::Updated => {
            chapters.sort_by(|a, b| b.updated_at().total_cmp(&a.updated_at()))
        }
    }
}

/// One window of a sorted chapter list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterPage {
    pub page: usize,
    pub total_pages: usize,
    pub sort: SortMode,
    pub chapters: Vec<Chapter>,
}

impl ChapterPage {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Cuts page `page` (1-based, clamped into range) out of `chapters`.
pub fn paginate(chapters: Vec<Chapter>, page: usize, per_page: usize, sort: SortMode) -> ChapterPage {
    let per_page = per_page.max(1);
    let total_pages = chapters.len().div_ceil(per_page);
    let page = page.min(total_pages).max(1);

    let chapters = chapters
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    ChapterPage {
        page,
        total_pages,
        sort,
        chapters,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chapter(id: &str, last_updated: Option<f64>) -> Chapter {
        Chapter {
            id: id.to_string(),
            title: format!("Chapter {id}"),
            volume: None,
            last_updated,
            pages: vec![],
        }
    }

    const FEED: &str = r#"{
        "title": "One Punch Man",
        "chapters": {
            "1": {
                "title": "One Punch",
                "volume": "1",
                "last_updated": 1600000000,
                "groups": {
                    "/r/OnePunchMan": ["https://i.example/1-1.png", "https://i.example/1-2.png"]
                }
            },
            "2": {
                "volume": 1,
                "groups": { "/r/OnePunchMan": "/proxy/api/imgur/chapter/abc" }
            },
            "3": {
                "title": "Third",
                "last_updated": 1700000000.5,
                "groups": { "other": ["https://i.example/3-1.png"] }
            }
        }
    }"#;

    #[test]
    fn test_parse_feed() {
        let feed: Feed = serde_json::from_str(FEED).unwrap();
        let chapters = feed.chapters("/r/OnePunchMan");

        assert_eq!(feed.title.as_deref(), Some("One Punch Man"));
        assert_eq!(chapters.len(), 3);

        assert_eq!(chapters[0].title, "One Punch");
        assert_eq!(chapters[0].volume, Some(Volume::Text("1".to_string())));
        assert_eq!(
            chapters[0].pages,
            vec!["https://i.example/1-1.png", "https://i.example/1-2.png"]
        );

        assert_eq!(chapters[1].title, DEFAULT_CHAPTER_TITLE);
        assert_eq!(chapters[1].volume, Some(Volume::Number(1.0)));
        assert_eq!(chapters[1].updated_at(), 0.0);
        assert!(chapters[1].pages.is_empty());

        assert!(chapters[2].pages.is_empty());
    }

    #[test]
    fn test_parse_feed_without_chapters() {
        let feed: Feed = serde_json::from_str("{}").unwrap();

        assert!(feed.chapters("/r/OnePunchMan").is_empty());
    }

    #[test]
    fn test_latest_chapter_ignores_order() {
        let a = chapter("A", Some(10.0));
        let b = chapter("B", Some(20.0));

        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b.clone(), a.clone()];

        assert_eq!(latest_chapter(&forward).map(|c| c.id.as_str()), Some("B"));
        assert_eq!(latest_chapter(&backward).map(|c| c.id.as_str()), Some("B"));
    }

    #[test]
    fn test_latest_chapter_tie_is_stable() {
        let chapters = vec![
            chapter("A", Some(10.0)),
            chapter("B", Some(10.0)),
            chapter("C", None),
        ];

        for _ in 0..5 {
            assert_eq!(latest_chapter(&chapters).map(|c| c.id.as_str()), Some("A"));
        }
    }

    #[test]
    fn test_latest_chapter_missing_timestamp_is_zero() {
        let chapters = vec![chapter("A", None), chapter("B", Some(1.0))];

        assert_eq!(latest_chapter(&chapters).map(|c| c.id.as_str()), Some("B"));
        assert!(latest_chapter(&[]).is_none());
    }

    #[test]
    fn test_sort_by_chapter_is_numeric() {
        let mut chapters = vec![
            chapter("1", None),
            chapter("10", None),
            chapter("2", None),
        ];

        sort_chapters(&mut chapters, SortMode::Chapter);

        let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "2", "1"]);
    }

    #[test]
    fn test_sort_by_chapter_puts_non_numeric_last() {
        let mut chapters = vec![
            chapter("extra", None),
            chapter("20.5", None),
            chapter("3", None),
        ];

        sort_chapters(&mut chapters, SortMode::Chapter);

        let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["20.5", "3", "extra"]);
    }

    #[test]
    fn test_sort_by_updated() {
        let mut chapters = vec![
            chapter("1", Some(5.0)),
            chapter("2", None),
            chapter("3", Some(7.0)),
        ];

        sort_chapters(&mut chapters, SortMode::Updated);

        let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_sort_mode_from_str() {
        assert_eq!("chapter".parse::<SortMode>().unwrap(), SortMode::Chapter);
        assert_eq!(" Updated ".parse::<SortMode>().unwrap(), SortMode::Updated);
        assert!("volume".parse::<SortMode>().is_err());
    }

    #[test]
    fn test_paginate() {
        let chapters: Vec<Chapter> = (1..=25).map(|i| chapter(&i.to_string(), None)).collect();

        let first = paginate(chapters.clone(), 1, 10, SortMode::Chapter);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.chapters.len(), 10);
        assert_eq!(first.chapters[0].id, "1");
        assert_eq!(first.chapters[9].id, "10");
        assert!(first.has_next());
        assert!(!first.has_prev());

        let last = paginate(chapters.clone(), 3, 10, SortMode::Chapter);
        assert_eq!(last.page, 3);
        let ids: Vec<&str> = last.chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["21", "22", "23", "24", "25"]);
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn test_paginate_clamps_page() {
        let chapters: Vec<Chapter> = (1..=25).map(|i| chapter(&i.to_string(), None)).collect();

        assert_eq!(paginate(chapters.clone(), 0, 10, SortMode::Updated).page, 1);
        assert_eq!(paginate(chapters, 9, 10, SortMode::Updated).page, 3);

        let empty = paginate(vec![], 1, 10, SortMode::Chapter);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.chapters.is_empty());
        assert!(!empty.has_next());
        assert!(!empty.has_prev());
    }
}
