//! Feed filter engine.
//!
//! Turns the raw tweet collection plus the user's criteria into the ordered
//! view the feed displays. The whole view is recomputed on every call.

use crate::records::TweetRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Sentinel category meaning "no category restriction".
pub const ALL_CATEGORIES: &str = "all";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Latest,
    Likes,
    Retweets,
    Views,
}

impl SortKey {
    /// Unrecognized keys fall back to `Latest`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "likes" => SortKey::Likes,
            "retweets" => SortKey::Retweets,
            "views" => SortKey::Views,
            _ => SortKey::Latest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimePeriod {
    /// Unrecognized periods place no restriction, same as `All`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => TimePeriod::Today,
            "week" => TimePeriod::Week,
            "month" => TimePeriod::Month,
            _ => TimePeriod::All,
        }
    }

    /// Largest whole-day age retained by this window, `None` for `All`.
    fn max_days(self) -> Option<i64> {
        match self {
            TimePeriod::All => None,
            TimePeriod::Today => Some(1),
            TimePeriod::Week => Some(7),
            TimePeriod::Month => Some(30),
        }
    }
}

/// Whether `selected_category` narrows the feed.
///
/// `Ignore` reproduces the hosted site, where the category picker has no
/// effect on the result. `Enforce` keeps only tweets tagged with the
/// selected category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMode {
    #[default]
    Ignore,
    Enforce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_query: String,
    pub selected_category: String,
    pub sort_key: SortKey,
    pub min_likes: u64,
    pub min_retweets: u64,
    pub time_period: TimePeriod,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            selected_category: ALL_CATEGORIES.to_string(),
            sort_key: SortKey::default(),
            min_likes: 0,
            min_retweets: 0,
            time_period: TimePeriod::default(),
        }
    }
}

/// Source of "now" for time-window filtering.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct FeedFilter<C = SystemClock> {
    clock: C,
    category_mode: CategoryMode,
}

impl FeedFilter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for FeedFilter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FeedFilter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            category_mode: CategoryMode::default(),
        }
    }

    pub fn category_mode(mut self, mode: CategoryMode) -> Self {
        self.category_mode = mode;
        self
    }

    /// Filter then sort. Records are cloned into the result, never mutated.
    /// Sorting is stable, so records with equal keys keep their input order.
    pub fn apply(&self, records: &[TweetRecord], criteria: &FilterCriteria) -> Vec<TweetRecord> {
        let now = self.clock.now();
        let query = criteria.search_query.to_lowercase();

        let mut view: Vec<TweetRecord> = records
            .iter()
            .filter(|tweet| {
                matches_search(tweet, &query)
                    && meets_thresholds(tweet, criteria)
                    && within_period(tweet, criteria.time_period, now)
                    && self.matches_category(tweet, &criteria.selected_category)
            })
            .cloned()
            .collect();

        match criteria.sort_key {
            SortKey::Likes => view.sort_by_key(|t| Reverse(t.likes())),
            SortKey::Retweets => view.sort_by_key(|t| Reverse(t.retweets())),
            SortKey::Views => view.sort_by_key(|t| Reverse(t.views())),
            SortKey::Latest => view.sort_by_key(|t| {
                Reverse(t.publication_date.map_or(0, |d| d.timestamp_millis()))
            }),
        }

        view
    }

    fn matches_category(&self, tweet: &TweetRecord, selected: &str) -> bool {
        match self.category_mode {
            CategoryMode::Ignore => true,
            CategoryMode::Enforce => {
                selected == ALL_CATEGORIES || tweet.category.as_deref() == Some(selected)
            }
        }
    }
}

/// Apply criteria against the wall clock, ignoring the category selection.
pub fn apply(records: &[TweetRecord], criteria: &FilterCriteria) -> Vec<TweetRecord> {
    FeedFilter::new().apply(records, criteria)
}

fn matches_search(tweet: &TweetRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains(query))
    };
    contains(&tweet.content) || contains(&tweet.author_name)
}

fn meets_thresholds(tweet: &TweetRecord, criteria: &FilterCriteria) -> bool {
    tweet.likes() >= criteria.min_likes && tweet.retweets() >= criteria.min_retweets
}

fn within_period(tweet: &TweetRecord, period: TimePeriod, now: DateTime<Utc>) -> bool {
    let Some(max_days) = period.max_days() else {
        return true;
    };
    let Some(published) = tweet.publication_date else {
        return false;
    };
    let days = (now - published).num_milliseconds().div_euclid(MS_PER_DAY);
    days <= max_days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
    }

    fn engine() -> FeedFilter<FixedClock> {
        FeedFilter::with_clock(FixedClock(now()))
    }

    fn tweet(id: &str) -> TweetRecord {
        TweetRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn with_likes(id: &str, likes: u64) -> TweetRecord {
        TweetRecord {
            likes_count: Some(likes),
            ..tweet(id)
        }
    }

    fn published(id: &str, y: i32, m: u32, d: u32) -> TweetRecord {
        TweetRecord {
            publication_date: Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
            ..tweet(id)
        }
    }

    fn ids(records: &[TweetRecord]) -> Vec<&str> {
        records.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(engine().apply(&[], &FilterCriteria::default()).is_empty());
    }

    #[test]
    fn test_search_case_insensitive() {
        let records = vec![TweetRecord {
            content: Some("Viral Trend".to_string()),
            ..tweet("t1")
        }];
        for query in ["viral", "TREND", "l tr"] {
            let criteria = FilterCriteria {
                search_query: query.to_string(),
                ..Default::default()
            };
            assert_eq!(ids(&engine().apply(&records, &criteria)), vec!["t1"], "{query}");
        }
    }

    #[test]
    fn test_search_matches_author() {
        let records = vec![
            TweetRecord {
                author_name: Some("Grace Hopper".to_string()),
                ..tweet("by-grace")
            },
            TweetRecord {
                content: Some("unrelated".to_string()),
                ..tweet("other")
            },
        ];
        let criteria = FilterCriteria {
            search_query: "hopper".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &criteria)), vec!["by-grace"]);
    }

    #[test]
    fn test_search_missing_text_never_matches() {
        let records = vec![tweet("empty")];
        let criteria = FilterCriteria {
            search_query: "x".to_string(),
            ..Default::default()
        };
        assert!(engine().apply(&records, &criteria).is_empty());
    }

    #[test]
    fn test_threshold_inclusive() {
        let records = vec![with_likes("at", 100), with_likes("below", 99)];
        let criteria = FilterCriteria {
            min_likes: 100,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &criteria)), vec!["at"]);
    }

    #[test]
    fn test_retweet_threshold_inclusive() {
        let records = vec![
            TweetRecord {
                retweets_count: Some(50),
                ..tweet("at")
            },
            TweetRecord {
                retweets_count: Some(49),
                ..tweet("below")
            },
            tweet("missing"),
        ];
        let criteria = FilterCriteria {
            min_retweets: 50,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &criteria)), vec!["at"]);
    }

    #[test]
    fn test_zero_threshold_keeps_missing_counts() {
        let records = vec![tweet("missing")];
        assert_eq!(
            ids(&engine().apply(&records, &FilterCriteria::default())),
            vec!["missing"]
        );
    }

    #[test]
    fn test_time_window_boundary() {
        let records = vec![published("one-day", 2024, 1, 9), published("two-days", 2024, 1, 8)];

        let today = FilterCriteria {
            time_period: TimePeriod::Today,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &today)), vec!["one-day"]);

        let week = FilterCriteria {
            time_period: TimePeriod::Week,
            ..Default::default()
        };
        assert_eq!(
            ids(&engine().apply(&records, &week)),
            vec!["one-day", "two-days"]
        );
    }

    #[test]
    fn test_week_and_month_edges() {
        let records = vec![
            published("seven", 2024, 1, 3),
            published("eight", 2024, 1, 2),
            published("thirty", 2023, 12, 11),
            published("thirty-one", 2023, 12, 10),
        ];
        let week = FilterCriteria {
            time_period: TimePeriod::Week,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &week)), vec!["seven"]);

        let month = FilterCriteria {
            time_period: TimePeriod::Month,
            ..Default::default()
        };
        assert_eq!(
            ids(&engine().apply(&records, &month)),
            vec!["seven", "eight", "thirty"]
        );
    }

    #[test]
    fn test_partial_day_floors() {
        let records = vec![TweetRecord {
            publication_date: Some(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 1).unwrap()),
            ..tweet("just-under-two")
        }];
        let today = FilterCriteria {
            time_period: TimePeriod::Today,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &today)), vec!["just-under-two"]);
    }

    #[test]
    fn test_future_dates_in_every_window() {
        let records = vec![published("tomorrow", 2024, 1, 11)];
        let today = FilterCriteria {
            time_period: TimePeriod::Today,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &today)), vec!["tomorrow"]);
    }

    #[test]
    fn test_missing_date_only_in_all() {
        let records = vec![tweet("undated")];
        let month = FilterCriteria {
            time_period: TimePeriod::Month,
            ..Default::default()
        };
        assert!(engine().apply(&records, &month).is_empty());

        let all = FilterCriteria {
            time_period: TimePeriod::All,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &all)), vec!["undated"]);
    }

    #[test]
    fn test_sort_by_likes() {
        let records = vec![with_likes("a", 10), with_likes("b", 30), with_likes("c", 20)];
        let criteria = FilterCriteria {
            sort_key: SortKey::Likes,
            ..Default::default()
        };
        let likes: Vec<u64> = engine()
            .apply(&records, &criteria)
            .iter()
            .map(|t| t.likes())
            .collect();
        assert_eq!(likes, vec![30, 20, 10]);
    }

    #[test]
    fn test_sort_by_retweets_and_views() {
        let records = vec![
            TweetRecord {
                retweets_count: Some(1),
                views_count: Some(500),
                ..tweet("a")
            },
            TweetRecord {
                retweets_count: Some(9),
                views_count: None,
                ..tweet("b")
            },
        ];
        let by_retweets = FilterCriteria {
            sort_key: SortKey::Retweets,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &by_retweets)), vec!["b", "a"]);

        let by_views = FilterCriteria {
            sort_key: SortKey::Views,
            ..Default::default()
        };
        assert_eq!(ids(&engine().apply(&records, &by_views)), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_latest_undated_last() {
        let records = vec![
            tweet("undated"),
            published("old", 2023, 6, 1),
            published("new", 2024, 1, 9),
        ];
        assert_eq!(
            ids(&engine().apply(&records, &FilterCriteria::default())),
            vec!["new", "old", "undated"]
        );
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let records = vec![
            with_likes("first", 5),
            with_likes("top", 9),
            with_likes("second", 5),
            with_likes("third", 5),
        ];
        let criteria = FilterCriteria {
            sort_key: SortKey::Likes,
            ..Default::default()
        };
        assert_eq!(
            ids(&engine().apply(&records, &criteria)),
            vec!["top", "first", "second", "third"]
        );
    }

    #[test]
    fn test_filter_idempotent_on_own_output() {
        let records = vec![
            TweetRecord {
                content: Some("viral cats".to_string()),
                likes_count: Some(500),
                ..published("a", 2024, 1, 5)
            },
            TweetRecord {
                content: Some("viral dogs".to_string()),
                likes_count: Some(5),
                ..published("b", 2024, 1, 6)
            },
            TweetRecord {
                content: Some("Viral birds".to_string()),
                likes_count: Some(900),
                ..published("c", 2023, 1, 1)
            },
            TweetRecord {
                content: Some("viral fish".to_string()),
                likes_count: Some(700),
                ..published("d", 2024, 1, 9)
            },
        ];
        let criteria = FilterCriteria {
            search_query: "viral".to_string(),
            min_likes: 100,
            time_period: TimePeriod::Week,
            sort_key: SortKey::Likes,
            ..Default::default()
        };
        let once = engine().apply(&records, &criteria);
        let twice = engine().apply(&once, &criteria);
        assert_eq!(ids(&once), vec!["d", "a"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_category_ignored_by_default() {
        let records = vec![
            TweetRecord {
                category: Some("tech".to_string()),
                ..tweet("tech")
            },
            tweet("untagged"),
        ];
        let criteria = FilterCriteria {
            selected_category: "memes".to_string(),
            ..Default::default()
        };
        assert_eq!(
            ids(&engine().apply(&records, &criteria)),
            vec!["tech", "untagged"]
        );
    }

    #[test]
    fn test_category_enforced() {
        let records = vec![
            TweetRecord {
                category: Some("tech".to_string()),
                ..tweet("tech")
            },
            TweetRecord {
                category: Some("memes".to_string()),
                ..tweet("memes")
            },
            tweet("untagged"),
        ];
        let engine = engine().category_mode(CategoryMode::Enforce);

        let criteria = FilterCriteria {
            selected_category: "memes".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&engine.apply(&records, &criteria)), vec!["memes"]);

        let all = FilterCriteria::default();
        assert_eq!(engine.apply(&records, &all).len(), 3);
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!(SortKey::parse("likes"), SortKey::Likes);
        assert_eq!(SortKey::parse("Views"), SortKey::Views);
        assert_eq!(SortKey::parse("retweets"), SortKey::Retweets);
        assert_eq!(SortKey::parse("trending"), SortKey::Latest);
    }

    #[test]
    fn test_parse_time_period() {
        assert_eq!(TimePeriod::parse("today"), TimePeriod::Today);
        assert_eq!(TimePeriod::parse("WEEK"), TimePeriod::Week);
        assert_eq!(TimePeriod::parse("month"), TimePeriod::Month);
        assert_eq!(TimePeriod::parse("decade"), TimePeriod::All);
    }

    #[test]
    fn test_free_apply_uses_wall_clock() {
        let records = vec![TweetRecord {
            publication_date: Some(Utc::now()),
            ..tweet("fresh")
        }];
        let criteria = FilterCriteria {
            time_period: TimePeriod::Today,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&records, &criteria)), vec!["fresh"]);
    }
}
