//! Engagement summary over the whole tweet collection.

use crate::records::TweetRecord;
use chrono::{DateTime, Utc};

const TOP_TWEETS: usize = 5;
const TIMELINE_POINTS: usize = 10;
const NAME_WIDTH: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopTweet {
    pub name: String,
    pub likes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub likes: u64,
    pub retweets: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedStats {
    pub total_tweets: usize,
    pub total_likes: u64,
    pub total_retweets: u64,
    pub total_views: u64,
    pub avg_likes: u64,
    pub avg_retweets: u64,
    pub top_by_likes: Vec<TopTweet>,
    pub timeline: Vec<TimelinePoint>,
}

impl FeedStats {
    pub fn compute(tweets: &[TweetRecord]) -> Self {
        let total_tweets = tweets.len();
        let total_likes: u64 = tweets.iter().map(TweetRecord::likes).sum();
        let total_retweets: u64 = tweets.iter().map(TweetRecord::retweets).sum();
        let total_views: u64 = tweets.iter().map(TweetRecord::views).sum();

        let mut by_likes: Vec<&TweetRecord> = tweets.iter().collect();
        by_likes.sort_by_key(|t| std::cmp::Reverse(t.likes()));
        let top_by_likes = by_likes
            .into_iter()
            .take(TOP_TWEETS)
            .map(|t| TopTweet {
                name: short_name(t.author_name.as_deref()),
                likes: t.likes(),
            })
            .collect();

        let mut dated: Vec<(DateTime<Utc>, &TweetRecord)> = tweets
            .iter()
            .filter_map(|t| t.publication_date.map(|d| (d, t)))
            .collect();
        dated.sort_by_key(|(d, _)| *d);
        let skip = dated.len().saturating_sub(TIMELINE_POINTS);
        let timeline = dated
            .into_iter()
            .skip(skip)
            .map(|(date, t)| TimelinePoint {
                date,
                likes: t.likes(),
                retweets: t.retweets(),
            })
            .collect();

        Self {
            total_tweets,
            total_likes,
            total_retweets,
            total_views,
            avg_likes: rounded_mean(total_likes, total_tweets),
            avg_retweets: rounded_mean(total_retweets, total_tweets),
            top_by_likes,
            timeline,
        }
    }
}

/// Mean rounded half up; zero for an empty collection.
fn rounded_mean(total: u64, count: usize) -> u64 {
    if count == 0 {
        return 0;
    }
    let count = count as u128;
    ((2 * total as u128 + count) / (2 * count)) as u64
}

fn short_name(author: Option<&str>) -> String {
    match author {
        Some(name) if !name.is_empty() => name.chars().take(NAME_WIDTH).collect(),
        _ => "Unknown".to_string(),
    }
}
