use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use searchx::analytics::FeedStats;
use searchx::bookmarks::{BookmarkStore, FileSlot};
use searchx::config::Config;
use searchx::filter::{Clock, FeedFilter, FilterCriteria, SortKey, SystemClock, TimePeriod};
use searchx::format::{format_count, format_grouped, format_long, format_relative};
use searchx::identity::{Identity, MemberIdentity};
use searchx::records::{Feed, RecordBackend, RecordStore, TweetRecord, TWEETS_COLLECTION};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const WRAP_WIDTH: usize = 76;

#[derive(Parser)]
#[command(name = "searchx")]
#[command(about = "Browse, filter and bookmark viral tweets", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the filtered, sorted feed
    Feed {
        /// Case-insensitive text matched against content and author
        #[arg(short, long, default_value = "")]
        search: String,

        /// Category id, or "all"
        #[arg(long, default_value = "all")]
        category: String,

        /// latest, likes, retweets or views
        #[arg(long, default_value = "latest")]
        sort: String,

        #[arg(long, default_value_t = 0)]
        min_likes: u64,

        #[arg(long, default_value_t = 0)]
        min_retweets: u64,

        /// all, today, week or month
        #[arg(long, default_value = "all")]
        period: String,

        /// Show at most this many tweets
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// List active categories in display order
    Categories,
    /// Show one tweet in full
    Show { id: String },
    /// List saved tweets
    Saved {
        /// Remove every saved tweet
        #[arg(long)]
        clear: bool,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Engagement summary for the whole collection
    Stats,
}

#[derive(Subcommand)]
enum BookmarkAction {
    Add { id: String },
    Remove { id: String },
    Toggle { id: String },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;
    let store = config.store.open()?;
    let identity = MemberIdentity::new(config.member.name.clone());
    let mut bookmarks = BookmarkStore::open(FileSlot::new(config.bookmarks.data_dir.clone()));

    match cli.command {
        Command::Feed {
            search,
            category,
            sort,
            min_likes,
            min_retweets,
            period,
            limit,
        } => {
            let criteria = FilterCriteria {
                search_query: search,
                selected_category: category,
                sort_key: SortKey::parse(&sort),
                min_likes,
                min_retweets,
                time_period: TimePeriod::parse(&period),
            };
            let feed = Feed::load(&store).await;
            let engine = FeedFilter::new().category_mode(config.feed.category_mode);
            let view = engine.apply(&feed.tweets, &criteria);

            println!("{} of {} tweets", view.len(), feed.tweets.len());
            let now = SystemClock.now();
            for tweet in view.iter().take(limit.unwrap_or(usize::MAX)) {
                print_card(tweet, bookmarks.contains(&tweet.id), now);
            }
        }
        Command::Categories => {
            let feed = Feed::load(&store).await;
            if feed.categories.is_empty() {
                println!("No categories.");
            }
            for category in &feed.categories {
                println!(
                    "{:<20} {}",
                    category.id,
                    category.category_name.as_deref().unwrap_or("")
                );
                if let Some(description) = &category.description {
                    println!("{:<20} {}", "", description);
                }
            }
        }
        Command::Show { id } => {
            let tweet = store
                .get_by_id::<TweetRecord>(TWEETS_COLLECTION, &id)
                .await
                .with_context(|| format!("failed to load tweet {}", id))?
                .with_context(|| format!("tweet {} not found", id))?;
            print_detail(&tweet, bookmarks.contains(&tweet.id));
        }
        Command::Saved { clear } => {
            if clear {
                require_member(&identity, &config_path)?;
                bookmarks.clear();
                println!("Removed all saved tweets.");
                return Ok(());
            }
            let tweets = if bookmarks.is_empty() {
                Vec::new()
            } else {
                load_tweets(&store).await
            };
            let saved = bookmarks.saved_records(&tweets);
            if let Some(notice) = saved_notice(bookmarks.len(), saved.len()) {
                println!("{}", notice);
            }
            let now = SystemClock.now();
            for tweet in saved {
                print_card(tweet, true, now);
            }
        }
        Command::Bookmark { action } => {
            require_member(&identity, &config_path)?;
            match action {
                BookmarkAction::Add { id } => {
                    if bookmarks.add(id.as_str()) {
                        println!("Saved {}", id);
                    } else {
                        println!("{} is already saved", id);
                    }
                }
                BookmarkAction::Remove { id } => {
                    if bookmarks.remove(&id) {
                        println!("Removed {}", id);
                    } else {
                        println!("{} was not saved", id);
                    }
                }
                BookmarkAction::Toggle { id } => {
                    if bookmarks.toggle(&id) {
                        println!("Saved {}", id);
                    } else {
                        println!("Removed {}", id);
                    }
                }
                BookmarkAction::Clear => {
                    bookmarks.clear();
                    println!("Removed all saved tweets.");
                }
            }
        }
        Command::Stats => {
            let feed = Feed::load(&store).await;
            print_stats(&FeedStats::compute(&feed.tweets), feed.categories.len());
        }
    }

    Ok(())
}

fn require_member(identity: &impl Identity, config_path: &std::path::Path) -> Result<()> {
    if !identity.is_authenticated() {
        anyhow::bail!(
            "sign in to manage bookmarks: set [member] name in {}",
            config_path.display()
        );
    }
    tracing::debug!(member = identity.member_name(), "bookmark change");
    Ok(())
}

/// Message shown above the saved list when nothing can be printed.
fn saved_notice(bookmarked: usize, loaded: usize) -> Option<String> {
    match (bookmarked, loaded) {
        (0, _) => Some("No saved tweets yet.".to_string()),
        (n, 0) => Some(format!("{} saved tweets could not be loaded", n)),
        _ => None,
    }
}

async fn load_tweets(store: &RecordBackend) -> Vec<TweetRecord> {
    match store.get_all::<TweetRecord>(TWEETS_COLLECTION).await {
        Ok(page) => page.items,
        Err(e) => {
            tracing::error!(error = %e, "error loading saved tweets");
            Vec::new()
        }
    }
}

fn author_line(tweet: &TweetRecord) -> String {
    let name = tweet.author_name.as_deref().unwrap_or("Unknown");
    match tweet.author_handle.as_deref() {
        Some(handle) => format!("{} {}", name, handle),
        None => name.to_string(),
    }
}

fn print_card(tweet: &TweetRecord, saved: bool, now: chrono::DateTime<chrono::Utc>) {
    let marker = if saved { " [saved]" } else { "" };
    let age = format_relative(tweet.publication_date, now);
    println!();
    if age.is_empty() {
        println!("{}{}", author_line(tweet), marker);
    } else {
        println!("{} · {}{}", author_line(tweet), age, marker);
    }
    if let Some(content) = &tweet.content {
        let options = textwrap::Options::new(WRAP_WIDTH)
            .initial_indent("  ")
            .subsequent_indent("  ");
        println!("{}", textwrap::fill(content, options));
    }
    println!(
        "  likes {}  retweets {}  views {}  ({})",
        format_count(tweet.likes_count),
        format_count(tweet.retweets_count),
        format_count(tweet.views_count),
        tweet.id
    );
}

fn print_detail(tweet: &TweetRecord, saved: bool) {
    println!("{}", author_line(tweet));
    let published = format_long(tweet.publication_date);
    if !published.is_empty() {
        println!("{}", published);
    }
    println!();
    if let Some(content) = &tweet.content {
        println!("{}", textwrap::fill(content, WRAP_WIDTH));
        println!();
    }
    if let Some(media) = &tweet.media_url {
        println!("Media:    {}", media);
    }
    println!("Likes:    {}", format_grouped(tweet.likes_count));
    println!("Retweets: {}", format_grouped(tweet.retweets_count));
    println!("Views:    {}", format_grouped(tweet.views_count));
    println!("Saved:    {}", if saved { "yes" } else { "no" });
}

fn print_stats(stats: &FeedStats, active_categories: usize) {
    println!("Tweets:      {}", format_count(Some(stats.total_tweets as u64)));
    println!("Likes:       {}", format_count(Some(stats.total_likes)));
    println!("Retweets:    {}", format_count(Some(stats.total_retweets)));
    println!("Views:       {}", format_count(Some(stats.total_views)));
    println!("Avg likes:   {}", format_count(Some(stats.avg_likes)));
    println!("Avg retweets: {}", format_count(Some(stats.avg_retweets)));
    println!("Categories:  {}", active_categories);

    if !stats.top_by_likes.is_empty() {
        println!();
        println!("Top tweets by likes");
        for top in &stats.top_by_likes {
            println!("  {:<15}  {}", top.name, format_count(Some(top.likes)));
        }
    }

    if !stats.timeline.is_empty() {
        println!();
        println!("Recent engagement");
        for point in &stats.timeline {
            println!(
                "  {:<6}  likes {:>7}  retweets {:>7}",
                point.date.format("%b %-d").to_string(),
                format_count(Some(point.likes)),
                format_count(Some(point.retweets))
            );
        }
    }
}
