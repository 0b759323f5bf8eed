//! Discovery core for a viral tweet feed.
//!
//! [`filter`] turns the tweet collection and the user's criteria into the
//! ordered feed, [`bookmarks`] keeps the saved tweet ids of the current
//! profile, and [`records`] reads the hosted collections both work from.

pub mod analytics;
pub mod bookmarks;
pub mod config;
pub mod filter;
pub mod format;
pub mod identity;
pub mod records;

pub use bookmarks::{BookmarkSlot, BookmarkStore, FileSlot, MemorySlot, BOOKMARKS_KEY};
pub use filter::{
    apply, CategoryMode, Clock, FeedFilter, FilterCriteria, FixedClock, SortKey, SystemClock,
    TimePeriod, ALL_CATEGORIES,
};
pub use records::{RecordPage, RecordStore, StoreError, TweetCategory, TweetRecord};
