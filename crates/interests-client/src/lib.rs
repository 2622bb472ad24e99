//! Client side of the recommendation feed
//!
//! Keeps the anonymous visitor identity and vote memory in [`storage`],
//! talks to the recommendation service through [`service`], and drives
//! paging and voting in [`controller::FeedController`].

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod interests;
pub mod service;
pub mod storage;
pub mod votes;

pub use self::config::ServiceConfig;
pub use self::controller::{FeedController, FeedState, FeedView};
pub use self::identity::{IdentitySource, IdentityStore};
pub use self::interests::InterestStore;
pub use self::service::{FeedSource, HttpFeedService, VoteSink};
pub use self::storage::{ClientStorage, MemStorage, RedbStorage};
pub use self::votes::{VotePersistence, VoteStore};
