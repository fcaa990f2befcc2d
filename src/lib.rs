//! Paginated, deduplicating listing of tourist sites over a paged search API.
//!
//! A [`feed::FeedController`] drives infinite scroll over a
//! [`provider::SiteSearchProvider`], anchored either on the user's position
//! or on a keyword/category search.

pub mod config;
pub mod feed;
pub mod location;
pub mod provider;
pub mod site;
pub mod util;
