//! Loads wall/hub feed fixtures from JSON files, builds the normalized
//! cache, and prints the unified feed plus the recent-activity panel.
//!
//! Usage: hubfeed-dashboard <wall.json> <hub.json>
//! The media base URL comes from HUBFEED_MEDIA_BASE_URL.

use async_trait::async_trait;
use hubfeed_cache::{ApiError, FeedApi, FeedCache, FeedFilter, DEFAULT_RECENT_LIMIT};
use hubfeed_media::MediaResolver;
use hubfeed_msg::{parse_posts, RawHubPost, RawPost, RawWallPost};
use hubfeed_post::Normalizer;
use log::info;
use serde_json::Value;
use std::env;
use std::error::Error;
use std::fs;
use std::sync::{Arc, Mutex};

/// In-memory stand-in for the remote backend: serves the loaded fixture
/// records and applies like toggles against them.
struct FixtureApi {
    viewer_id: String,
    wall: Mutex<Vec<RawWallPost>>,
    hub: Mutex<Vec<RawHubPost>>,
}

impl FixtureApi {
    fn load(wall_path: &str, hub_path: &str, viewer_id: &str) -> Result<Self, Box<dyn Error>> {
        let wall_values: Vec<Value> = serde_json::from_str(&fs::read_to_string(wall_path)?)?;
        let hub_values: Vec<Value> = serde_json::from_str(&fs::read_to_string(hub_path)?)?;

        let mut wall = Vec::new();
        for post in parse_posts(&wall_values) {
            if let RawPost::Wall(post) = post {
                wall.push(post);
            }
        }
        let mut hub = Vec::new();
        for post in parse_posts(&hub_values) {
            if let RawPost::Hub(post) = post {
                hub.push(post);
            }
        }

        info!("loaded {} wall posts, {} hub posts", wall.len(), hub.len());
        Ok(Self {
            viewer_id: viewer_id.to_string(),
            wall: Mutex::new(wall),
            hub: Mutex::new(hub),
        })
    }

    fn lock<T>(target: &Mutex<Vec<T>>) -> std::sync::MutexGuard<'_, Vec<T>> {
        target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FeedApi for FixtureApi {
    async fn fetch_wall_posts(&self) -> Result<Vec<RawWallPost>, ApiError> {
        Ok(Self::lock(&self.wall).clone())
    }

    async fn fetch_hub_posts(&self) -> Result<Vec<RawHubPost>, ApiError> {
        Ok(Self::lock(&self.hub).clone())
    }

    async fn like_wall_post(&self, id: &str) -> Result<RawWallPost, ApiError> {
        let mut wall = Self::lock(&self.wall);
        let post = wall
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| ApiError::Request(format!("no such wall post: {}", id)))?;
        post.is_liked = !post.is_liked;
        if post.is_liked {
            post.like_count += 1;
        } else {
            post.like_count = post.like_count.saturating_sub(1);
        }
        Ok(post.clone())
    }

    async fn like_hub_post(&self, id: &str) -> Result<RawHubPost, ApiError> {
        let mut hub = Self::lock(&self.hub);
        let post = hub
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| ApiError::Request(format!("no such hub post: {}", id)))?;
        post.is_liked = !post.is_liked;
        if post.is_liked {
            post.likes += 1;
        } else {
            post.likes = post.likes.saturating_sub(1);
        }
        Ok(post.clone())
    }

    async fn vote_on_poll(&self, id: &str, option_index: usize) -> Result<RawWallPost, ApiError> {
        let mut wall = Self::lock(&self.wall);
        let post = wall
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| ApiError::Request(format!("no such wall post: {}", id)))?;
        let poll = post
            .poll
            .as_mut()
            .ok_or_else(|| ApiError::Request(format!("no poll on post: {}", id)))?;
        if option_index >= poll.options.len() {
            return Err(ApiError::Request(format!(
                "option {} out of range",
                option_index
            )));
        }

        if let Some(prior) = poll
            .voters
            .iter()
            .position(|voter| voter.user_id == self.viewer_id)
        {
            let prior_index = poll.voters[prior].option_index;
            poll.options[prior_index].votes = poll.options[prior_index].votes.saturating_sub(1);
            poll.voters.remove(prior);
            poll.total_votes = poll.total_votes.saturating_sub(1);
        }
        poll.options[option_index].votes += 1;
        poll.total_votes += 1;
        poll.voters.push(hubfeed_msg::PollVoter {
            user_id: self.viewer_id.clone(),
            option_index,
        });
        Ok(post.clone())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let wall_path = args.next().ok_or("usage: hubfeed-dashboard <wall.json> <hub.json>")?;
    let hub_path = args.next().ok_or("usage: hubfeed-dashboard <wall.json> <hub.json>")?;

    let base_url = env::var("HUBFEED_MEDIA_BASE_URL").ok();
    let media = MediaResolver::new(base_url.as_deref())?;

    let viewer_id = env::var("HUBFEED_VIEWER_ID").unwrap_or_else(|_| "local-viewer".to_string());
    let api = Arc::new(FixtureApi::load(&wall_path, &hub_path, &viewer_id)?);
    let cache = FeedCache::new(api, Normalizer::new(media, viewer_id));

    cache.refresh().await?;

    println!("== feed ==");
    for post in cache.feed(&FeedFilter::default()) {
        println!(
            "[{}] {} - {} ({}, {} likes, {} comments)",
            post.category,
            post.title,
            post.author.name,
            post.time_ago,
            post.stats.likes,
            post.stats.comments
        );
        if let Some(poll) = &post.poll {
            println!("  poll: {}", poll.question);
            for option in &poll.options {
                println!("    {} - {}", option.label, option.votes);
            }
        }
    }

    println!();
    println!("== recent activity ==");
    for post in cache.recent_activity(DEFAULT_RECENT_LIMIT) {
        println!("{} - {}", post.title, post.time_ago);
    }

    Ok(())
}
