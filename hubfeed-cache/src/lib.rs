//! The normalized feed cache: one owned copy of every post keyed by id,
//! mutated only through full refresh or the optimistic like/vote path
//! (speculate under the lock, suspend for the network call, then commit
//! the server's authoritative record or restore the snapshot).

use hubfeed_msg::{Category, PollVoter, RawPost};
use hubfeed_post::{NormalizedPost, Normalizer, PostOrigin};
use log::{trace, warn};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error as ThisError;
use tokio::sync::watch;

pub mod api;
pub use api::{ApiError, FeedApi};

/// Default length of the recent-activity projection.
pub const DEFAULT_RECENT_LIMIT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Like,
    Vote,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActionKind::Like => write!(f, "like"),
            ActionKind::Vote => write!(f, "vote"),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum MutationError {
    /// A mutation of the same kind is already in flight for this post.
    /// Rejected synchronously, before any network call.
    #[error("a {action} is already pending for post {id}")]
    Conflict { id: String, action: ActionKind },
    #[error("unknown post: {0}")]
    UnknownPost(String),
    #[error("post {0} has no poll")]
    NoPoll(String),
    #[error("option {index} is out of range for poll on post {id}")]
    InvalidOption { id: String, index: usize },
    /// The remote call failed after the speculative update; the cache has
    /// already been rolled back to its pre-mutation snapshot.
    #[error("mutation failed, cause: {0}")]
    Api(#[from] ApiError),
}

#[derive(Clone, Debug, Default)]
pub struct FeedFilter {
    pub category: Option<Category>,
    pub search: Option<String>,
}

struct CacheInner {
    posts: Vec<NormalizedPost>,
    pending: HashSet<(String, ActionKind)>,
}

pub struct FeedCache {
    api: Arc<dyn FeedApi>,
    normalizer: Normalizer,
    inner: Mutex<CacheInner>,
    revision: watch::Sender<u64>,
}

impl FeedCache {
    pub fn new(api: Arc<dyn FeedApi>, normalizer: Normalizer) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            normalizer,
            inner: Mutex::new(CacheInner {
                posts: Vec::new(),
                pending: HashSet::new(),
            }),
            revision,
        }
    }

    /// Channel that ticks on every cache change; UI subscribers re-read
    /// through [`FeedCache::feed`] when it does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Fetches both feeds and replaces the cache wholesale. Wall posts
    /// keep their fetch order, hub posts follow. A mutation pending during
    /// the refresh is not discarded: its commit or rollback lands after
    /// this replacement and wins for that post id.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let wall = self.api.fetch_wall_posts().await?;
        let hub = self.api.fetch_hub_posts().await?;

        let posts: Vec<NormalizedPost> = wall
            .into_iter()
            .map(RawPost::Wall)
            .chain(hub.into_iter().map(RawPost::Hub))
            .map(|raw| self.normalizer.normalize(&raw))
            .collect();

        {
            let mut inner = self.lock_inner();
            trace!("cache refresh: {} posts", posts.len());
            inner.posts = posts;
        }
        self.bump();
        Ok(())
    }

    /// Synchronous filtered read of the current cache.
    pub fn feed(&self, filter: &FeedFilter) -> Vec<NormalizedPost> {
        let inner = self.lock_inner();

        let query = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
            .map(str::to_lowercase);

        inner
            .posts
            .iter()
            .filter(|post| match filter.category {
                None | Some(Category::All) => true,
                Some(category) => post.category == category,
            })
            .filter(|post| match &query {
                None => true,
                Some(query) => {
                    post.title.to_lowercase().contains(query)
                        || post.content.to_lowercase().contains(query)
                        || post.author.name.to_lowercase().contains(query)
                }
            })
            .cloned()
            .collect()
    }

    /// Read-only projection for the activity sidebar: newest first,
    /// ties kept in cache order, truncated to `limit`. A view over the
    /// same cache as [`FeedCache::feed`], so mutations show up here too.
    pub fn recent_activity(&self, limit: usize) -> Vec<NormalizedPost> {
        let inner = self.lock_inner();
        let mut posts = inner.posts.clone();
        drop(inner);

        // Stable sort; entries without a parseable timestamp sink to the end.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        posts
    }

    /// Toggles the viewer's like on a post: speculative flag-flip and
    /// count step under the lock, then the origin-matched remote call,
    /// then commit of the server record or snapshot rollback.
    pub async fn like(&self, id: &str) -> Result<NormalizedPost, MutationError> {
        let snapshot = {
            let mut inner = self.lock_inner();
            let CacheInner { posts, pending } = &mut *inner;

            let key = (id.to_string(), ActionKind::Like);
            if pending.contains(&key) {
                return Err(MutationError::Conflict {
                    id: id.to_string(),
                    action: ActionKind::Like,
                });
            }
            let post = posts
                .iter_mut()
                .find(|post| post.id == id)
                .ok_or_else(|| MutationError::UnknownPost(id.to_string()))?;

            let snapshot = post.clone();
            // The flag and the counter move in lock-step, never separately.
            post.is_liked = !post.is_liked;
            if post.is_liked {
                post.stats.likes += 1;
            } else {
                post.stats.likes = post.stats.likes.saturating_sub(1);
            }
            pending.insert(key);
            snapshot
        };
        self.bump();

        let result = match snapshot.origin {
            PostOrigin::Wall => self.api.like_wall_post(id).await.map(RawPost::Wall),
            PostOrigin::Hub => self.api.like_hub_post(id).await.map(RawPost::Hub),
        };

        self.settle(id, ActionKind::Like, snapshot, result)
    }

    /// Casts or replaces the viewer's poll vote. A prior vote by the same
    /// voter is removed first, so re-voting moves the vote instead of
    /// stacking a second one.
    pub async fn vote(
        &self,
        id: &str,
        option_index: usize,
    ) -> Result<NormalizedPost, MutationError> {
        let snapshot = {
            let mut inner = self.lock_inner();
            let CacheInner { posts, pending } = &mut *inner;

            let key = (id.to_string(), ActionKind::Vote);
            if pending.contains(&key) {
                return Err(MutationError::Conflict {
                    id: id.to_string(),
                    action: ActionKind::Vote,
                });
            }
            let post = posts
                .iter_mut()
                .find(|post| post.id == id)
                .ok_or_else(|| MutationError::UnknownPost(id.to_string()))?;
            let snapshot = post.clone();

            let poll = post
                .poll
                .as_mut()
                .ok_or_else(|| MutationError::NoPoll(id.to_string()))?;
            if option_index >= poll.options.len() {
                return Err(MutationError::InvalidOption {
                    id: id.to_string(),
                    index: option_index,
                });
            }

            let viewer = self.normalizer.viewer_id().to_string();
            if let Some(prior) = poll
                .voters
                .iter()
                .position(|voter| voter.user_id == viewer)
            {
                let prior_index = poll.voters[prior].option_index;
                if let Some(option) = poll.options.get_mut(prior_index) {
                    option.votes = option.votes.saturating_sub(1);
                }
                poll.voters.remove(prior);
                poll.total_votes = poll.total_votes.saturating_sub(1);
            }

            poll.options[option_index].votes += 1;
            poll.total_votes += 1;
            poll.voters.push(PollVoter {
                user_id: viewer,
                option_index,
            });
            poll.has_voted = true;
            poll.voted_option = Some(option_index);

            pending.insert(key);
            snapshot
        };
        self.bump();

        let result = self
            .api
            .vote_on_poll(id, option_index)
            .await
            .map(RawPost::Wall);

        self.settle(id, ActionKind::Vote, snapshot, result)
    }

    /// Resolves a pending mutation. On success the cache entry is
    /// overwritten with the server's authoritative record; on failure it
    /// is restored to the exact pre-mutation snapshot. Either way the
    /// pending mark is cleared and subscribers are notified. A post that
    /// vanished from the cache in the meantime settles silently.
    fn settle(
        &self,
        id: &str,
        action: ActionKind,
        snapshot: NormalizedPost,
        result: Result<RawPost, ApiError>,
    ) -> Result<NormalizedPost, MutationError> {
        let outcome = {
            let mut inner = self.lock_inner();
            let CacheInner { posts, pending } = &mut *inner;
            pending.remove(&(id.to_string(), action));

            match result {
                Ok(raw) => {
                    let fresh = self.normalizer.normalize(&raw);
                    if let Some(slot) = posts.iter_mut().find(|post| post.id == id) {
                        *slot = fresh.clone();
                    }
                    trace!("{} committed for post {}", action, id);
                    Ok(fresh)
                }
                Err(error) => {
                    if let Some(slot) = posts.iter_mut().find(|post| post.id == id) {
                        *slot = snapshot;
                    }
                    warn!("{} rolled back for post {}: {}", action, id, error);
                    Err(MutationError::Api(error))
                }
            }
        };
        self.bump();
        outcome
    }

    fn lock_inner(&self) -> MutexGuard<'_, CacheInner> {
        // A poisoned lock only means a panic mid-read; the data itself is
        // only written under the snapshot/settle discipline.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
