use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError, OneOrMany};

pub mod category;
pub use category::{hub_category, wall_category, Category};

/// Wire-format type enum for wall posts. Unknown values are tolerated and
/// normalize into the catch-all category downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum WallPostType {
    #[serde(rename = "foundersDesk")]
    FoundersDesk,
    #[serde(rename = "travelStories")]
    TravelStories,
    #[serde(rename = "poll")]
    Poll,
    #[serde(rename = "article")]
    Article,
    #[serde(rename = "announcement")]
    Announcement,
    #[serde(rename = "event")]
    Event,
    #[serde(other)]
    Unknown,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallUser {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub role: Option<String>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubUser {
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub role: Option<String>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub url: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub label: String,
    #[serde(default)]
    pub votes: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVoter {
    pub user_id: String,
    pub option_index: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub total_votes: u64,
    #[serde(default)]
    pub voters: Vec<PollVoter>,
}

impl Poll {
    /// Total votes must equal the per-option sum and the voter-record count,
    /// with each voter appearing at most once.
    pub fn is_consistent(&self) -> bool {
        let option_sum: u64 = self.options.iter().map(|option| option.votes).sum();
        let mut seen: Vec<&str> = self
            .voters
            .iter()
            .map(|voter| voter.user_id.as_str())
            .collect();
        seen.sort_unstable();
        seen.dedup();

        option_sum == self.total_votes
            && self.voters.len() as u64 == self.total_votes
            && seen.len() == self.voters.len()
    }

    /// The option index of a voter's active vote, if any.
    pub fn voter_choice(&self, user_id: &str) -> Option<usize> {
        self.voters
            .iter()
            .find(|voter| voter.user_id == user_id)
            .map(|voter| voter.option_index)
    }
}

/// Admin/community wall-feed post as shipped by the backend. Descriptions
/// arrive as either one string or an ordered list of paragraph strings.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWallPost {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub post_type: WallPostType,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub title: Option<String>,
    #[serde_as(as = "Option<DefaultOnError<OneOrMany<_>>>")]
    #[serde(default)]
    pub description: Option<Vec<String>>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<VideoRef>,
    #[serde(default)]
    pub poll: Option<Poll>,
    #[serde(default)]
    pub user: Option<WallUser>,
    pub created_at: String,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub time_ago: Option<String>,
}

/// Member-authored hub post. The author object is mandatory and the
/// category vocabulary is distinct from the wall feed's type enum.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHubPost {
    #[serde(rename = "_id")]
    pub id: String,
    pub category: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub image: Option<String>,
    pub user: HubUser,
    pub created_at: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub time_ago: Option<String>,
}

/// Tagged union attached at the ingestion boundary. Discrimination is
/// structural: wall posts carry a `type` enum, hub posts a `category`
/// string plus a mandatory `user` object. Consumers match on the tag
/// instead of re-deriving the shape.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawPost {
    Wall(RawWallPost),
    Hub(RawHubPost),
}

impl RawPost {
    pub fn id(&self) -> &str {
        match self {
            RawPost::Wall(post) => &post.id,
            RawPost::Hub(post) => &post.id,
        }
    }
}

/// Parses a batch of raw JSON records into tagged posts. A malformed
/// record is skipped with a warning; one bad record never fails the feed.
pub fn parse_posts(values: &[Value]) -> Vec<RawPost> {
    values
        .iter()
        .filter_map(|value| match serde_json::from_value(value.clone()) {
            Ok(post) => Some(post),
            Err(error) => {
                warn!("skipping malformed post record: {}", error);
                None
            }
        })
        .collect()
}
