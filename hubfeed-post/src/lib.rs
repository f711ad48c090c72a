use chrono::{DateTime, Utc};
use hubfeed_media::{ImageVariant, MediaResolver};
use hubfeed_msg::{
    hub_category, wall_category, Category, Poll, PollOption, PollVoter, RawHubPost, RawPost,
    RawWallPost, WallPostType,
};
use hubfeed_text::{join_paragraphs, parse_timestamp, strip_html, time_ago};
use serde::{Deserialize, Serialize};

/// Title shown when a post arrives without one.
pub const UNTITLED_TITLE: &str = "Untitled Post";

/// Author label for community posts with no attached user.
pub const ADMIN_AUTHOR: &str = "Community Admin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum PostOrigin {
    #[serde(rename = "wallpost")]
    Wall,
    #[serde(rename = "hubpost")]
    Hub,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Author {
    pub name: String,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostStats {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
}

/// Poll as displayed: the wire shape plus the current viewer's vote state.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PollView {
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_votes: u64,
    pub voters: Vec<PollVoter>,
    pub has_voted: bool,
    pub voted_option: Option<usize>,
}

/// Canonical display model both backend feeds normalize into. Owned by
/// the feed cache; UI layers get read-only clones and signal intent back
/// through the cache's mutation functions.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct NormalizedPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub image: Option<String>,
    pub poll: Option<PollView>,
    pub stats: PostStats,
    pub created_at: Option<DateTime<Utc>>,
    pub time_ago: String,
    pub category: Category,
    pub origin: PostOrigin,
    pub is_liked: bool,
}

/// Maps both raw backend shapes into [`NormalizedPost`]. Pure: output is a
/// function of the input record, the static category tables, and the
/// configured media base URL.
#[derive(Clone, Debug)]
pub struct Normalizer {
    media: MediaResolver,
    viewer_id: String,
}

impl Normalizer {
    pub fn new(media: MediaResolver, viewer_id: impl Into<String>) -> Self {
        Self {
            media,
            viewer_id: viewer_id.into(),
        }
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    pub fn normalize(&self, raw: &RawPost) -> NormalizedPost {
        match raw {
            RawPost::Wall(post) => self.normalize_wall(post),
            RawPost::Hub(post) => self.normalize_hub(post),
        }
    }

    fn normalize_wall(&self, post: &RawWallPost) -> NormalizedPost {
        let author = match &post.user {
            Some(user) => {
                let name = [user.first_name.as_deref(), user.last_name.as_deref()]
                    .iter()
                    .flatten()
                    .copied()
                    .collect::<Vec<&str>>()
                    .join(" ");
                Author {
                    name: if name.is_empty() {
                        ADMIN_AUTHOR.to_string()
                    } else {
                        name
                    },
                    role: user.role.clone(),
                    avatar: self
                        .media
                        .resolve(user.avatar.as_deref(), ImageVariant::Avatar),
                }
            }
            None => Author {
                name: ADMIN_AUTHOR.to_string(),
                role: None,
                avatar: None,
            },
        };

        let content = post
            .description
            .as_deref()
            .map(join_paragraphs)
            .unwrap_or_default();

        // Primary image: first of the media list, else the first video's
        // thumbnail, else nothing.
        let image = post
            .images
            .first()
            .map(String::as_str)
            .or_else(|| {
                post.videos
                    .iter()
                    .find_map(|video| video.thumbnail.as_deref())
            })
            .and_then(|path| self.media.resolve(Some(path), ImageVariant::Post));

        // An embedded poll forces the polls category no matter what type
        // the backend declared. Policy, not an accident.
        let category = if post.poll.is_some() || post.post_type == WallPostType::Poll {
            Category::PulsePolls
        } else {
            wall_category(post.post_type)
        };

        NormalizedPost {
            id: post.id.clone(),
            title: post
                .title
                .clone()
                .unwrap_or_else(|| UNTITLED_TITLE.to_string()),
            content,
            author,
            image,
            poll: post.poll.as_ref().map(|poll| self.poll_view(poll)),
            stats: PostStats {
                likes: post.like_count,
                comments: post.comment_count,
                shares: post.share_count,
                views: post.view_count,
            },
            created_at: parse_timestamp(&post.created_at),
            time_ago: post
                .time_ago
                .clone()
                .unwrap_or_else(|| time_ago(&post.created_at)),
            category,
            origin: PostOrigin::Wall,
            is_liked: post.is_liked,
        }
    }

    fn normalize_hub(&self, post: &RawHubPost) -> NormalizedPost {
        NormalizedPost {
            id: post.id.clone(),
            title: post
                .title
                .clone()
                .unwrap_or_else(|| UNTITLED_TITLE.to_string()),
            content: strip_html(&post.description),
            author: Author {
                name: post.user.name.clone(),
                role: post.user.role.clone(),
                avatar: self
                    .media
                    .resolve(post.user.avatar.as_deref(), ImageVariant::Avatar),
            },
            image: self
                .media
                .resolve(post.image.as_deref(), ImageVariant::Post),
            poll: None,
            stats: PostStats {
                likes: post.likes,
                comments: post.comments,
                shares: post.shares,
                views: post.views,
            },
            created_at: parse_timestamp(&post.created_at),
            time_ago: post
                .time_ago
                .clone()
                .unwrap_or_else(|| time_ago(&post.created_at)),
            category: hub_category(&post.category),
            origin: PostOrigin::Hub,
            is_liked: post.is_liked,
        }
    }

    fn poll_view(&self, poll: &Poll) -> PollView {
        let voted_option = poll.voter_choice(&self.viewer_id);
        PollView {
            question: poll.question.clone(),
            options: poll.options.clone(),
            total_votes: poll.total_votes,
            voters: poll.voters.clone(),
            has_voted: voted_option.is_some(),
            voted_option,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        let media = MediaResolver::new(Some("https://cdn.example.com")).unwrap();
        Normalizer::new(media, "viewer-1")
    }

    fn wall_post(value: serde_json::Value) -> RawPost {
        RawPost::Wall(serde_json::from_value(value).unwrap())
    }

    fn hub_post(value: serde_json::Value) -> RawPost {
        RawPost::Hub(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_wall_post_scenario() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "foundersDesk",
            "description": ["Hello", "World"],
            "likeCount": 3,
            "isLiked": false,
            "createdAt": "2023-05-01T00:00:00Z"
        })));

        assert_eq!(post.content, "Hello<br><br>World");
        assert_eq!(post.category, Category::FoundersDesk);
        assert_eq!(post.category.as_tag(), "founders-desk");
        assert_eq!(post.stats.likes, 3);
        assert!(!post.is_liked);
        assert_eq!(post.origin, PostOrigin::Wall);
    }

    #[test]
    fn test_unauthored_wall_post_gets_admin_author() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "announcement",
            "createdAt": "2023-05-01T00:00:00Z"
        })));
        assert_eq!(post.author.name, ADMIN_AUTHOR);
        assert_eq!(post.title, UNTITLED_TITLE);
        assert_eq!(post.content, "");
    }

    #[test]
    fn test_wall_author_name_assembly() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "article",
            "user": { "firstName": "Grace", "lastName": "Hopper", "avatar": "/a.png" },
            "createdAt": "2023-05-01T00:00:00Z"
        })));
        assert_eq!(post.author.name, "Grace Hopper");
        assert_eq!(
            post.author.avatar.as_deref(),
            Some("https://cdn.example.com/a.png?w=128&h=128&fm=webp")
        );
    }

    #[test]
    fn test_poll_presence_forces_polls_category() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "article",
            "poll": {
                "question": "Next meetup city?",
                "options": [
                    { "label": "Lisbon", "votes": 1 },
                    { "label": "Bali", "votes": 0 }
                ],
                "totalVotes": 1,
                "voters": [{ "userId": "viewer-1", "optionIndex": 0 }]
            },
            "createdAt": "2023-05-01T00:00:00Z"
        })));

        assert_eq!(post.category, Category::PulsePolls);
        assert_eq!(post.category.as_tag(), "pulse-polls");

        let poll = post.poll.unwrap();
        assert!(poll.has_voted);
        assert_eq!(poll.voted_option, Some(0));
    }

    #[test]
    fn test_hub_post_fallback_title() {
        let post = normalizer().normalize(&hub_post(json!({
            "_id": "h1",
            "category": "business-insights",
            "description": "<p>Closed our first deal</p>",
            "user": { "name": "Ada Lovelace", "role": "Founder" },
            "likes": 5,
            "createdAt": "2023-05-01T00:00:00Z"
        })));

        assert_eq!(post.title, "Untitled Post");
        assert_eq!(post.content, "Closed our first deal");
        assert_eq!(post.author.name, "Ada Lovelace");
        assert_eq!(post.category, Category::Articles);
        assert_eq!(post.origin, PostOrigin::Hub);
        assert_eq!(post.stats.likes, 5);
    }

    #[test]
    fn test_wall_image_fallback_to_video_thumbnail() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "event",
            "videos": [{ "url": "/v.mp4", "thumbnail": "/v.jpg" }],
            "createdAt": "2023-05-01T00:00:00Z"
        })));
        assert_eq!(
            post.image.as_deref(),
            Some("https://cdn.example.com/v.jpg?w=1024&h=768&fm=webp")
        );
    }

    #[test]
    fn test_precomputed_time_ago_is_kept() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "article",
            "timeAgo": "4h ago",
            "createdAt": "2023-05-01T00:00:00Z"
        })));
        assert_eq!(post.time_ago, "4h ago");
    }

    #[test]
    fn test_invalid_created_at() {
        let post = normalizer().normalize(&wall_post(json!({
            "_id": "w1",
            "type": "article",
            "createdAt": "yesterday-ish"
        })));
        assert_eq!(post.created_at, None);
        assert_eq!(post.time_ago, "Recently");
    }
}
