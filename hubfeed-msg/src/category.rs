//! Static mapping tables between backend wire-format enums and the
//! canonical UI-facing category tags.
//!
//! The two backends use disjoint vocabularies: the wall feed ships a
//! camelCase type enum, the hub feed free-text hyphenated categories.
//! Both map into one fixed canonical set; anything unmapped lands in the
//! catch-all `all` tag rather than failing.

use crate::WallPostType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Category {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "founders-desk")]
    FoundersDesk,
    #[serde(rename = "travel-stories")]
    TravelStories,
    #[serde(rename = "pulse-polls")]
    PulsePolls,
    #[serde(rename = "articles")]
    Articles,
    #[serde(rename = "announcements")]
    Announcements,
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "member-stories")]
    MemberStories,
}

impl Category {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::FoundersDesk => "founders-desk",
            Category::TravelStories => "travel-stories",
            Category::PulsePolls => "pulse-polls",
            Category::Articles => "articles",
            Category::Announcements => "announcements",
            Category::Events => "events",
            Category::MemberStories => "member-stories",
        }
    }

    /// Inverse lookup from a UI tag. Unrecognized tags fall back to the
    /// catch-all rather than erroring.
    pub fn from_tag(tag: &str) -> Category {
        match tag {
            "founders-desk" => Category::FoundersDesk,
            "travel-stories" => Category::TravelStories,
            "pulse-polls" => Category::PulsePolls,
            "articles" => Category::Articles,
            "announcements" => Category::Announcements,
            "events" => Category::Events,
            "member-stories" => Category::MemberStories,
            _ => Category::All,
        }
    }

    /// The wall wire type a category round-trips to, for categories that
    /// have one. Used when a UI filter is sent back to the wall backend.
    pub fn wall_wire_type(&self) -> Option<WallPostType> {
        match self {
            Category::FoundersDesk => Some(WallPostType::FoundersDesk),
            Category::TravelStories => Some(WallPostType::TravelStories),
            Category::PulsePolls => Some(WallPostType::Poll),
            Category::Articles => Some(WallPostType::Article),
            Category::Announcements => Some(WallPostType::Announcement),
            Category::Events => Some(WallPostType::Event),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

pub fn wall_category(post_type: WallPostType) -> Category {
    match post_type {
        WallPostType::FoundersDesk => Category::FoundersDesk,
        WallPostType::TravelStories => Category::TravelStories,
        WallPostType::Poll => Category::PulsePolls,
        WallPostType::Article => Category::Articles,
        WallPostType::Announcement => Category::Announcements,
        WallPostType::Event => Category::Events,
        WallPostType::Unknown => Category::All,
    }
}

/// Hub categories map onto the same canonical set where a counterpart
/// exists. `general` and `open-floor` have no counterpart and collapse
/// into the catch-all, as does anything unrecognized.
pub fn hub_category(raw: &str) -> Category {
    match raw {
        "member-stories" => Category::MemberStories,
        "travel-tales" => Category::TravelStories,
        "business-insights" => Category::Articles,
        "founder-qa" => Category::FoundersDesk,
        _ => Category::All,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_mapping() {
        assert_eq!(
            wall_category(WallPostType::FoundersDesk),
            Category::FoundersDesk
        );
        assert_eq!(wall_category(WallPostType::Poll), Category::PulsePolls);
        assert_eq!(wall_category(WallPostType::Unknown), Category::All);
    }

    #[test]
    fn test_hub_mapping_collapses_unmapped() {
        assert_eq!(hub_category("member-stories"), Category::MemberStories);
        assert_eq!(hub_category("travel-tales"), Category::TravelStories);
        assert_eq!(hub_category("general"), Category::All);
        assert_eq!(hub_category("open-floor"), Category::All);
        assert_eq!(hub_category("never-seen-before"), Category::All);
    }

    #[test]
    fn test_tag_round_trip() {
        for category in [
            Category::All,
            Category::FoundersDesk,
            Category::TravelStories,
            Category::PulsePolls,
            Category::Articles,
            Category::Announcements,
            Category::Events,
            Category::MemberStories,
        ] {
            assert_eq!(Category::from_tag(category.as_tag()), category);
        }
        assert_eq!(Category::from_tag("bogus"), Category::All);
    }

    #[test]
    fn test_wall_wire_round_trip() {
        assert_eq!(
            Category::PulsePolls.wall_wire_type(),
            Some(WallPostType::Poll)
        );
        assert_eq!(Category::All.wall_wire_type(), None);
        assert_eq!(Category::MemberStories.wall_wire_type(), None);
    }
}
