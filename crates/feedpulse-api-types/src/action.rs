use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User action vocabulary. Open-ended: unrecognized strings round-trip
/// through [`ActionType::Other`] so new client builds can emit actions
/// an older server has never seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Like,
    Unlike,
    Save,
    Unsave,
    Share,
    Comment,
    PostView,
    NavigationClick,
    SearchFocus,
    SearchQuery,
    MenuClick,
    CommentClick,
    PlayVideo,
    PauseVideo,
    MuteVideo,
    UnmuteVideo,
    DoubleTapLike,
    ViewAllComments,
    CommentInputFocus,
    FinalMaxScroll,
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::Like => "like",
            ActionType::Unlike => "unlike",
            ActionType::Save => "save",
            ActionType::Unsave => "unsave",
            ActionType::Share => "share",
            ActionType::Comment => "comment",
            ActionType::PostView => "post_view",
            ActionType::NavigationClick => "navigation_click",
            ActionType::SearchFocus => "search_focus",
            ActionType::SearchQuery => "search_query",
            ActionType::MenuClick => "menu_click",
            ActionType::CommentClick => "comment_click",
            ActionType::PlayVideo => "play_video",
            ActionType::PauseVideo => "pause_video",
            ActionType::MuteVideo => "mute_video",
            ActionType::UnmuteVideo => "unmute_video",
            ActionType::DoubleTapLike => "double_tap_like",
            ActionType::ViewAllComments => "view_all_comments",
            ActionType::CommentInputFocus => "comment_input_focus",
            ActionType::FinalMaxScroll => "final_max_scroll",
            ActionType::Other(s) => s.as_str(),
        }
    }

    /// An empty action type is a reported-but-non-fatal validation
    /// failure on both ends of the pipeline.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<String> for ActionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "like" => ActionType::Like,
            "unlike" => ActionType::Unlike,
            "save" => ActionType::Save,
            "unsave" => ActionType::Unsave,
            "share" => ActionType::Share,
            "comment" => ActionType::Comment,
            "post_view" => ActionType::PostView,
            "navigation_click" => ActionType::NavigationClick,
            "search_focus" => ActionType::SearchFocus,
            "search_query" => ActionType::SearchQuery,
            "menu_click" => ActionType::MenuClick,
            "comment_click" => ActionType::CommentClick,
            "play_video" => ActionType::PlayVideo,
            "pause_video" => ActionType::PauseVideo,
            "mute_video" => ActionType::MuteVideo,
            "unmute_video" => ActionType::UnmuteVideo,
            "double_tap_like" => ActionType::DoubleTapLike,
            "view_all_comments" => ActionType::ViewAllComments,
            "comment_input_focus" => ActionType::CommentInputFocus,
            "final_max_scroll" => ActionType::FinalMaxScroll,
            _ => ActionType::Other(value),
        }
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

impl std::str::FromStr for ActionType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ActionType::from(s.to_string()))
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over the flat `additional_data` map, keyed by the action
/// that produced it. Unrecognized shapes fall back to [`ActionDetail::Unknown`]
/// so the pipeline never rejects data it merely does not understand.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionDetail {
    #[default]
    None,
    /// Length of the comment text, sent alongside `comment`.
    Comment { comment_length: u64 },
    /// Total comments revealed by `view_all_comments`.
    ViewAllComments { total_comments: u64 },
    /// Submitted search text for `search_query`.
    SearchQuery { query: String },
    /// Maximum scroll depth reached, sent with `final_max_scroll`.
    FinalMaxScroll { max_scroll_percentage: f64 },
    Unknown(Map<String, Value>),
}

impl ActionDetail {
    /// Interpret a wire-level `additional_data` map for a given action.
    pub fn from_map(action: &ActionType, data: Map<String, Value>) -> Self {
        if data.is_empty() {
            return ActionDetail::None;
        }
        match action {
            ActionType::Comment => match data.get("comment_length").and_then(Value::as_u64) {
                Some(comment_length) => ActionDetail::Comment { comment_length },
                None => ActionDetail::Unknown(data),
            },
            ActionType::ViewAllComments => {
                match data.get("total_comments").and_then(Value::as_u64) {
                    Some(total_comments) => ActionDetail::ViewAllComments { total_comments },
                    None => ActionDetail::Unknown(data),
                }
            }
            ActionType::SearchQuery => match data.get("query").and_then(Value::as_str) {
                Some(query) => ActionDetail::SearchQuery {
                    query: query.to_string(),
                },
                None => ActionDetail::Unknown(data),
            },
            ActionType::FinalMaxScroll => {
                match data.get("max_scroll_percentage").and_then(Value::as_f64) {
                    Some(max_scroll_percentage) => ActionDetail::FinalMaxScroll {
                        max_scroll_percentage,
                    },
                    None => ActionDetail::Unknown(data),
                }
            }
            _ => ActionDetail::Unknown(data),
        }
    }

    /// Render back to the flat wire map.
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            ActionDetail::None => {}
            ActionDetail::Comment { comment_length } => {
                map.insert("comment_length".into(), comment_length.into());
            }
            ActionDetail::ViewAllComments { total_comments } => {
                map.insert("total_comments".into(), total_comments.into());
            }
            ActionDetail::SearchQuery { query } => {
                map.insert("query".into(), query.into());
            }
            ActionDetail::FinalMaxScroll {
                max_scroll_percentage,
            } => {
                map.insert(
                    "max_scroll_percentage".into(),
                    Value::from(max_scroll_percentage),
                );
            }
            ActionDetail::Unknown(data) => return data,
        }
        map
    }
}

/// Derive the deterministic post join key used by the feed UI:
/// username plus the first twenty characters of the caption with
/// whitespace runs collapsed to underscores. Collision-tolerant and
/// non-cryptographic; only aggregation joins on it.
pub fn derive_post_id(username: &str, caption: &str) -> String {
    let prefix: String = caption.chars().take(20).collect();
    let mut normalized = String::with_capacity(prefix.len());
    let mut in_whitespace = false;
    for ch in prefix.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                normalized.push('_');
                in_whitespace = true;
            }
        } else {
            normalized.push(ch);
            in_whitespace = false;
        }
    }
    format!("{username}_{normalized}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_type_round_trips_known_and_unknown_values() {
        let like: ActionType = serde_json::from_value(json!("like")).unwrap();
        assert_eq!(like, ActionType::Like);
        assert_eq!(serde_json::to_value(&like).unwrap(), json!("like"));

        let custom: ActionType = serde_json::from_value(json!("pinch_zoom")).unwrap();
        assert_eq!(custom, ActionType::Other("pinch_zoom".to_string()));
        assert_eq!(serde_json::to_value(&custom).unwrap(), json!("pinch_zoom"));
    }

    #[test]
    fn detail_is_typed_for_known_actions() {
        let mut data = Map::new();
        data.insert("max_scroll_percentage".into(), json!(73.5));
        let detail = ActionDetail::from_map(&ActionType::FinalMaxScroll, data);
        assert_eq!(
            detail,
            ActionDetail::FinalMaxScroll {
                max_scroll_percentage: 73.5
            }
        );
    }

    #[test]
    fn detail_falls_back_to_unknown_for_unexpected_shapes() {
        let mut data = Map::new();
        data.insert("volume".into(), json!(11));
        let detail = ActionDetail::from_map(&ActionType::MuteVideo, data.clone());
        assert_eq!(detail, ActionDetail::Unknown(data.clone()));
        assert_eq!(detail.into_map(), data);
    }

    #[test]
    fn post_id_collapses_whitespace_in_caption_prefix() {
        assert_eq!(
            derive_post_id("ines", "golden hour at the pier, again"),
            "ines_golden_hour_at_the_p"
        );
        assert_eq!(derive_post_id("sam", "hi"), "sam_hi");
    }
}
