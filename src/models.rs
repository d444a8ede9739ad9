use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A YouTube channel as mirrored by the moderation backend. The client never
/// mutates one; it only re-fetches after a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub custom_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub subscriber_count: u64,
    #[serde(default)]
    pub video_count: u64,
    #[serde(default)]
    pub view_count: u64,
}

impl Channel {
    pub fn url(&self) -> String {
        match &self.custom_url {
            Some(custom) if !custom.is_empty() => {
                format!("https://www.youtube.com/{custom}")
            }
            _ => format!("https://www.youtube.com/channel/{}", self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub view_count: u64,
}

impl Video {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Moderation state reported by the backend for a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Success,
    Pending,
    Deleted,
    Hidden,
    #[serde(other)]
    Unknown,
}

impl Default for CommentStatus {
    fn default() -> Self {
        CommentStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, rename = "authorProfileImageURL")]
    pub author_profile_image_url: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Flat, unscoped collection of every detected comment for the authenticated
/// user. Channel scoping happens client-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsResponse {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncAck {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parses_backend_shape() {
        let raw = r#"{
            "id": "UC123",
            "title": "My Channel",
            "customUrl": "@mychannel",
            "description": "stuff",
            "thumbnail": "https://example.com/t.png",
            "publishedAt": "2020-05-01T12:00:00Z",
            "subscriberCount": 1200,
            "videoCount": 34,
            "viewCount": 56789
        }"#;
        let channel: Channel = serde_json::from_str(raw).expect("parse channel");
        assert_eq!(channel.id, "UC123");
        assert_eq!(channel.custom_url.as_deref(), Some("@mychannel"));
        assert_eq!(channel.subscriber_count, 1200);
        assert_eq!(channel.url(), "https://www.youtube.com/@mychannel");
    }

    #[test]
    fn channel_url_falls_back_to_id() {
        let raw = r#"{
            "id": "UC123",
            "title": "My Channel",
            "publishedAt": "2020-05-01T12:00:00Z"
        }"#;
        let channel: Channel = serde_json::from_str(raw).expect("parse channel");
        assert_eq!(channel.url(), "https://www.youtube.com/channel/UC123");
    }

    #[test]
    fn comment_parses_status_and_image_url() {
        let raw = r#"{
            "commentId": "c1",
            "channelId": "UC123",
            "videoId": "v1",
            "author": "spam bot",
            "authorProfileImageURL": "https://example.com/a.png",
            "text": "first!!!",
            "status": "hidden",
            "createdAt": "2024-01-01T09:30:00Z"
        }"#;
        let comment: Comment = serde_json::from_str(raw).expect("parse comment");
        assert_eq!(comment.status, CommentStatus::Hidden);
        assert_eq!(
            comment.author_profile_image_url.as_deref(),
            Some("https://example.com/a.png")
        );
        assert!(comment.deleted_at.is_none());
        assert_eq!(comment.watch_url(), "https://www.youtube.com/watch?v=v1");
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let raw = r#"{
            "commentId": "c2",
            "status": "quarantined",
            "createdAt": "2024-01-01T09:30:00Z"
        }"#;
        let comment: Comment = serde_json::from_str(raw).expect("parse comment");
        assert_eq!(comment.status, CommentStatus::Unknown);
    }

    #[test]
    fn report_defaults_missing_fields() {
        let report: Report = serde_json::from_str("{}").expect("parse report");
        assert!(report.comments.is_empty());
        assert!(report.total.is_none());
    }
}
