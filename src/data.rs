use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::gateway::{Gateway, GatewayError};
use crate::models::{Channel, Comment, CommentStatus, Report, Video};

/// Channel discovery plus the backend-side sync jobs.
pub trait ChannelService: Send + Sync {
    fn list_channels(&self, token: &str) -> Result<Vec<Channel>, GatewayError>;
    fn sync_channel(&self, token: &str) -> Result<Vec<Channel>, GatewayError>;
    fn sync_videos(&self, channel_id: &str, token: &str) -> Result<(), GatewayError>;
}

pub trait ReportService: Send + Sync {
    fn report(&self, token: &str) -> Result<Report, GatewayError>;
}

pub trait VideoService: Send + Sync {
    fn videos(&self, token: &str) -> Result<Vec<Video>, GatewayError>;
}

pub trait CommentService: Send + Sync {
    fn comments(&self, video_id: &str, token: &str) -> Result<Vec<Comment>, GatewayError>;
    fn delete_comment(&self, comment_id: &str, token: &str) -> Result<(), GatewayError>;
    fn delete_all_comments(&self, video_id: &str, token: &str) -> Result<(), GatewayError>;
}

pub struct RemoteChannelService {
    gateway: Arc<Gateway>,
}

impl RemoteChannelService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

impl ChannelService for RemoteChannelService {
    fn list_channels(&self, token: &str) -> Result<Vec<Channel>, GatewayError> {
        self.gateway.list_channels(token)
    }

    fn sync_channel(&self, token: &str) -> Result<Vec<Channel>, GatewayError> {
        self.gateway.sync_channel(token)
    }

    fn sync_videos(&self, channel_id: &str, token: &str) -> Result<(), GatewayError> {
        self.gateway.sync_videos(channel_id, token).map(|_| ())
    }
}

pub struct RemoteReportService {
    gateway: Arc<Gateway>,
}

impl RemoteReportService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

impl ReportService for RemoteReportService {
    fn report(&self, token: &str) -> Result<Report, GatewayError> {
        self.gateway.report(token)
    }
}

pub struct RemoteVideoService {
    gateway: Arc<Gateway>,
}

impl RemoteVideoService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

impl VideoService for RemoteVideoService {
    fn videos(&self, token: &str) -> Result<Vec<Video>, GatewayError> {
        self.gateway.videos(token)
    }
}

pub struct RemoteCommentService {
    gateway: Arc<Gateway>,
}

impl RemoteCommentService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

impl CommentService for RemoteCommentService {
    fn comments(&self, video_id: &str, token: &str) -> Result<Vec<Comment>, GatewayError> {
        self.gateway.comments(video_id, token)
    }

    fn delete_comment(&self, comment_id: &str, token: &str) -> Result<(), GatewayError> {
        self.gateway.delete_comment(comment_id, token).map(|_| ())
    }

    fn delete_all_comments(&self, video_id: &str, token: &str) -> Result<(), GatewayError> {
        self.gateway
            .delete_all_comments(video_id, token)
            .map(|_| ())
    }
}

#[derive(Default)]
pub struct MockChannelService;

impl ChannelService for MockChannelService {
    fn list_channels(&self, _token: &str) -> Result<Vec<Channel>, GatewayError> {
        Ok(vec![mock_channel()])
    }

    fn sync_channel(&self, _token: &str) -> Result<Vec<Channel>, GatewayError> {
        Ok(vec![mock_channel()])
    }

    fn sync_videos(&self, _channel_id: &str, _token: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MockReportService;

impl ReportService for MockReportService {
    fn report(&self, _token: &str) -> Result<Report, GatewayError> {
        let comments = mock_comments();
        let total = comments.len() as u64;
        Ok(Report {
            comments,
            total: Some(total),
        })
    }
}

#[derive(Default)]
pub struct MockVideoService;

impl VideoService for MockVideoService {
    fn videos(&self, _token: &str) -> Result<Vec<Video>, GatewayError> {
        Ok(mock_videos())
    }
}

#[derive(Default)]
pub struct MockCommentService;

impl CommentService for MockCommentService {
    fn comments(&self, video_id: &str, _token: &str) -> Result<Vec<Comment>, GatewayError> {
        Ok(mock_comments()
            .into_iter()
            .filter(|comment| comment.video_id == video_id)
            .collect())
    }

    fn delete_comment(&self, _comment_id: &str, _token: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    fn delete_all_comments(&self, _video_id: &str, _token: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

pub fn mock_channel() -> Channel {
    Channel {
        id: "UCmock0000000000000000".into(),
        title: "Example Creator".into(),
        custom_url: Some("@examplecreator".into()),
        description: "Sample channel provided for offline use.".into(),
        thumbnail: String::new(),
        published_at: days_ago(900),
        subscriber_count: 12_400,
        video_count: 87,
        view_count: 1_450_000,
    }
}

pub fn mock_videos() -> Vec<Video> {
    vec![
        Video {
            video_id: "vid-workflow".into(),
            title: "Moderation workflow walkthrough".into(),
            thumbnail: String::new(),
            published_at: days_ago(12),
            like_count: 310,
            comment_count: 42,
            view_count: 9_800,
        },
        Video {
            video_id: "vid-qa".into(),
            title: "Creator Q&A".into(),
            thumbnail: String::new(),
            published_at: days_ago(4),
            like_count: 120,
            comment_count: 18,
            view_count: 3_100,
        },
    ]
}

pub fn mock_comments() -> Vec<Comment> {
    let statuses = [
        CommentStatus::Deleted,
        CommentStatus::Hidden,
        CommentStatus::Pending,
        CommentStatus::Pending,
        CommentStatus::Success,
    ];
    statuses
        .into_iter()
        .enumerate()
        .map(|(i, status)| {
            let video_id = if i % 2 == 0 { "vid-workflow" } else { "vid-qa" };
            Comment {
                comment_id: format!("comment-{i}"),
                channel_id: "UCmock0000000000000000".into(),
                video_id: video_id.into(),
                author: format!("viewer{i}"),
                author_profile_image_url: None,
                text: "Check my channel for free giveaways!!!".into(),
                status,
                created_at: days_ago(i as i64),
                deleted_at: None,
            }
        })
        .collect()
}
