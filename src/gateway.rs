use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::models::{
    Channel, ChannelsResponse, Comment, CommentsResponse, DeleteAck, Report, SyncAck, Video,
    VideosResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("api error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Parse(serde_json::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub http_client: Option<HttpClient>,
}

/// Thin authenticated HTTP wrapper around the moderation backend. Every call
/// takes the bearer token explicitly and fails closed when it is empty.
pub struct Gateway {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let mut base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        let http = match config.http_client {
            Some(client) => client,
            // Sync jobs can run long; the backend sets no deadline, so the
            // client does not either.
            None => HttpClient::builder().timeout(None).build()?,
        };
        let user_agent = config
            .user_agent
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| format!("modtube/{}", crate::VERSION));

        Ok(Gateway {
            http,
            user_agent,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn list_channels(&self, token: &str) -> Result<Vec<Channel>, GatewayError> {
        let resp: ChannelsResponse = self.request(Method::GET, "channels", &[], token)?;
        Ok(resp.channels)
    }

    pub fn sync_channel(&self, token: &str) -> Result<Vec<Channel>, GatewayError> {
        let resp: ChannelsResponse = self.request(Method::PUT, "channels/sync", &[], token)?;
        Ok(resp.channels)
    }

    pub fn sync_videos(&self, channel_id: &str, token: &str) -> Result<SyncAck, GatewayError> {
        let path = format!("{}/videos/sync", channel_id);
        self.request_or_default(Method::PUT, &path, &[], token)
    }

    pub fn report(&self, token: &str) -> Result<Report, GatewayError> {
        self.request(Method::GET, "report", &[], token)
    }

    pub fn videos(&self, token: &str) -> Result<Vec<Video>, GatewayError> {
        let resp: VideosResponse = self.request(Method::GET, "videos", &[], token)?;
        Ok(resp.videos)
    }

    pub fn comments(&self, video_id: &str, token: &str) -> Result<Vec<Comment>, GatewayError> {
        let params = [("videoId", video_id)];
        let resp: CommentsResponse = self.request(Method::GET, "comments", &params, token)?;
        Ok(resp.comments)
    }

    pub fn delete_comment(&self, comment_id: &str, token: &str) -> Result<DeleteAck, GatewayError> {
        let path = format!("comments/{}", comment_id);
        self.request_or_default(Method::DELETE, &path, &[], token)
    }

    pub fn delete_all_comments(
        &self,
        video_id: &str,
        token: &str,
    ) -> Result<DeleteAck, GatewayError> {
        let params = [("videoId", video_id)];
        self.request_or_default(Method::DELETE, "comments", &params, token)
    }

    fn request<T>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        token: &str,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let body = self.send(method, path, params, token)?;
        serde_json::from_str(&body).map_err(GatewayError::Parse)
    }

    /// Like `request`, for endpoints that may acknowledge with an empty body.
    fn request_or_default<T>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        token: &str,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned + Default,
    {
        let body = self.send(method, path, params, token)?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&body).map_err(GatewayError::Parse)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        token: &str,
    ) -> Result<String, GatewayError> {
        if token.trim().is_empty() {
            return Err(GatewayError::MissingToken);
        }
        let mut url = self.endpoint(path)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }

        let req = self
            .http
            .request(method, url)
            .header(USER_AGENT, self.user_agent.clone())
            .header(AUTHORIZATION, format!("Bearer {}", token));

        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base_url.join(path)?)
    }
}
