use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::data::{ChannelService, CommentService, ReportService, VideoService};
use crate::gateway::GatewayError;
use crate::models::{Channel, Comment, Report, Video};
use crate::report;
use crate::sync::{Orchestrator, SyncError, SyncOutcome};

/// Reactive triad every view exposes: current data, whether a fetch is in
/// flight, and the last fetch failure as a displayable message.
#[derive(Debug, Clone)]
pub struct ViewState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T: Default> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: true,
            error: None,
        }
    }
}

/// What became of a fire-and-forget action. The presenter applies
/// `should_refetch` uniformly instead of each action mutating view data on
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub succeeded: bool,
    pub should_refetch: bool,
}

impl ActionOutcome {
    fn success() -> Self {
        Self {
            succeeded: true,
            should_refetch: true,
        }
    }

    fn failure() -> Self {
        Self {
            succeeded: false,
            should_refetch: false,
        }
    }
}

/// Guard for one in-flight background call. A response is applied only while
/// its id matches and the flag is unset; anything else is stale and dropped.
struct Pending {
    request_id: u64,
    cancel_flag: Arc<AtomicBool>,
}

impl Pending {
    fn cancel(self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    fn matches(&self, request_id: u64) -> bool {
        !self.cancel_flag.load(Ordering::SeqCst) && self.request_id == request_id
    }
}

enum Response {
    Channel {
        request_id: u64,
        result: Result<SyncOutcome, SyncError>,
    },
    Report {
        request_id: u64,
        result: Result<Report, GatewayError>,
    },
    History {
        request_id: u64,
        result: Result<Vec<Comment>, GatewayError>,
    },
    Videos {
        request_id: u64,
        result: Result<Vec<Video>, GatewayError>,
    },
    Comments {
        request_id: u64,
        result: Result<Vec<Comment>, GatewayError>,
    },
    Action {
        request_id: u64,
        message: String,
        outcome: ActionOutcome,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub channel: Option<Channel>,
    pub comments: Vec<Comment>,
}

/// Dashboard view: channel card plus aggregate spam statistics. Channel
/// resolution and the report are independent fetches issued together; either
/// side failing leaves the other side's result intact.
pub struct DashboardPresenter {
    channels: Arc<dyn ChannelService>,
    reports: Arc<dyn ReportService>,
    state: ViewState<DashboardData>,
    last_token: Option<String>,
    pending_channel: Option<Pending>,
    pending_report: Option<Pending>,
    pending_action: Option<Pending>,
    fetch_errors: Vec<String>,
    notices: Vec<String>,
    refetch_queued: bool,
    response_tx: Sender<Response>,
    response_rx: Receiver<Response>,
    next_request_id: u64,
}

impl DashboardPresenter {
    pub fn new(channels: Arc<dyn ChannelService>, reports: Arc<dyn ReportService>) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            channels,
            reports,
            state: ViewState::default(),
            last_token: None,
            pending_channel: None,
            pending_report: None,
            pending_action: None,
            fetch_errors: Vec::new(),
            notices: Vec::new(),
            refetch_queued: false,
            response_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> &ViewState<DashboardData> {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.loading || self.pending_action.is_some()
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Report comments scoped to the resolved channel. While the channel is
    /// still unknown this degrades to the full report.
    pub fn scoped_comments(&self) -> Vec<Comment> {
        let channel_id = self.state.data.channel.as_ref().map(|c| c.id.as_str());
        report::filter_by_channel(&self.state.data.comments, channel_id)
    }

    pub fn stats(&self) -> report::Stats {
        report::compute_stats(&self.scoped_comments())
    }

    pub fn pie_segments(&self) -> Vec<report::PieSegment> {
        report::compute_pie_segments(&self.stats())
    }

    pub fn daily_buckets(&self) -> Vec<report::DailyBucket> {
        report::compute_daily_buckets(&self.scoped_comments())
    }

    /// Feed the latest known token in. A fetch starts only when the value
    /// actually changes; feeding the same token twice is a no-op.
    pub fn sync_token(&mut self, token: Option<&str>) {
        if self.last_token.as_deref() == token {
            return;
        }
        self.last_token = token.map(str::to_string);
        if let Some(token) = token {
            self.load(token);
        }
    }

    pub fn refresh(&mut self) {
        if let Some(token) = self.last_token.clone() {
            self.load(&token);
        }
    }

    /// Trigger the sync cascade in the background. Completion arrives as a
    /// notice plus, on success, a queued refetch.
    pub fn sync_channel(&mut self) {
        let Some(token) = self.last_token.clone() else {
            self.notices.push("Cannot sync without a token".to_string());
            return;
        };
        if self.pending_action.is_some() {
            self.notices.push("A sync is already running".to_string());
            return;
        }

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending_action = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let channels = self.channels.clone();
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let mut orchestrator = Orchestrator::new(channels);
            let (message, outcome) = match orchestrator.sync_channel(&token) {
                Ok(outcome) if outcome.is_partial() => {
                    let detail = outcome
                        .video_error
                        .as_ref()
                        .map(|err| err.to_string())
                        .unwrap_or_default();
                    (format!("Channel synced, but {detail}"), ActionOutcome::success())
                }
                Ok(_) => ("Channel synced".to_string(), ActionOutcome::success()),
                Err(err) => (format!("Sync failed: {err}"), ActionOutcome::failure()),
            };
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Action {
                request_id,
                message,
                outcome,
            });
        });
    }

    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
            changed = true;
        }
        if self.refetch_queued {
            self.refetch_queued = false;
            self.refresh();
            changed = true;
        }
        changed
    }

    fn load(&mut self, token: &str) {
        if let Some(pending) = self.pending_channel.take() {
            pending.cancel();
        }
        if let Some(pending) = self.pending_report.take() {
            pending.cancel();
        }
        self.fetch_errors.clear();
        self.state.loading = true;
        self.state.error = None;
        let token = token.to_string();

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending_channel = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let channels = self.channels.clone();
        let tx = self.response_tx.clone();
        let channel_token = token.clone();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let mut orchestrator = Orchestrator::new(channels);
            let result = orchestrator.resolve_channel(&channel_token);
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Channel { request_id, result });
        });

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending_report = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let reports = self.reports.clone();
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let result = reports.report(&token);
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Report { request_id, result });
        });
    }

    fn handle_response(&mut self, response: Response) {
        match response {
            Response::Channel { request_id, result } => {
                let Some(pending) = &self.pending_channel else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending_channel = None;
                match result {
                    Ok(outcome) => {
                        if let Some(err) = &outcome.video_error {
                            self.notices.push(format!("Channel ready, but {err}"));
                        }
                        self.state.data.channel = Some(outcome.channel);
                    }
                    Err(err) => {
                        self.state.data.channel = None;
                        self.fetch_errors.push(err.to_string());
                    }
                }
                self.finish_if_settled();
            }
            Response::Report { request_id, result } => {
                let Some(pending) = &self.pending_report else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending_report = None;
                match result {
                    Ok(fetched) => self.state.data.comments = fetched.comments,
                    Err(err) => {
                        self.state.data.comments = Vec::new();
                        self.fetch_errors.push(err.to_string());
                    }
                }
                self.finish_if_settled();
            }
            Response::Action {
                request_id,
                message,
                outcome,
            } => {
                let Some(pending) = &self.pending_action else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending_action = None;
                self.notices.push(message);
                if outcome.should_refetch {
                    self.refetch_queued = true;
                }
            }
            _ => {}
        }
    }

    /// Both halves have reported in; settle the triad.
    fn finish_if_settled(&mut self) {
        if self.pending_channel.is_some() || self.pending_report.is_some() {
            return;
        }
        self.state.loading = false;
        self.state.error = if self.fetch_errors.is_empty() {
            None
        } else {
            Some(self.fetch_errors.join("; "))
        };
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryData {
    pub comments: Vec<Comment>,
    pub total: usize,
}

/// History view: every detected comment for the user's channel, newest
/// first. The channel lookup and the report fetch are dependent, so they run
/// sequentially on one worker; a failed lookup only widens the scope to the
/// unfiltered report.
pub struct HistoryPresenter {
    channels: Arc<dyn ChannelService>,
    reports: Arc<dyn ReportService>,
    state: ViewState<HistoryData>,
    last_token: Option<String>,
    pending: Option<Pending>,
    response_tx: Sender<Response>,
    response_rx: Receiver<Response>,
    next_request_id: u64,
}

impl HistoryPresenter {
    pub fn new(channels: Arc<dyn ChannelService>, reports: Arc<dyn ReportService>) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            channels,
            reports,
            state: ViewState::default(),
            last_token: None,
            pending: None,
            response_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> &ViewState<HistoryData> {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.loading
    }

    pub fn stats(&self) -> report::Stats {
        report::compute_stats(&self.state.data.comments)
    }

    pub fn sync_token(&mut self, token: Option<&str>) {
        if self.last_token.as_deref() == token {
            return;
        }
        self.last_token = token.map(str::to_string);
        if let Some(token) = token {
            self.load(token);
        }
    }

    pub fn refresh(&mut self) {
        if let Some(token) = self.last_token.clone() {
            self.load(&token);
        }
    }

    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
            changed = true;
        }
        changed
    }

    fn load(&mut self, token: &str) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.state.loading = true;
        self.state.error = None;

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let channels = self.channels.clone();
        let reports = self.reports.clone();
        let tx = self.response_tx.clone();
        let token = token.to_string();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            // Lookup first, report second; the report request depends on the
            // channel id and never starts before the lookup settles.
            let channel_id = match channels.list_channels(&token) {
                Ok(list) => list.into_iter().next().map(|channel| channel.id),
                Err(_) => None,
            };
            let result = reports.report(&token).map(|fetched| {
                let scoped = report::filter_by_channel(&fetched.comments, channel_id.as_deref());
                report::sort_by_recency(&scoped)
            });
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::History { request_id, result });
        });
    }

    fn handle_response(&mut self, response: Response) {
        match response {
            Response::History { request_id, result } => {
                let Some(pending) = &self.pending else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending = None;
                match result {
                    Ok(comments) => {
                        self.state.data.total = comments.len();
                        self.state.data.comments = comments;
                        self.state.error = None;
                    }
                    Err(err) => {
                        self.state.data = HistoryData::default();
                        self.state.error = Some(err.to_string());
                    }
                }
                self.state.loading = false;
            }
            _ => {}
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }
}

/// Video list view: one fetch, no actions.
pub struct VideoListPresenter {
    videos: Arc<dyn VideoService>,
    state: ViewState<Vec<Video>>,
    last_token: Option<String>,
    pending: Option<Pending>,
    response_tx: Sender<Response>,
    response_rx: Receiver<Response>,
    next_request_id: u64,
}

impl VideoListPresenter {
    pub fn new(videos: Arc<dyn VideoService>) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            videos,
            state: ViewState::default(),
            last_token: None,
            pending: None,
            response_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> &ViewState<Vec<Video>> {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.loading
    }

    pub fn sync_token(&mut self, token: Option<&str>) {
        if self.last_token.as_deref() == token {
            return;
        }
        self.last_token = token.map(str::to_string);
        if let Some(token) = token {
            self.load(token);
        }
    }

    pub fn refresh(&mut self) {
        if let Some(token) = self.last_token.clone() {
            self.load(&token);
        }
    }

    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
            changed = true;
        }
        changed
    }

    fn load(&mut self, token: &str) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.state.loading = true;
        self.state.error = None;

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let videos = self.videos.clone();
        let tx = self.response_tx.clone();
        let token = token.to_string();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let result = videos.videos(&token);
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Videos { request_id, result });
        });
    }

    fn handle_response(&mut self, response: Response) {
        match response {
            Response::Videos { request_id, result } => {
                let Some(pending) = &self.pending else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending = None;
                match result {
                    Ok(videos) => {
                        self.state.data = videos;
                        self.state.error = None;
                    }
                    Err(err) => {
                        self.state.data = Vec::new();
                        self.state.error = Some(err.to_string());
                    }
                }
                self.state.loading = false;
            }
            _ => {}
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }
}

/// Comment list for one video, with the two delete actions. Deletes never
/// touch the comment list directly; the authoritative list comes back with
/// the refetch that a successful delete queues.
pub struct CommentListPresenter {
    comments: Arc<dyn CommentService>,
    video: Video,
    state: ViewState<Vec<Comment>>,
    last_token: Option<String>,
    pending: Option<Pending>,
    pending_action: Option<Pending>,
    notices: Vec<String>,
    refetch_queued: bool,
    response_tx: Sender<Response>,
    response_rx: Receiver<Response>,
    next_request_id: u64,
}

impl CommentListPresenter {
    pub fn new(comments: Arc<dyn CommentService>, video: Video) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            comments,
            video,
            state: ViewState::default(),
            last_token: None,
            pending: None,
            pending_action: None,
            notices: Vec::new(),
            refetch_queued: false,
            response_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    pub fn video(&self) -> &Video {
        &self.video
    }

    pub fn state(&self) -> &ViewState<Vec<Comment>> {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.loading || self.pending_action.is_some()
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn sync_token(&mut self, token: Option<&str>) {
        if self.last_token.as_deref() == token {
            return;
        }
        self.last_token = token.map(str::to_string);
        if let Some(token) = token {
            self.load(token);
        }
    }

    pub fn refresh(&mut self) {
        if let Some(token) = self.last_token.clone() {
            self.load(&token);
        }
    }

    pub fn delete_comment(&mut self, comment_id: &str) {
        let Some(token) = self.last_token.clone() else {
            self.notices.push("Cannot delete without a token".to_string());
            return;
        };
        if self.pending_action.is_some() {
            self.notices.push("Another action is still running".to_string());
            return;
        }

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending_action = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let service = self.comments.clone();
        let tx = self.response_tx.clone();
        let comment_id = comment_id.to_string();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let (message, outcome) = match service.delete_comment(&comment_id, &token) {
                Ok(()) => ("Comment deleted".to_string(), ActionOutcome::success()),
                Err(err) => (format!("Delete failed: {err}"), ActionOutcome::failure()),
            };
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Action {
                request_id,
                message,
                outcome,
            });
        });
    }

    pub fn delete_all_comments(&mut self) {
        let Some(token) = self.last_token.clone() else {
            self.notices.push("Cannot delete without a token".to_string());
            return;
        };
        if self.pending_action.is_some() {
            self.notices.push("Another action is still running".to_string());
            return;
        }

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending_action = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let service = self.comments.clone();
        let tx = self.response_tx.clone();
        let video_id = self.video.video_id.clone();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let (message, outcome) = match service.delete_all_comments(&video_id, &token) {
                Ok(()) => (
                    "Deleted all comments for this video".to_string(),
                    ActionOutcome::success(),
                ),
                Err(err) => (format!("Delete all failed: {err}"), ActionOutcome::failure()),
            };
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Action {
                request_id,
                message,
                outcome,
            });
        });
    }

    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            self.handle_response(response);
            changed = true;
        }
        if self.refetch_queued {
            self.refetch_queued = false;
            self.refresh();
            changed = true;
        }
        changed
    }

    fn load(&mut self, token: &str) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.state.loading = true;
        self.state.error = None;

        let request_id = self.next_id();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending = Some(Pending {
            request_id,
            cancel_flag: cancel_flag.clone(),
        });
        let service = self.comments.clone();
        let tx = self.response_tx.clone();
        let video_id = self.video.video_id.clone();
        let token = token.to_string();
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let result = service.comments(&video_id, &token);
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let _ = tx.send(Response::Comments { request_id, result });
        });
    }

    fn handle_response(&mut self, response: Response) {
        match response {
            Response::Comments { request_id, result } => {
                let Some(pending) = &self.pending else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending = None;
                match result {
                    Ok(comments) => {
                        self.state.data = comments;
                        self.state.error = None;
                    }
                    Err(err) => {
                        self.state.data = Vec::new();
                        self.state.error = Some(err.to_string());
                    }
                }
                self.state.loading = false;
            }
            Response::Action {
                request_id,
                message,
                outcome,
            } => {
                let Some(pending) = &self.pending_action else {
                    return;
                };
                if !pending.matches(request_id) {
                    return;
                }
                self.pending_action = None;
                self.notices.push(message);
                if outcome.should_refetch {
                    self.refetch_queued = true;
                }
            }
            _ => {}
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MockCommentService, MockVideoService};
    use crate::models::CommentStatus;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn ts(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("test timestamp")
    }

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            title: format!("Channel {id}"),
            custom_url: None,
            description: String::new(),
            thumbnail: String::new(),
            published_at: ts("2020-01-01T00:00:00Z"),
            subscriber_count: 0,
            video_count: 0,
            view_count: 0,
        }
    }

    fn comment(id: &str, channel: &str, status: CommentStatus, created: &str) -> Comment {
        Comment {
            comment_id: id.to_string(),
            channel_id: channel.to_string(),
            video_id: "v1".to_string(),
            author: "someone".to_string(),
            author_profile_image_url: None,
            text: "spam".to_string(),
            status,
            created_at: ts(created),
            deleted_at: None,
        }
    }

    fn status_err() -> GatewayError {
        GatewayError::Status {
            status: 500,
            body: "boom".to_string(),
        }
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for presenter");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[derive(Default)]
    struct CountingChannels {
        lists: AtomicUsize,
        syncs: AtomicUsize,
        video_syncs: AtomicUsize,
        fail_list: bool,
        fail_sync: bool,
        fail_videos: bool,
    }

    impl ChannelService for CountingChannels {
        fn list_channels(&self, _token: &str) -> Result<Vec<Channel>, GatewayError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail_list {
                return Err(status_err());
            }
            Ok(vec![channel("UC1")])
        }

        fn sync_channel(&self, _token: &str) -> Result<Vec<Channel>, GatewayError> {
            self.syncs.fetch_add(1, Ordering::SeqCst);
            if self.fail_sync {
                return Err(status_err());
            }
            Ok(vec![channel("UC1")])
        }

        fn sync_videos(&self, _channel_id: &str, _token: &str) -> Result<(), GatewayError> {
            self.video_syncs.fetch_add(1, Ordering::SeqCst);
            if self.fail_videos {
                return Err(status_err());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingReports {
        fetches: AtomicUsize,
        fail: bool,
        comments: Vec<Comment>,
    }

    impl ReportService for CountingReports {
        fn report(&self, _token: &str) -> Result<Report, GatewayError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(status_err());
            }
            Ok(Report {
                comments: self.comments.clone(),
                total: Some(self.comments.len() as u64),
            })
        }
    }

    #[derive(Default)]
    struct CountingComments {
        fetches: AtomicUsize,
        deletes: AtomicUsize,
        delete_alls: AtomicUsize,
        fail_delete: bool,
        last_scope: parking_lot::Mutex<String>,
        comments: Vec<Comment>,
    }

    impl CommentService for CountingComments {
        fn comments(&self, _video_id: &str, _token: &str) -> Result<Vec<Comment>, GatewayError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.comments.clone())
        }

        fn delete_comment(&self, comment_id: &str, _token: &str) -> Result<(), GatewayError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            *self.last_scope.lock() = comment_id.to_string();
            if self.fail_delete {
                return Err(status_err());
            }
            Ok(())
        }

        fn delete_all_comments(&self, video_id: &str, _token: &str) -> Result<(), GatewayError> {
            self.delete_alls.fetch_add(1, Ordering::SeqCst);
            *self.last_scope.lock() = video_id.to_string();
            if self.fail_delete {
                return Err(status_err());
            }
            Ok(())
        }
    }

    /// Report service whose first call blocks until the gate opens; later
    /// calls answer immediately with a distinguishable comment.
    struct GatedReports {
        gate: Receiver<()>,
        calls: AtomicUsize,
    }

    impl ReportService for GatedReports {
        fn report(&self, _token: &str) -> Result<Report, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let marker = if call == 0 {
                let _ = self.gate.recv();
                "stale"
            } else {
                "fresh"
            };
            Ok(Report {
                comments: vec![comment(marker, "UC1", CommentStatus::Pending, "2024-01-01T00:00:00Z")],
                total: Some(1),
            })
        }
    }

    fn sample_comments() -> Vec<Comment> {
        vec![
            comment("c1", "UC1", CommentStatus::Deleted, "2024-01-01T08:00:00Z"),
            comment("c2", "UC1", CommentStatus::Pending, "2024-01-02T08:00:00Z"),
            comment("c3", "UC2", CommentStatus::Pending, "2024-01-03T08:00:00Z"),
        ]
    }

    #[test]
    fn dashboard_waits_for_a_token() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports::default());
        let mut presenter = DashboardPresenter::new(channels.clone(), reports.clone());

        presenter.sync_token(None);
        presenter.poll();
        assert!(presenter.state().loading);
        assert!(presenter.state().data.channel.is_none());
        assert_eq!(channels.lists.load(Ordering::SeqCst), 0);
        assert_eq!(reports.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dashboard_fetches_once_per_token_value() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports {
            comments: sample_comments(),
            ..Default::default()
        });
        let mut presenter = DashboardPresenter::new(channels.clone(), reports.clone());

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        assert_eq!(channels.lists.load(Ordering::SeqCst), 1);
        assert_eq!(reports.fetches.load(Ordering::SeqCst), 1);

        presenter.sync_token(Some("tok"));
        thread::sleep(Duration::from_millis(20));
        presenter.poll();
        assert_eq!(channels.lists.load(Ordering::SeqCst), 1);
        assert_eq!(reports.fetches.load(Ordering::SeqCst), 1);

        presenter.sync_token(Some("rotated"));
        wait_until(|| {
            presenter.poll();
            reports.fetches.load(Ordering::SeqCst) == 2 && !presenter.state().loading
        });
        assert_eq!(channels.lists.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dashboard_scopes_stats_to_the_resolved_channel() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports {
            comments: sample_comments(),
            ..Default::default()
        });
        let mut presenter = DashboardPresenter::new(channels, reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        let stats = presenter.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn dashboard_report_failure_keeps_channel_data() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports {
            fail: true,
            ..Default::default()
        });
        let mut presenter = DashboardPresenter::new(channels, reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        let state = presenter.state();
        assert!(state.data.channel.is_some());
        assert!(state.data.comments.is_empty());
        assert!(state.error.as_deref().unwrap_or_default().contains("500"));
    }

    #[test]
    fn dashboard_channel_failure_keeps_report_data() {
        let channels = Arc::new(CountingChannels {
            fail_list: true,
            ..Default::default()
        });
        let reports = Arc::new(CountingReports {
            comments: sample_comments(),
            ..Default::default()
        });
        let mut presenter = DashboardPresenter::new(channels, reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        let state = presenter.state();
        assert!(state.data.channel.is_none());
        assert_eq!(state.data.comments.len(), 3);
        assert!(state.error.is_some());
    }

    #[test]
    fn dashboard_sync_refetches_after_success() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports::default());
        let mut presenter = DashboardPresenter::new(channels.clone(), reports.clone());

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });

        presenter.sync_channel();
        let mut notices = Vec::new();
        wait_until(|| {
            presenter.poll();
            notices.extend(presenter.take_notices());
            !notices.is_empty()
        });
        assert_eq!(notices[0], "Channel synced");
        assert_eq!(channels.video_syncs.load(Ordering::SeqCst), 1);

        wait_until(|| {
            presenter.poll();
            reports.fetches.load(Ordering::SeqCst) == 2 && !presenter.state().loading
        });
    }

    #[test]
    fn dashboard_sync_surfaces_partial_failure() {
        let channels = Arc::new(CountingChannels {
            fail_videos: true,
            ..Default::default()
        });
        let reports = Arc::new(CountingReports::default());
        let mut presenter = DashboardPresenter::new(channels.clone(), reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });

        presenter.sync_channel();
        let mut notices = Vec::new();
        wait_until(|| {
            presenter.poll();
            notices.extend(presenter.take_notices());
            !notices.is_empty()
        });
        assert!(notices[0].starts_with("Channel synced, but"));
        assert!(notices[0].contains("video sync failed"));
    }

    #[test]
    fn dashboard_sync_failure_does_not_refetch() {
        let channels = Arc::new(CountingChannels {
            fail_sync: true,
            ..Default::default()
        });
        let reports = Arc::new(CountingReports::default());
        let mut presenter = DashboardPresenter::new(channels, reports.clone());

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        assert_eq!(reports.fetches.load(Ordering::SeqCst), 1);

        presenter.sync_channel();
        let mut notices = Vec::new();
        wait_until(|| {
            presenter.poll();
            notices.extend(presenter.take_notices());
            !notices.is_empty()
        });
        assert!(notices[0].starts_with("Sync failed"));

        thread::sleep(Duration::from_millis(50));
        presenter.poll();
        assert_eq!(reports.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dashboard_drops_stale_responses_after_token_change() {
        let (open_gate, gate) = unbounded();
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(GatedReports {
            gate,
            calls: AtomicUsize::new(0),
        });
        let mut presenter = DashboardPresenter::new(channels, reports);

        presenter.sync_token(Some("old"));
        wait_until(|| {
            presenter.poll();
            presenter.state().data.channel.is_some()
        });

        presenter.sync_token(Some("new"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        assert_eq!(presenter.state().data.comments[0].comment_id, "fresh");

        let _ = open_gate.send(());
        thread::sleep(Duration::from_millis(50));
        presenter.poll();
        assert_eq!(presenter.state().data.comments[0].comment_id, "fresh");
    }

    #[test]
    fn history_scopes_and_sorts_newest_first() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports {
            comments: sample_comments(),
            ..Default::default()
        });
        let mut presenter = HistoryPresenter::new(channels, reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        let data = &presenter.state().data;
        let ids: Vec<_> = data.comments.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(data.total, 2);
    }

    #[test]
    fn history_survives_a_failed_channel_lookup() {
        let channels = Arc::new(CountingChannels {
            fail_list: true,
            ..Default::default()
        });
        let reports = Arc::new(CountingReports {
            comments: sample_comments(),
            ..Default::default()
        });
        let mut presenter = HistoryPresenter::new(channels, reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        let state = presenter.state();
        assert!(state.error.is_none());
        assert_eq!(state.data.comments.len(), 3);
        assert_eq!(state.data.comments[0].comment_id, "c3");
    }

    #[test]
    fn history_report_failure_clears_data() {
        let channels = Arc::new(CountingChannels::default());
        let reports = Arc::new(CountingReports {
            fail: true,
            ..Default::default()
        });
        let mut presenter = HistoryPresenter::new(channels, reports);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        let state = presenter.state();
        assert!(state.data.comments.is_empty());
        assert_eq!(state.data.total, 0);
        assert!(state.error.is_some());
    }

    #[test]
    fn video_list_loads_from_the_service() {
        let mut presenter = VideoListPresenter::new(Arc::new(MockVideoService));
        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        assert_eq!(presenter.state().data.len(), 2);
        assert!(presenter.state().error.is_none());
    }

    #[test]
    fn comment_list_loads_for_its_video() {
        let video = crate::data::mock_videos().remove(0);
        let mut presenter = CommentListPresenter::new(Arc::new(MockCommentService), video);
        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        assert!(!presenter.state().data.is_empty());
        assert!(presenter
            .state()
            .data
            .iter()
            .all(|c| c.video_id == "vid-workflow"));
    }

    #[test]
    fn delete_refetches_after_success() {
        let service = Arc::new(CountingComments {
            comments: sample_comments(),
            ..Default::default()
        });
        let video = crate::data::mock_videos().remove(0);
        let mut presenter = CommentListPresenter::new(service.clone(), video);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });
        assert_eq!(service.fetches.load(Ordering::SeqCst), 1);

        presenter.delete_comment("c1");
        let mut notices = Vec::new();
        wait_until(|| {
            presenter.poll();
            notices.extend(presenter.take_notices());
            !notices.is_empty()
        });
        assert_eq!(notices[0], "Comment deleted");
        assert_eq!(*service.last_scope.lock(), "c1");

        wait_until(|| {
            presenter.poll();
            service.fetches.load(Ordering::SeqCst) == 2 && !presenter.state().loading
        });
    }

    #[test]
    fn failed_delete_does_not_refetch() {
        let service = Arc::new(CountingComments {
            fail_delete: true,
            comments: sample_comments(),
            ..Default::default()
        });
        let video = crate::data::mock_videos().remove(0);
        let mut presenter = CommentListPresenter::new(service.clone(), video);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });

        presenter.delete_comment("c1");
        let mut notices = Vec::new();
        wait_until(|| {
            presenter.poll();
            notices.extend(presenter.take_notices());
            !notices.is_empty()
        });
        assert!(notices[0].starts_with("Delete failed"));

        thread::sleep(Duration::from_millis(50));
        presenter.poll();
        assert_eq!(service.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delete_all_is_scoped_to_the_presenter_video() {
        let service = Arc::new(CountingComments {
            comments: sample_comments(),
            ..Default::default()
        });
        let video = crate::data::mock_videos().remove(0);
        let video_id = video.video_id.clone();
        let mut presenter = CommentListPresenter::new(service.clone(), video);

        presenter.sync_token(Some("tok"));
        wait_until(|| {
            presenter.poll();
            !presenter.state().loading
        });

        presenter.delete_all_comments();
        let mut notices = Vec::new();
        wait_until(|| {
            presenter.poll();
            notices.extend(presenter.take_notices());
            !notices.is_empty()
        });
        assert_eq!(notices[0], "Deleted all comments for this video");
        assert_eq!(service.delete_alls.load(Ordering::SeqCst), 1);
        assert_eq!(*service.last_scope.lock(), video_id);

        wait_until(|| {
            presenter.poll();
            service.fetches.load(Ordering::SeqCst) == 2 && !presenter.state().loading
        });
    }
}
