use std::sync::Arc;

use thiserror::Error;

use crate::data::ChannelService;
use crate::gateway::GatewayError;
use crate::models::Channel;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no channel found for this account")]
    NoChannelFound,
    #[error("video sync failed: {0}")]
    VideoSync(GatewayError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Where a sync run currently stands. Every run walks a subset of these in
/// order and the trace records the exact path taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    ResolvingChannel,
    SyncingChannel,
    SyncingVideos,
    Done,
    DoneWithPartialError,
    Failed,
}

/// A finished run. `video_error` is set when the channel landed but the video
/// cascade did not; the channel data is still valid in that case.
#[derive(Debug)]
pub struct SyncOutcome {
    pub channel: Channel,
    pub video_error: Option<SyncError>,
}

impl SyncOutcome {
    pub fn is_partial(&self) -> bool {
        self.video_error.is_some()
    }
}

/// Sequences channel discovery and the channel-sync to video-sync cascade.
/// One account owns exactly one managed channel, so "the channel" is always
/// the first entry of whatever list the backend returns.
pub struct Orchestrator {
    channels: Arc<dyn ChannelService>,
    phase: SyncPhase,
    trace: Vec<SyncPhase>,
}

impl Orchestrator {
    pub fn new(channels: Arc<dyn ChannelService>) -> Self {
        Self {
            channels,
            phase: SyncPhase::Idle,
            trace: vec![SyncPhase::Idle],
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn trace(&self) -> &[SyncPhase] {
        &self.trace
    }

    fn enter(&mut self, phase: SyncPhase) {
        self.phase = phase;
        self.trace.push(phase);
    }

    /// Fetch the channel list and take the first entry. An empty list falls
    /// back to a full sync instead of failing.
    pub fn resolve_channel(&mut self, token: &str) -> Result<SyncOutcome, SyncError> {
        self.enter(SyncPhase::ResolvingChannel);
        let channels = match self.channels.list_channels(token) {
            Ok(channels) => channels,
            Err(err) => {
                self.enter(SyncPhase::Failed);
                return Err(err.into());
            }
        };
        match channels.into_iter().next() {
            Some(channel) => {
                self.enter(SyncPhase::Done);
                Ok(SyncOutcome {
                    channel,
                    video_error: None,
                })
            }
            None => self.run_sync(token),
        }
    }

    /// Channel sync followed unconditionally by the video cascade. The two
    /// are not transactional: a video failure leaves the synced channel in
    /// place and is reported alongside it.
    pub fn sync_channel(&mut self, token: &str) -> Result<SyncOutcome, SyncError> {
        self.run_sync(token)
    }

    fn run_sync(&mut self, token: &str) -> Result<SyncOutcome, SyncError> {
        self.enter(SyncPhase::SyncingChannel);
        let channels = match self.channels.sync_channel(token) {
            Ok(channels) => channels,
            Err(err) => {
                self.enter(SyncPhase::Failed);
                return Err(err.into());
            }
        };
        let Some(channel) = channels.into_iter().next() else {
            self.enter(SyncPhase::Failed);
            return Err(SyncError::NoChannelFound);
        };

        self.enter(SyncPhase::SyncingVideos);
        match self.channels.sync_videos(&channel.id, token) {
            Ok(()) => {
                self.enter(SyncPhase::Done);
                Ok(SyncOutcome {
                    channel,
                    video_error: None,
                })
            }
            Err(err) => {
                self.enter(SyncPhase::DoneWithPartialError);
                Ok(SyncOutcome {
                    channel,
                    video_error: Some(SyncError::VideoSync(err)),
                })
            }
        }
    }

    /// Video sync on its own, scoped to an already-known channel.
    pub fn sync_videos(&mut self, channel_id: &str, token: &str) -> Result<(), SyncError> {
        self.enter(SyncPhase::SyncingVideos);
        match self.channels.sync_videos(channel_id, token) {
            Ok(()) => {
                self.enter(SyncPhase::Done);
                Ok(())
            }
            Err(err) => {
                self.enter(SyncPhase::Failed);
                Err(SyncError::VideoSync(err))
            }
        }
    }
}
