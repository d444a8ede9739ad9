use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config;
use crate::data::{
    RemoteChannelService, RemoteCommentService, RemoteReportService, RemoteVideoService,
};
use crate::gateway::{Gateway, GatewayConfig};
use crate::session::Session;
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    let session = Arc::new(Session::new(&cfg.auth));

    let gateway = Arc::new(
        Gateway::new(GatewayConfig {
            base_url: Some(cfg.api.base_url.clone()),
            ..Default::default()
        })
        .context("build gateway")?,
    );

    let status = match session.token() {
        Some(_) => format!("Connected to {}. Press 1-4 to switch tabs.", cfg.api.base_url),
        None => format!(
            "No token yet. Put one in auth.token (or the token file) in {display_path}; \
             the app picks it up without a restart."
        ),
    };

    let options = ui::Options {
        status_message: status,
        config_path: display_path,
        session,
        channel_service: Arc::new(RemoteChannelService::new(gateway.clone())),
        report_service: Arc::new(RemoteReportService::new(gateway.clone())),
        video_service: Arc::new(RemoteVideoService::new(gateway.clone())),
        comment_service: Arc::new(RemoteCommentService::new(gateway)),
    };

    let mut model = ui::Model::new(options);
    model.run()
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/modtube/config.yaml".to_string()
    }
}
