use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph,
    Wrap,
};
use ratatui::{Frame, Terminal};
use unicode_width::UnicodeWidthStr;

use crate::data::{ChannelService, CommentService, ReportService, VideoService};
use crate::models::{Comment, Video};
use crate::presenter::{
    CommentListPresenter, DashboardPresenter, HistoryPresenter, VideoListPresenter,
};
use crate::report::{self, Classification};
use crate::session::Session;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
const COLOR_WARNING: Color = Color::Rgb(249, 226, 175);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

/// How often the session sources are re-read for a token that appeared or
/// rotated after startup.
const TOKEN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Dashboard,
    Videos,
    Comments,
    History,
}

const TABS: [Tab; 4] = [Tab::Dashboard, Tab::Videos, Tab::Comments, Tab::History];

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Videos => "Videos",
            Tab::Comments => "Comments",
            Tab::History => "History",
        }
    }

}

/// History status filter, cycled in place: everything, removed only,
/// pending only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryFilter {
    All,
    Removed,
    Pending,
}

impl HistoryFilter {
    fn label(self) -> &'static str {
        match self {
            HistoryFilter::All => "all",
            HistoryFilter::Removed => "removed",
            HistoryFilter::Pending => "pending",
        }
    }

    fn next(self) -> Self {
        match self {
            HistoryFilter::All => HistoryFilter::Removed,
            HistoryFilter::Removed => HistoryFilter::Pending,
            HistoryFilter::Pending => HistoryFilter::All,
        }
    }

    fn keeps(self, comment: &Comment) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Removed => report::classify(comment) == Classification::Removed,
            HistoryFilter::Pending => report::classify(comment) == Classification::Pending,
        }
    }
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

pub struct Options {
    pub status_message: String,
    pub config_path: String,
    pub session: Arc<Session>,
    pub channel_service: Arc<dyn ChannelService>,
    pub report_service: Arc<dyn ReportService>,
    pub video_service: Arc<dyn VideoService>,
    pub comment_service: Arc<dyn CommentService>,
}

pub struct Model {
    tab: Tab,
    dashboard: DashboardPresenter,
    videos: VideoListPresenter,
    history: HistoryPresenter,
    comments: Option<CommentListPresenter>,
    comment_service: Arc<dyn CommentService>,
    session: Arc<Session>,
    last_token_poll: Instant,
    selected_video: usize,
    selected_comment: usize,
    selected_history: usize,
    history_filter: HistoryFilter,
    confirm_delete_all: bool,
    status_message: String,
    config_path: String,
    spinner: Spinner,
    needs_redraw: bool,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let dashboard =
            DashboardPresenter::new(opts.channel_service.clone(), opts.report_service.clone());
        let videos = VideoListPresenter::new(opts.video_service);
        let history = HistoryPresenter::new(opts.channel_service, opts.report_service);

        Self {
            tab: Tab::Dashboard,
            dashboard,
            videos,
            history,
            comments: None,
            comment_service: opts.comment_service,
            session: opts.session,
            last_token_poll: Instant::now(),
            selected_video: 0,
            selected_comment: 0,
            selected_history: 0,
            history_filter: HistoryFilter::All,
            confirm_delete_all: false,
            status_message: opts.status_message,
            config_path: opts.config_path,
            spinner: Spinner::new(),
            needs_redraw: true,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        // The token may already be on disk; the first feed starts the
        // initial fetches.
        self.feed_token();

        loop {
            if self.poll_async() {
                self.needs_redraw = true;
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.needs_redraw = true;
                            }
                        }
                    }
                }
            }

            if self.poll_async() {
                self.needs_redraw = true;
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.needs_redraw = true;
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    /// Drain background responses and re-feed the token. Returns true when
    /// anything on screen may have changed.
    fn poll_async(&mut self) -> bool {
        let mut changed = false;

        if self.last_token_poll.elapsed() >= TOKEN_POLL_INTERVAL {
            self.last_token_poll = Instant::now();
            if self.session.reload() {
                self.status_message = match self.session.token() {
                    Some(_) => "Token loaded".to_string(),
                    None => "Token is gone; waiting for a new one".to_string(),
                };
                changed = true;
            }
        }
        self.feed_token();

        changed |= self.dashboard.poll();
        changed |= self.videos.poll();
        changed |= self.history.poll();
        if let Some(comments) = &mut self.comments {
            changed |= comments.poll();
        }

        for notice in self.take_notices() {
            self.status_message = notice;
            changed = true;
        }

        self.clamp_selections();
        changed
    }

    fn feed_token(&mut self) {
        let token = self.session.token();
        self.dashboard.sync_token(token.as_deref());
        self.videos.sync_token(token.as_deref());
        self.history.sync_token(token.as_deref());
        if let Some(comments) = &mut self.comments {
            comments.sync_token(token.as_deref());
        }
    }

    fn take_notices(&mut self) -> Vec<String> {
        let mut notices = self.dashboard.take_notices();
        if let Some(comments) = &mut self.comments {
            notices.extend(comments.take_notices());
        }
        notices
    }

    fn is_loading(&self) -> bool {
        self.dashboard.is_busy()
            || self.videos.is_busy()
            || self.history.is_busy()
            || self.comments.as_ref().is_some_and(|c| c.is_busy())
    }

    fn clamp_selections(&mut self) {
        let videos = self.videos.state().data.len();
        if self.selected_video >= videos {
            self.selected_video = videos.saturating_sub(1);
        }
        let comments = self
            .comments
            .as_ref()
            .map(|c| c.state().data.len())
            .unwrap_or(0);
        if self.selected_comment >= comments {
            self.selected_comment = comments.saturating_sub(1);
        }
        let history = self.history_rows().len();
        if self.selected_history >= history {
            self.selected_history = history.saturating_sub(1);
        }
    }

    fn history_rows(&self) -> Vec<Comment> {
        self.history
            .state()
            .data
            .comments
            .iter()
            .filter(|comment| self.history_filter.keeps(comment))
            .cloned()
            .collect()
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.confirm_delete_all {
            match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_delete_all = false;
                    if let Some(comments) = &mut self.comments {
                        comments.delete_all_comments();
                        self.status_message = "Deleting all comments…".to_string();
                    }
                }
                _ => {
                    self.confirm_delete_all = false;
                    self.status_message = "Delete all cancelled".to_string();
                }
            }
            self.needs_redraw = true;
            return Ok(false);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('1') => self.switch_tab(Tab::Dashboard),
            KeyCode::Char('2') => self.switch_tab(Tab::Videos),
            KeyCode::Char('3') => self.switch_tab(Tab::Comments),
            KeyCode::Char('4') => self.switch_tab(Tab::History),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_active(),
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_in_browser(),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter => self.activate_selection(),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if self.tab == Tab::Dashboard {
                    self.status_message = "Syncing channel…".to_string();
                    self.dashboard.sync_channel();
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if self.tab == Tab::History {
                    self.history_filter = self.history_filter.next();
                    self.selected_history = 0;
                    self.status_message =
                        format!("History filter: {}", self.history_filter.label());
                }
            }
            KeyCode::Char('d') => {
                if self.tab == Tab::Comments {
                    self.delete_selected_comment();
                }
            }
            KeyCode::Char('D') => {
                if self.tab == Tab::Comments
                    && self
                        .comments
                        .as_ref()
                        .is_some_and(|c| !c.state().data.is_empty())
                {
                    self.confirm_delete_all = true;
                }
            }
            _ => return Ok(false),
        }

        self.needs_redraw = true;
        Ok(false)
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.status_message = format!("{} tab", tab.title());
        }
    }

    fn refresh_active(&mut self) {
        match self.tab {
            Tab::Dashboard => self.dashboard.refresh(),
            Tab::Videos => self.videos.refresh(),
            Tab::History => self.history.refresh(),
            Tab::Comments => {
                if let Some(comments) = &mut self.comments {
                    comments.refresh();
                }
            }
        }
        self.status_message = format!("Refreshing {}…", self.tab.title());
    }

    fn move_selection(&mut self, delta: i64) {
        let (selected, len) = match self.tab {
            Tab::Videos => (&mut self.selected_video, self.videos.state().data.len()),
            Tab::Comments => {
                let len = self
                    .comments
                    .as_ref()
                    .map(|c| c.state().data.len())
                    .unwrap_or(0);
                (&mut self.selected_comment, len)
            }
            Tab::History => {
                let len = self.history_rows().len();
                (&mut self.selected_history, len)
            }
            Tab::Dashboard => return,
        };
        if len == 0 {
            return;
        }
        let next = (*selected as i64 + delta).clamp(0, len as i64 - 1);
        *selected = next as usize;
    }

    fn activate_selection(&mut self) {
        if self.tab != Tab::Videos {
            return;
        }
        let Some(video) = self.videos.state().data.get(self.selected_video).cloned() else {
            return;
        };
        self.open_comments_for(video);
    }

    fn open_comments_for(&mut self, video: Video) {
        let already_open = self
            .comments
            .as_ref()
            .is_some_and(|c| c.video().video_id == video.video_id);
        if !already_open {
            let mut presenter = CommentListPresenter::new(self.comment_service.clone(), video);
            presenter.sync_token(self.session.token().as_deref());
            self.comments = Some(presenter);
            self.selected_comment = 0;
        }
        self.tab = Tab::Comments;
        if let Some(comments) = &self.comments {
            self.status_message = format!("Comments for \"{}\"", comments.video().title);
        }
    }

    fn delete_selected_comment(&mut self) {
        let Some(comments) = &mut self.comments else {
            return;
        };
        let Some(comment) = comments.state().data.get(self.selected_comment) else {
            return;
        };
        let comment_id = comment.comment_id.clone();
        comments.delete_comment(&comment_id);
        self.status_message = "Deleting comment…".to_string();
    }

    fn open_in_browser(&mut self) {
        let url = match self.tab {
            Tab::Dashboard => self
                .dashboard
                .state()
                .data
                .channel
                .as_ref()
                .map(|channel| channel.url()),
            Tab::Videos => self
                .videos
                .state()
                .data
                .get(self.selected_video)
                .map(Video::watch_url),
            Tab::Comments => self
                .comments
                .as_ref()
                .map(|comments| comments.video().watch_url()),
            Tab::History => self
                .history_rows()
                .get(self.selected_history)
                .map(Comment::watch_url),
        };
        match url {
            Some(url) if !url.is_empty() => {
                self.status_message = match webbrowser::open(&url) {
                    Ok(()) => format!("Opened {}", url),
                    Err(err) => format!("Could not open browser: {}", err),
                };
            }
            _ => {
                self.status_message = "Nothing to open here yet".to_string();
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        self.draw_tab_bar(frame, layout[1]);

        match self.tab {
            Tab::Dashboard => self.draw_dashboard(frame, layout[2]),
            Tab::Videos => self.draw_videos(frame, layout[2]),
            Tab::Comments => self.draw_comments(frame, layout[2]),
            Tab::History => self.draw_history(frame, layout[2]),
        }

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[3]);

        if self.confirm_delete_all {
            self.draw_confirm(frame, layout[2]);
        }
    }

    fn draw_tab_bar(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut spans: Vec<Span> = Vec::with_capacity(TABS.len() * 2);
        for (idx, tab) in TABS.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw("  "));
            }
            let active = self.tab == *tab;
            let mut style = Style::default().fg(if active {
                COLOR_ACCENT
            } else {
                COLOR_TEXT_SECONDARY
            });
            if active {
                style = style.add_modifier(Modifier::BOLD);
            }
            let marker = if active { "●" } else { "○" };
            spans.push(Span::styled(
                format!("{} {} {}", idx + 1, marker, tab.title()),
                style,
            ));
        }
        let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(COLOR_BG));
        frame.render_widget(bar, area);
    }

    fn panel_block(&self, title: &str) -> Block<'static> {
        Block::default()
            .title(Span::styled(
                title.to_string(),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_IDLE))
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::uniform(1))
    }

    fn draw_dashboard(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let state = self.dashboard.state();
        if let Some(error) = state.error.clone() {
            if state.data.channel.is_none() && state.data.comments.is_empty() {
                self.draw_message(frame, area, "Dashboard", &error, COLOR_ERROR);
                return;
            }
        }
        if state.loading && state.data.channel.is_none() && state.data.comments.is_empty() {
            self.draw_message(
                frame,
                area,
                "Dashboard",
                "Loading channel and report…",
                COLOR_TEXT_SECONDARY,
            );
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Length(6),
                Constraint::Min(8),
            ])
            .split(area);

        self.draw_channel_card(frame, chunks[0]);
        self.draw_pie(frame, chunks[1]);
        self.draw_daily_chart(frame, chunks[2]);
    }

    fn draw_channel_card(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.panel_block("Channel");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let state = self.dashboard.state();
        let stats = self.dashboard.stats();
        let mut lines: Vec<Line> = Vec::new();
        match &state.data.channel {
            Some(channel) => {
                let mut title_spans = vec![Span::styled(
                    channel.title.clone(),
                    Style::default()
                        .fg(COLOR_TEXT_PRIMARY)
                        .add_modifier(Modifier::BOLD),
                )];
                if let Some(custom) = &channel.custom_url {
                    if !custom.is_empty() {
                        title_spans.push(Span::raw("  "));
                        title_spans.push(Span::styled(
                            custom.clone(),
                            Style::default().fg(COLOR_ACCENT),
                        ));
                    }
                }
                lines.push(Line::from(title_spans));
                lines.push(Line::from(Span::styled(
                    format!(
                        "{} subscribers · {} videos · {} views",
                        format_count(channel.subscriber_count),
                        format_count(channel.video_count),
                        format_count(channel.view_count),
                    ),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
            None => {
                lines.push(Line::from(Span::styled(
                    "No channel yet — press s to sync",
                    Style::default()
                        .fg(COLOR_TEXT_SECONDARY)
                        .add_modifier(Modifier::ITALIC),
                )));
            }
        }
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled(
                format!("Detected {}", stats.total),
                Style::default().fg(COLOR_TEXT_PRIMARY),
            ),
            Span::raw("   "),
            Span::styled(
                format!("Removed {}", stats.removed),
                Style::default().fg(COLOR_SUCCESS),
            ),
            Span::raw("   "),
            Span::styled(
                format!("Pending {}", stats.pending),
                Style::default().fg(COLOR_WARNING),
            ),
        ]));
        if let Some(error) = &state.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(COLOR_ERROR),
            )));
        }

        let card = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        frame.render_widget(card, inner);
    }

    fn draw_pie(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.panel_block("Spam breakdown");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let segments = self.dashboard.pie_segments();
        if segments.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No comments in the report yet",
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            ));
            frame.render_widget(empty, inner);
            return;
        }

        let constraints: Vec<Constraint> =
            segments.iter().map(|_| Constraint::Length(1)).collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);
        for (segment, row) in segments.iter().zip(rows.iter()) {
            let color = if segment.label == "Removed" {
                COLOR_SUCCESS
            } else {
                COLOR_WARNING
            };
            let gauge = Gauge::default()
                .ratio(f64::from(segment.percentage).min(100.0) / 100.0)
                .label(format!(
                    "{} {} ({}%)",
                    segment.label, segment.value, segment.percentage
                ))
                .gauge_style(Style::default().fg(color).bg(COLOR_PANEL_SELECTED_BG));
            frame.render_widget(gauge, *row);
        }
    }

    fn draw_daily_chart(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.panel_block("Last 7 active days");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let buckets = self.dashboard.daily_buckets();
        if buckets.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No activity to chart",
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            ));
            frame.render_widget(empty, inner);
            return;
        }

        let mut chart = BarChart::default()
            .bar_width(3)
            .bar_gap(1)
            .group_gap(2)
            .label_style(Style::default().fg(COLOR_TEXT_SECONDARY));
        for bucket in &buckets {
            let bars = [
                Bar::default()
                    .value(bucket.removed as u64)
                    .style(Style::default().fg(COLOR_SUCCESS)),
                Bar::default()
                    .value(bucket.pending as u64)
                    .style(Style::default().fg(COLOR_WARNING)),
            ];
            let group = BarGroup::default()
                .label(Line::from(short_day_label(&bucket.label)))
                .bars(&bars);
            chart = chart.data(group);
        }
        frame.render_widget(chart, inner);
    }

    fn draw_videos(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let state = self.videos.state();
        if let Some(error) = state.error.clone() {
            self.draw_message(frame, area, "Videos", &error, COLOR_ERROR);
            return;
        }
        if state.loading && state.data.is_empty() {
            self.draw_message(
                frame,
                area,
                "Videos",
                "Loading videos…",
                COLOR_TEXT_SECONDARY,
            );
            return;
        }

        let block = self.panel_block("Videos");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.data.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No videos synced yet — press s on the dashboard",
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            ));
            frame.render_widget(empty, inner);
            return;
        }

        let items: Vec<ListItem> = state
            .data
            .iter()
            .enumerate()
            .map(|(idx, video)| {
                let selected = idx == self.selected_video;
                let background = if selected {
                    COLOR_PANEL_SELECTED_BG
                } else {
                    COLOR_PANEL_BG
                };
                let mut title_style = Style::default().fg(COLOR_TEXT_PRIMARY).bg(background);
                if selected {
                    title_style = title_style.add_modifier(Modifier::BOLD);
                }
                let lines = vec![
                    Line::from(Span::styled(video.title.clone(), title_style)),
                    Line::from(Span::styled(
                        format!(
                            "{} · {} comments · {} views",
                            format_timestamp(video.published_at),
                            format_count(video.comment_count),
                            format_count(video.view_count),
                        ),
                        Style::default().fg(COLOR_TEXT_SECONDARY).bg(background),
                    )),
                    Line::default(),
                ];
                ListItem::new(pad_lines(lines, inner.width, background))
            })
            .collect();

        frame.render_widget(List::new(items), inner);
    }

    fn draw_comments(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let Some(comments) = &self.comments else {
            self.draw_message(
                frame,
                area,
                "Comments",
                "Pick a video on the Videos tab (Enter) to see its comments",
                COLOR_TEXT_SECONDARY,
            );
            return;
        };

        let title = format!("Comments — {}", comments.video().title);
        let state = comments.state();
        if let Some(error) = state.error.clone() {
            self.draw_message(frame, area, &title, &error, COLOR_ERROR);
            return;
        }
        if state.loading && state.data.is_empty() {
            self.draw_message(
                frame,
                area,
                &title,
                "Loading comments…",
                COLOR_TEXT_SECONDARY,
            );
            return;
        }

        let block = self.panel_block(&title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.data.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No spam detected on this video",
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            ));
            frame.render_widget(empty, inner);
            return;
        }

        let selected = self.selected_comment;
        let items: Vec<ListItem> = state
            .data
            .iter()
            .enumerate()
            .map(|(idx, comment)| comment_row(comment, idx == selected, inner.width))
            .collect();
        frame.render_widget(List::new(items), inner);
    }

    fn draw_history(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let state = self.history.state();
        if let Some(error) = state.error.clone() {
            self.draw_message(frame, area, "History", &error, COLOR_ERROR);
            return;
        }
        if state.loading && state.data.comments.is_empty() {
            self.draw_message(
                frame,
                area,
                "History",
                "Loading report…",
                COLOR_TEXT_SECONDARY,
            );
            return;
        }

        let stats = self.history.stats();
        let title = format!(
            "History — {} detected · {} removed · {} pending · filter: {}",
            stats.total,
            stats.removed,
            stats.pending,
            self.history_filter.label(),
        );
        let block = self.panel_block(&title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = self.history_rows();
        if rows.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "Nothing matches this filter",
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::ITALIC),
            ));
            frame.render_widget(empty, inner);
            return;
        }

        let selected = self.selected_history;
        let items: Vec<ListItem> = rows
            .iter()
            .enumerate()
            .map(|(idx, comment)| comment_row(comment, idx == selected, inner.width))
            .collect();
        frame.render_widget(List::new(items), inner);
    }

    fn draw_message(&self, frame: &mut Frame<'_>, area: Rect, title: &str, text: &str, fg: Color) {
        let block = self.panel_block(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let message = Paragraph::new(Span::styled(
            text.to_string(),
            Style::default().fg(fg).add_modifier(Modifier::ITALIC),
        ))
        .wrap(Wrap { trim: true });
        frame.render_widget(message, inner);
    }

    fn draw_confirm(&self, frame: &mut Frame<'_>, area: Rect) {
        let popup = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(
                "Delete all comments",
                Style::default()
                    .fg(COLOR_ERROR)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_ERROR))
            .style(Style::default().bg(COLOR_PANEL_FOCUSED_BG))
            .padding(Padding::uniform(1));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);
        let prompt = Paragraph::new(
            "Delete every detected comment on this video? This cannot be undone. (y/n)",
        )
        .style(Style::default().fg(COLOR_TEXT_PRIMARY))
        .wrap(Wrap { trim: true });
        frame.render_widget(prompt, inner);
    }

    fn footer_text(&self) -> String {
        if self.confirm_delete_all {
            return "y confirm · any other key cancel".to_string();
        }

        let mut parts: Vec<String> = vec!["1-4 tabs".to_string()];
        match self.tab {
            Tab::Dashboard => {
                parts.push("s sync channel".to_string());
                parts.push("o open channel".to_string());
            }
            Tab::Videos => {
                parts.push("j/k move".to_string());
                parts.push("Enter comments".to_string());
                parts.push("o open video".to_string());
            }
            Tab::Comments => {
                if self.comments.is_some() {
                    parts.push("j/k move".to_string());
                    parts.push("d delete".to_string());
                    parts.push("D delete all".to_string());
                    parts.push("o open video".to_string());
                }
            }
            Tab::History => {
                parts.push("j/k move".to_string());
                parts.push("f cycle filter".to_string());
                parts.push("o open video".to_string());
            }
        }
        parts.push("r refresh".to_string());
        parts.push("q quit".to_string());
        parts.push(format!("config: {}", self.config_path));
        parts.join(" · ")
    }
}

fn comment_row(comment: &Comment, selected: bool, width: u16) -> ListItem<'static> {
    let background = if selected {
        COLOR_PANEL_SELECTED_BG
    } else {
        COLOR_PANEL_BG
    };
    let (badge, badge_color) = status_badge(comment);
    let mut author_style = Style::default().fg(COLOR_TEXT_PRIMARY).bg(background);
    if selected {
        author_style = author_style.add_modifier(Modifier::BOLD);
    }
    let lines = vec![
        Line::from(vec![
            Span::styled(comment.author.clone(), author_style),
            Span::styled("  ", Style::default().bg(background)),
            Span::styled(
                format!("[{}]", badge),
                Style::default()
                    .fg(badge_color)
                    .bg(background)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ", Style::default().bg(background)),
            Span::styled(
                format_timestamp(comment.created_at),
                Style::default().fg(COLOR_TEXT_SECONDARY).bg(background),
            ),
        ]),
        Line::from(Span::styled(
            comment.text.clone(),
            Style::default().fg(COLOR_TEXT_SECONDARY).bg(background),
        )),
        Line::default(),
    ];
    ListItem::new(pad_lines(lines, width, background))
}

fn status_badge(comment: &Comment) -> (&'static str, Color) {
    match report::classify(comment) {
        Classification::Removed => ("removed", COLOR_SUCCESS),
        Classification::Pending => ("pending", COLOR_WARNING),
    }
}

fn pad_lines(mut lines: Vec<Line<'static>>, width: u16, background: Color) -> Vec<Line<'static>> {
    for line in &mut lines {
        let used: usize = line.spans.iter().map(|span| span.content.width()).sum();
        let missing = (width as usize).saturating_sub(used);
        if missing > 0 {
            line.spans.push(Span::styled(
                " ".repeat(missing),
                Style::default().bg(background),
            ));
        }
    }
    lines
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%-d %b %Y %H:%M").to_string()
}

/// Thousands get a short suffix; the channel card has no room for full
/// digits.
fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Bucket labels come in as "5 Jan 2024"; the bar chart only has room for
/// day and month.
fn short_day_label(label: &str) -> String {
    label
        .rsplit_once(' ')
        .map(|(front, _year)| front.to_string())
        .unwrap_or_else(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentStatus;

    fn comment_with_status(status: CommentStatus) -> Comment {
        Comment {
            comment_id: "c1".to_string(),
            channel_id: "UC1".to_string(),
            video_id: "v1".to_string(),
            author: "someone".to_string(),
            author_profile_image_url: None,
            text: "spam".to_string(),
            status,
            created_at: "2024-01-05T09:30:00Z".parse().expect("test timestamp"),
            deleted_at: None,
        }
    }

    #[test]
    fn history_filter_cycles_through_all_states() {
        let mut filter = HistoryFilter::All;
        filter = filter.next();
        assert_eq!(filter, HistoryFilter::Removed);
        filter = filter.next();
        assert_eq!(filter, HistoryFilter::Pending);
        filter = filter.next();
        assert_eq!(filter, HistoryFilter::All);
    }

    #[test]
    fn history_filter_uses_the_shared_classification() {
        let hidden = comment_with_status(CommentStatus::Hidden);
        let deleted = comment_with_status(CommentStatus::Deleted);
        let success = comment_with_status(CommentStatus::Success);
        assert!(HistoryFilter::Removed.keeps(&hidden));
        assert!(HistoryFilter::Removed.keeps(&deleted));
        assert!(!HistoryFilter::Removed.keeps(&success));
        assert!(HistoryFilter::Pending.keeps(&success));
        assert!(HistoryFilter::All.keeps(&hidden));
    }

    #[test]
    fn status_badges_follow_the_classification() {
        let (badge, _) = status_badge(&comment_with_status(CommentStatus::Hidden));
        assert_eq!(badge, "removed");
        let (badge, _) = status_badge(&comment_with_status(CommentStatus::Pending));
        assert_eq!(badge, "pending");
    }

    #[test]
    fn counts_abbreviate_above_a_thousand() {
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(12_400), "12.4K");
        assert_eq!(format_count(1_450_000), "1.5M");
    }

    #[test]
    fn timestamps_render_without_locale() {
        let at: DateTime<Utc> = "2024-01-05T09:30:00Z".parse().expect("test timestamp");
        assert_eq!(format_timestamp(at), "5 Jan 2024 09:30");
    }

    #[test]
    fn bucket_labels_drop_the_year() {
        assert_eq!(short_day_label("5 Jan 2024"), "5 Jan");
        assert_eq!(short_day_label("oddball"), "oddball");
    }

    #[test]
    fn tab_order_matches_the_number_keys() {
        let titles: Vec<_> = TABS.iter().map(|tab| tab.title()).collect();
        assert_eq!(titles, vec!["Dashboard", "Videos", "Comments", "History"]);
    }
}
