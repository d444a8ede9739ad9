use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{Comment, CommentStatus};

/// How many active days the dashboard chart keeps.
const DAILY_BUCKET_CAP: usize = 7;

/// Unified moderation class. `deleted` and `hidden` both count as removed;
/// every stat, filter, and chart goes through this one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Removed,
    Pending,
}

pub fn classify(comment: &Comment) -> Classification {
    match comment.status {
        CommentStatus::Deleted | CommentStatus::Hidden => Classification::Removed,
        _ => Classification::Pending,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub removed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieSegment {
    pub label: &'static str,
    pub value: usize,
    pub percentage: u32,
}

/// One calendar day with at least one comment. `day` is the stable key;
/// `label` is only for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBucket {
    pub day: NaiveDate,
    pub label: String,
    pub removed: usize,
    pub pending: usize,
}

/// Scope the flat report to one channel. An unknown channel id degrades to
/// the full report rather than an empty one.
pub fn filter_by_channel(comments: &[Comment], channel_id: Option<&str>) -> Vec<Comment> {
    match channel_id {
        Some(id) => comments
            .iter()
            .filter(|comment| comment.channel_id == id)
            .cloned()
            .collect(),
        None => comments.to_vec(),
    }
}

pub fn compute_stats(comments: &[Comment]) -> Stats {
    let mut stats = Stats {
        total: comments.len(),
        ..Stats::default()
    };
    for comment in comments {
        match classify(comment) {
            Classification::Removed => stats.removed += 1,
            Classification::Pending => stats.pending += 1,
        }
    }
    stats
}

pub fn compute_pie_segments(stats: &Stats) -> Vec<PieSegment> {
    if stats.total == 0 {
        return Vec::new();
    }
    let mut segments = Vec::new();
    for (label, value) in [("Removed", stats.removed), ("Pending", stats.pending)] {
        if value == 0 {
            continue;
        }
        let percentage = ((value as f64 / stats.total as f64) * 100.0).round() as u32;
        segments.push(PieSegment {
            label,
            value,
            percentage,
        });
    }
    segments
}

/// Group comments by UTC calendar day and keep the most recent seven active
/// days, ascending. Days without comments produce no bucket and do not count
/// toward the seven.
pub fn compute_daily_buckets(comments: &[Comment]) -> Vec<DailyBucket> {
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for comment in comments {
        let entry = days.entry(comment.created_at.date_naive()).or_default();
        match classify(comment) {
            Classification::Removed => entry.0 += 1,
            Classification::Pending => entry.1 += 1,
        }
    }
    let skip = days.len().saturating_sub(DAILY_BUCKET_CAP);
    days.into_iter()
        .skip(skip)
        .map(|(day, (removed, pending))| DailyBucket {
            label: day.format("%-d %b %Y").to_string(),
            day,
            removed,
            pending,
        })
        .collect()
}

/// Newest first; ties keep their input order.
pub fn sort_by_recency(comments: &[Comment]) -> Vec<Comment> {
    let mut sorted = comments.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn comment(id: &str, channel: &str, status: CommentStatus, created: &str) -> Comment {
        Comment {
            comment_id: id.to_string(),
            channel_id: channel.to_string(),
            video_id: "v1".to_string(),
            author: "someone".to_string(),
            author_profile_image_url: None,
            text: "look at this".to_string(),
            status,
            created_at: created.parse::<DateTime<Utc>>().expect("test timestamp"),
            deleted_at: None,
        }
    }

    fn sample_report() -> Vec<Comment> {
        vec![
            comment("c1", "UC1", CommentStatus::Deleted, "2024-01-01T08:00:00Z"),
            comment("c2", "UC1", CommentStatus::Pending, "2024-01-01T09:00:00Z"),
            comment("c3", "UC1", CommentStatus::Success, "2024-01-02T10:00:00Z"),
        ]
    }

    #[test]
    fn deleted_and_hidden_are_one_class() {
        let deleted = comment("c1", "UC1", CommentStatus::Deleted, "2024-01-01T00:00:00Z");
        let hidden = comment("c2", "UC1", CommentStatus::Hidden, "2024-01-01T00:00:00Z");
        assert_eq!(classify(&deleted), Classification::Removed);
        assert_eq!(classify(&hidden), Classification::Removed);
    }

    #[test]
    fn everything_else_counts_as_pending() {
        for status in [
            CommentStatus::Success,
            CommentStatus::Pending,
            CommentStatus::Unknown,
        ] {
            let c = comment("c1", "UC1", status, "2024-01-01T00:00:00Z");
            assert_eq!(classify(&c), Classification::Pending);
        }
    }

    #[test]
    fn stats_count_the_sample_report() {
        let stats = compute_stats(&sample_report());
        assert_eq!(
            stats,
            Stats {
                total: 3,
                removed: 1,
                pending: 2
            }
        );
    }

    #[test]
    fn pie_segments_match_the_sample_report() {
        let segments = compute_pie_segments(&compute_stats(&sample_report()));
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].label, "Removed");
        assert_eq!(segments[0].value, 1);
        assert_eq!(segments[0].percentage, 33);
        assert_eq!(segments[1].label, "Pending");
        assert_eq!(segments[1].value, 2);
        assert_eq!(segments[1].percentage, 67);
        let sum: u32 = segments.iter().map(|s| s.percentage).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn pie_omits_zero_segments() {
        let comments = vec![
            comment("c1", "UC1", CommentStatus::Deleted, "2024-01-01T00:00:00Z"),
            comment("c2", "UC1", CommentStatus::Hidden, "2024-01-02T00:00:00Z"),
        ];
        let segments = compute_pie_segments(&compute_stats(&comments));
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, "Removed");
        assert_eq!(segments[0].percentage, 100);
    }

    #[test]
    fn pie_is_empty_for_empty_input() {
        assert!(compute_pie_segments(&Stats::default()).is_empty());
    }

    #[test]
    fn buckets_match_the_sample_report() {
        let buckets = compute_daily_buckets(&sample_report());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(buckets[0].removed, 1);
        assert_eq!(buckets[0].pending, 1);
        assert_eq!(buckets[1].day, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(buckets[1].removed, 0);
        assert_eq!(buckets[1].pending, 1);
    }

    #[test]
    fn buckets_keep_only_the_last_seven_active_days() {
        let mut comments = Vec::new();
        for day in 1..=9 {
            let created = format!("2024-03-{:02}T12:00:00Z", day);
            comments.push(comment(
                &format!("c{}", day),
                "UC1",
                CommentStatus::Pending,
                &created,
            ));
        }
        let buckets = compute_daily_buckets(&comments);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].day, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(buckets[6].day, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(buckets.windows(2).all(|w| w[0].day < w[1].day));
    }

    #[test]
    fn bucket_labels_are_locale_independent() {
        let comments = vec![comment(
            "c1",
            "UC1",
            CommentStatus::Pending,
            "2024-01-05T00:00:00Z",
        )];
        let buckets = compute_daily_buckets(&comments);
        assert_eq!(buckets[0].label, "5 Jan 2024");
    }

    #[test]
    fn filter_without_channel_returns_input_unmodified() {
        let comments = sample_report();
        let filtered = filter_by_channel(&comments, None);
        assert_eq!(filtered.len(), comments.len());
        let ids: Vec<_> = filtered.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn filter_scopes_to_the_channel() {
        let mut comments = sample_report();
        comments.push(comment(
            "c4",
            "UC2",
            CommentStatus::Deleted,
            "2024-01-03T00:00:00Z",
        ));
        let filtered = filter_by_channel(&comments, Some("UC2"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].comment_id, "c4");
    }

    #[test]
    fn recency_sort_is_stable_and_descending() {
        let comments = vec![
            comment("first", "UC1", CommentStatus::Pending, "2024-01-01T08:00:00Z"),
            comment("tie-a", "UC1", CommentStatus::Pending, "2024-01-02T08:00:00Z"),
            comment("tie-b", "UC1", CommentStatus::Pending, "2024-01-02T08:00:00Z"),
        ];
        let sorted = sort_by_recency(&comments);
        let ids: Vec<_> = sorted.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["tie-a", "tie-b", "first"]);
    }
}
