//! Live-TV guide data: channels, categories and program-guide entries

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, ServerId};

/// A live-TV channel.
///
/// Stored channels carry their own `id`; channels produced by a guide refresh
/// use the provider's `external_id` as `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub server_id: ServerId,
    pub external_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub channel_count: usize,
}

/// One program slot, half-open `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgEntry {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl EpgEntry {
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }
}

/// Sort entries by start time and drop empty or overlapping slots, so that a
/// channel's schedule is time-ordered and non-overlapping.
#[must_use]
pub fn normalize_epg(mut entries: Vec<EpgEntry>) -> Vec<EpgEntry> {
    entries.retain(|e| e.end_time > e.start_time);
    entries.sort_by_key(|e| e.start_time);

    let mut out: Vec<EpgEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if out.last().is_some_and(|prev| entry.start_time < prev.end_time) {
            continue;
        }
        out.push(entry);
    }
    out
}

/// Immutable guide value. Replaced as a whole on every successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideSnapshot {
    pub channels: Vec<Channel>,
    pub categories: Vec<Category>,
    pub epg_by_channel: HashMap<String, Vec<EpgEntry>>,
    pub fetched_at: DateTime<Utc>,
}

impl GuideSnapshot {
    /// Placeholder returned before the first refresh
    #[must_use]
    pub fn empty() -> Self {
        Self {
            channels: Vec::new(),
            categories: Vec::new(),
            epg_by_channel: HashMap::new(),
            fetched_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Build a snapshot, deriving category counts from `channels`
    #[must_use]
    pub fn build(
        channels: Vec<Channel>,
        categories: Vec<(String, String)>,
        epg_by_channel: HashMap<String, Vec<EpgEntry>>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for channel in &channels {
            if let Some(category_id) = channel.category_id.as_deref() {
                *counts.entry(category_id).or_default() += 1;
            }
        }
        let categories = categories
            .into_iter()
            .map(|(id, name)| {
                let channel_count = counts.get(id.as_str()).copied().unwrap_or(0);
                Category { id, name, channel_count }
            })
            .collect();

        Self {
            channels,
            categories,
            epg_by_channel,
            fetched_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[must_use]
    pub fn channel(&self, external_id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.external_id == external_id)
    }

    #[must_use]
    pub fn channels_in_category(&self, category_id: &str) -> Vec<&Channel> {
        self.channels
            .iter()
            .filter(|c| c.category_id.as_deref() == Some(category_id))
            .collect()
    }

    /// Program airing on `channel_id` at `at`
    #[must_use]
    pub fn now_playing(&self, channel_id: &str, at: DateTime<Utc>) -> Option<&EpgEntry> {
        self.epg_by_channel
            .get(channel_id)?
            .iter()
            .find(|e| e.contains(at))
    }

    /// Age of the snapshot relative to `now`
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn entry(start: i64, end: i64, title: &str) -> EpgEntry {
        EpgEntry {
            channel_id: "101".to_string(),
            title: title.to_string(),
            description: String::new(),
            start_time: at(start),
            end_time: at(end),
        }
    }

    fn channel(external_id: &str, category: Option<&str>) -> Channel {
        Channel {
            id: ChannelId::from(external_id),
            server_id: ServerId::from("srv"),
            external_id: external_id.to_string(),
            name: format!("Channel {external_id}"),
            category_id: category.map(str::to_string),
            logo_url: None,
        }
    }

    #[test]
    fn test_half_open_interval() {
        let e = entry(100, 200, "show");
        assert!(e.contains(at(100)));
        assert!(e.contains(at(199)));
        assert!(!e.contains(at(200)));
    }

    #[test]
    fn test_normalize_sorts_and_drops_overlaps() {
        let entries = vec![
            entry(300, 400, "c"),
            entry(100, 200, "a"),
            entry(150, 250, "overlap"),
            entry(200, 300, "b"),
            entry(500, 500, "empty"),
        ];
        let titles: Vec<_> = normalize_epg(entries).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_build_derives_category_counts() {
        let snapshot = GuideSnapshot::build(
            vec![channel("1", Some("news")), channel("2", Some("news")), channel("3", None)],
            vec![
                ("news".to_string(), "News".to_string()),
                ("sport".to_string(), "Sport".to_string()),
            ],
            HashMap::new(),
            at(0),
        );
        assert_eq!(snapshot.categories[0].channel_count, 2);
        assert_eq!(snapshot.categories[1].channel_count, 0);
        assert_eq!(snapshot.channels_in_category("news").len(), 2);
    }

    #[test]
    fn test_now_playing() {
        let mut epg = HashMap::new();
        epg.insert("101".to_string(), vec![entry(0, 100, "first"), entry(100, 200, "second")]);
        let snapshot = GuideSnapshot::build(vec![channel("101", None)], vec![], epg, at(0));
        assert_eq!(snapshot.now_playing("101", at(150)).unwrap().title, "second");
        assert!(snapshot.now_playing("101", at(250)).is_none());
        assert!(snapshot.now_playing("999", at(50)).is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = GuideSnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.channel("101").is_none());
    }
}
