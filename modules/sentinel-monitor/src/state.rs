use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use sentinel_common::{
    Alert, DashboardStats, EmailLogEntry, MonitoringConfig, PlatformCount, SentinelError,
    ALL_PLATFORMS,
};

use crate::notifier;

pub type SharedState = Arc<RwLock<MonitorState>>;

/// Session-lifetime monitor state: alert feed, email log, and the live
/// monitoring config. All mutation goes through the methods here; the API
/// layer only ever sees snapshots.
pub struct MonitorState {
    alerts: Vec<Alert>,
    email_log: Vec<EmailLogEntry>,
    config: MonitoringConfig,
}

impl MonitorState {
    pub fn new(config: MonitoringConfig) -> Self {
        Self {
            alerts: Vec::new(),
            email_log: Vec::new(),
            config,
        }
    }

    pub fn shared(config: MonitoringConfig) -> SharedState {
        Arc::new(RwLock::new(Self::new(config)))
    }

    /// Apply one acquisition cycle: prepend the new alerts (newest batch
    /// first) and record one notification per alert against the current
    /// recipient.
    pub fn apply_cycle(&mut self, mut new_alerts: Vec<Alert>) {
        if new_alerts.is_empty() {
            return;
        }

        let recipient = self.config.target_email.clone();
        for alert in &mut new_alerts {
            let entry = notifier::compose_email(alert, &recipient);
            info!(
                recipient = recipient.as_str(),
                subject = entry.subject.as_str(),
                alert_id = %alert.id,
                "Notification email recorded"
            );
            self.email_log.insert(0, entry);

            if !alert.email_sent {
                alert.email_sent = true;
                alert.email_sent_at = Some(Utc::now());
            }
        }

        // Newest batch goes to the front, preserving in-batch order.
        new_alerts.append(&mut self.alerts);
        self.alerts = new_alerts;
    }

    // --- Config mutation ---

    pub fn add_keyword(&mut self, word: &str) -> Result<(), SentinelError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(SentinelError::Validation("keyword must not be empty".to_string()));
        }
        if !self.config.keywords.iter().any(|k| k == word) {
            self.config.keywords.push(word.to_string());
        }
        Ok(())
    }

    pub fn remove_keyword(&mut self, word: &str) {
        self.config.keywords.retain(|k| k != word);
    }

    pub fn set_target_email(&mut self, email: &str) -> Result<(), SentinelError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SentinelError::Validation("recipient must not be empty".to_string()));
        }
        self.config.target_email = email.to_string();
        Ok(())
    }

    pub fn set_monitoring(&mut self, on: bool) {
        self.config.is_monitoring = on;
    }

    // --- Snapshots ---

    pub fn config(&self) -> MonitoringConfig {
        self.config.clone()
    }

    pub fn keywords(&self) -> Vec<String> {
        self.config.keywords.clone()
    }

    pub fn alerts(&self, limit: Option<usize>) -> Vec<Alert> {
        match limit {
            Some(n) => self.alerts.iter().take(n).cloned().collect(),
            None => self.alerts.clone(),
        }
    }

    pub fn emails(&self, limit: Option<usize>) -> Vec<EmailLogEntry> {
        match limit {
            Some(n) => self.email_log.iter().take(n).cloned().collect(),
            None => self.email_log.clone(),
        }
    }

    pub fn stats(&self) -> DashboardStats {
        let mut counts: HashMap<_, u32> = HashMap::new();
        for alert in &self.alerts {
            *counts.entry(alert.platform).or_default() += 1;
        }

        let alerts_by_platform = ALL_PLATFORMS
            .iter()
            .filter_map(|p| {
                counts.get(p).map(|&count| PlatformCount {
                    platform: *p,
                    count,
                })
            })
            .collect();

        DashboardStats {
            total_alerts: self.alerts.len() as u32,
            emails_sent: self.email_log.len() as u32,
            alerts_by_platform,
            last_detection: self.alerts.first().map(|a| a.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::{EngagementStats, Platform};

    fn test_config() -> MonitoringConfig {
        MonitoringConfig {
            keywords: vec!["depressed".to_string(), "fat".to_string()],
            target_email: "ops@example.com".to_string(),
            platforms: ALL_PLATFORMS.to_vec(),
            is_monitoring: false,
        }
    }

    fn test_alert(platform: Platform, keyword: &str) -> Alert {
        Alert::new(
            platform,
            "someone",
            format!("post about {keyword}"),
            keyword,
            platform.search_url(keyword),
            EngagementStats::default(),
        )
    }

    #[test]
    fn cycle_records_one_email_per_alert() {
        let mut state = MonitorState::new(test_config());
        let batch = vec![
            test_alert(Platform::Twitter, "depressed"),
            test_alert(Platform::Reddit, "fat"),
        ];
        let ids: Vec<_> = batch.iter().map(|a| a.id).collect();

        state.apply_cycle(batch);

        let alerts = state.alerts(None);
        let emails = state.emails(None);
        assert_eq!(alerts.len(), 2);
        assert_eq!(emails.len(), 2);

        for alert in &alerts {
            assert!(alert.email_sent);
            assert!(alert.email_sent_at.is_some());
        }

        // Every entry references a distinct alert that exists in the feed.
        let mut referenced: Vec<_> = emails.iter().map(|e| e.trigger_alert_id).collect();
        referenced.sort();
        referenced.dedup();
        assert_eq!(referenced.len(), 2);
        for id in referenced {
            assert!(ids.contains(&id));
        }
    }

    #[test]
    fn newer_batches_come_first() {
        let mut state = MonitorState::new(test_config());
        let first = test_alert(Platform::Twitter, "depressed");
        let first_id = first.id;
        state.apply_cycle(vec![first]);

        let second = test_alert(Platform::Reddit, "fat");
        let second_id = second.id;
        state.apply_cycle(vec![second]);

        let alerts = state.alerts(None);
        assert_eq!(alerts[0].id, second_id);
        assert_eq!(alerts[1].id, first_id);

        let emails = state.emails(None);
        assert_eq!(emails[0].trigger_alert_id, second_id);
    }

    #[test]
    fn empty_cycle_changes_nothing() {
        let mut state = MonitorState::new(test_config());
        state.apply_cycle(Vec::new());
        assert!(state.alerts(None).is_empty());
        assert!(state.emails(None).is_empty());
    }

    #[test]
    fn keywords_deduplicate_and_validate() {
        let mut state = MonitorState::new(test_config());

        state.add_keyword("lonely").unwrap();
        state.add_keyword("lonely").unwrap();
        state.add_keyword("  ").unwrap_err();

        assert_eq!(state.keywords(), vec!["depressed", "fat", "lonely"]);

        state.remove_keyword("fat");
        assert_eq!(state.keywords(), vec!["depressed", "lonely"]);
    }

    #[test]
    fn recipient_updates_apply_to_later_cycles() {
        let mut state = MonitorState::new(test_config());
        state.set_target_email("other@example.com").unwrap();
        state.apply_cycle(vec![test_alert(Platform::Twitter, "depressed")]);

        assert_eq!(state.emails(None)[0].recipient, "other@example.com");
    }

    #[test]
    fn stats_count_by_platform() {
        let mut state = MonitorState::new(test_config());
        state.apply_cycle(vec![
            test_alert(Platform::Twitter, "depressed"),
            test_alert(Platform::Twitter, "fat"),
            test_alert(Platform::Reddit, "fat"),
        ]);

        let stats = state.stats();
        assert_eq!(stats.total_alerts, 3);
        assert_eq!(stats.emails_sent, 3);
        assert!(stats.last_detection.is_some());

        let twitter = stats
            .alerts_by_platform
            .iter()
            .find(|c| c.platform == Platform::Twitter)
            .unwrap();
        assert_eq!(twitter.count, 2);
        // Platforms with no alerts are omitted entirely.
        assert!(stats
            .alerts_by_platform
            .iter()
            .all(|c| c.platform != Platform::TikTok));
    }

    #[test]
    fn alert_limit_takes_newest() {
        let mut state = MonitorState::new(test_config());
        state.apply_cycle(vec![test_alert(Platform::Twitter, "depressed")]);
        state.apply_cycle(vec![test_alert(Platform::Reddit, "fat")]);

        let top = state.alerts(Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].platform, Platform::Reddit);
    }
}
