use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use uuid::Uuid;

// --- Platforms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Platform {
    Twitter,
    Reddit,
    Instagram,
    Facebook,
    TikTok,
}

pub const ALL_PLATFORMS: [Platform; 5] = [
    Platform::Twitter,
    Platform::Reddit,
    Platform::Instagram,
    Platform::Facebook,
    Platform::TikTok,
];

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Twitter => write!(f, "Twitter"),
            Platform::Reddit => write!(f, "Reddit"),
            Platform::Instagram => write!(f, "Instagram"),
            Platform::Facebook => write!(f, "Facebook"),
            Platform::TikTok => write!(f, "TikTok"),
        }
    }
}

impl Platform {
    /// Loose platform normalization for model output. Case-insensitive
    /// substring matching, with Twitter as the catch-all.
    pub fn from_str_loose(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("twitter") || lower.contains("x.com") {
            Self::Twitter
        } else if lower.contains("reddit") {
            Self::Reddit
        } else if lower.contains("instagram") {
            Self::Instagram
        } else if lower.contains("facebook") {
            Self::Facebook
        } else if lower.contains("tiktok") {
            Self::TikTok
        } else {
            Self::Twitter
        }
    }

    /// Platform search link for a keyword. Used wherever a direct post URL
    /// is unavailable or would be fabricated (synthetic and fallback posts).
    pub fn search_url(&self, keyword: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
        match self {
            Platform::Twitter => format!("https://x.com/search?q={encoded}&f=live"),
            Platform::Reddit => format!("https://www.reddit.com/search/?q={encoded}&sort=new"),
            Platform::Instagram => format!("https://www.instagram.com/explore/tags/{encoded}/"),
            Platform::Facebook => format!("https://www.facebook.com/search/posts/?q={encoded}"),
            Platform::TikTok => format!("https://www.tiktok.com/search?q={encoded}"),
        }
    }
}

// --- Alerts ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
}

/// A detected post. Created by the acquisition pipeline; immutable except
/// for the one-time email_sent transition performed by the notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub platform: Platform,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub keyword_detected: String,
    pub url: String,
    pub engagement: EngagementStats,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Construct a freshly acquired alert: new id, acquisition-time
    /// timestamp, notification pending.
    pub fn new(
        platform: Platform,
        username: impl Into<String>,
        content: impl Into<String>,
        keyword_detected: impl Into<String>,
        url: impl Into<String>,
        engagement: EngagementStats,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform,
            username: username.into(),
            timestamp: Utc::now(),
            content: content.into(),
            keyword_detected: keyword_detected.into(),
            url: url.into(),
            engagement,
            email_sent: false,
            email_sent_at: None,
        }
    }
}

// --- Monitoring config ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    pub keywords: Vec<String>,
    pub target_email: String,
    /// Platform allow-list. Exposed to the dashboard but not used to filter
    /// acquisition results.
    pub platforms: Vec<Platform>,
    pub is_monitoring: bool,
}

// --- Email log ---

/// A simulated email notification. Append-only, newest-first; always
/// references the alert that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub trigger_alert_id: Uuid,
}

// --- Dashboard stats ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_alerts: u32,
    pub emails_sent: u32,
    pub alerts_by_platform: Vec<PlatformCount>,
    pub last_detection: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCount {
    pub platform: Platform,
    pub count: u32,
}
