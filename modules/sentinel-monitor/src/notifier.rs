use chrono::Utc;
use uuid::Uuid;

use sentinel_common::{Alert, EmailLogEntry};

/// Render the notification for an alert. Pure: the caller appends the
/// entry to the log and flips the alert's sent flag.
pub fn compose_email(alert: &Alert, recipient: &str) -> EmailLogEntry {
    let subject = format!("Keyword Alert – “{}”", alert.keyword_detected);

    let body = format!(
        "Keyword detected: {keyword}\n\
         \n\
         Platform: {platform}\n\
         Username: {username}\n\
         Timestamp: {timestamp}\n\
         \n\
         Post:\n\
         {content}\n\
         \n\
         Link to post:\n\
         {url}\n\
         \n\
         Metadata:\n\
         - Likes: {likes}\n\
         - Comments: {comments}\n\
         - Shares: {shares}",
        keyword = alert.keyword_detected,
        platform = alert.platform,
        username = alert.username,
        timestamp = alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        content = alert.content,
        url = alert.url,
        likes = alert.engagement.likes,
        comments = alert.engagement.comments,
        shares = alert.engagement.shares,
    );

    EmailLogEntry {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        recipient: recipient.to_string(),
        subject,
        body,
        trigger_alert_id: alert.id,
    }
}
