use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use ai_client::{util::strip_code_blocks, Gemini};
use sentinel_common::{Alert, EngagementStats, Platform};

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// A single way of acquiring posts. Strategies are tried in strict order;
/// the first one that yields a non-empty list wins.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Attempt to acquire posts for the keyword list. An empty list means
    /// "no result" and is not an error.
    async fn attempt(&self, keywords: &[String]) -> Result<Vec<Alert>>;
}

// --- Grounded retrieval ---

/// Ask the model, with live search attached, for real posts matching the
/// keywords. The response is prose containing a JSON array; URLs are
/// trusted as direct post links.
pub struct GroundedRetrieval {
    gemini: Gemini,
}

impl GroundedRetrieval {
    pub fn new(gemini: Gemini) -> Self {
        Self { gemini }
    }
}

fn grounded_prompt(keywords: &[String]) -> String {
    format!(
        "Find 2 to 3 recent, public social media posts containing one of these keywords: {}.\n\n\
         Prioritize platforms: Twitter, Reddit, TikTok, Instagram, Facebook.\n\n\
         For each post found, extract:\n\
         - The specific Platform name\n\
         - The Username of the poster\n\
         - The content/text of the post\n\
         - The specific keyword matched\n\
         - The DIRECT URL to the post (must be a specific post link, not a search page)\n\
         - Estimate likes, comments, shares based on context or typical engagement.\n\n\
         Return the data as a strictly valid JSON array of objects with keys:\n\
         platform, username, content, keywordDetected, url, likes, comments, shares.\n\n\
         Do not include markdown formatting. Just the JSON array.",
        keywords.join(", ")
    )
}

/// Build an alert from one loosely-typed object in the grounded response.
/// Every missing or wrong-typed field gets a default instead of failing
/// the whole batch.
fn normalize_grounded(item: &serde_json::Value, keywords: &[String]) -> Alert {
    let platform = Platform::from_str_loose(item["platform"].as_str().unwrap_or(""));
    let username = item["username"].as_str().unwrap_or("unknown_user");
    let content = item["content"].as_str().unwrap_or("Content not available");
    let keyword = item["keywordDetected"]
        .as_str()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| keywords.first().map(String::as_str).unwrap_or("unknown"));
    let url = item["url"].as_str().unwrap_or_default();

    Alert::new(
        platform,
        username,
        content,
        keyword,
        url,
        EngagementStats {
            likes: item["likes"].as_u64().unwrap_or(0) as u32,
            comments: item["comments"].as_u64().unwrap_or(0) as u32,
            shares: item["shares"].as_u64().unwrap_or(0) as u32,
        },
    )
}

#[async_trait]
impl AcquisitionStrategy for GroundedRetrieval {
    fn name(&self) -> &str {
        "grounded_retrieval"
    }

    async fn attempt(&self, keywords: &[String]) -> Result<Vec<Alert>> {
        let text = self.gemini.generate_grounded(grounded_prompt(keywords)).await?;

        let parsed: serde_json::Value = serde_json::from_str(strip_code_blocks(&text))?;
        let items = parsed
            .as_array()
            .ok_or_else(|| anyhow!("grounded response is not a JSON array"))?;

        Ok(items
            .iter()
            .map(|item| normalize_grounded(item, keywords))
            .collect())
    }
}

// --- Constrained synthesis ---

/// What the model returns for each synthetic post. The response schema is
/// derived from this type, so parsing is strict.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SyntheticPost {
    pub platform: Platform,
    pub username: String,
    pub content: String,
    #[serde(rename = "keywordDetected")]
    pub keyword_detected: String,
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
}

/// Ask the model for schema-validated synthetic posts. A fabricated direct
/// post URL would be dead, so each record gets the platform search URL for
/// its detected keyword instead of anything the model produced.
pub struct ConstrainedSynthesis {
    gemini: Gemini,
}

impl ConstrainedSynthesis {
    pub fn new(gemini: Gemini) -> Self {
        Self { gemini }
    }
}

fn synthesis_prompt(keywords: &[String]) -> String {
    format!(
        "Generate 2 realistic, synthetic social media posts containing one of: {}.\n\
         The posts should look like they come from Twitter, Reddit, or TikTok.\n\
         Return JSON matching the schema.",
        keywords.join(", ")
    )
}

#[async_trait]
impl AcquisitionStrategy for ConstrainedSynthesis {
    fn name(&self) -> &str {
        "constrained_synthesis"
    }

    async fn attempt(&self, keywords: &[String]) -> Result<Vec<Alert>> {
        let posts: Vec<SyntheticPost> = self
            .gemini
            .generate_structured(synthesis_prompt(keywords))
            .await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let url = post.platform.search_url(&post.keyword_detected);
                Alert::new(
                    post.platform,
                    post.username,
                    post.content,
                    post.keyword_detected,
                    url,
                    EngagementStats {
                        likes: post.likes,
                        comments: post.comments,
                        shares: post.shares,
                    },
                )
            })
            .collect())
    }
}

// --- Local fallback ---

const FALLBACK_PLATFORMS: [Platform; 3] =
    [Platform::Twitter, Platform::Reddit, Platform::Instagram];

/// Locally generated mock post. No network; cannot fail.
pub struct LocalFallback;

impl LocalFallback {
    pub fn generate(keywords: &[String]) -> Alert {
        let mut rng = rand::rng();

        let keyword = if keywords.is_empty() {
            "unknown".to_string()
        } else {
            keywords[rng.random_range(0..keywords.len())].clone()
        };
        let platform = FALLBACK_PLATFORMS[rng.random_range(0..FALLBACK_PLATFORMS.len())];

        Alert::new(
            platform,
            format!("user_{}", rng.random_range(0..10_000)),
            format!("I've been feeling really {keyword} lately. #vent"),
            keyword.clone(),
            platform.search_url(&keyword),
            EngagementStats {
                likes: rng.random_range(0..500),
                comments: rng.random_range(0..50),
                shares: rng.random_range(0..20),
            },
        )
    }
}

#[async_trait]
impl AcquisitionStrategy for LocalFallback {
    fn name(&self) -> &str {
        "local_fallback"
    }

    async fn attempt(&self, keywords: &[String]) -> Result<Vec<Alert>> {
        Ok(vec![Self::generate(keywords)])
    }
}

// --- Pipeline ---

/// Ordered strategy chain. Remote failures are caught and logged, never
/// propagated; the chain always ends in the infallible local fallback, so
/// acquisition as a whole cannot fail.
pub struct AcquisitionPipeline {
    strategies: Vec<Box<dyn AcquisitionStrategy>>,
}

impl AcquisitionPipeline {
    /// Standard chain. Without a credential the remote tiers are not
    /// constructed at all, so acquisition performs zero network calls.
    pub fn new(gemini: Option<Gemini>) -> Self {
        let strategies: Vec<Box<dyn AcquisitionStrategy>> = match gemini {
            Some(gemini) => vec![
                Box::new(GroundedRetrieval::new(gemini.clone())),
                Box::new(ConstrainedSynthesis::new(gemini)),
                Box::new(LocalFallback),
            ],
            None => {
                warn!("No Gemini credential configured, using local fallback data only");
                vec![Box::new(LocalFallback)]
            }
        };
        Self { strategies }
    }

    pub fn from_strategies(strategies: Vec<Box<dyn AcquisitionStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn acquire(&self, keywords: &[String]) -> Vec<Alert> {
        for strategy in &self.strategies {
            match strategy.attempt(keywords).await {
                Ok(alerts) if !alerts.is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        count = alerts.len(),
                        "Posts acquired"
                    );
                    return alerts;
                }
                Ok(_) => {
                    warn!(strategy = strategy.name(), "No posts found, trying next tier");
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Acquisition tier failed, trying next"
                    );
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn keywords() -> Vec<String> {
        vec!["depressed".to_string(), "fat".to_string()]
    }

    struct FixedStrategy {
        name: &'static str,
        result: fn(&[String]) -> Result<Vec<Alert>>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl AcquisitionStrategy for FixedStrategy {
        fn name(&self) -> &str {
            self.name
        }

        async fn attempt(&self, keywords: &[String]) -> Result<Vec<Alert>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)(keywords)
        }
    }

    fn strategy(
        name: &'static str,
        result: fn(&[String]) -> Result<Vec<Alert>>,
    ) -> (Box<dyn AcquisitionStrategy>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Box::new(FixedStrategy {
                name,
                result,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn one_alert(keywords: &[String]) -> Result<Vec<Alert>> {
        Ok(vec![LocalFallback::generate(keywords)])
    }

    fn empty(_: &[String]) -> Result<Vec<Alert>> {
        Ok(Vec::new())
    }

    fn fails(_: &[String]) -> Result<Vec<Alert>> {
        Err(anyhow!("network down"))
    }

    #[tokio::test]
    async fn first_non_empty_tier_wins() {
        let (first, first_calls) = strategy("first", one_alert);
        let (second, second_calls) = strategy("second", one_alert);
        let pipeline = AcquisitionPipeline::from_strategies(vec![first, second]);

        let alerts = pipeline.acquire(&keywords()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_result_falls_through_like_an_error() {
        let (first, _) = strategy("first", empty);
        let (second, second_calls) = strategy("second", one_alert);
        let pipeline = AcquisitionPipeline::from_strategies(vec![first, second]);

        let alerts = pipeline.acquire(&keywords()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_cascade_to_the_local_fallback() {
        let (first, _) = strategy("first", fails);
        let (second, second_calls) = strategy("second", fails);
        let pipeline = AcquisitionPipeline::from_strategies(vec![
            first,
            second,
            Box::new(LocalFallback),
        ]);

        let alerts = pipeline.acquire(&keywords()).await;
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(alerts.len(), 1);
        // Fallback posts always link to a search page, never a direct post.
        assert!(alerts[0].url.contains("search") || alerts[0].url.contains("/explore/tags/"));
    }

    #[tokio::test]
    async fn without_credential_only_the_fallback_exists() {
        let pipeline = AcquisitionPipeline::new(None);
        assert_eq!(pipeline.strategies.len(), 1);
        assert_eq!(pipeline.strategies[0].name(), "local_fallback");

        let alerts = pipeline.acquire(&keywords()).await;
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn with_credential_all_three_tiers_in_order() {
        let gemini = Gemini::new("test-key", GEMINI_MODEL);
        let pipeline = AcquisitionPipeline::new(Some(gemini));
        let names: Vec<&str> = pipeline.strategies.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["grounded_retrieval", "constrained_synthesis", "local_fallback"]
        );
    }

    #[test]
    fn fallback_embeds_the_keyword() {
        let alert = LocalFallback::generate(&keywords());
        assert!(FALLBACK_PLATFORMS.contains(&alert.platform));
        assert!(alert.content.contains(&alert.keyword_detected));
        assert!(keywords().contains(&alert.keyword_detected));
        assert_eq!(alert.url, alert.platform.search_url(&alert.keyword_detected));
        assert!(!alert.email_sent);
        assert!(alert.engagement.likes < 500);
        assert!(alert.engagement.comments < 50);
        assert!(alert.engagement.shares < 20);
    }

    #[test]
    fn fallback_with_no_keywords_uses_placeholder() {
        let alert = LocalFallback::generate(&[]);
        assert_eq!(alert.keyword_detected, "unknown");
    }

    #[test]
    fn grounded_normalization_defaults_missing_fields() {
        let item = serde_json::json!({
            "platform": "posted on reddit",
            "likes": "not-a-number"
        });
        let alert = normalize_grounded(&item, &keywords());
        assert_eq!(alert.platform, Platform::Reddit);
        assert_eq!(alert.username, "unknown_user");
        assert_eq!(alert.content, "Content not available");
        assert_eq!(alert.keyword_detected, "depressed");
        assert_eq!(alert.engagement.likes, 0);
    }

    #[test]
    fn grounded_normalization_keeps_direct_urls() {
        let item = serde_json::json!({
            "platform": "Twitter",
            "username": "someone",
            "content": "feeling fat today",
            "keywordDetected": "fat",
            "url": "https://x.com/someone/status/12345",
            "likes": 10,
            "comments": 2,
            "shares": 1
        });
        let alert = normalize_grounded(&item, &keywords());
        assert_eq!(alert.url, "https://x.com/someone/status/12345");
        assert_eq!(alert.engagement.likes, 10);
    }

    #[test]
    fn grounded_prompt_lists_all_keywords() {
        let prompt = grounded_prompt(&keywords());
        assert!(prompt.contains("depressed, fat"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn synthetic_post_schema_enumerates_platforms() {
        use ai_client::GeminiOutput;
        let schema = Vec::<SyntheticPost>::gemini_schema();
        assert_eq!(schema["type"], "ARRAY");
        let platform = &schema["items"]["properties"]["platform"];
        let variants = platform["enum"].as_array().unwrap();
        assert_eq!(variants.len(), 5);
        assert!(variants.contains(&serde_json::json!("TikTok")));
    }
}
