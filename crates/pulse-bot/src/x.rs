//! X (Twitter) API v2 Client
//!
//! `SocialPlatform` over the v2 REST API with an OAuth 2.0 user-context
//! bearer token. HTTP 429 maps to `RateLimited`; everything else that fails
//! maps to `Transport`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use pulse_engine::{Account, EngineError, IncomingMessage, ItemId, PostHandle, Result, SocialPlatform};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// X client configuration
#[derive(Clone, Debug)]
pub struct XConfig {
    /// OAuth 2.0 user-context access token (`X_BEARER_TOKEN`)
    pub bearer_token: String,

    /// API base, overridable for tests
    pub base_url: String,

    pub timeout_secs: u64,
}

impl XConfig {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            base_url: "https://api.x.com".into(),
            timeout_secs: 15,
        }
    }

    /// `None` when no token is configured; the bot then runs dry.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("X_BEARER_TOKEN").ok().filter(|t| !t.trim().is_empty())?;
        let mut config = Self::new(token);
        if let Ok(base) = std::env::var("X_API_BASE") {
            config.base_url = base;
        }
        if let Some(secs) = std::env::var("X_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            config.timeout_secs = secs;
        }
        Some(config)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    data: Vec<WirePost>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Deserialize, Default)]
struct Includes {
    #[serde(default)]
    users: Vec<WireUser>,
}

#[derive(Deserialize)]
struct WireUser {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct WirePost {
    id: String,
    text: String,
    #[serde(default)]
    author_id: String,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
}

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyTo<'a>>,
}

#[derive(Serialize)]
struct ReplyTo<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Serialize)]
struct TweetRef<'a> {
    tweet_id: &'a str,
}

/// Attach author handles from `includes.users`
fn into_messages(list: ListEnvelope) -> Vec<IncomingMessage> {
    let handles: HashMap<String, String> = list.includes.users.into_iter().map(|u| (u.id, u.username)).collect();
    list.data
        .into_iter()
        .map(|post| {
            let handle = handles.get(&post.author_id).cloned().unwrap_or_default();
            IncomingMessage::new(post.id, handle, post.author_id, post.text)
        })
        .collect()
}

// ============================================================================
// Client
// ============================================================================

pub struct XClient {
    http: reqwest::Client,
    config: XConfig,
    me: OnceCell<Account>,
}

impl XClient {
    pub fn from_config(config: XConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            me: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/2/{path}", self.config.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, op: &str) -> Result<T> {
        let response = request
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("{op}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => EngineError::RateLimited(format!("x {op}")),
                s => EngineError::Transport(format!("{op}: {s}: {detail}")),
            });
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::Transport(format!("{op}: malformed response: {e}")))
    }

    async fn user_id(&self) -> Result<ItemId> {
        Ok(self.me().await?.id)
    }

    async fn create_post(&self, body: &str, parent: Option<&PostHandle>) -> Result<PostHandle> {
        let payload = CreatePost {
            text: body,
            reply: parent.map(|p| ReplyTo {
                in_reply_to_tweet_id: p.as_str(),
            }),
        };
        let created: Envelope<CreatedPost> = self.send(self.http.post(self.url("tweets")).json(&payload), "post").await?;
        Ok(PostHandle::new(created.data.id))
    }
}

#[async_trait]
impl SocialPlatform for XClient {
    async fn me(&self) -> Result<Account> {
        let account = self
            .me
            .get_or_try_init(|| async {
                let user: Envelope<WireUser> = self.send(self.http.get(self.url("users/me")), "me").await?;
                Ok::<_, EngineError>(Account {
                    id: ItemId::new(user.data.id),
                    handle: user.data.username,
                })
            })
            .await?;
        Ok(account.clone())
    }

    async fn post_text(&self, body: &str) -> Result<PostHandle> {
        self.create_post(body, None).await
    }

    async fn post_reply(&self, body: &str, parent: &PostHandle) -> Result<PostHandle> {
        self.create_post(body, Some(parent)).await
    }

    async fn repost(&self, id: &ItemId) -> Result<()> {
        let me = self.user_id().await?;
        let request = self
            .http
            .post(self.url(&format!("users/{me}/retweets")))
            .json(&TweetRef { tweet_id: id.as_str() });
        self.send::<serde_json::Value>(request, "repost").await.map(drop)
    }

    async fn like(&self, id: &ItemId) -> Result<()> {
        let me = self.user_id().await?;
        let request = self
            .http
            .post(self.url(&format!("users/{me}/likes")))
            .json(&TweetRef { tweet_id: id.as_str() });
        self.send::<serde_json::Value>(request, "like").await.map(drop)
    }

    async fn fetch_mentions(&self, limit: usize) -> Result<Vec<IncomingMessage>> {
        let me = self.user_id().await?;
        let max_results = limit.clamp(5, 100).to_string();
        let request = self.http.get(self.url(&format!("users/{me}/mentions"))).query(&[
            ("max_results", max_results.as_str()),
            ("expansions", "author_id"),
            ("user.fields", "username"),
        ]);
        let list: ListEnvelope = self.send(request, "mentions").await?;
        Ok(into_messages(list))
    }

    async fn search_recent(&self, query: &str, limit: usize) -> Result<Vec<IncomingMessage>> {
        let max_results = limit.clamp(10, 100).to_string();
        let request = self.http.get(self.url("tweets/search/recent")).query(&[
            ("query", query),
            ("max_results", max_results.as_str()),
            ("expansions", "author_id"),
            ("user.fields", "username"),
        ]);
        let list: ListEnvelope = self.send(request, "search").await?;
        Ok(into_messages(list))
    }

    fn name(&self) -> &str {
        "x"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> XClient {
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "1000", "name": "Pulse", "username": "pulse_bot"}
            })))
            .mount(server)
            .await;

        let mut config = XConfig::new("test-token");
        config.base_url = server.uri();
        XClient::from_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_me_is_cached() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        let first = client.me().await.unwrap();
        let second = client.me().await.unwrap();
        assert_eq!(first.handle, "pulse_bot");
        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_post_reply_payload() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(json!({"text": "gm", "reply": {"in_reply_to_tweet_id": "55"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": "56", "text": "gm"}})))
            .mount(&server)
            .await;

        let handle = client.post_reply("gm", &ItemId::from("55")).await.unwrap();
        assert_eq!(handle.as_str(), "56");
    }

    #[tokio::test]
    async fn test_mentions_resolve_handles() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        Mock::given(method("GET"))
            .and(path("/2/users/1000/mentions"))
            .and(query_param("max_results", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "9", "text": "@pulse_bot btc?", "author_id": "7"},
                    {"id": "8", "text": "@pulse_bot gm", "author_id": "6"}
                ],
                "includes": {"users": [{"id": "7", "name": "Whale", "username": "whale"}]}
            })))
            .mount(&server)
            .await;

        let mentions = client.fetch_mentions(20).await.unwrap();
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].author_handle, "whale");
        assert_eq!(mentions[1].display_handle(), "trader");
    }

    #[tokio::test]
    async fn test_no_results_is_empty() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .and(query_param("max_results", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})))
            .mount(&server)
            .await;

        assert!(client.search_recent("#bitcoin", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        let client = client(&server).await;
        Mock::given(method("POST"))
            .and(path("/2/users/1000/retweets"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/2/users/1000/likes"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client.repost(&ItemId::from("1")).await.unwrap_err();
        assert!(err.aborts_batch());
        let err = client.like(&ItemId::from("1")).await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
    }
}
