//! Typed helpers over [`Passthrough`], one per Reddit operation.
//!
//! Each helper builds exactly one [`UpstreamRequest`]; the only local logic is
//! id prefix normalisation and optional-field handling.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::passthrough::{Passthrough, UpstreamRequest};

/// Default listing size.
pub const DEFAULT_LIMIT: u32 = 25;

/// Largest listing size Reddit serves.
pub const MAX_LIMIT: u32 = 100;

/// Reddit "thing" prefix for links (posts).
const LINK_PREFIX: &str = "t3_";

/// Reddit "thing" prefix for comments.
const COMMENT_PREFIX: &str = "t1_";

/// Vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
    Clear,
}

impl VoteDirection {
    /// Parse Reddit's numeric direction (`1`, `-1`, `0`).
    pub fn from_i8(dir: i8) -> Option<Self> {
        match dir {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            0 => Some(Self::Clear),
            _ => None,
        }
    }

    fn as_param(self) -> &'static str {
        match self {
            Self::Up => "1",
            Self::Down => "-1",
            Self::Clear => "0",
        }
    }
}

/// Submission kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Text ("self") post with optional body.
    SelfPost { text: Option<String> },
    /// Link post with optional URL.
    Link { url: Option<String> },
    /// Any other kind Reddit accepts (image, video, ...), forwarded as-is.
    Other { kind: String },
}

/// Flair selection parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlairSelection {
    pub link_id: Option<String>,
    pub flair_template_id: Option<String>,
    pub text: Option<String>,
}

/// Reddit API surface.
#[derive(Debug, Clone)]
pub struct RedditApi {
    passthrough: Passthrough,
}

impl RedditApi {
    pub fn new(passthrough: Passthrough) -> Self {
        Self { passthrough }
    }

    pub fn passthrough(&self) -> &Passthrough {
        &self.passthrough
    }

    async fn get(&self, path: impl Into<String>) -> Result<Value> {
        self.passthrough.call(UpstreamRequest::get(path)).await
    }

    async fn listing(&self, path: impl Into<String>, limit: u32) -> Result<Value> {
        self.passthrough
            .call(UpstreamRequest::get(path).with_query("limit", limit))
            .await
    }

    async fn post<'a>(
        &self,
        path: &str,
        fields: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Result<Value> {
        self.passthrough
            .call(UpstreamRequest::post_form(path, fields))
            .await
    }

    // ── Identity ───────────────────────────────────────────────────────────

    pub async fn me(&self) -> Result<Value> {
        self.get("/api/v1/me").await
    }

    pub async fn karma(&self) -> Result<Value> {
        self.get("/api/v1/me/karma").await
    }

    pub async fn trophies(&self) -> Result<Value> {
        self.get("/api/v1/me/trophies").await
    }

    // ── Subreddits ─────────────────────────────────────────────────────────

    pub async fn subscribed_subreddits(&self, limit: u32) -> Result<Value> {
        self.listing("/subreddits/mine/subscriber", limit).await
    }

    pub async fn subreddit_about(&self, subreddit: &str) -> Result<Value> {
        self.get(format!("/r/{}/about", subreddit)).await
    }

    pub async fn subreddit_rules(&self, subreddit: &str) -> Result<Value> {
        self.get(format!("/r/{}/about/rules", subreddit)).await
    }

    pub async fn subreddit_moderators(&self, subreddit: &str) -> Result<Value> {
        self.get(format!("/r/{}/about/moderators", subreddit)).await
    }

    pub async fn subreddit_traffic(&self, subreddit: &str) -> Result<Value> {
        self.get(format!("/r/{}/about/traffic", subreddit)).await
    }

    pub async fn subreddit_flairs(&self, subreddit: &str) -> Result<Value> {
        self.get(format!("/r/{}/api/link_flair", subreddit)).await
    }

    pub async fn wiki_pages(&self, subreddit: &str) -> Result<Value> {
        self.get(format!("/r/{}/wiki/pages", subreddit)).await
    }

    pub async fn wiki_page(&self, subreddit: &str, page: &str) -> Result<Value> {
        self.get(format!("/r/{}/wiki/{}", subreddit, page)).await
    }

    pub async fn subreddits_by_category(&self, category: &str, limit: u32) -> Result<Value> {
        self.listing(format!("/subreddits/{}", category), limit)
            .await
    }

    pub async fn trending_subreddits(&self) -> Result<Value> {
        self.get("/api/trending_subreddits").await
    }

    // ── Posts ──────────────────────────────────────────────────────────────

    /// Front page listing for the authenticated user.
    pub async fn posts(&self, sort: &str, limit: u32) -> Result<Value> {
        self.listing(format!("/{}", sort), limit).await
    }

    pub async fn subreddit_posts(&self, subreddit: &str, sort: &str, limit: u32) -> Result<Value> {
        self.listing(format!("/r/{}/{}", subreddit, sort), limit)
            .await
    }

    pub async fn post_details(&self, post_id: &str) -> Result<Value> {
        self.get(format!("/comments/{}", strip_link_prefix(post_id)))
            .await
    }

    pub async fn post_duplicates(&self, post_id: &str) -> Result<Value> {
        self.get(format!("/duplicates/{}", strip_link_prefix(post_id)))
            .await
    }

    pub async fn by_ids(&self, ids: &[String]) -> Result<Value> {
        self.get(format!("/by_id/{}", fullnames(ids))).await
    }

    // ── Own content ────────────────────────────────────────────────────────

    pub async fn saved(&self, limit: u32) -> Result<Value> {
        self.listing("/user/me/saved", limit).await
    }

    pub async fn hidden(&self, limit: u32) -> Result<Value> {
        self.listing("/user/me/hidden", limit).await
    }

    pub async fn upvoted(&self, limit: u32) -> Result<Value> {
        self.listing("/user/me/upvoted", limit).await
    }

    pub async fn downvoted(&self, limit: u32) -> Result<Value> {
        self.listing("/user/me/downvoted", limit).await
    }

    // ── Users ──────────────────────────────────────────────────────────────

    pub async fn user_about(&self, username: &str) -> Result<Value> {
        self.get(format!("/user/{}/about", username)).await
    }

    pub async fn user_posts(&self, username: &str, limit: u32) -> Result<Value> {
        self.listing(format!("/user/{}/submitted", username), limit)
            .await
    }

    pub async fn user_comments(&self, username: &str, limit: u32) -> Result<Value> {
        self.listing(format!("/user/{}/comments", username), limit)
            .await
    }

    // ── Search ─────────────────────────────────────────────────────────────

    pub async fn search(
        &self,
        query: &str,
        subreddit: Option<&str>,
        sort: &str,
        limit: u32,
    ) -> Result<Value> {
        let path = match subreddit {
            Some(sr) => format!("/r/{}/search", sr),
            None => "/search".to_string(),
        };
        let request = UpstreamRequest::get(path)
            .with_query("q", query)
            .with_query("sort", sort)
            .with_query("limit", limit);
        self.passthrough.call(request).await
    }

    // ── Multireddits ───────────────────────────────────────────────────────

    pub async fn user_multireddits(&self, username: &str) -> Result<Value> {
        self.get(format!("/api/multi/user/{}", username)).await
    }

    pub async fn multireddit(&self, username: &str, name: &str) -> Result<Value> {
        self.get(format!("/user/{}/m/{}", username, name)).await
    }

    // ── Voting, saving, hiding ─────────────────────────────────────────────

    pub async fn vote(&self, id: &str, direction: VoteDirection) -> Result<Value> {
        self.post(
            "/api/vote",
            [("id", id.to_string()), ("dir", direction.as_param().to_string())],
        )
        .await
    }

    pub async fn save(&self, id: &str, category: Option<&str>) -> Result<Value> {
        let mut fields = vec![("id", id.to_string())];
        if let Some(category) = category {
            fields.push(("category", category.to_string()));
        }
        self.post("/api/save", fields).await
    }

    pub async fn unsave(&self, id: &str) -> Result<Value> {
        self.post("/api/unsave", [("id", id.to_string())]).await
    }

    pub async fn hide(&self, id: &str) -> Result<Value> {
        self.post("/api/hide", [("id", id.to_string())]).await
    }

    pub async fn unhide(&self, id: &str) -> Result<Value> {
        self.post("/api/unhide", [("id", id.to_string())]).await
    }

    // ── Comments & submissions ─────────────────────────────────────────────

    pub async fn add_comment(&self, parent_id: &str, text: &str) -> Result<Value> {
        self.post(
            "/api/comment",
            [
                ("parent", parent_id.to_string()),
                ("text", text.to_string()),
            ],
        )
        .await
    }

    pub async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<Value> {
        self.post(
            "/api/editusertext",
            [
                ("thing_id", comment_id.to_string()),
                ("text", text.to_string()),
            ],
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<Value> {
        self.post("/api/del", [("id", comment_id.to_string())]).await
    }

    pub async fn submit(&self, subreddit: &str, title: &str, submission: Submission) -> Result<Value> {
        let mut fields = vec![
            ("sr", subreddit.to_string()),
            ("title", title.to_string()),
        ];
        match submission {
            Submission::SelfPost { text } => {
                fields.push(("kind", "self".to_string()));
                if let Some(text) = text {
                    fields.push(("text", text));
                }
            }
            Submission::Link { url } => {
                fields.push(("kind", "link".to_string()));
                if let Some(url) = url {
                    fields.push(("url", url));
                }
            }
            Submission::Other { kind } => fields.push(("kind", kind)),
        }
        self.post("/api/submit", fields).await
    }

    pub async fn subscribe(&self, subreddit_id: &str, action: &str) -> Result<Value> {
        self.post(
            "/api/subscribe",
            [("sr", subreddit_id.to_string()), ("action", action.to_string())],
        )
        .await
    }

    pub async fn select_flair(&self, subreddit: &str, flair: FlairSelection) -> Result<Value> {
        let mut fields = vec![("r", subreddit.to_string())];
        if let Some(link) = flair.link_id {
            fields.push(("link", link));
        }
        if let Some(template) = flair.flair_template_id {
            fields.push(("flair_template_id", template));
        }
        if let Some(text) = flair.text {
            fields.push(("text", text));
        }
        self.post("/api/selectflair", fields).await
    }

    // ── Messages ───────────────────────────────────────────────────────────

    pub async fn messages(&self, folder: &str, limit: u32) -> Result<Value> {
        self.listing(format!("/message/{}", folder), limit).await
    }

    pub async fn send_message(&self, to: &str, subject: &str, text: &str) -> Result<Value> {
        self.post(
            "/api/compose",
            [
                ("to", to.to_string()),
                ("subject", subject.to_string()),
                ("text", text.to_string()),
            ],
        )
        .await
    }

    pub async fn mark_messages_read(&self, ids: &[String]) -> Result<Value> {
        self.post("/api/read_message", [("id", ids.join(","))]).await
    }

    pub async fn mark_messages_unread(&self, ids: &[String]) -> Result<Value> {
        self.post("/api/unread_message", [("id", ids.join(","))])
            .await
    }

    // ── Moderation-ish ─────────────────────────────────────────────────────

    pub async fn report(&self, id: &str, reason: &str) -> Result<Value> {
        self.post(
            "/api/report",
            [
                ("thing_id", id.to_string()),
                ("reason", reason.to_string()),
            ],
        )
        .await
    }

    pub async fn block_user(&self, account_id: &str) -> Result<Value> {
        self.post("/api/block_user", [("account_id", account_id.to_string())])
            .await
    }

    // ── Friends ────────────────────────────────────────────────────────────

    pub async fn friends(&self) -> Result<Value> {
        self.get("/api/v1/me/friends").await
    }

    pub async fn add_friend(&self, username: &str, note: Option<&str>) -> Result<Value> {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(username.to_string()));
        if let Some(note) = note {
            body.insert("note".to_string(), Value::String(note.to_string()));
        }
        self.passthrough
            .call(UpstreamRequest::put_json(
                format!("/api/v1/me/friends/{}", username),
                Value::Object(body),
            ))
            .await
    }

    pub async fn remove_friend(&self, username: &str) -> Result<Value> {
        self.passthrough
            .call(UpstreamRequest::delete(format!(
                "/api/v1/me/friends/{}",
                username
            )))
            .await
    }

    // ── Preferences ────────────────────────────────────────────────────────

    pub async fn preferences(&self) -> Result<Value> {
        self.get("/api/v1/me/prefs").await
    }

    pub async fn update_preferences(&self, preferences: Value) -> Result<Value> {
        self.passthrough
            .call(UpstreamRequest::patch_json("/api/v1/me/prefs", preferences))
            .await
    }
}

/// Drop a leading `t3_` so the id can be used in a path.
pub fn strip_link_prefix(id: &str) -> &str {
    id.strip_prefix(LINK_PREFIX).unwrap_or(id)
}

/// Comma-join ids as fullnames, treating bare ids as posts.
pub fn fullnames(ids: &[String]) -> String {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| {
            if id.starts_with(LINK_PREFIX) || id.starts_with(COMMENT_PREFIX) {
                id.to_string()
            } else {
                format!("{}{}", LINK_PREFIX, id)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
