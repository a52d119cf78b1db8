//! Reddit passthrough endpoints.
//!
//! Handlers validate their input, then make exactly one call through
//! [`snoolink_oauth::RedditApi`]. Validation failures are answered before any
//! token lookup.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use snoolink_oauth::reddit::{DEFAULT_LIMIT, MAX_LIMIT};
use snoolink_oauth::{FlairSelection, Submission, VoteDirection};

use crate::error::{Result, ServerError};
use crate::state::AppState;

type ApiResult = Result<Json<Value>>;

// ─────────────────────────────────────────────────────────────────────────────
// Request types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    /// The requested listing size, 25 when absent.
    pub fn resolve(&self) -> Result<u32> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(n) if (1..=i64::from(MAX_LIMIT)).contains(&n) => Ok(n as u32),
            Some(n) => Err(ServerError::BadRequest(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, n
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub subreddit: Option<String>,
    #[serde(default = "default_search_sort")]
    pub sort: String,
    pub limit: Option<i64>,
}

fn default_search_sort() -> String {
    "relevance".to_string()
}

#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    pub ids: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub id: String,
    pub direction: i8,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub id: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub parent_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub comment_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPostRequest {
    pub subreddit: String,
    pub title: String,
    pub kind: String,
    pub text: Option<String>,
    pub url: Option<String>,
}

impl SubmitPostRequest {
    fn submission(&self) -> Submission {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        match self.kind.as_str() {
            "self" => Submission::SelfPost {
                text: non_empty(&self.text),
            },
            "link" => Submission::Link {
                url: non_empty(&self.url),
            },
            other => Submission::Other {
                kind: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub subreddit_id: String,
    #[serde(default = "default_subscribe_action")]
    pub action: String,
}

fn default_subscribe_action() -> String {
    "sub".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FlairRequest {
    pub subreddit: String,
    pub link_id: Option<String>,
    pub flair_template_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct BlockUserRequest {
    pub account_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FriendNoteRequest {
    pub note: Option<String>,
}

/// Reject values that would escape their path segment upstream.
fn segment(value: &str) -> Result<&str> {
    if value.is_empty() || value.contains(['/', '?', '#']) || value == ".." {
        return Err(ServerError::BadRequest(format!(
            "invalid path segment '{}'",
            value
        )));
    }
    Ok(value)
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

pub async fn me_handler(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.reddit.me().await?))
}

pub async fn karma_handler(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.reddit.karma().await?))
}

pub async fn trophies_handler(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.reddit.trophies().await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Subreddits
// ─────────────────────────────────────────────────────────────────────────────

pub async fn subscribed_handler(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    Ok(Json(state.reddit.subscribed_subreddits(limit).await?))
}

pub async fn subreddit_about_handler(
    State(state): State<AppState>,
    Path(subreddit): Path<String>,
) -> ApiResult {
    let sr = segment(&subreddit)?;
    Ok(Json(state.reddit.subreddit_about(sr).await?))
}

pub async fn subreddit_rules_handler(
    State(state): State<AppState>,
    Path(subreddit): Path<String>,
) -> ApiResult {
    let sr = segment(&subreddit)?;
    Ok(Json(state.reddit.subreddit_rules(sr).await?))
}

pub async fn subreddit_moderators_handler(
    State(state): State<AppState>,
    Path(subreddit): Path<String>,
) -> ApiResult {
    let sr = segment(&subreddit)?;
    Ok(Json(state.reddit.subreddit_moderators(sr).await?))
}

pub async fn subreddit_posts_handler(
    State(state): State<AppState>,
    Path((subreddit, sort)): Path<(String, String)>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    let (sr, sort) = (segment(&subreddit)?, segment(&sort)?);
    Ok(Json(state.reddit.subreddit_posts(sr, sort, limit).await?))
}

pub async fn wiki_pages_handler(
    State(state): State<AppState>,
    Path(subreddit): Path<String>,
) -> ApiResult {
    let sr = segment(&subreddit)?;
    Ok(Json(state.reddit.wiki_pages(sr).await?))
}

pub async fn wiki_page_handler(
    State(state): State<AppState>,
    Path((subreddit, page)): Path<(String, String)>,
) -> ApiResult {
    let (sr, page) = (segment(&subreddit)?, segment(&page)?);
    Ok(Json(state.reddit.wiki_page(sr, page).await?))
}

pub async fn traffic_handler(
    State(state): State<AppState>,
    Path(subreddit): Path<String>,
) -> ApiResult {
    let sr = segment(&subreddit)?;
    Ok(Json(state.reddit.subreddit_traffic(sr).await?))
}

pub async fn flairs_handler(
    State(state): State<AppState>,
    Path(subreddit): Path<String>,
) -> ApiResult {
    let sr = segment(&subreddit)?;
    Ok(Json(state.reddit.subreddit_flairs(sr).await?))
}

pub async fn subreddits_by_category_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    let category = segment(&category)?;
    Ok(Json(
        state.reddit.subreddits_by_category(category, limit).await?,
    ))
}

pub async fn trending_handler(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.reddit.trending_subreddits().await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Posts
// ─────────────────────────────────────────────────────────────────────────────

pub async fn posts_handler(
    State(state): State<AppState>,
    Path(sort): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    let sort = segment(&sort)?;
    Ok(Json(state.reddit.posts(sort, limit).await?))
}

pub async fn post_details_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult {
    let id = segment(&post_id)?;
    Ok(Json(state.reddit.post_details(id).await?))
}

pub async fn post_duplicates_handler(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult {
    let id = segment(&post_id)?;
    Ok(Json(state.reddit.post_duplicates(id).await?))
}

pub async fn by_ids_handler(
    State(state): State<AppState>,
    Query(q): Query<IdsQuery>,
) -> ApiResult {
    let ids: Vec<String> = q
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(ServerError::BadRequest("ids must not be empty".to_string()));
    }
    for id in &ids {
        segment(id)?;
    }
    Ok(Json(state.reddit.by_ids(&ids).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Own content
// ─────────────────────────────────────────────────────────────────────────────

pub async fn saved_handler(State(state): State<AppState>, Query(q): Query<LimitQuery>) -> ApiResult {
    let limit = q.resolve()?;
    Ok(Json(state.reddit.saved(limit).await?))
}

pub async fn hidden_handler(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    Ok(Json(state.reddit.hidden(limit).await?))
}

pub async fn upvoted_handler(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    Ok(Json(state.reddit.upvoted(limit).await?))
}

pub async fn downvoted_handler(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    Ok(Json(state.reddit.downvoted(limit).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

pub async fn user_about_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult {
    let user = segment(&username)?;
    Ok(Json(state.reddit.user_about(user).await?))
}

pub async fn user_posts_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    let user = segment(&username)?;
    Ok(Json(state.reddit.user_posts(user, limit).await?))
}

pub async fn user_comments_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    let user = segment(&username)?;
    Ok(Json(state.reddit.user_comments(user, limit).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Search and multireddits
// ─────────────────────────────────────────────────────────────────────────────

pub async fn search_handler(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult {
    let limit = LimitQuery { limit: q.limit }.resolve()?;
    let subreddit = match q.subreddit.as_deref().filter(|s| !s.is_empty()) {
        Some(sr) => Some(segment(sr)?),
        None => None,
    };
    Ok(Json(
        state
            .reddit
            .search(&q.query, subreddit, &q.sort, limit)
            .await?,
    ))
}

pub async fn multireddits_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult {
    let user = segment(&username)?;
    Ok(Json(state.reddit.user_multireddits(user).await?))
}

pub async fn multireddit_handler(
    State(state): State<AppState>,
    Path((username, name)): Path<(String, String)>,
) -> ApiResult {
    let (user, name) = (segment(&username)?, segment(&name)?);
    Ok(Json(state.reddit.multireddit(user, name).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutations
// ─────────────────────────────────────────────────────────────────────────────

pub async fn vote_handler(State(state): State<AppState>, Json(req): Json<VoteRequest>) -> ApiResult {
    let direction = VoteDirection::from_i8(req.direction).ok_or_else(|| {
        ServerError::BadRequest(format!(
            "direction must be 1, 0 or -1, got {}",
            req.direction
        ))
    })?;
    Ok(Json(state.reddit.vote(&req.id, direction).await?))
}

pub async fn save_handler(State(state): State<AppState>, Json(req): Json<SaveRequest>) -> ApiResult {
    Ok(Json(
        state
            .reddit
            .save(&req.id, req.category.as_deref())
            .await?,
    ))
}

pub async fn unsave_handler(State(state): State<AppState>, Json(req): Json<IdRequest>) -> ApiResult {
    Ok(Json(state.reddit.unsave(&req.id).await?))
}

pub async fn hide_handler(State(state): State<AppState>, Json(req): Json<IdRequest>) -> ApiResult {
    Ok(Json(state.reddit.hide(&req.id).await?))
}

pub async fn unhide_handler(State(state): State<AppState>, Json(req): Json<IdRequest>) -> ApiResult {
    Ok(Json(state.reddit.unhide(&req.id).await?))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    Json(req): Json<CommentRequest>,
) -> ApiResult {
    Ok(Json(
        state.reddit.add_comment(&req.parent_id, &req.text).await?,
    ))
}

pub async fn edit_comment_handler(
    State(state): State<AppState>,
    Json(req): Json<EditCommentRequest>,
) -> ApiResult {
    Ok(Json(
        state.reddit.edit_comment(&req.comment_id, &req.text).await?,
    ))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> ApiResult {
    Ok(Json(state.reddit.delete_comment(&comment_id).await?))
}

pub async fn submit_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitPostRequest>,
) -> ApiResult {
    let submission = req.submission();
    Ok(Json(
        state
            .reddit
            .submit(&req.subreddit, &req.title, submission)
            .await?,
    ))
}

pub async fn subscribe_handler(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> ApiResult {
    Ok(Json(
        state
            .reddit
            .subscribe(&req.subreddit_id, &req.action)
            .await?,
    ))
}

pub async fn flair_handler(State(state): State<AppState>, Json(req): Json<FlairRequest>) -> ApiResult {
    let selection = FlairSelection {
        link_id: req.link_id,
        flair_template_id: req.flair_template_id,
        text: req.text,
    };
    Ok(Json(
        state.reddit.select_flair(&req.subreddit, selection).await?,
    ))
}

pub async fn send_message_handler(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> ApiResult {
    Ok(Json(
        state
            .reddit
            .send_message(&req.to, &req.subject, &req.text)
            .await?,
    ))
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult {
    Ok(Json(state.reddit.mark_messages_read(&req.ids).await?))
}

pub async fn mark_unread_handler(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> ApiResult {
    Ok(Json(state.reddit.mark_messages_unread(&req.ids).await?))
}

pub async fn report_handler(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> ApiResult {
    Ok(Json(state.reddit.report(&req.id, &req.reason).await?))
}

pub async fn block_handler(
    State(state): State<AppState>,
    Json(req): Json<BlockUserRequest>,
) -> ApiResult {
    Ok(Json(state.reddit.block_user(&req.account_id).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages, friends, preferences
// ─────────────────────────────────────────────────────────────────────────────

pub async fn messages_handler(
    State(state): State<AppState>,
    Path(folder): Path<String>,
    Query(q): Query<LimitQuery>,
) -> ApiResult {
    let limit = q.resolve()?;
    let folder = segment(&folder)?;
    Ok(Json(state.reddit.messages(folder, limit).await?))
}

pub async fn friends_handler(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.reddit.friends().await?))
}

pub async fn add_friend_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<FriendNoteRequest>,
) -> ApiResult {
    let user = segment(&username)?;
    Ok(Json(
        state.reddit.add_friend(user, req.note.as_deref()).await?,
    ))
}

pub async fn remove_friend_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult {
    let user = segment(&username)?;
    Ok(Json(state.reddit.remove_friend(user).await?))
}

pub async fn preferences_handler(State(state): State<AppState>) -> ApiResult {
    Ok(Json(state.reddit.preferences().await?))
}

pub async fn update_preferences_handler(
    State(state): State<AppState>,
    Json(preferences): Json<Value>,
) -> ApiResult {
    if !preferences.is_object() {
        return Err(ServerError::BadRequest(
            "preferences must be a JSON object".to_string(),
        ));
    }
    Ok(Json(state.reddit.update_preferences(preferences).await?))
}
