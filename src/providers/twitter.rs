use async_trait::async_trait;
use twitter_v2::authorization::Oauth1aToken;
use twitter_v2::query::TweetField;
use twitter_v2::{Tweet, TwitterApi, User};

use crate::config::TwitterCredentials;
use crate::error::{Error, Result};
use crate::models::{Comment, PostWithComments};

pub const RECENT_POSTS: usize = 5;
pub const MAX_REPLIES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SocialUser {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocialPost {
    pub id: u64,
    pub text: String,
    pub author_id: Option<u64>,
    pub in_reply_to_user_id: Option<u64>,
    pub created_at: Option<String>,
}

#[async_trait]
pub trait SocialClient: Send + Sync {
    async fn user_by_username(&self, username: &str) -> Result<Option<SocialUser>>;

    async fn user_by_id(&self, user_id: u64) -> Result<Option<SocialUser>>;

    async fn recent_posts(&self, user_id: u64, max_results: usize) -> Result<Vec<SocialPost>>;

    /// Posts in the conversation started by `post_id`.
    async fn conversation_replies(&self, post_id: u64, max_results: usize)
        -> Result<Vec<SocialPost>>;
}

/// Recent posts of `username` with the replies addressed to that account.
pub async fn fetch_posts_and_comments(
    client: &dyn SocialClient,
    username: &str,
) -> Result<Vec<PostWithComments>> {
    let user = client
        .user_by_username(username)
        .await?
        .ok_or_else(|| Error::Social(format!("Could not fetch user data for {}", username)))?;

    let posts = client.recent_posts(user.id, RECENT_POSTS).await?;
    let mut posts_with_comments = Vec::with_capacity(posts.len());

    for post in posts {
        let mut comments = Vec::new();
        let replies = client.conversation_replies(post.id, MAX_REPLIES).await?;

        for reply in replies {
            if reply.in_reply_to_user_id != Some(user.id) {
                continue;
            }
            let Some(author_id) = reply.author_id else {
                continue;
            };
            if let Some(author) = client.user_by_id(author_id).await? {
                comments.push(Comment {
                    text: reply.text,
                    author: author.username,
                    timestamp: reply.created_at,
                });
            }
        }

        posts_with_comments.push(PostWithComments {
            post: post.text,
            post_id: post.id.to_string(),
            timestamp: post.created_at,
            comments,
        });
    }

    Ok(posts_with_comments)
}

/// Like [`fetch_posts_and_comments`], but logs failures and yields an empty list.
pub async fn posts_and_comments(client: &dyn SocialClient, username: &str) -> Vec<PostWithComments> {
    match fetch_posts_and_comments(client, username).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::error!(error = %e, "Error getting Twitter posts and comments");
            Vec::new()
        }
    }
}

pub struct TwitterClient {
    api: TwitterApi<Oauth1aToken>,
}

impl TwitterClient {
    pub fn new(credentials: &TwitterCredentials) -> Self {
        let auth = Oauth1aToken::new(
            credentials.api_key.clone(),
            credentials.api_secret.clone(),
            credentials.access_token.clone(),
            credentials.access_token_secret.clone(),
        );
        TwitterClient {
            api: TwitterApi::new(auth),
        }
    }
}

fn social_error(e: twitter_v2::Error) -> Error {
    Error::Social(e.to_string())
}

fn to_user(user: User) -> SocialUser {
    SocialUser {
        id: user.id.as_u64(),
        username: user.username,
    }
}

fn to_post(tweet: Tweet) -> SocialPost {
    SocialPost {
        id: tweet.id.as_u64(),
        text: tweet.text,
        author_id: tweet.author_id.map(|id| id.as_u64()),
        in_reply_to_user_id: tweet.in_reply_to_user_id.map(|id| id.as_u64()),
        created_at: tweet.created_at.map(|t| t.to_string()),
    }
}

#[async_trait]
impl SocialClient for TwitterClient {
    async fn user_by_username(&self, username: &str) -> Result<Option<SocialUser>> {
        let user = self
            .api
            .get_user_by_username(username)
            .send()
            .await
            .map_err(social_error)?
            .into_data();
        Ok(user.map(to_user))
    }

    async fn user_by_id(&self, user_id: u64) -> Result<Option<SocialUser>> {
        let user = self
            .api
            .get_user(user_id)
            .send()
            .await
            .map_err(social_error)?
            .into_data();
        Ok(user.map(to_user))
    }

    async fn recent_posts(&self, user_id: u64, max_results: usize) -> Result<Vec<SocialPost>> {
        let tweets = self
            .api
            .get_user_tweets(user_id)
            .max_results(max_results)
            .tweet_fields([TweetField::CreatedAt])
            .send()
            .await
            .map_err(social_error)?
            .into_data()
            .unwrap_or_default();
        Ok(tweets.into_iter().map(to_post).collect())
    }

    async fn conversation_replies(
        &self,
        post_id: u64,
        max_results: usize,
    ) -> Result<Vec<SocialPost>> {
        let tweets = self
            .api
            .get_tweets_search_recent(format!("conversation_id:{}", post_id))
            .max_results(max_results)
            .tweet_fields([
                TweetField::AuthorId,
                TweetField::InReplyToUserId,
                TweetField::CreatedAt,
            ])
            .send()
            .await
            .map_err(social_error)?
            .into_data()
            .unwrap_or_default();
        Ok(tweets.into_iter().map(to_post).collect())
    }
}
