// src/providers/tests/twitter_tests.rs

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::super::twitter::{
    fetch_posts_and_comments, posts_and_comments, SocialClient, SocialPost, SocialUser,
    MAX_REPLIES, RECENT_POSTS,
};
use crate::error::{Error, Result};

const POGGY_ID: u64 = 1;

#[derive(Default)]
struct FakeSocial {
    users: HashMap<u64, String>,
    posts: Vec<SocialPost>,
    replies: HashMap<u64, Vec<SocialPost>>,
    fail_replies: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeSocial {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn post(id: u64, text: &str) -> SocialPost {
    SocialPost {
        id,
        text: text.to_string(),
        author_id: Some(POGGY_ID),
        in_reply_to_user_id: None,
        created_at: Some("2024-12-01 10:00:00.0 +00:00:00".to_string()),
    }
}

fn reply(id: u64, author: u64, to: Option<u64>, text: &str) -> SocialPost {
    SocialPost {
        id,
        text: text.to_string(),
        author_id: Some(author),
        in_reply_to_user_id: to,
        created_at: None,
    }
}

#[async_trait]
impl SocialClient for FakeSocial {
    async fn user_by_username(&self, username: &str) -> Result<Option<SocialUser>> {
        self.record(format!("user_by_username:{}", username));
        Ok(self
            .users
            .iter()
            .find(|(_, name)| name.as_str() == username)
            .map(|(id, name)| SocialUser {
                id: *id,
                username: name.clone(),
            }))
    }

    async fn user_by_id(&self, user_id: u64) -> Result<Option<SocialUser>> {
        self.record(format!("user_by_id:{}", user_id));
        Ok(self.users.get(&user_id).map(|name| SocialUser {
            id: user_id,
            username: name.clone(),
        }))
    }

    async fn recent_posts(&self, user_id: u64, max_results: usize) -> Result<Vec<SocialPost>> {
        self.record(format!("recent_posts:{}:{}", user_id, max_results));
        Ok(self.posts.clone())
    }

    async fn conversation_replies(
        &self,
        post_id: u64,
        max_results: usize,
    ) -> Result<Vec<SocialPost>> {
        self.record(format!("replies:{}:{}", post_id, max_results));
        if self.fail_replies {
            return Err(Error::Social("429 Too Many Requests".to_string()));
        }
        Ok(self.replies.get(&post_id).cloned().unwrap_or_default())
    }
}

fn populated() -> FakeSocial {
    let mut social = FakeSocial::default();
    social.users.insert(POGGY_ID, "poggygotchi".to_string());
    social.users.insert(2, "alice".to_string());
    social.users.insert(3, "bob".to_string());
    social.posts = vec![post(100, "rolling into the weekend"), post(101, "smol pogg today")];
    social.replies.insert(
        100,
        vec![
            reply(200, 2, Some(POGGY_ID), "chunky boi!"),
            // reply to someone else in the thread
            reply(201, 3, Some(2), "agreed alice"),
            // author that cannot be resolved
            reply(202, 99, Some(POGGY_ID), "who am i"),
        ],
    );
    social
}

#[tokio::test]
async fn test_collects_direct_replies_only() {
    let social = populated();
    let posts = fetch_posts_and_comments(&social, "poggygotchi").await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].post, "rolling into the weekend");
    assert_eq!(posts[0].post_id, "100");
    assert_eq!(posts[0].comments.len(), 1);
    assert_eq!(posts[0].comments[0].author, "alice");
    assert_eq!(posts[0].comments[0].text, "chunky boi!");
    assert!(posts[1].comments.is_empty());

    let calls = social.calls.lock().unwrap();
    assert!(calls.contains(&format!("recent_posts:{}:{}", POGGY_ID, RECENT_POSTS)));
    assert!(calls.contains(&format!("replies:100:{}", MAX_REPLIES)));
    assert!(!calls.contains(&"user_by_id:3".to_string()));
}

#[tokio::test]
async fn test_unknown_user_is_an_error() {
    let social = populated();
    let err = fetch_posts_and_comments(&social, "nobody").await.unwrap_err();
    assert!(matches!(err, Error::Social(msg) if msg.contains("nobody")));

    assert!(posts_and_comments(&social, "nobody").await.is_empty());
}

#[tokio::test]
async fn test_any_failure_yields_empty_list() {
    let mut social = populated();
    social.fail_replies = true;

    assert!(fetch_posts_and_comments(&social, "poggygotchi").await.is_err());
    assert!(posts_and_comments(&social, "poggygotchi").await.is_empty());
}
