use chrono::NaiveDateTime;

use crate::models::PostWithComments;

/// Observations that go into one autonomous prompt.
pub struct MarketSnapshot<'a> {
    pub time: NaiveDateTime,
    pub price: f64,
    pub balance_usd: f64,
    pub posts: &'a [PostWithComments],
}

pub fn build_thought(character_name: &str, snapshot: &MarketSnapshot<'_>) -> String {
    let mut thought = format!(
        "Current Time: {}\nCurrent ETH Price: ${:.2} USD\nYour Wallet Balance: ${:.2} USD\n\n",
        snapshot.time.format("%Y-%m-%d %H:%M:%S"),
        snapshot.price,
        snapshot.balance_usd
    );

    if !snapshot.posts.is_empty() {
        thought.push_str("Recent Twitter Activity:\n");
        for post in snapshot.posts {
            thought.push_str(&format!("Post: {}\n", post.post));
            if !post.comments.is_empty() {
                thought.push_str("Comments:\n");
                for comment in &post.comments {
                    thought.push_str(&format!("- {}: {}\n", comment.author, comment.text));
                }
            }
            thought.push('\n');
        }
    }

    thought.push_str(&format!(
        "Draft a tweet as {}!\n\
         Do not mention exact prices and do not mention the token names! Each tweet should be unique and creative\n\
         Keep in mind the last tweet you made and the time when you made it compared to now.",
        character_name
    ));
    thought
}
