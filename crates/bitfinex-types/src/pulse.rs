//! Pulse (social feed) records
//!
//! A post embeds its author's profile as a nested positional array. The
//! profile is decoded with its own schema; a post without one is still valid.

use crate::codec::{Decode, Row};
use crate::error::DecodeResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index of the embedded profile inside a post row
const PROFILE_INDEX: usize = 18;

/// Pulse user profile
///
/// Wire layout: `[PUID, MTS_CREATE, _, NICKNAME, _, PICTURE, TEXT, _, _,
/// TWITTER_HANDLE, _, FOLLOWERS, FOLLOWING]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub mts_create: i64,
    pub nickname: String,
    pub picture: String,
    pub text: String,
    pub twitter_handle: String,
    pub followers: i64,
    pub following: i64,
}

impl Decode for Profile {
    const NAME: &'static str = "profile";
    const MIN_LEN: usize = 10;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            id: row.string(0, "id")?,
            mts_create: row.int(1, "mts_create")?,
            nickname: row.string(3, "nickname")?,
            picture: row.string(5, "picture")?,
            text: row.string(6, "text")?,
            twitter_handle: row.string(9, "twitter_handle")?,
            followers: row.int(11, "followers")?,
            following: row.int(12, "following")?,
        })
    }
}

/// Pulse post
///
/// Wire layout: `[PID, MTS, _, PUID, _, TITLE, CONTENT, _, _, IS_PIN,
/// IS_PUBLIC, COMMENTS_DISABLED, TAGS, ATTACHMENTS, META, LIKES, _, _,
/// PROFILE, ...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub mts: i64,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub pinned: bool,
    pub public: bool,
    pub comments_disabled: bool,
    pub tags: Vec<String>,
    pub attachments: Vec<String>,
    pub meta: Value,
    pub likes: i64,
    pub profile: Option<Profile>,
}

impl Decode for Post {
    const NAME: &'static str = "post";
    const MIN_LEN: usize = 12;

    fn decode(row: &Row<'_>) -> DecodeResult<Self> {
        Ok(Self {
            id: row.string(0, "id")?,
            mts: row.int(1, "mts")?,
            user_id: row.string(3, "user_id")?,
            title: row.string(5, "title")?,
            content: row.string(6, "content")?,
            pinned: row.flag(9, "pinned")?,
            public: row.flag(10, "public")?,
            comments_disabled: row.flag(11, "comments_disabled")?,
            tags: row.strings(12, "tags")?,
            attachments: row.strings(13, "attachments")?,
            meta: row.raw_value(14),
            likes: row.int(15, "likes")?,
            profile: decode_profile(row)?,
        })
    }
}

// The profile arrives either as the row itself or wrapped once: `[[PUID, ...]]`.
fn decode_profile(row: &Row<'_>) -> DecodeResult<Option<Profile>> {
    let Some(nested) = row.nested(PROFILE_INDEX, "profile")? else {
        return Ok(None);
    };
    match nested {
        [] => Ok(None),
        [Value::Array(inner)] => Profile::from_raw(inner).map(Some),
        [Value::Null] => Ok(None),
        values => Profile::from_raw(values).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use serde_json::json;

    fn profile_row() -> Value {
        json!([
            "abc123", 1591614631576_i64, null, "Bitfinex", null, "avatar.png", "official",
            null, null, "bitfinex", null, 1200, 3
        ])
    }

    fn post_row(profile: Value) -> Value {
        let mut row = vec![
            json!("post-1"), json!(1593785302000_i64), Value::Null, json!("abc123"), Value::Null,
            json!("Title"), json!("Hello pulse"), Value::Null, Value::Null, json!(1), json!(1),
            json!(0), json!(["btc", "news"]), json!([]), Value::Null, json!(42), Value::Null,
            Value::Null,
        ];
        row.push(profile);
        Value::Array(row)
    }

    #[test]
    fn test_post_with_wrapped_profile() {
        let raw = post_row(json!([profile_row()]));
        let post = Post::from_value(&raw).unwrap();
        assert_eq!(post.title, "Title");
        assert!(post.pinned);
        assert!(!post.comments_disabled);
        assert_eq!(post.tags, vec!["btc", "news"]);
        assert_eq!(post.likes, 42);
        let profile = post.profile.unwrap();
        assert_eq!(profile.nickname, "Bitfinex");
        assert_eq!(profile.followers, 1200);
    }

    #[test]
    fn test_post_with_flat_profile() {
        let post = Post::from_value(&post_row(profile_row())).unwrap();
        assert_eq!(post.profile.unwrap().twitter_handle, "bitfinex");
    }

    #[test]
    fn test_post_without_profile() {
        let mut raw = post_row(Value::Null);
        let post = Post::from_value(&raw).unwrap();
        assert!(post.profile.is_none());

        // Shorter row that stops before the profile index
        raw.as_array_mut().unwrap().truncate(12);
        let post = Post::from_value(&raw).unwrap();
        assert!(post.profile.is_none());
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_short_profile_fails_post() {
        let raw = post_row(json!([["abc123", 0]]));
        let err = Post::from_value(&raw).unwrap_err();
        assert_eq!(err.record(), "profile");
        assert!(matches!(err, DecodeError::TooShort { expected: 10, actual: 2, .. }));
    }
}
