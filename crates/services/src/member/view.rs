use bson::Bson;
use memberdir_db::models::{MemberRecord, member::fields};
use serde::Serialize;

use super::normalize::normalize_timestamp;

/// Public representation of a member. Every field has a total default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub bio: String,
    pub headline: String,
    pub location: String,
    pub tags: Vec<String>,
    pub join_date: Option<String>,
    pub last_active: Option<String>,
    pub invitation_date: Option<String>,
    pub active: bool,
    pub email_marketing: bool,
    pub member: bool,
    pub profile_url: String,
    pub website_url: String,
    pub twitter_url: String,
    pub facebook_url: String,
    pub linkedin_url: String,
    pub instagram_url: String,
    pub posts: u64,
    pub comments: u64,
    pub likes_received: u64,
    pub avatar_url: String,
}

impl From<&MemberRecord> for Member {
    fn from(record: &MemberRecord) -> Self {
        let text = |key| text_of(record.get(key));
        let flag = |key| flag_of(record.get(key));
        let count = |key| count_of(record.get(key));
        let date = |key| normalize_timestamp(record.get(key));

        Self {
            id: record.id.clone(),
            first_name: text(fields::FIRST_NAME),
            last_name: text(fields::LAST_NAME),
            email: text(fields::EMAIL),
            bio: text(fields::BIO),
            headline: text(fields::HEADLINE),
            location: text(fields::LOCATION),
            tags: tags_of(record.get(fields::TAGS)),
            join_date: date(fields::JOIN_DATE),
            last_active: date(fields::LAST_ACTIVE),
            invitation_date: date(fields::INVITATION_DATE),
            active: flag(fields::ACTIVE),
            email_marketing: flag(fields::EMAIL_MARKETING),
            member: flag(fields::MEMBER),
            profile_url: text(fields::PROFILE_URL),
            website_url: text(fields::WEBSITE_URL),
            twitter_url: text(fields::TWITTER_URL),
            facebook_url: text(fields::FACEBOOK_URL),
            linkedin_url: text(fields::LINKEDIN_URL),
            instagram_url: text(fields::INSTAGRAM_URL),
            posts: count(fields::POSTS),
            comments: count(fields::COMMENTS),
            likes_received: count(fields::LIKES_RECEIVED),
            avatar_url: text(fields::AVATAR_URL),
        }
    }
}

fn text_of(value: Option<&Bson>) -> String {
    match value {
        Some(Bson::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn flag_of(value: Option<&Bson>) -> bool {
    matches!(value, Some(Bson::Boolean(true)))
}

fn count_of(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Int64(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Double(v)) if v.is_finite() && *v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}

fn tags_of(value: Option<&Bson>) -> Vec<String> {
    match value {
        Some(Bson::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Bson::String(joined)) => split_tags(joined),
        _ => Vec::new(),
    }
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: u64, limit: u32, offset: u64, returned: usize) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: total > offset.saturating_add(returned as u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPage {
    pub members: Vec<Member>,
    pub pagination: Pagination,
}

/// Shapes fetched records into the public page.
pub fn assemble_page(records: &[MemberRecord], total: u64, limit: u32, offset: u64) -> MemberPage {
    let members: Vec<Member> = records.iter().map(Member::from).collect();
    let pagination = Pagination::new(total, limit, offset, members.len());
    MemberPage {
        members,
        pagination,
    }
}
