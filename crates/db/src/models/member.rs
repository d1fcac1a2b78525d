use bson::{Bson, Document};

/// Storage field names of a member document. Stored names are fixed by the
/// historical import format and differ from the public camelCase names.
pub mod fields {
    pub const ID: &str = "_id";
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
    pub const EMAIL: &str = "Email";
    pub const BIO: &str = "Bio";
    pub const HEADLINE: &str = "Headline";
    pub const LOCATION: &str = "Location";
    pub const TAGS: &str = "Tags";
    pub const JOIN_DATE: &str = "JoinDate";
    pub const LAST_ACTIVE: &str = "LastActive";
    pub const INVITATION_DATE: &str = "InvitationDate";
    pub const ACTIVE: &str = "Active";
    pub const EMAIL_MARKETING: &str = "EmailMarketing";
    pub const MEMBER: &str = "Member";
    pub const PROFILE_URL: &str = "ProfileURL";
    pub const WEBSITE_URL: &str = "WebsiteURL";
    pub const TWITTER_URL: &str = "TwitterURL";
    pub const FACEBOOK_URL: &str = "FacebookURL";
    pub const LINKEDIN_URL: &str = "LinkedInURL";
    pub const INSTAGRAM_URL: &str = "InstagramURL";
    pub const POSTS: &str = "Posts";
    pub const COMMENTS: &str = "Comments";
    pub const LIKES_RECEIVED: &str = "LikesReceived";
    pub const AVATAR_URL: &str = "AvatarURL";
    pub const SEARCH_NAME: &str = "searchName";
}

/// A raw member document as stored, split into its identity and the
/// remaining fields. Fields stay untyped because the collection is
/// schemaless and older imports disagree on value types.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    pub id: String,
    pub fields: Document,
}

impl MemberRecord {
    pub fn new(id: impl Into<String>, fields: Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn from_document(mut doc: Document) -> Self {
        let id = doc.remove(fields::ID).map(id_to_string).unwrap_or_default();
        Self { id, fields: doc }
    }

    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.fields.get(key)
    }
}

/// Renders a document `_id` the way clients see it.
pub fn id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}
