use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Banner image shown on the landing page carousel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeroImage {
    pub id: Uuid,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub alt_text: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HeroImage {
    pub fn new(fields: HeroImageFields) -> Self {
        let now = Utc::now();
        HeroImage {
            id: Uuid::new_v4(),
            title: fields.title,
            image_url: fields.image_url,
            link_url: fields.link_url,
            alt_text: fields.alt_text,
            sort_order: fields.sort_order,
            is_active: fields.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every editable field
    pub fn replace(&mut self, fields: HeroImageFields) {
        self.title = fields.title;
        self.image_url = fields.image_url;
        self.link_url = fields.link_url;
        self.alt_text = fields.alt_text;
        self.sort_order = fields.sort_order;
        self.is_active = fields.is_active;
        self.updated_at = Utc::now();
    }

    /// Applies only the fields present in the patch
    pub fn apply(&mut self, patch: HeroImagePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(link_url) = patch.link_url {
            self.link_url = link_url;
        }
        if let Some(alt_text) = patch.alt_text {
            self.alt_text = alt_text;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// Editable fields of a hero image, used for create and full replace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeroImageFields {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update of a hero image. `linkUrl: null` clears the link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeroImagePatch {
    pub title: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub link_url: Option<Option<String>>,
    pub alt_text: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Reader comment attached to an article
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_slug: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_slug: String, author_id: Uuid, author_name: String, body: String) -> Self {
        let now = Utc::now();
        Comment {
            id: Uuid::new_v4(),
            post_slug,
            author_id,
            author_name,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}
