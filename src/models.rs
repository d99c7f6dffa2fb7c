use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Clone, Debug, Serialize, FromRow, PartialEq)]
pub struct Section {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub show_in_main: bool,
    pub display_order: i64,
    pub description: Option<String>,
    pub profile_initial: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, FromRow, PartialEq)]
pub struct Link {
    pub id: i64,
    pub section_id: i64,
    pub label: String,
    pub url: String,
    pub icon_type: String,
    pub is_visible: bool,
    pub display_order: i64,
    pub clicks: i64,
    pub group_title: Option<String>,
    pub group_order: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Site-wide settings, collapsed from the key/value `settings` table.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Settings {
    pub site_title: String,
    pub site_description: String,
    pub profile_initial: String,
    pub profile_image_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_title: "My Links".to_string(),
            site_description: "All my important links in one place".to_string(),
            profile_initial: "M".to_string(),
            profile_image_url: String::new(),
        }
    }
}

impl Settings {
    /// Returns false for keys that are not part of the settings record.
    pub fn apply(&mut self, key: &str, value: String) -> bool {
        match key {
            "site_title" => self.site_title = value,
            "site_description" => self.site_description = value,
            "profile_initial" => self.profile_initial = value,
            "profile_image_url" => self.profile_image_url = value,
            _ => return false,
        }
        true
    }
}

pub const DEFAULT_ICON: &str = "link";

pub const AVAILABLE_ICONS: [&str; 30] = [
    "link",
    "github",
    "twitter",
    "instagram",
    "facebook",
    "linkedin",
    "youtube",
    "twitch",
    "discord",
    "tiktok",
    "globe",
    "mail",
    "phone",
    "map-pin",
    "book-open",
    "file-text",
    "shopping-bag",
    "coffee",
    "heart",
    "star",
    "music",
    "camera",
    "video",
    "code",
    "terminal",
    "palette",
    "pen-tool",
    "briefcase",
    "calendar",
    "message-circle",
];
