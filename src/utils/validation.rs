//! Request field sanitizing.
//!
//! Strings are trimmed and clipped rather than rejected, integers fall back to a
//! default, and URLs and slugs are rejected outright when they do not pass.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::{
    models::{AVAILABLE_ICONS, DEFAULT_ICON},
    services::{links::LinkPatch, sections::SectionPatch, settings::SettingsPatch},
};

pub mod max_len {
    pub const TITLE: usize = 100;
    pub const SLUG: usize = 50;
    pub const LABEL: usize = 100;
    pub const URL: usize = 2000;
    pub const DESCRIPTION: usize = 500;
    pub const GROUP_TITLE: usize = 100;
    pub const PROFILE_INITIAL: usize = 1;
    pub const PROFILE_IMAGE_URL: usize = 2000;
    pub const SITE_TITLE: usize = 100;
    pub const SITE_DESCRIPTION: usize = 500;
}

const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug pattern"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

/// Returns the trimmed URL when it parses and uses an allowed scheme.
pub fn validate_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max_len::URL {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    ALLOWED_SCHEMES
        .contains(&parsed.scheme())
        .then(|| trimmed.to_string())
}

/// Same as [`validate_url`] but only https is accepted.
pub fn validate_image_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max_len::PROFILE_IMAGE_URL {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    (parsed.scheme() == "https").then(|| trimmed.to_string())
}

/// Lowercases and trims, then requires `^[a-z0-9]+(-[a-z0-9]+)*$`.
pub fn validate_slug(slug: &str) -> Option<String> {
    let candidate = slug.trim().to_lowercase();
    if candidate.is_empty() || candidate.len() > max_len::SLUG {
        return None;
    }

    SLUG_PATTERN.is_match(&candidate).then_some(candidate)
}

/// Unknown icon tags fall back to the default icon.
pub fn validate_icon_type(icon_type: &str) -> &'static str {
    AVAILABLE_ICONS
        .iter()
        .find(|known| **known == icon_type)
        .copied()
        .unwrap_or(DEFAULT_ICON)
}

/// Non-strings become `default`; strings are trimmed and clipped to `max_chars`.
pub fn sanitize_string(value: Option<&Value>, max_chars: usize, default: &str) -> String {
    match value {
        Some(Value::String(raw)) => raw.trim().chars().take(max_chars).collect(),
        _ => default.to_string(),
    }
}

/// Accepts non-negative integers given as numbers or numeric strings
/// (leading digits are parsed, as in `parseInt`). Anything else yields `default`.
pub fn validate_positive_int(value: &Value, default: i64) -> i64 {
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(raw) => parse_int_prefix(raw),
        _ => None,
    };

    match parsed {
        Some(n) if n >= 0 => n,
        _ => default,
    }
}

pub fn parse_positive_int_str(raw: &str, default: i64) -> i64 {
    match parse_int_prefix(raw) {
        Some(n) if n >= 0 => n,
        _ => default,
    }
}

fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// JavaScript-style truthiness, used for loosely typed boolean flags.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn validate_link_data(data: &Map<String, Value>) -> Result<LinkPatch, ValidationError> {
    let mut patch = LinkPatch::default();

    if let Some(value) = data.get("section_id") {
        let section_id = validate_positive_int(value, -1);
        if section_id < 0 {
            return Err(ValidationError("Invalid section_id"));
        }
        patch.section_id = Some(section_id);
    }

    if data.contains_key("label") {
        let label = sanitize_string(data.get("label"), max_len::LABEL, "");
        if label.is_empty() {
            return Err(ValidationError("Label is required"));
        }
        patch.label = Some(label);
    }

    if let Some(value) = data.get("url") {
        let url = value.as_str().and_then(validate_url).ok_or(ValidationError(
            "Invalid URL. Must be http, https, mailto, or tel protocol.",
        ))?;
        patch.url = Some(url);
    }

    if let Some(value) = data.get("icon_type") {
        let icon = value.as_str().map_or(DEFAULT_ICON, validate_icon_type);
        patch.icon_type = Some(icon.to_string());
    }

    if let Some(value) = data.get("is_visible") {
        patch.is_visible = Some(truthy(value));
    }

    if let Some(value) = data.get("display_order") {
        patch.display_order = Some(validate_positive_int(value, 0));
    }

    if data.contains_key("group_title") {
        let group = sanitize_string(data.get("group_title"), max_len::GROUP_TITLE, "");
        patch.group_title = Some((!group.is_empty()).then_some(group));
    }

    if let Some(value) = data.get("group_order") {
        patch.group_order = Some(validate_positive_int(value, 0));
    }

    Ok(patch)
}

pub fn validate_section_data(data: &Map<String, Value>) -> Result<SectionPatch, ValidationError> {
    let mut patch = SectionPatch::default();

    if data.contains_key("title") {
        let title = sanitize_string(data.get("title"), max_len::TITLE, "");
        if title.is_empty() {
            return Err(ValidationError("Title is required"));
        }
        patch.title = Some(title);
    }

    if let Some(value) = data.get("slug") {
        let slug = value.as_str().and_then(validate_slug).ok_or(ValidationError(
            "Invalid slug. Use only lowercase letters, numbers, and hyphens.",
        ))?;
        patch.slug = Some(slug);
    }

    if let Some(value) = data.get("show_in_main") {
        patch.show_in_main = Some(truthy(value));
    }

    if let Some(value) = data.get("display_order") {
        patch.display_order = Some(validate_positive_int(value, 0));
    }

    if data.contains_key("description") {
        let description = sanitize_string(data.get("description"), max_len::DESCRIPTION, "");
        patch.description = Some((!description.is_empty()).then_some(description));
    }

    if data.contains_key("profile_initial") {
        let initial = sanitize_string(
            data.get("profile_initial"),
            max_len::PROFILE_INITIAL,
            "",
        );
        patch.profile_initial = Some((!initial.is_empty()).then(|| initial.to_uppercase()));
    }

    if let Some(value) = data.get("profile_image_url") {
        patch.profile_image_url = Some(optional_image_url(value)?);
    }

    Ok(patch)
}

pub fn validate_settings_data(data: &Map<String, Value>) -> Result<SettingsPatch, ValidationError> {
    let mut patch = SettingsPatch::default();

    if data.contains_key("site_title") {
        let title = sanitize_string(data.get("site_title"), max_len::SITE_TITLE, "");
        if title.is_empty() {
            return Err(ValidationError("Site title is required"));
        }
        patch.site_title = Some(title);
    }

    if data.contains_key("site_description") {
        patch.site_description = Some(sanitize_string(
            data.get("site_description"),
            max_len::SITE_DESCRIPTION,
            "",
        ));
    }

    if data.contains_key("profile_initial") {
        let initial = sanitize_string(
            data.get("profile_initial"),
            max_len::PROFILE_INITIAL,
            "",
        );
        patch.profile_initial = Some(initial.to_uppercase());
    }

    if let Some(value) = data.get("profile_image_url") {
        patch.profile_image_url = Some(optional_image_url(value)?.unwrap_or_default());
    }

    Ok(patch)
}

/// Blank or missing image URLs clear the field; anything else must be https.
fn optional_image_url(value: &Value) -> Result<Option<String>, ValidationError> {
    match value.as_str().map(str::trim) {
        Some(raw) if !raw.is_empty() => validate_image_url(raw)
            .map(Some)
            .ok_or(ValidationError(
                "Invalid profile image URL. Must be a valid HTTPS URL.",
            )),
        _ => Ok(None),
    }
}
