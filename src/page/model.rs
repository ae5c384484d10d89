use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type tag of a content block. The tag set is closed; anything else
/// (documents written by a newer version, hand-edited JSON) lands on
/// `Unknown` instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Standard,
    VideoEmbed,
    MusicEmbed,
    ImageBanner,
    PhotoCarousel,
    LatestYouTube,
    LiveTwitch,
    Product,
    FeaturedProducts,
    TextSection,
    #[serde(other)]
    Unknown,
}

/// Visibility window for a scheduled block. Absent bounds are unbounded
/// on that side; both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl Schedule {
    /// True when `now` falls inside the [start, end] window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if now < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if now > end {
                return false;
            }
        }
        true
    }
}

/// Per-block presentation overrides. Every field is optional; the renderer
/// supplies the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Styling {
    /// Block opacity in percent (default: 100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// CSS background (default: rgba(255,255,255,0.1)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Default block opacity, percent.
pub const DEFAULT_OPACITY: f32 = 100.0;
/// Default block background.
pub const DEFAULT_BACKGROUND: &str = "rgba(255,255,255,0.1)";

/// One renderable unit of page content. Only `id`, `type`, `order` and
/// `active` are structural; everything else is read (or ignored) per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Sort key only — values need not be contiguous.
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stored as plaintext, matching the original document format.
    /// Never serialized into public views — see site::PublicBlock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<Styling>,
}

fn default_true() -> bool {
    true
}

impl Block {
    /// Minimal valid block, used by the editor when appending.
    pub fn new(id: String, kind: BlockKind, order: i64) -> Self {
        Self {
            id,
            kind,
            order,
            active: true,
            title: String::new(),
            url: None,
            thumbnail: None,
            description: None,
            password: None,
            schedule: None,
            images: Vec::new(),
            artist: None,
            platform: None,
            price: None,
            embed_code: None,
            styling: None,
        }
    }

    /// Whether activation goes through the password gate.
    /// An empty stored password counts as no password.
    pub fn is_locked(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Profile header shown at the top of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: String,
}

/// Page-wide colors and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default)]
    pub preset: String,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub font: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            preset: "Default Light".to_string(),
            background_color: "#FFFFFF".to_string(),
            primary_color: "#111827".to_string(),
            font: "Inter".to_string(),
        }
    }
}

/// Background media and favicon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub wallpaper_url: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub favicon_url: String,
}

/// Marketing pixel IDs injected into the page head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pixels {
    #[serde(default)]
    pub meta_pixel: String,
    #[serde(default)]
    pub google_tag: String,
    #[serde(default)]
    pub tiktok_pixel: String,
    #[serde(default)]
    pub snapchat_pixel: String,
    #[serde(default)]
    pub pinterest_tag: String,
    #[serde(default)]
    pub custom_header_scripts: String,
}

/// The single document the whole page renders from. Blocks exist only
/// inside this document; there is no independent block lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub media: Media,
    #[serde(default)]
    pub pixels: Pixels,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_tag_deserializes_to_unknown() {
        let block: Block = serde_json::from_value(serde_json::json!({
            "id": "x",
            "type": "hologram",
            "title": "Future thing"
        }))
        .unwrap();
        assert_eq!(block.kind, BlockKind::Unknown);
        assert!(block.active);
        assert_eq!(block.order, 0);
    }

    #[test]
    fn type_tags_round_trip_camel_case() {
        let json = serde_json::to_value(BlockKind::LatestYouTube).unwrap();
        assert_eq!(json, serde_json::json!("latestYouTube"));
        let json = serde_json::to_value(BlockKind::FeaturedProducts).unwrap();
        assert_eq!(json, serde_json::json!("featuredProducts"));
    }

    #[test]
    fn schedule_bounds_are_inclusive_and_optional() {
        let start = "2026-01-01T00:00:00Z".parse().unwrap();
        let end = "2026-01-31T00:00:00Z".parse().unwrap();
        let window = Schedule {
            start: Some(start),
            end: Some(end),
        };
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));

        let open_ended = Schedule {
            start: Some(start),
            end: None,
        };
        assert!(open_ended.contains(end + chrono::Duration::days(400)));
        assert!(!open_ended.contains(start - chrono::Duration::seconds(1)));
    }

    #[test]
    fn empty_password_is_not_locked() {
        let mut block = Block::new("a".into(), BlockKind::Standard, 0);
        assert!(!block.is_locked());
        block.password = Some(String::new());
        assert!(!block.is_locked());
        block.password = Some("hunter2".into());
        assert!(block.is_locked());
    }
}
