use super::model::{Block, BlockKind, Media, PageDocument, Pixels, Profile, Theme};

/// Built-in starter document. Seeded into the store on first boot and used
/// as the fallback whenever the stored document cannot be fetched or parsed,
/// so the public page never renders blank.
pub fn default_document() -> PageDocument {
    let mut portfolio = Block::new("1".to_string(), BlockKind::Standard, 0);
    portfolio.title = "My Portfolio".to_string();
    portfolio.url = Some("https://example.com/portfolio".to_string());

    let mut video = Block::new("2".to_string(), BlockKind::VideoEmbed, 1);
    video.title = "Latest Project Video".to_string();
    video.url = Some("https://vimeo.com/123456789".to_string());

    let mut music = Block::new("3".to_string(), BlockKind::MusicEmbed, 2);
    music.title = "My Favorite Lo-fi Playlist".to_string();
    music.url = Some("https://open.spotify.com/embed/playlist/37i9dQZF1DXcBWIGoYBM5M".to_string());

    PageDocument {
        profile: Profile {
            name: "Your Name".to_string(),
            subtitle: "Creator | Athlete | Entrepreneur".to_string(),
            location: "Somewhere, Earth".to_string(),
            bio: "Welcome to my page. Edit this bio in the admin dashboard.".to_string(),
            image_url: String::new(),
        },
        theme: Theme::default(),
        media: Media::default(),
        pixels: Pixels::default(),
        blocks: vec![portfolio, video, music],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_has_visible_content() {
        let doc = default_document();
        assert!(!doc.blocks.is_empty());
        assert!(doc.blocks.iter().all(|b| b.active));
        // Orders are already dense and sorted
        let orders: Vec<i64> = doc.blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, (0..doc.blocks.len() as i64).collect::<Vec<_>>());
    }

    #[test]
    fn default_document_round_trips_through_json() {
        let doc = default_document();
        let value = serde_json::to_value(&doc).unwrap();
        let back: PageDocument = serde_json::from_value(value).unwrap();
        assert_eq!(doc, back);
    }
}
