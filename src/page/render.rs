use chrono::{DateTime, Utc};

use super::model::{Block, BlockKind, PageDocument, Styling, DEFAULT_BACKGROUND, DEFAULT_OPACITY};
use super::resolve::resolve;

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Inline style for a block from its styling overrides, with documented
/// defaults: opacity 100%, background rgba(255,255,255,0.1).
fn block_style(styling: Option<&Styling>) -> String {
    let opacity = styling
        .and_then(|s| s.opacity)
        .unwrap_or(DEFAULT_OPACITY)
        .clamp(0.0, 100.0);
    let background = styling
        .and_then(|s| s.background.as_deref())
        .unwrap_or(DEFAULT_BACKGROUND);
    let color = styling
        .and_then(|s| s.text_color.as_deref())
        .unwrap_or("inherit");
    format!(
        "background:{};opacity:{};color:{}",
        html_escape(background),
        opacity / 100.0,
        html_escape(color),
    )
}

/// Activation markup shared by clickable variants. Gated blocks get a
/// password prompt driven by the page script instead of a direct link.
fn activation_attrs(block: &Block) -> String {
    let id = html_escape(&block.id);
    if block.is_locked() {
        format!("href=\"#\" onclick=\"return promptUnlock('{}')\"", id)
    } else {
        let url = html_escape(block.url.as_deref().unwrap_or("#"));
        format!(
            "href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" onclick=\"trackClick('{}')\"",
            url, id
        )
    }
}

/// Render one block to an HTML fragment. Total over the type tag:
/// `Unknown` renders nothing and nothing here can fail. Each variant reads
/// only the fields relevant to its kind and tolerates absent optionals.
pub fn render_block(block: &Block) -> String {
    let title = html_escape(&block.title);
    let style = block_style(block.styling.as_ref());
    let lock_badge = if block.is_locked() {
        "<span class=\"lock\">&#128274;</span>"
    } else {
        ""
    };

    match block.kind {
        BlockKind::Standard => {
            let thumb = block
                .thumbnail
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| {
                    format!(
                        "<img class=\"thumb\" src=\"{}\" alt=\"{}\">",
                        html_escape(t),
                        title
                    )
                })
                .unwrap_or_default();
            format!(
                "<a class=\"block standard\" style=\"{}\" {}>{}<span class=\"title\">{}</span>{}<span class=\"err\" id=\"err-{}\"></span></a>",
                style,
                activation_attrs(block),
                thumb,
                title,
                lock_badge,
                html_escape(&block.id),
            )
        }
        BlockKind::VideoEmbed => {
            let thumb = html_escape(block.thumbnail.as_deref().unwrap_or(""));
            format!(
                "<a class=\"block video\" style=\"{}\" {}>\
                 <div class=\"media\" style=\"background-image:url('{}')\">\
                 <span class=\"play\">&#9654;</span></div>\
                 <span class=\"caption\">{}</span>{}</a>",
                style,
                activation_attrs(block),
                thumb,
                title,
                lock_badge,
            )
        }
        BlockKind::MusicEmbed => {
            let artist = html_escape(block.artist.as_deref().unwrap_or(""));
            let platform = html_escape(block.platform.as_deref().unwrap_or(""));
            format!(
                "<a class=\"block music\" style=\"{}\" {}>\
                 <span class=\"title\">{}</span>\
                 <span class=\"meta\">{} {}</span>&#127925;{}</a>",
                style,
                activation_attrs(block),
                title,
                artist,
                platform,
                lock_badge,
            )
        }
        BlockKind::ImageBanner => {
            let image = html_escape(block.thumbnail.as_deref().unwrap_or(""));
            let desc = html_escape(block.description.as_deref().unwrap_or(""));
            format!(
                "<div class=\"block banner\" style=\"{}\">\
                 <img src=\"{}\" alt=\"{}\">\
                 <div class=\"caption\"><span class=\"title\">{}</span><p>{}</p></div></div>",
                style, image, title, title, desc,
            )
        }
        BlockKind::PhotoCarousel => {
            let slides: String = block
                .images
                .iter()
                .map(|img| format!("<img src=\"{}\" alt=\"{}\">", html_escape(img), title))
                .collect();
            format!(
                "<div class=\"block carousel\" style=\"{}\">\
                 <div class=\"slides\">{}</div>\
                 <span class=\"title\">{}</span></div>",
                style, slides, title,
            )
        }
        BlockKind::LatestYouTube | BlockKind::LiveTwitch => {
            let url = html_escape(block.url.as_deref().unwrap_or(""));
            format!(
                "<div class=\"block embed\" style=\"{}\">\
                 <iframe src=\"{}\" title=\"{}\" loading=\"lazy\" allowfullscreen></iframe></div>",
                style, url, title,
            )
        }
        BlockKind::Product => {
            let image = html_escape(block.thumbnail.as_deref().unwrap_or(""));
            let price = block
                .price
                .map(|p| format!("<span class=\"price\">${:.2}</span>", p))
                .unwrap_or_default();
            format!(
                "<a class=\"block product\" style=\"{}\" {}>\
                 <img src=\"{}\" alt=\"{}\">\
                 <span class=\"title\">{}</span>{}{}</a>",
                style,
                activation_attrs(block),
                image,
                title,
                title,
                price,
                lock_badge,
            )
        }
        BlockKind::FeaturedProducts => {
            let tiles: String = block
                .images
                .iter()
                .map(|img| format!("<img src=\"{}\" alt=\"{}\">", html_escape(img), title))
                .collect();
            format!(
                "<div class=\"block featured\" style=\"{}\">\
                 <span class=\"title\">{}</span><div class=\"grid\">{}</div></div>",
                style, title, tiles,
            )
        }
        BlockKind::TextSection => {
            let text = html_escape(block.description.as_deref().unwrap_or(""));
            format!(
                "<div class=\"block text\" style=\"{}\">\
                 <span class=\"title\">{}</span><p>{}</p></div>",
                style, title, text,
            )
        }
        // Unmapped type: render nothing, never error.
        BlockKind::Unknown => String::new(),
    }
}

/// Marketing pixel snippets for the page head. Only non-empty IDs emit
/// anything; custom header scripts are injected verbatim (admin-supplied).
fn render_pixels(doc: &PageDocument) -> String {
    let mut head = String::new();
    let px = &doc.pixels;
    if !px.google_tag.is_empty() {
        let id = html_escape(&px.google_tag);
        head.push_str(&format!(
            "<script async src=\"https://www.googletagmanager.com/gtag/js?id={id}\"></script>\
             <script>window.dataLayer=window.dataLayer||[];function gtag(){{dataLayer.push(arguments);}}\
             gtag('js',new Date());gtag('config','{id}');</script>",
        ));
    }
    if !px.meta_pixel.is_empty() {
        head.push_str(&format!(
            "<script>fbq&&fbq('init','{}');</script>",
            html_escape(&px.meta_pixel)
        ));
    }
    head.push_str(&px.custom_header_scripts);
    head
}

/// Render the full public bio page for the given instant.
/// Visibility is re-derived from `now` on every call, never cached.
pub fn render_page(doc: &PageDocument, now: DateTime<Utc>) -> String {
    let visible = resolve(&doc.blocks, now);
    let blocks_html: String = visible.iter().map(|b| render_block(b)).collect();

    let profile = &doc.profile;
    let theme = &doc.theme;
    let media = &doc.media;

    let wallpaper = if media.wallpaper_url.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"wallpaper\" style=\"background-image:url('{}')\"></div>",
            html_escape(&media.wallpaper_url)
        )
    };
    let video_bg = if media.video_url.is_empty() {
        String::new()
    } else {
        format!(
            "<video class=\"wallpaper\" autoplay loop muted playsinline><source src=\"{}\" type=\"video/mp4\"></video>",
            html_escape(&media.video_url)
        )
    };
    let favicon = if media.favicon_url.is_empty() {
        String::new()
    } else {
        format!("<link rel=\"icon\" href=\"{}\">", html_escape(&media.favicon_url))
    };
    let avatar = if profile.image_url.is_empty() {
        String::new()
    } else {
        format!(
            "<img class=\"avatar\" src=\"{}\" alt=\"{}\">",
            html_escape(&profile.image_url),
            html_escape(&profile.name)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name}</title>
    {favicon}
    {pixels}
    <style>
        body {{ font-family: {font}, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; background: {bg}; color: {fg}; margin: 0; min-height: 100vh; }}
        .wallpaper {{ position: fixed; inset: 0; background-size: cover; background-position: center; object-fit: cover; width: 100%; height: 100%; z-index: 0; }}
        .wrap {{ position: relative; z-index: 1; max-width: 640px; margin: 0 auto; padding: 4rem 1rem 2rem; display: flex; flex-direction: column; align-items: center; gap: 1rem; }}
        .avatar {{ width: 112px; height: 112px; border-radius: 50%; object-fit: cover; border: 4px solid rgba(255,255,255,0.5); }}
        header {{ text-align: center; margin-bottom: 1.5rem; }}
        header h1 {{ margin: 0.5rem 0 0; font-size: 1.8rem; }}
        header .subtitle {{ opacity: 0.9; margin: 0.25rem 0; }}
        header .location {{ opacity: 0.8; font-size: 0.9rem; margin: 0.25rem 0; }}
        header .bio {{ opacity: 0.9; max-width: 28rem; margin: 1rem auto 0; }}
        .block {{ display: block; width: 100%; border: 1px solid rgba(255,255,255,0.2); border-radius: 12px; padding: 1rem; text-decoration: none; text-align: center; box-sizing: border-box; }}
        .block .thumb {{ width: 48px; height: 48px; border-radius: 8px; object-fit: cover; vertical-align: middle; margin-right: 0.75rem; }}
        .block .title {{ font-weight: 600; }}
        .block .err {{ display: block; color: #f87171; font-size: 0.8rem; }}
        .block img {{ max-width: 100%; border-radius: 8px; }}
        .block .media {{ height: 12rem; background-size: cover; background-position: center; border-radius: 8px; display: flex; align-items: center; justify-content: center; }}
        .block .play {{ background: rgba(255,255,255,0.9); color: #111; border-radius: 50%; width: 3rem; height: 3rem; display: flex; align-items: center; justify-content: center; }}
        .block iframe {{ width: 100%; height: 18rem; border: 0; border-radius: 8px; }}
        .block .slides {{ display: flex; gap: 0.5rem; overflow-x: auto; scroll-snap-type: x mandatory; }}
        .block .slides img {{ scroll-snap-align: center; height: 12rem; }}
        .block .grid {{ display: grid; grid-template-columns: repeat(2, 1fr); gap: 0.5rem; }}
        .block .price {{ display: block; font-weight: 700; margin-top: 0.25rem; }}
        .block .meta {{ display: block; opacity: 0.8; font-size: 0.9rem; }}
        .lock {{ margin-left: 0.5rem; opacity: 0.6; }}
    </style>
</head>
<body>
    {wallpaper}
    {video_bg}
    <div class="wrap">
        <header>
            {avatar}
            <h1>{name}</h1>
            <p class="subtitle">{subtitle}</p>
            <p class="location">{location}</p>
            <p class="bio">{bio}</p>
        </header>
        {blocks}
    </div>
    <script>
        fetch('/api/track/view', {{method: 'POST'}}).catch(function () {{}});
        function trackClick(id) {{
            fetch('/api/track/click/' + id, {{method: 'POST'}}).catch(function () {{}});
        }}
        function promptUnlock(id) {{
            var attempt = prompt('This link is password protected. Enter the password:');
            if (attempt === null) return false;
            fetch('/api/blocks/' + id + '/unlock', {{
                method: 'POST',
                headers: {{'Content-Type': 'application/json'}},
                body: JSON.stringify({{password: attempt}})
            }}).then(function (resp) {{
                if (resp.ok) {{
                    trackClick(id);
                    return resp.json().then(function (body) {{
                        if (body.url) window.open(body.url, '_blank');
                    }});
                }}
                var err = document.getElementById('err-' + id);
                if (err) err.textContent = 'Incorrect password';
            }}).catch(function () {{}});
            return false;
        }}
    </script>
</body>
</html>"#,
        name = html_escape(&profile.name),
        subtitle = html_escape(&profile.subtitle),
        location = html_escape(&profile.location),
        bio = html_escape(&profile.bio),
        font = html_escape(&theme.font),
        bg = html_escape(&theme.background_color),
        fg = html_escape(&theme.primary_color),
        favicon = favicon,
        pixels = render_pixels(doc),
        wallpaper = wallpaper,
        video_bg = video_bg,
        avatar = avatar,
        blocks = blocks_html,
    )
}
