use foundation::LonLat;
use formats::StoryProperties;
use url::Url;

use crate::config::PopupConfig;
use crate::sanitize::{EntityDecoder, HtmlEntityDecoder, escape_attribute, escape_text};

const DEFAULT_TITLE: &str = "Story";
const DEFAULT_URL: &str = "#";

/// Builds popup markup from untrusted story properties.
#[derive(Debug, Default, Clone)]
pub struct PopupBuilder<D = HtmlEntityDecoder> {
    decoder: D,
}

impl<D: EntityDecoder> PopupBuilder<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Emits, in order: date, title, optional byline, optional outlet,
    /// optional thumbnail linked to the story, and the "Read story" link.
    ///
    /// Source text may arrive HTML-encoded, so free-text fields are decoded
    /// first and escaped afterwards.
    pub fn build(&self, props: &StoryProperties) -> String {
        let title = self
            .decoder
            .decode(props.title.as_deref().unwrap_or(DEFAULT_TITLE));
        let date = self.decoder.decode_opt(props.date.as_deref());
        let author = self.decoder.decode_opt(props.author.as_deref());
        let outlet = self.decoder.decode_opt(props.outlet.as_deref());
        let url = escape_attribute(props.url.as_deref().unwrap_or(DEFAULT_URL));

        let mut html = String::new();
        html.push_str(&format!(
            r#"<div class="popup-date" style="font-size:12px; font-weight:700; margin:0 0 6px 0;">{}</div>"#,
            escape_text(&date)
        ));
        html.push_str(&format!(
            r#"<div class="popup-title" style="font-size:14px; font-weight:400; margin:0 0 10px 0;">{}</div>"#,
            escape_text(&title)
        ));
        if !author.trim().is_empty() {
            html.push_str(&format!(
                r#"<div class="popup-byline">By {}</div>"#,
                escape_text(author.trim())
            ));
        }
        if !outlet.trim().is_empty() {
            html.push_str(&format!(
                r#"<div class="popup-outlet">Outlet: {}</div>"#,
                escape_text(outlet.trim())
            ));
        }
        if let Some(thumbnail) = props.thumbnail.as_deref().filter(|t| is_remote_image_url(t)) {
            html.push_str(&format!(
                r#"<a class="popup-thumb" href="{url}" target="_blank" rel="noopener noreferrer"><img src="{}" alt="{}" loading="lazy"></a>"#,
                escape_attribute(thumbnail),
                escape_attribute(&title)
            ));
        }
        html.push_str(&format!(
            r#"<a class="popup-link" href="{url}" target="_blank" rel="noopener noreferrer">Read story →</a>"#
        ));
        html
    }
}

/// [`PopupBuilder::build`] with the built-in entity decoder.
pub fn build_popup_html(props: &StoryProperties) -> String {
    PopupBuilder::<HtmlEntityDecoder>::default().build(props)
}

/// True only for absolute `http`/`https` URLs. Relative paths, `data:` URIs
/// and anything unparsable are rejected.
pub fn is_remote_image_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Where to anchor the popup for a feature clicked at `click_lon_deg`: the
/// feature's own coordinate, moved onto the world copy that was clicked.
pub fn popup_anchor(feature: LonLat, click_lon_deg: f64) -> LonLat {
    feature.unwrapped_toward(click_lon_deg)
}

/// Popup offset and the map padding to apply before opening it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupPlacement {
    pub offset_px: f64,
    pub close_button: bool,
    /// Top padding keeping the popup clear of a fixed overlay; zero on wide
    /// viewports.
    pub padding_top_px: f64,
}

impl PopupPlacement {
    pub fn for_viewport(config: &PopupConfig, viewport_width_px: f64, overlay_height_px: f64) -> Self {
        let narrow = viewport_width_px <= config.narrow_viewport_max_px;
        let padding_top_px = if narrow && overlay_height_px.is_finite() {
            overlay_height_px.max(0.0)
        } else {
            0.0
        };
        Self {
            offset_px: config.offset_px,
            close_button: config.close_button,
            padding_top_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PopupPlacement, build_popup_html, is_remote_image_url, popup_anchor};
    use crate::config::PopupConfig;
    use foundation::LonLat;
    use formats::StoryProperties;

    fn props() -> StoryProperties {
        StoryProperties {
            title: Some("Rooftop &amp; river".to_string()),
            date: Some("2020-05-19".to_string()),
            url: Some("https://example.org/s/1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn sections_appear_in_order() {
        let mut p = props();
        p.author = Some("W. Njeri".to_string());
        p.outlet = Some("City Desk".to_string());
        p.thumbnail = Some("https://example.org/t.jpg".to_string());
        let html = build_popup_html(&p);

        let order = [
            "popup-date",
            "popup-title",
            "By W. Njeri",
            "Outlet: City Desk",
            "<img",
            "Read story",
        ]
        .map(|needle| html.find(needle).expect(needle));
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{html}");
    }

    #[test]
    fn defaults_for_missing_fields() {
        let html = build_popup_html(&StoryProperties::default());
        assert!(html.contains(">Story</div>"));
        assert!(html.contains(r##"href="#""##));
        assert!(!html.contains("popup-byline"));
        assert!(!html.contains("popup-outlet"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn blank_author_and_outlet_are_omitted() {
        let mut p = props();
        p.author = Some("   ".to_string());
        p.outlet = Some(String::new());
        let html = build_popup_html(&p);
        assert!(!html.contains("By "));
        assert!(!html.contains("Outlet:"));
    }

    #[test]
    fn decoded_text_is_escaped_again() {
        let mut p = props();
        p.author = Some("&lt;script&gt;alert(1)&lt;/script&gt;".to_string());
        let html = build_popup_html(&p);
        assert!(html.contains("Rooftop &amp; river"));
        assert!(html.contains("By &lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn legacy_entity_in_title_renders_as_one_ampersand() {
        let mut p = props();
        p.title = Some("Tom &amp Jerry".to_string());
        p.author = Some("&hearts; Ana".to_string());
        let html = build_popup_html(&p);
        assert!(html.contains(">Tom &amp; Jerry</div>"), "{html}");
        assert!(!html.contains("&amp;amp"));
        assert!(html.contains("By \u{2665} Ana"));
    }

    #[test]
    fn hostile_url_cannot_break_out_of_attribute() {
        let mut p = props();
        p.url = Some(r#"" onmouseover="x`"#.to_string());
        let html = build_popup_html(&p);
        assert!(html.contains(r#"href="&quot; onmouseover=&quot;x&#096;""#));
    }

    #[test]
    fn thumbnail_needs_absolute_http_url() {
        assert!(is_remote_image_url("http://example.org/a.png"));
        assert!(is_remote_image_url("https://example.org/a.png"));
        assert!(!is_remote_image_url("/img/a.png"));
        assert!(!is_remote_image_url("a.png"));
        assert!(!is_remote_image_url(""));
        assert!(!is_remote_image_url("data:image/png;base64,AAAA"));
        assert!(!is_remote_image_url("javascript:alert(1)"));
        assert!(!is_remote_image_url("ftp://example.org/a.png"));
    }

    #[test]
    fn thumbnail_is_wrapped_in_story_link() {
        let mut p = props();
        p.thumbnail = Some("https://example.org/t.jpg".to_string());
        let html = build_popup_html(&p);
        assert!(html.contains(
            r#"<a class="popup-thumb" href="https://example.org/s/1" target="_blank" rel="noopener noreferrer"><img src="https://example.org/t.jpg" alt="Rooftop &amp; river" loading="lazy"></a>"#
        ));
    }

    #[test]
    fn anchor_follows_clicked_world_copy() {
        assert_eq!(
            popup_anchor(LonLat::new(-179.0, 10.0), 179.0),
            LonLat::new(181.0, 10.0)
        );
        assert_eq!(
            popup_anchor(LonLat::new(12.0, 10.0), 13.0),
            LonLat::new(12.0, 10.0)
        );
    }

    #[test]
    fn narrow_viewports_get_overlay_padding() {
        let config = PopupConfig::default();
        let narrow = PopupPlacement::for_viewport(&config, 480.0, 72.0);
        assert_eq!(narrow.padding_top_px, 72.0);
        assert_eq!(narrow.offset_px, 12.0);
        let wide = PopupPlacement::for_viewport(&config, 1280.0, 72.0);
        assert_eq!(wide.padding_top_px, 0.0);
        let no_overlay = PopupPlacement::for_viewport(&config, 480.0, f64::NAN);
        assert_eq!(no_overlay.padding_top_px, 0.0);
    }
}
