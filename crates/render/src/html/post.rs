//! Post pass over the finished fragment.
//!
//! Links and images written as raw HTML by authors get the same decoration
//! as markdown ones. Elements that already carry `target` or `loading` are
//! left alone, which also skips everything the inline pass produced.

use std::borrow::Cow;

use lol_html::html_content::ContentType;
use lol_html::{ElementContentHandlers, RewriteStrSettings, Selector, element, rewrite_str};

use mdpress_core::PressError;

use crate::inline::{EXTERNAL_ICON, is_external};

type Handler = (Cow<'static, Selector>, ElementContentHandlers<'static>);

/// Decorates raw `<a>` and `<img>` elements.
pub fn decorate(html: &str) -> Result<String, PressError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![external_link_handler(), image_handler()],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| PressError::Rewrite(e.to_string()))
}

fn external_link_handler() -> Handler {
    element!("a[href]", |el| {
        let href = el.get_attribute("href").unwrap_or_default();
        if !is_external(&href) || el.has_attribute("target") {
            return Ok(());
        }
        el.set_attribute("target", "_blank")?;
        el.set_attribute("rel", "noreferrer noopener")?;
        el.append(EXTERNAL_ICON, ContentType::Html);
        Ok(())
    })
}

fn image_handler() -> Handler {
    element!("img", |el| {
        if el.has_attribute("loading") {
            return Ok(());
        }
        el.set_attribute("loading", "lazy")?;
        if !el.has_attribute("decoding") {
            el.set_attribute("decoding", "async")?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_external_link_is_decorated() {
        let html = decorate(r#"<p><a href="https://example.com">x</a></p>"#).unwrap();
        assert!(html.starts_with(
            r#"<p><a href="https://example.com" target="_blank" rel="noreferrer noopener">x<svg class="external-link-icon""#
        ));
        assert!(html.ends_with("</svg></a></p>"));
    }

    #[test]
    fn internal_and_decorated_links_are_untouched() {
        let cases = [
            r#"<a href="/guide/">g</a>"#,
            r#"<a href="https://x.dev" target="_self">x</a>"#,
            r#"<img src="/a.png" alt="" loading="eager">"#,
            r#"<pre><code>&lt;a href="https://x.dev"&gt;</code></pre>"#,
        ];
        for input in cases {
            assert_eq!(decorate(input).unwrap(), input, "input: {:?}", input);
        }
    }

    #[test]
    fn raw_image_gets_lazy_loading() {
        assert_eq!(
            decorate(r#"<img src="/cat.png" alt="cat">"#).unwrap(),
            r#"<img src="/cat.png" alt="cat" loading="lazy" decoding="async">"#
        );
    }
}
