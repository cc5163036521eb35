use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::record::{normalize_text, truncate_description};

/// Parse a selector that is a compile-time constant of this crate
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static CSS selector is valid")
}

/// Whitespace-normalized text content of an element
pub fn text_of(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first descendant of `element` matching `selector`, or empty
pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element.select(selector).next().map(text_of).unwrap_or_default()
}

/// Resolve `href` against `base`; `None` for empty or unparseable links
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = Url::parse(base).ok()?;
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Closest ancestor of `element` with the given tag name
pub fn ancestor_named<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == name)
}

const DESCRIPTION_SELECTORS: [&str; 5] = [
    "[data-testid='job-description']",
    ".job-description",
    "#job-description",
    "article",
    "main",
];

/// Shorter matches are navigation stubs, not descriptions
const MIN_DESCRIPTION_CHARS: usize = 200;

/// Pull the description out of a posting's detail page
///
/// Tries the known description containers in order and returns the first
/// whose text is long enough, truncated to `max_len` characters.
pub fn extract_description(html: &str, max_len: usize) -> String {
    let document = Html::parse_document(html);

    for css in DESCRIPTION_SELECTORS {
        let Ok(sel) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = document.select(&sel).next() {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if text.chars().count() > MIN_DESCRIPTION_CHARS {
                return truncate_description(text, max_len);
            }
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_handles_relative_and_absolute_links() {
        assert_eq!(
            absolutize("https://www.jobs.ch", "/en/vacancies/detail/123/").as_deref(),
            Some("https://www.jobs.ch/en/vacancies/detail/123/")
        );
        assert_eq!(
            absolutize("https://www.jobs.ch", "https://other.ch/job/1").as_deref(),
            Some("https://other.ch/job/1")
        );
        assert_eq!(absolutize("https://www.jobs.ch", "  "), None);
        assert_eq!(absolutize("https://www.jobs.ch", "mailto:hr@acme.ch"), None);
    }

    #[test]
    fn description_prefers_specific_containers() {
        let body = "Lorem ipsum dolor sit amet. ".repeat(10);
        let html = format!(
            "<main><nav>Menu</nav><div class='job-description'>{body}</div></main>"
        );

        let description = extract_description(&html, 5000);
        assert_eq!(description, body.trim());
    }

    #[test]
    fn short_description_candidates_are_ignored() {
        let html = "<article>Too short</article>";
        assert_eq!(extract_description(html, 5000), "");
    }

    #[test]
    fn description_is_truncated() {
        let html = format!("<article>{}</article>", "x".repeat(400));
        assert_eq!(extract_description(&html, 250).len(), 250);
    }

    #[test]
    fn finds_enclosing_article() {
        let document = Html::parse_fragment("<article id='card'><div><a href='/x'>X</a></div></article>");
        let link = document.select(&selector("a")).next().unwrap();
        let article = ancestor_named(link, "article").unwrap();
        assert_eq!(article.value().attr("id"), Some("card"));
    }
}
