use scraper::{ElementRef, Html};
use urlencoding::encode;

use super::html::{absolutize, selector, text_of};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const BASE_URL: &str = "https://www.jobagent.ch";

/// Category slugs crawled when no category is given, one page each
pub const CATEGORIES: [&str; 17] = [
    "administration-verwaltung",
    "banken-versicherungen",
    "bau-handwerk-immobilien",
    "gastro-hotellerie-tourismus",
    "informatik",
    "marketing-kommunikation-medien",
    "medizin-gesundheitswesen",
    "non-profit-soziales-bildung",
    "finanz-und-rechnungswesen",
    "personal-organisation-bildung",
    "planung-design",
    "produktion-operations",
    "recht-beratung",
    "schutz-sicherheit",
    "transport-verkehr",
    "verkauf-einkauf-kundenberatung",
    "diverse",
];

/// jobagent.ch is browsed by category; the keyword is the category slug and
/// the location is not supported by the site.
pub struct JobAgent;

impl Collector for JobAgent {
    fn source(&self) -> Source {
        Source::JobAgent
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String> {
        if query.keyword.is_empty() {
            let slug = CATEGORIES.get(usize::try_from(page).ok()?.checked_sub(1)?)?;
            return Some(format!("{BASE_URL}/{slug}-jobs"));
        }
        Some(format!("{BASE_URL}/{}-jobs?page={page}", encode(&query.keyword)))
    }

    fn extract(&self, html: &str, _query: &SearchQuery) -> Vec<Posting> {
        let document = Html::parse_document(html);
        let link_selector = selector("a[href*='/job/']");

        document
            .select(&link_selector)
            .filter_map(|anchor| {
                let title = text_of(anchor);
                if title.is_empty() {
                    return None;
                }
                let link = absolutize(BASE_URL, anchor.value().attr("href")?)?;
                let (location, company) = location_and_company(anchor, &title);

                Some(Posting {
                    title,
                    company,
                    location,
                    link,
                    description: String::new(),
                })
            })
            .collect()
    }

    fn stops_on_empty_page(&self, query: &SearchQuery) -> bool {
        !query.keyword.is_empty()
    }
}

/// Listing rows read "<title> <location> <company...>"
fn location_and_company(anchor: ElementRef<'_>, title: &str) -> (String, String) {
    let Some(parent) = anchor.parent().and_then(ElementRef::wrap) else {
        return Default::default();
    };
    let row = text_of(parent);
    let Some((_, remainder)) = row.split_once(title) else {
        return Default::default();
    };

    let pieces: Vec<&str> = remainder.split_whitespace().collect();
    match pieces.as_slice() {
        [location, company @ ..] if !company.is_empty() => (location.to_string(), company.join(" ")),
        _ => Default::default(),
    }
}
