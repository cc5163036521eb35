use scraper::Html;
use urlencoding::encode;

use super::html::{absolutize, first_text, selector};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const BASE_URL: &str = "https://ch.indeed.com";
const RESULTS_PER_PAGE: u32 = 10;

pub struct Indeed;

impl Collector for Indeed {
    fn source(&self) -> Source {
        Source::Indeed
    }

    /// Indeed pages by result offset rather than page number
    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String> {
        let start = page.saturating_sub(1) * RESULTS_PER_PAGE;
        let mut url = format!("{BASE_URL}/jobs?q={}&start={start}", encode(&query.keyword));
        if !query.location.is_empty() {
            url.push_str(&format!("&l={}", encode(&query.location)));
        }
        Some(url)
    }

    fn extract(&self, html: &str, _query: &SearchQuery) -> Vec<Posting> {
        let document = Html::parse_document(html);
        let card_selector = selector("div.job_seen_beacon");
        let title_selector = selector("h2 a span");
        let link_selector = selector("h2 a");
        let company_selector = selector("[data-testid='company-name']");
        let location_selector = selector("[data-testid='text-location']");

        document
            .select(&card_selector)
            .filter_map(|card| {
                let title = first_text(card, &title_selector);
                if title.is_empty() {
                    return None;
                }
                let href = card.select(&link_selector).next()?.value().attr("href")?;

                Some(Posting {
                    title,
                    company: first_text(card, &company_selector),
                    location: first_text(card, &location_selector),
                    link: absolutize(BASE_URL, href)?,
                    description: String::new(),
                })
            })
            .collect()
    }
}
