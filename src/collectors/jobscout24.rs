use scraper::Html;
use urlencoding::encode;

use super::html::{absolutize, selector, text_of};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const BASE_URL: &str = "https://www.jobscout24.ch";

pub struct JobScout24;

impl Collector for JobScout24 {
    fn source(&self) -> Source {
        Source::JobScout24
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String> {
        Some(format!(
            "{BASE_URL}/en/jobs?term={}&location={}&page={page}",
            encode(&query.keyword),
            encode(&query.location)
        ))
    }

    fn extract(&self, html: &str, query: &SearchQuery) -> Vec<Posting> {
        let document = Html::parse_document(html);
        let link_selector = selector("a[href*='/en/job/']");

        document
            .select(&link_selector)
            .filter_map(|card| {
                let title = text_of(card);
                if title.is_empty() {
                    return None;
                }
                Some(Posting {
                    title,
                    company: String::new(),
                    location: query.location.clone(),
                    link: absolutize(BASE_URL, card.value().attr("href")?)?,
                    description: String::new(),
                })
            })
            .collect()
    }
}
