use scraper::Html;
use urlencoding::encode;

use super::html::{absolutize, ancestor_named, first_text, selector, text_of};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const BASE_URL: &str = "https://www.jobs.ch";

pub struct JobsCh;

impl Collector for JobsCh {
    fn source(&self) -> Source {
        Source::JobsCh
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String> {
        Some(format!(
            "{BASE_URL}/en/vacancies/?term={}&location={}&page={page}",
            encode(&query.keyword),
            encode(&query.location)
        ))
    }

    fn extract(&self, html: &str, query: &SearchQuery) -> Vec<Posting> {
        let document = Html::parse_document(html);
        let link_selector = selector("a[data-cy='job-link']");
        let company_selector = selector("[data-cy='company-name']");
        let location_selector = selector("[data-cy='job-location']");

        document
            .select(&link_selector)
            .filter_map(|card| {
                let title = text_of(card);
                let link = absolutize(BASE_URL, card.value().attr("href")?)?;
                if title.is_empty() {
                    return None;
                }

                let article = ancestor_named(card, "article");
                let company = article
                    .map(|a| first_text(a, &company_selector))
                    .unwrap_or_default();
                let location = article
                    .map(|a| first_text(a, &location_selector))
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| query.location.clone());

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
}
