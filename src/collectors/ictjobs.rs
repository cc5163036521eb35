use scraper::Html;
use urlencoding::encode;

use super::html::{absolutize, selector, text_of};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const BASE_URL: &str = "https://ictjobs.ch";

/// ictjobs.ch renders all matches of a free-text search on one page
pub struct IctJobs;

impl Collector for IctJobs {
    fn source(&self) -> Source {
        Source::IctJobs
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String> {
        (page == 1).then(|| format!("{BASE_URL}/?fs={}", encode(&query.keyword)))
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
                Some(Posting {
                    link: absolutize(BASE_URL, anchor.value().attr("href")?)?,
                    description: title.clone(),
                    title,
                    company: String::new(),
                    location: String::new(),
                })
            })
            .collect()
    }
}
