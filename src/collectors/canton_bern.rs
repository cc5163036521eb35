use scraper::Html;

use super::html::{absolutize, selector, text_of};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const EMPLOYER: &str = "Kanton Bern";
const EMPLOYER_LOCATION: &str = "Bern";

const BE_BASE_URL: &str = "https://www.jobs.sites.be.ch";
const BE_PAGES: [&str; 3] = [
    "https://www.jobs.sites.be.ch/de/start/jobs/jobs-fuer-berufserfahrene-berufseinsteigende-und-studierende.html",
    "https://www.jobs.sites.be.ch/de/start/jobs/lehrstellen-und-praktika-fuer-schuelerinnen-und-schueler.html",
    "https://www.jobs.sites.be.ch/de/start/jobs/jobs-fuer-lehrpersonen.html",
];

const STEZE_BASE_URL: &str = "https://www.steze.apps.be.ch";
const STEZE_RESULTS: &str = "https://www.steze.apps.be.ch/steze/results";

/// Canton of Bern job portal; a fixed list of listing pages
pub struct CantonBern;

/// Canton of Bern teaching positions (Stellenbörse Lehrpersonen)
pub struct Steze;

impl Collector for CantonBern {
    fn source(&self) -> Source {
        Source::CantonBern
    }

    fn page_url(&self, _query: &SearchQuery, page: u32) -> Option<String> {
        let index = usize::try_from(page).ok()?.checked_sub(1)?;
        BE_PAGES.get(index).map(|url| url.to_string())
    }

    fn extract(&self, html: &str, _query: &SearchQuery) -> Vec<Posting> {
        job_anchors(html, BE_BASE_URL)
    }

    fn stops_on_empty_page(&self, _query: &SearchQuery) -> bool {
        false
    }
}

impl Collector for Steze {
    fn source(&self) -> Source {
        Source::Steze
    }

    fn page_url(&self, _query: &SearchQuery, page: u32) -> Option<String> {
        (page == 1).then(|| STEZE_RESULTS.to_string())
    }

    fn extract(&self, html: &str, _query: &SearchQuery) -> Vec<Posting> {
        job_anchors(html, STEZE_BASE_URL)
    }
}

/// Every titled anchor whose own href mentions "job"
///
/// The portals have no stable result markup; the href filter is applied
/// before resolving, since the portal host itself contains "jobs".
fn job_anchors(html: &str, base_url: &str) -> Vec<Posting> {
    let document = Html::parse_document(html);
    let anchor_selector = selector("a[href]");

    document
        .select(&anchor_selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if !href.to_lowercase().contains("job") {
                return None;
            }
            let title = text_of(anchor);
            if title.is_empty() {
                return None;
            }

            Some(Posting {
                description: title.clone(),
                title,
                company: EMPLOYER.to_string(),
                location: EMPLOYER_LOCATION.to_string(),
                link: absolutize(base_url, href)?,
            })
        })
        .collect()
}
