use scraper::Html;
use urlencoding::encode;

use super::html::{absolutize, first_text, selector, text_of};
use super::{Collector, Posting, SearchQuery};
use crate::record::Source;

const BASE_URL: &str = "https://www.careerjet.ch";

pub struct CareerJet;

impl Collector for CareerJet {
    fn source(&self) -> Source {
        Source::CareerJet
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String> {
        Some(format!(
            "{BASE_URL}/jobs?s={}&l={}&p={page}",
            encode(&query.keyword),
            encode(&query.location)
        ))
    }

    fn extract(&self, html: &str, _query: &SearchQuery) -> Vec<Posting> {
        let document = Html::parse_document(html);
        let card_selector = selector("article.job");
        let title_selector = selector("h2 a");
        let company_selector = selector(".company");
        let location_selector = selector(".location");

        document
            .select(&card_selector)
            .filter_map(|card| {
                let anchor = card.select(&title_selector).next()?;
                let title = text_of(anchor);
                if title.is_empty() {
                    return None;
                }

                Some(Posting {
                    title,
                    company: first_text(card, &company_selector),
                    location: first_text(card, &location_selector),
                    link: absolutize(BASE_URL, anchor.value().attr("href")?)?,
                    description: String::new(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_article_cards() {
        let html = r#"
            <ul class="jobs">
              <li><article class="job clicky">
                <header><h2><a href="/jobad/ch8f1e">Pflegefachperson HF</a></h2></header>
                <p class="company">Inselspital</p>
                <ul class="location"><li>Bern</li></ul>
              </article></li>
              <li><article class="job">
                <h2><a href="https://www.careerjet.ch/jobad/ch9a2b">Koch/Köchin</a></h2>
              </article></li>
              <li><article class="job"><h2>No anchor</h2></article></li>
            </ul>"#;

        let postings = CareerJet.extract(html, &SearchQuery::default());

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].title, "Pflegefachperson HF");
        assert_eq!(postings[0].company, "Inselspital");
        assert_eq!(postings[0].location, "Bern");
        assert_eq!(postings[0].link, "https://www.careerjet.ch/jobad/ch8f1e");
        assert_eq!(postings[1].title, "Koch/Köchin");
        assert_eq!(postings[1].location, "");
    }

    #[test]
    fn builds_page_url() {
        assert_eq!(
            CareerJet.page_url(&SearchQuery::new("koch", "Bern"), 1).as_deref(),
            Some("https://www.careerjet.ch/jobs?s=koch&l=Bern&p=1")
        );
    }
}
