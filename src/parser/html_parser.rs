// Selector-driven parsing for markup job boards
use crate::config::HtmlSelectors;
use crate::model::{ParseError, ParsedPage, RawPayload, ScrapeError, Vacancy};
use crate::parser::{structure_mismatch, SourceParser};
use crate::utils::{clean_text, resolve_url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;

pub struct HtmlParser {
    source_id: String,
    base_url: String,
    container_raw: String,
    url_attr: String,
    container: Selector,
    item: Selector,
    title: Selector,
    url: Selector,
    location: Option<Selector>,
    description: Option<Selector>,
    company: Option<Selector>,
    total_pages: Option<Selector>,
    detail_description: Option<Selector>,
}

impl HtmlParser {
    pub fn new(source_id: &str, base_url: &str, selectors: &HtmlSelectors) -> Result<Self, ScrapeError> {
        let compile = |css: &str| {
            Selector::parse(css).map_err(|e| ScrapeError::InvalidSource {
                source_id: source_id.to_string(),
                reason: format!("invalid selector `{}`: {}", css, e),
            })
        };
        let compile_opt = |css: &Option<String>| css.as_deref().map(compile).transpose();

        Ok(Self {
            source_id: source_id.to_string(),
            base_url: base_url.to_string(),
            container_raw: selectors.container.clone(),
            url_attr: selectors.url_attr.clone(),
            container: compile(&selectors.container)?,
            item: compile(&selectors.item)?,
            title: compile(&selectors.title)?,
            url: compile(&selectors.url)?,
            location: compile_opt(&selectors.location)?,
            description: compile_opt(&selectors.description)?,
            company: compile_opt(&selectors.company)?,
            total_pages: compile_opt(&selectors.total_pages)?,
            detail_description: compile_opt(&selectors.detail_description)?,
        })
    }

    fn parse_item(&self, item: ElementRef) -> Option<Vacancy> {
        let title_node = item.select(&self.title).next()?;
        let mut title = element_text(title_node);
        if title.is_empty() {
            title = clean_text(title_node.value().attr("title").unwrap_or_default());
        }
        if title.is_empty() {
            return None;
        }

        let href = item
            .select(&self.url)
            .next()
            .and_then(|node| node.value().attr(&self.url_attr))?;
        let url = resolve_url(&self.base_url, href)?;

        let mut vacancy = Vacancy::new(title, url, &self.source_id);
        vacancy.location = self.optional_text(item, &self.location);
        vacancy.description = self.optional_text(item, &self.description);
        vacancy.company = self.optional_text(item, &self.company);
        Some(vacancy)
    }

    fn optional_text(&self, item: ElementRef, selector: &Option<Selector>) -> String {
        selector
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map(element_text)
            .unwrap_or_default()
    }

    /// Largest page number among the pagination links.
    fn declared_pages(&self, document: &Html) -> Option<u32> {
        let selector = self.total_pages.as_ref()?;
        document
            .select(selector)
            .filter_map(|node| element_text(node).parse::<u32>().ok())
            .max()
    }
}

fn element_text(node: ElementRef) -> String {
    clean_text(&node.text().collect::<String>())
}

impl SourceParser for HtmlParser {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn parse(&self, payload: &RawPayload) -> Result<ParsedPage, ParseError> {
        let document = Html::parse_document(&payload.body);

        let containers: Vec<ElementRef> = document.select(&self.container).collect();
        if containers.is_empty() {
            return Err(structure_mismatch(
                &self.source_id,
                format!("listings container `{}`", self.container_raw),
                &format!("no match in {}", payload.url),
            ));
        }

        let mut page = ParsedPage {
            total_pages: self.declared_pages(&document),
            ..Default::default()
        };

        // Nested containers select the same item more than once.
        let mut seen = HashSet::new();
        let items = containers
            .iter()
            .flat_map(|c| c.select(&self.item))
            .filter(|item| seen.insert(item.id()));

        for item in items {
            page.fragments += 1;
            match self.parse_item(item) {
                Some(vacancy) => page.vacancies.push(vacancy),
                None => {
                    page.skipped += 1;
                    debug!("[{}] skipped listing without title or link", self.source_id);
                }
            }
        }

        Ok(page)
    }

    fn parse_detail(&self, payload: &RawPayload) -> Option<String> {
        let selector = self.detail_description.as_ref()?;
        let document = Html::parse_document(&payload.body);
        let text = document
            .select(selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }

    fn has_detail_pages(&self) -> bool {
        self.detail_description.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> HtmlSelectors {
        HtmlSelectors {
            container: "div.results".to_string(),
            item: "article.job".to_string(),
            title: "h2".to_string(),
            url: "a.link".to_string(),
            url_attr: "href".to_string(),
            location: Some(".place".to_string()),
            description: Some(".teaser".to_string()),
            company: Some(".company".to_string()),
            total_pages: Some("ul.pagination a".to_string()),
            detail_description: Some("div#content".to_string()),
        }
    }

    fn parser() -> HtmlParser {
        HtmlParser::new("board", "https://board.example", &selectors()).expect("valid selectors")
    }

    fn payload(body: &str) -> RawPayload {
        RawPayload {
            url: "https://board.example/vacatures".to_string(),
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_listing_page() {
        let html = r#"
            <div class="results">
                <article class="job">
                    <h2>  Java   Developer </h2>
                    <a class="link" href="/vacature/1">Bekijk</a>
                    <span class="place">Utrecht</span>
                    <span class="company">Ordina</span>
                    <p class="teaser">Spring Boot and Kotlin</p>
                </article>
                <article class="job">
                    <h2>Tester</h2>
                    <a class="link" href="https://other.example/jobs/2#top">Bekijk</a>
                </article>
            </div>
            <ul class="pagination"><li><a>1</a></li><li><a>2</a></li><li><a>7</a></li><li><a>Volgende</a></li></ul>
        "#;

        let page = parser().parse(&payload(html)).expect("parse should succeed");

        assert_eq!(page.vacancies.len(), 2);
        assert_eq!(page.skipped, 0);
        assert_eq!(page.total_pages, Some(7));

        let first = &page.vacancies[0];
        assert_eq!(first.title, "Java Developer");
        assert_eq!(first.url, "https://board.example/vacature/1");
        assert_eq!(first.location, "Utrecht");
        assert_eq!(first.company, "Ordina");
        assert_eq!(first.broker, "board");

        let second = &page.vacancies[1];
        assert_eq!(second.url, "https://other.example/jobs/2");
        assert_eq!(second.location, "");
        assert_eq!(second.description, "");
    }

    #[test]
    fn test_fragment_without_link_is_skipped() {
        let html = r#"
            <div class="results">
                <article class="job"><h2>No link here</h2></article>
                <article class="job"><h2>Kept</h2><a class="link" href="/vacature/3">x</a></article>
                <article class="job"><h2></h2><a class="link" href="/vacature/4">x</a></article>
            </div>
        "#;

        let page = parser().parse(&payload(html)).expect("parse should succeed");

        assert_eq!(page.vacancies.len(), 1);
        assert_eq!(page.vacancies[0].title, "Kept");
        assert_eq!(page.skipped, 2);
        assert_eq!(page.fragments, 3);
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn test_nested_containers_count_each_fragment_once() {
        let html = r#"
            <div class="results">
                <div class="results">
                    <article class="job"><h2>No link here</h2></article>
                    <article class="job"><h2>Kept</h2><a class="link" href="/vacature/5">x</a></article>
                </div>
            </div>
        "#;

        let page = parser().parse(&payload(html)).expect("parse should succeed");

        assert_eq!(page.fragments, 2);
        assert_eq!(page.skipped, 1);
        assert_eq!(page.vacancies.len(), 1);
    }

    #[test]
    fn test_missing_container_is_structure_mismatch() {
        let html = r#"<html><body><div class="redesigned"><article class="job"></article></div></body></html>"#;

        let err = parser().parse(&payload(html)).unwrap_err();
        let ParseError::StructureMismatch { source_id, expected, .. } = err;
        assert_eq!(source_id, "board");
        assert!(expected.contains("div.results"));
    }

    #[test]
    fn test_empty_container_is_empty_page() {
        let page = parser()
            .parse(&payload(r#"<div class="results"></div>"#))
            .expect("empty container is a valid page");
        assert!(page.vacancies.is_empty());
        assert_eq!(page.fragments, 0);
    }

    #[test]
    fn test_parse_detail_description() {
        let detail = payload(r#"<div id="content">
            <p>We zoeken een</p>
            <p>Java developer</p>
        </div>"#);
        assert_eq!(
            parser().parse_detail(&detail).as_deref(),
            Some("We zoeken een Java developer")
        );
        assert_eq!(parser().parse_detail(&payload("<p>nothing</p>")), None);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut bad = selectors();
        bad.item = "article[".to_string();
        assert!(HtmlParser::new("board", "https://board.example", &bad).is_err());
    }
}
