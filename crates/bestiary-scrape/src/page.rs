//! Classification of a single fetched reference page.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};

/// Words whose presence in an info box marks it as a taxonomy box.
const TAXONOMY_RANKS: &[&str] = &["Kingdom", "Phylum", "Species"];

/// Words a link's title must contain (lowercase) to be worth following.
const RELEVANCE_KEYWORDS: &[&str] = &["animal", "bird", "mammal", "fish", "species", "genus"];

const DISAMBIGUATION_PHRASE: &str = "may refer to:";
const DISAMBIGUATION_WINDOW: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageClass {
    /// The page lists several subjects.
    Disambiguation,
    /// `src` of the first image in a taxonomy info box.
    Image(String),
    /// Title of the first relevant article link.
    Link(String),
    NoContent,
}

/// Page identifier used in `/wiki/{id}` URLs: spaces become `_`, everything
/// except unreserved characters and `/` is percent-encoded.
pub fn page_identifier(title: &str) -> String {
    urlencoding::encode(&title.replace(' ', "_")).replace("%2F", "/")
}

pub fn classify_page(html: &str) -> Result<PageClass> {
    let document = Html::parse_document(html);

    if is_disambiguation(&document)? {
        return Ok(PageClass::Disambiguation);
    }

    if let Some(infobox) = find_infobox(&document)? {
        let text: String = infobox.text().collect();
        if TAXONOMY_RANKS.iter().any(|rank| text.contains(rank)) {
            let img_selector = parse_selector("img[src]")?;
            if let Some(src) = infobox
                .select(&img_selector)
                .next()
                .and_then(|img| img.value().attr("src"))
            {
                return Ok(PageClass::Image(src.to_string()));
            }
        }
    }

    Ok(first_relevant_link(&document)?
        .map(PageClass::Link)
        .unwrap_or(PageClass::NoContent))
}

fn is_disambiguation(document: &Html) -> Result<bool> {
    let marker = parse_selector("table#disambigbox")?;
    if document.select(&marker).next().is_some() {
        return Ok(true);
    }
    let leading: String = document
        .root_element()
        .text()
        .flat_map(str::chars)
        .take(DISAMBIGUATION_WINDOW)
        .collect();
    Ok(leading.contains(DISAMBIGUATION_PHRASE))
}

fn find_infobox(document: &Html) -> Result<Option<ElementRef<'_>>> {
    let biota = parse_selector("table.infobox.biota")?;
    if let Some(table) = document.select(&biota).next() {
        return Ok(Some(table));
    }
    let generic = parse_selector("table.infobox")?;
    Ok(document.select(&generic).next())
}

fn first_relevant_link(document: &Html) -> Result<Option<String>> {
    let content_selector = parse_selector("div.mw-parser-output")?;
    let link_selector = parse_selector("a[href]")?;

    let Some(content) = document.select(&content_selector).next() else {
        return Ok(None);
    };

    for link in content.select(&link_selector) {
        let href = link.value().attr("href").unwrap_or_default();
        let title = link.value().attr("title").unwrap_or_default().to_lowercase();
        if is_article_href(href) && RELEVANCE_KEYWORDS.iter().any(|k| title.contains(k)) {
            return Ok(Some(link_target_title(href)));
        }
    }
    Ok(None)
}

fn is_article_href(href: &str) -> bool {
    href.starts_with("/wiki/") && ![":", "#", "Main_Page"].iter().any(|x| href.contains(x))
}

/// `/wiki/Bos_taurus` → `Bos taurus`.
fn link_target_title(href: &str) -> String {
    let raw = href.strip_prefix("/wiki/").unwrap_or(href);
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    decoded.replace('_', " ")
}

fn parse_selector(input: &str) -> Result<Selector> {
    Selector::parse(input).map_err(|e| ScrapeError::Parse(format!("invalid selector {input}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAXOBOX: &str = r#"<html><body><div class="mw-parser-output">
        <table class="infobox biota"><tr><td><img src="//upload.example/cattle.jpg"></td></tr>
        <tr><td>Kingdom: Animalia</td></tr><tr><td>Species: B. taurus</td></tr></table>
        <p>Cattle are <a href="/wiki/Bovinae" title="Bovinae subfamily of mammal">bovines</a>.</p>
        </div></body></html>"#;

    #[test]
    fn test_page_identifier() {
        assert_eq!(page_identifier("Red fox"), "Red_fox");
        assert_eq!(page_identifier("ass/donkey"), "ass/donkey");
        assert_eq!(page_identifier("Père David's deer"), "P%C3%A8re_David%27s_deer");
    }

    #[test]
    fn test_taxobox_image_found() {
        assert_eq!(
            classify_page(TAXOBOX).unwrap(),
            PageClass::Image("//upload.example/cattle.jpg".to_string())
        );
    }

    #[test]
    fn test_generic_infobox_needs_rank_keyword() {
        let html = r#"<html><body><div class="mw-parser-output">
            <table class="infobox"><tr><td><img src="/logo.png"></td></tr><tr><td>Founded 1901</td></tr></table>
            </div></body></html>"#;
        assert_eq!(classify_page(html).unwrap(), PageClass::NoContent);

        let html = r#"<html><body><div class="mw-parser-output">
            <table class="infobox"><tr><td><img src="/horse.png"></td></tr><tr><td>Phylum: Chordata</td></tr></table>
            </div></body></html>"#;
        assert_eq!(classify_page(html).unwrap(), PageClass::Image("/horse.png".to_string()));
    }

    #[test]
    fn test_disambiguation_box_rejected_despite_image() {
        let html = r#"<html><body><div class="mw-parser-output">
            <table class="infobox biota"><tr><td><img src="/jaguar.jpg"></td></tr><tr><td>Kingdom: Animalia</td></tr></table>
            <table id="disambigbox"><tr><td>disambiguation</td></tr></table>
            </div></body></html>"#;
        assert_eq!(classify_page(html).unwrap(), PageClass::Disambiguation);
    }

    #[test]
    fn test_disambiguation_phrase_only_counts_near_top() {
        let html = r#"<html><body><p>Jaguar may refer to:</p>
            <table class="infobox biota"><tr><td><img src="/jaguar.jpg"></td></tr><tr><td>Kingdom</td></tr></table>
            </body></html>"#;
        assert_eq!(classify_page(html).unwrap(), PageClass::Disambiguation);

        let padding = "x".repeat(DISAMBIGUATION_WINDOW);
        let html = format!(
            r#"<html><body><p>{padding}</p><p>may refer to:</p>
            <table class="infobox biota"><tr><td><img src="/jaguar.jpg"></td></tr><tr><td>Kingdom</td></tr></table>
            </body></html>"#
        );
        assert_eq!(classify_page(&html).unwrap(), PageClass::Image("/jaguar.jpg".to_string()));
    }

    #[test]
    fn test_first_relevant_link_is_followed() {
        let html = r##"<html><body><div class="mw-parser-output">
            <a href="#cite">jump</a>
            <a href="/wiki/Main_Page" title="Main Page animal">home</a>
            <a href="/wiki/File:Cow.jpg" title="animal picture">file</a>
            <a href="https://example.org/wiki/Cow" title="animal">external</a>
            <a href="/wiki/Pasture" title="Pasture">grass</a>
            <a href="/wiki/Bos_taurus" title="Bos taurus (species)">cow</a>
            <a href="/wiki/Zebu" title="Zebu species">zebu</a>
            </div></body></html>"##;
        assert_eq!(classify_page(html).unwrap(), PageClass::Link("Bos taurus".to_string()));
    }

    #[test]
    fn test_links_outside_content_are_ignored() {
        let html = r#"<html><body>
            <nav><a href="/wiki/Bird" title="Bird">nav</a></nav>
            <div class="mw-parser-output"><p>Nothing here.</p></div>
            </body></html>"#;
        assert_eq!(classify_page(html).unwrap(), PageClass::NoContent);
    }

    #[test]
    fn test_link_target_is_percent_decoded() {
        assert_eq!(link_target_title("/wiki/P%C3%A8re_David%27s_deer"), "Père David's deer");
    }
}
