//! Builds the adjective index from the "List of animal names" tables.

use bestiary_core::AdjectiveIndex;
use bestiary_core::normalize::{normalize_name, strip_citations};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{Result, ScrapeError};

const ANIMAL_HEADER: &str = "animal";
const ADJECTIVE_HEADER: &str = "collateral adjective";

static ADJECTIVE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;,/]| and ").expect("valid regex"));

/// Splits an adjective cell ("bovine; taurine[3]") into lowercase adjectives.
pub fn split_adjectives(text: &str) -> Vec<String> {
    let text = strip_citations(text);
    ADJECTIVE_SPLIT_RE
        .split(&text)
        .map(|adj| adj.trim().to_lowercase())
        .filter(|adj| !adj.is_empty())
        .collect()
}

pub fn extract_adjective_index(html: &str) -> Result<AdjectiveIndex> {
    let document = Html::parse_document(html);
    let table_selector = parse_selector("table.wikitable")?;
    let row_selector = parse_selector("tr")?;
    let th_selector = parse_selector("th")?;
    let td_selector = parse_selector("td")?;

    let mut index = AdjectiveIndex::new();

    for table in document.select(&table_selector) {
        let mut rows = table.select(&row_selector);
        let Some(header_row) = rows.next() else {
            continue;
        };
        let headers: Vec<String> = header_row
            .select(&th_selector)
            .map(|th| th.text().collect::<String>().trim().to_lowercase())
            .collect();
        let (Some(animal_idx), Some(adj_idx)) = (
            headers.iter().position(|h| h == ANIMAL_HEADER),
            headers.iter().position(|h| h == ADJECTIVE_HEADER),
        ) else {
            debug!(?headers, "skipping table without animal/adjective columns");
            continue;
        };

        for row in rows {
            let cells: Vec<ElementRef> = row.select(&td_selector).collect();
            if cells.len() <= animal_idx.max(adj_idx) {
                continue;
            }

            let animal = normalize_name(&cells[animal_idx].text().collect::<String>());
            if animal.is_empty() {
                continue;
            }
            let adjective_text = cells[adj_idx]
                .text()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" / ");

            for adjective in split_adjectives(&adjective_text) {
                index.insert(&adjective, animal.clone());
            }
        }
    }

    Ok(index)
}

fn parse_selector(input: &str) -> Result<Selector> {
    Selector::parse(input).map_err(|e| ScrapeError::Parse(format!("invalid selector {input}: {e}")))
}
