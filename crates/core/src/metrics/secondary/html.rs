//! Structural extraction from the item detail page.
//!
//! The page layout is not a stable contract, so every lookup is a ladder of
//! increasingly loose strategies and every miss is just `None`.
//!
//! Relevant markup (`table.per_table`):
//! ```html
//! <tr><th>PER<span class="bar">l</span>EPS(2024.12)</th>
//!     <td><em id="_per">13.53</em>배<span class="bar">l</span><em id="_eps">4,950</em>원</td></tr>
//! <tr><th>PBR<span class="bar">l</span>BPS (2024.12)</th>
//!     <td><em id="_pbr">1.16</em>배<span class="bar">l</span><em>57,930</em>원</td></tr>
//! ```

use super::Field;
use crate::cascade::{first_some, Strategy};
use crate::normalize::number_text;
use scraper::{ElementRef, Html, Selector};

// Rows that quote sector averages or forecasts instead of the company's own figure.
const EXCLUDED_ROW_MARKERS: [&str; 2] = ["동일업종", "추정"];
const CURRENCY_UNIT: char = '원';
const NEXT_ELEMENT_WINDOW: usize = 8;
const PROXIMITY_WINDOW: usize = 10;

pub fn extract(document: &Html, field: Field) -> Option<f64> {
    let label = field.label();
    let mut strategies = vec![Strategy::new("element_id", move || by_id(document, field.element_id()))];
    if field == Field::Bps {
        strategies.push(Strategy::new("pbr_cell_sibling", move || pbr_cell_sibling(document)));
        strategies.push(Strategy::new("after_pbr_in_document", move || after_pbr_in_document(document)));
    }
    strategies.push(Strategy::new("row_header", move || by_row_header(document, label)));
    if field == Field::Bps {
        strategies.push(Strategy::new("currency_near_label", move || {
            currency_near_label(document, label)
        }));
    }
    first_some(label, &strategies)
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn is_leaf(el: ElementRef<'_>) -> bool {
    !el.children().any(|c| c.value().is_element())
}

fn by_id(document: &Html, id: &str) -> Option<f64> {
    let sel = selector(&format!("#{id}"))?;
    document
        .select(&sel)
        .next()
        .and_then(|el| number_text(&text_of(el)))
}

fn pbr_element(document: &Html) -> Option<ElementRef<'_>> {
    let sel = selector(&format!("#{}", Field::Pbr.element_id()))?;
    document.select(&sel).next()
}

/// Second numeric leaf inside the table cell that holds the PBR element.
fn pbr_cell_sibling(document: &Html) -> Option<f64> {
    let pbr = pbr_element(document)?;
    let cell = pbr
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")?;

    let leaf_sel = selector("*")?;
    cell.select(&leaf_sel)
        .filter(|el| is_leaf(*el))
        .filter_map(|el| number_text(&text_of(el)))
        .nth(1)
}

/// First numeric leaf element following the PBR element in document order.
fn after_pbr_in_document(document: &Html) -> Option<f64> {
    let pbr = pbr_element(document)?;
    let all = selector("*")?;
    document
        .select(&all)
        .skip_while(|el| *el != pbr)
        .skip(1)
        .filter(|el| is_leaf(*el))
        .take(NEXT_ELEMENT_WINDOW)
        .find_map(|el| number_text(&text_of(el)))
}

/// Row whose header names `label`; picks the value at the label's position when the
/// header lists several metrics (`PBR l BPS`).
fn by_row_header(document: &Html, label: &str) -> Option<f64> {
    let tr_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;
    let em_sel = selector("em")?;

    for tr in document.select(&tr_sel) {
        let header = tr
            .select(&th_sel)
            .flat_map(|th| th.text())
            .collect::<Vec<_>>()
            .join(" ");
        if EXCLUDED_ROW_MARKERS.iter().any(|m| header.contains(m)) {
            continue;
        }
        let labels = header_labels(&header);
        let Some(position) = labels.iter().position(|l| *l == label) else {
            continue;
        };

        if labels.len() <= 1 {
            if let Some(v) = latest_actual_cell(tr, &td_sel) {
                return Some(v);
            }
        }

        let mut values: Vec<f64> = tr
            .select(&td_sel)
            .flat_map(|td| td.select(&em_sel))
            .filter_map(|em| number_text(&text_of(em)))
            .collect();
        if values.is_empty() {
            values = tr
                .select(&td_sel)
                .filter_map(|td| number_text(&text_of(td)))
                .collect();
        }

        let value = if labels.len() <= 1 {
            values.first()
        } else {
            values.get(position)
        };
        if let Some(v) = value {
            return Some(*v);
        }
    }
    None
}

/// Value in the right-most column headed by a reported period (`2024.12`), skipping
/// estimate columns (`2025.12(E)`). `None` when the table has no period headers.
fn latest_actual_cell(tr: ElementRef<'_>, td_sel: &Selector) -> Option<f64> {
    let table = tr
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")?;
    let head_sel = selector("thead th")?;

    let periods: Vec<bool> = table
        .select(&head_sel)
        .map(|th| text_of(th).trim().to_string())
        .filter(|t| t.len() >= 4 && t.chars().take(4).all(|c| c.is_ascii_digit()))
        .map(|t| !t.contains("(E)"))
        .collect();
    if periods.is_empty() {
        return None;
    }

    let cells: Vec<Option<f64>> = tr.select(td_sel).map(|td| number_text(&text_of(td))).collect();
    periods
        .iter()
        .zip(cells)
        .filter_map(|(actual, value)| if *actual { value } else { None })
        .last()
}

/// Upper-case ASCII metric names in a header, in order: `"PBR l BPS (2024.12)"` -> `[PBR, BPS]`.
fn header_labels(header: &str) -> Vec<&str> {
    header
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 2 && t.chars().all(|c| c.is_ascii_uppercase()))
        .collect()
}

/// Scans text nodes after one mentioning `label` for a number carrying the currency unit.
fn currency_near_label(document: &Html, label: &str) -> Option<f64> {
    let nodes: Vec<&str> = document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let start = nodes.iter().position(|t| t.contains(label))?;
    let window = &nodes[start + 1..nodes.len().min(start + 1 + PROXIMITY_WINDOW)];
    window.iter().enumerate().find_map(|(i, node)| {
        let unit_here = node.ends_with(CURRENCY_UNIT);
        let unit_next = window
            .get(i + 1)
            .is_some_and(|next| next.starts_with(CURRENCY_UNIT));
        if !(unit_here || unit_next) || !node.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        number_text(node)
    })
}
