//! Holdings page structure: investor headings and their tables.

use super::html::{
    clear_elements, element_span, elements_with_classes, find_open_tag, inner_after_open_tag,
    text_of, to_lower_ascii,
};
use super::ScrapeError;

const TABLE_CLASSES: [&str; 2] = ["v2-show-sm", "inspiration-table"];
const INVESTOR_CLASS: &str = "highlight";
const DESCRIPTION_CLASS: &str = "instrument__description-name";

/// One table row as text, before any number parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub instrument: String,
    pub quantity: String,
    pub opening_price: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestorTable {
    pub investor: String,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    instrument: usize,
    quantity: usize,
    opening_price: usize,
}

impl Columns {
    /// Layout used when a table has no recognisable header.
    const POSITIONAL: Columns = Columns {
        instrument: 0,
        quantity: 1,
        opening_price: 2,
    };

    fn from_header(cells: &[String]) -> Result<Option<Columns>, &'static str> {
        let find = |names: &[&str]| {
            cells.iter().position(|c| {
                let lc = c.to_lowercase();
                names.iter().any(|n| lc.contains(n))
            })
        };
        let instrument = find(&["instrument"]);
        let quantity = find(&["antal"]);
        let opening_price = find(&["åbningspris", "abningspris"]);
        match (instrument, quantity, opening_price) {
            (None, None, None) => Ok(None),
            (Some(instrument), Some(quantity), Some(opening_price)) => Ok(Some(Columns {
                instrument,
                quantity,
                opening_price,
            })),
            (None, _, _) => Err("Instrument"),
            (_, None, _) => Err("Antal"),
            (_, _, None) => Err("Åbningspris"),
        }
    }
}

/// Split the page into one table per investor, in page order.
pub fn parse_page(html: &str) -> Result<Vec<InvestorTable>, ScrapeError> {
    let tables: Vec<&str> = elements_with_classes(html, "table", &TABLE_CLASSES)
        .into_iter()
        .map(|(s, e)| &html[s..e])
        .collect();
    if tables.is_empty() {
        return Err(ScrapeError::NoTables);
    }

    let investors: Vec<String> = elements_with_classes(html, "h2", &[INVESTOR_CLASS])
        .into_iter()
        .map(|(s, e)| text_of(inner_after_open_tag(&html[s..e])))
        .collect();
    if investors.len() != tables.len() {
        return Err(ScrapeError::InvestorTableMismatch {
            investors: investors.len(),
            tables: tables.len(),
        });
    }

    let mut out = Vec::with_capacity(tables.len());
    for (index, (investor, table)) in investors.into_iter().zip(tables).enumerate() {
        let rows = parse_table(table).map_err(|column| ScrapeError::MissingColumn {
            table: index,
            column: column.to_string(),
        })?;
        log::debug!("table {index}: {investor} with {} rows", rows.len());
        out.push(InvestorTable { investor, rows });
    }
    Ok(out)
}

fn parse_table(table: &str) -> Result<Vec<RawRow>, &'static str> {
    let table = clear_elements(table, "div", DESCRIPTION_CLASS);
    let lc = to_lower_ascii(&table);

    let mut columns = None;
    let mut rows = Vec::new();
    let mut pos = 0usize;
    while let Some(start) = find_open_tag(&lc, "tr", pos) {
        let Some((s, e)) = element_span(&lc, "tr", start) else {
            break;
        };
        pos = e;
        let (cells, is_header) = row_cells(&table[s..e]);
        if cells.is_empty() {
            continue;
        }

        if columns.is_none() {
            match Columns::from_header(&cells)? {
                Some(found) => {
                    columns = Some(found);
                    continue;
                }
                None if is_header => continue,
                None => {
                    log::debug!("no header row, using positional columns");
                    columns = Some(Columns::POSITIONAL);
                }
            }
        }

        let cols = columns.unwrap_or(Columns::POSITIONAL);
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        let row = RawRow {
            instrument: cell(cols.instrument),
            quantity: cell(cols.quantity),
            opening_price: cell(cols.opening_price),
        };
        if row.instrument.is_empty() {
            log::debug!("skipping row without instrument: {cells:?}");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Text of every `<th>`/`<td>` cell in a row, and whether all were `<th>`.
fn row_cells(tr: &str) -> (Vec<String>, bool) {
    let lc = to_lower_ascii(tr);
    let mut cells = Vec::new();
    let mut all_th = true;
    let mut pos = 0usize;
    loop {
        let td = find_open_tag(&lc, "td", pos);
        let th = find_open_tag(&lc, "th", pos);
        let (start, tag) = match (td, th) {
            (Some(a), Some(b)) if b < a => (b, "th"),
            (Some(a), _) => (a, "td"),
            (None, Some(b)) => (b, "th"),
            (None, None) => break,
        };
        let Some((s, e)) = element_span(&lc, tag, start) else {
            break;
        };
        if tag == "td" {
            all_th = false;
        }
        cells.push(text_of(inner_after_open_tag(&tr[s..e])));
        pos = e;
    }
    let is_header = all_th && !cells.is_empty();
    (cells, is_header)
}
