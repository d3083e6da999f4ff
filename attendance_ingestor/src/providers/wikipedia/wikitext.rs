//! Minimal wikitext table reader for the attendance page.
//!
//! Only the subset of markup that appears in sortable `wikitable`s is
//! understood: `{| … |}` tables, `|-` row separators, `!`/`|` cells with
//! optional attributes, `[[links]]`, a handful of inline templates, `<ref>`
//! footnotes and bold/italic quotes. Anything else is dropped from the cell.

use crate::models::Attraction;

/// Parses the first table whose header names a museum, a city and a visitor
/// column. Rows lacking any of those three cells are skipped.
///
/// Returns `None` when no such table exists.
pub fn parse_attractions(wikitext: &str) -> Option<Vec<Attraction>> {
    for table in tables(wikitext) {
        let rows = rows(&table);
        let Some((header_at, columns)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.is_header())
            .and_then(|(i, row)| Columns::detect(&row.cells).map(|c| (i, c)))
        else {
            continue;
        };

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for row in &rows[header_at + 1..] {
            match columns.extract(&row.cells) {
                Some(attraction) => out.push(attraction),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "skipped incomplete table rows");
        }
        return Some(out);
    }
    None
}

/// Strips markup from one cell and returns its display text.
pub fn clean_cell(raw: &str) -> String {
    let expanded = expand_templates(&strip_refs(raw));
    let linked = render_links(&expanded);
    let text = strip_tags(&linked)
        .replace("'''", "")
        .replace("''", "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&ndash;", "–");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Target of the first article link in the cell, used for cities so that
/// `[[New York City|New York]]` yields the canonical title.
pub fn first_link_target(raw: &str) -> Option<String> {
    let expanded = expand_templates(&strip_refs(raw));
    let mut rest = expanded.as_str();
    while let Some(open) = rest.find("[[") {
        let after = &rest[open + 2..];
        let close = after.find("]]")?;
        let inner = &after[..close];
        let target = inner.split('|').next().unwrap_or_default();
        let target = target.split('#').next().unwrap_or_default().trim();
        if !target.is_empty() && !is_file_link(target) {
            return Some(target.replace('_', " "));
        }
        rest = &after[close + 2..];
    }
    None
}

/// Reads a visitor count written as `8,900,000` or `8.9 million`.
pub fn parse_visitors(text: &str) -> Option<u64> {
    let lower = text.to_lowercase();
    if let Some(at) = lower.find("million") {
        let before = lower[..at].trim_end();
        // Ranges like "8.7–8.9 million" keep the upper bound.
        let start = before
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == ','))
            .map_or(0, |(i, c)| i + c.len_utf8());
        let number: f64 = before[start..].replace(',', "").parse().ok()?;
        return Some((number * 1_000_000.0).round() as u64);
    }

    let start = lower.find(|c: char| c.is_ascii_digit())?;
    let digits: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// First plausible four-digit year in the text.
pub fn parse_year(text: &str) -> Option<i32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 4)
        .filter_map(|token| token.parse::<i32>().ok())
        .find(|year| (1900..=2100).contains(year))
}

#[derive(Debug)]
struct Row {
    cells: Vec<Cell>,
}

#[derive(Debug)]
struct Cell {
    header: bool,
    raw: String,
}

impl Row {
    fn is_header(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|c| c.header)
    }
}

#[derive(Debug)]
struct Columns {
    name: usize,
    city: usize,
    visitors: usize,
    country: Option<usize>,
    year: Option<usize>,
}

impl Columns {
    fn detect(header: &[Cell]) -> Option<Self> {
        let (mut name, mut city, mut visitors, mut country, mut year) =
            (None, None, None, None, None);
        for (i, cell) in header.iter().enumerate() {
            let label = clean_cell(&cell.raw).to_lowercase();
            let slot = if label.contains("visitor") || label.contains("attendance") {
                &mut visitors
            } else if label.contains("year") {
                &mut year
            } else if label.contains("country") {
                &mut country
            } else if label.contains("city") || label.contains("location") {
                &mut city
            } else if label.contains("museum") || label.contains("name") {
                &mut name
            } else {
                continue;
            };
            slot.get_or_insert(i);
        }
        Some(Self {
            name: name?,
            city: city?,
            visitors: visitors?,
            country,
            year,
        })
    }

    fn extract(&self, cells: &[Cell]) -> Option<Attraction> {
        let name = clean_cell(&cells.get(self.name)?.raw);
        let city_raw = &cells.get(self.city)?.raw;
        let city = first_link_target(city_raw).unwrap_or_else(|| clean_cell(city_raw));
        let annual_visitors = parse_visitors(&clean_cell(&cells.get(self.visitors)?.raw))?;
        if name.is_empty() || city.is_empty() {
            return None;
        }

        let country = self
            .country
            .and_then(|i| cells.get(i))
            .map(|c| clean_cell(&c.raw))
            .filter(|c| !c.is_empty());
        let observation_year = self
            .year
            .and_then(|i| cells.get(i))
            .and_then(|c| parse_year(&clean_cell(&c.raw)));

        Some(Attraction {
            name,
            city,
            country,
            annual_visitors,
            observation_year,
        })
    }
}

/// Bodies of the top-level tables, nested tables included verbatim.
fn tables(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("{|") {
            depth += 1;
            if depth == 1 {
                current.clear();
                continue;
            }
        } else if trimmed.starts_with("|}") && depth > 0 {
            depth -= 1;
            if depth == 0 {
                out.push(std::mem::take(&mut current));
                continue;
            }
        }
        if depth > 0 {
            current.push_str(line);
            current.push('\n');
        }
    }
    out
}

fn rows(table: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut cells: Vec<Cell> = Vec::new();
    for line in table.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("|-") {
            if !cells.is_empty() {
                rows.push(Row {
                    cells: std::mem::take(&mut cells),
                });
            }
        } else if trimmed.starts_with("|+") {
            // caption
        } else if let Some(rest) = trimmed.strip_prefix('!') {
            cells.extend(split_top_level(rest, "!!").into_iter().map(|c| Cell {
                header: true,
                raw: cell_content(c),
            }));
        } else if let Some(rest) = trimmed.strip_prefix('|') {
            cells.extend(split_top_level(rest, "||").into_iter().map(|c| Cell {
                header: false,
                raw: cell_content(c),
            }));
        } else if let Some(last) = cells.last_mut() {
            last.raw.push(' ');
            last.raw.push_str(trimmed);
        }
    }
    if !cells.is_empty() {
        rows.push(Row { cells });
    }
    rows
}

/// Drops a leading `attr="…" |` from a cell.
fn cell_content(cell: &str) -> String {
    let parts = split_top_level(cell, "|");
    if parts.len() > 1 && parts[0].contains('=') {
        parts[1..].join("|").trim().to_string()
    } else {
        cell.trim().to_string()
    }
}

/// Splits on `sep` outside `[[…]]` and `{{…}}`.
fn split_top_level<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    let bytes = s.as_bytes();
    let sep = sep.as_bytes();
    let mut parts = Vec::new();
    let (mut depth, mut start, mut i) = (0usize, 0usize, 0usize);
    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"[[") || rest.starts_with(b"{{") {
            depth += 1;
            i += 2;
        } else if depth > 0 && (rest.starts_with(b"]]") || rest.starts_with(b"}}")) {
            depth -= 1;
            i += 2;
        } else if depth == 0 && rest.starts_with(sep) {
            parts.push(&s[start..i]);
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

fn strip_refs(raw: &str) -> String {
    let mut text = remove_spans(raw, "<!--", "-->");
    while let Some(open) = text.find("<ref") {
        let Some(gt) = text[open..].find('>').map(|i| open + i) else {
            text.truncate(open);
            break;
        };
        let end = if text[..gt].ends_with('/') {
            gt + 1
        } else {
            text[gt..]
                .find("</ref>")
                .map_or(gt + 1, |i| gt + i + "</ref>".len())
        };
        text.replace_range(open..end, "");
    }
    text
}

fn remove_spans(raw: &str, open: &str, close: &str) -> String {
    let mut text = raw.to_string();
    while let Some(start) = text.find(open) {
        let end = text[start..]
            .find(close)
            .map_or(text.len(), |i| start + i + close.len());
        text.replace_range(start..end, "");
    }
    text
}

/// Expands templates innermost first.
fn expand_templates(raw: &str) -> String {
    let mut text = raw.to_string();
    while let Some(open) = text.rfind("{{") {
        let Some(close) = text[open..].find("}}").map(|i| open + i) else {
            text.truncate(open);
            break;
        };
        let rendered = render_template(&text[open + 2..close]);
        text.replace_range(open..close + 2, &rendered);
    }
    text
}

fn render_template(inner: &str) -> String {
    let params = split_top_level(inner, "|");
    let name = params[0].trim().to_lowercase();
    let positional: Vec<&str> = params[1..]
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.contains('='))
        .collect();
    match name.as_str() {
        "flag" | "flagcountry" | "flagu" | "nowrap" | "nobr" | "small" | "sort" => {
            positional.last().map(|p| p.to_string()).unwrap_or_default()
        }
        "sortname" => positional.join(" "),
        _ => String::new(),
    }
}

fn render_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("[[") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("]]") else {
            out.push_str(after);
            return out;
        };
        let inner = &after[..close];
        let mut parts = inner.splitn(2, '|');
        let target = parts.next().unwrap_or_default();
        if !is_file_link(target) {
            out.push_str(parts.next().unwrap_or(target));
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    out
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tail = &rest[lt + 1..];
        let is_tag = tail
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/');
        match tail.find('>') {
            Some(gt) if is_tag => {
                out.push(' ');
                rest = &tail[gt + 1..];
            }
            _ => {
                out.push('<');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_file_link(target: &str) -> bool {
    let lower = target.trim().to_lowercase();
    lower.starts_with("file:") || lower.starts_with("image:")
}
