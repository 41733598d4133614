//! HTML scraping dialect: row extraction via CSS selectors.
//!
//! The HTML dialect has no structured response envelope. The entity's
//! `html_row_selector` option addresses the repeated element that represents
//! one row; each attribute's data address is a CSS selector evaluated
//! relative to that row element. The cell value is the element's trimmed
//! text content.

use scraper::Html;
use scraper::Selector;
use serde_json::Map;
use serde_json::Value;

use crate::error::ExtractError;
use crate::model::EntitySource;

/// Extracts rows from an HTML document per the entity's CSS selectors.
///
/// Rows are keyed by attribute alias. Attributes whose selector matches
/// nothing in a row yield `null` for that row.
pub fn extract_rows(
    entity: &EntitySource,
    body: &str,
) -> Result<Vec<Map<String, Value>>, ExtractError> {
    let row_selector_source = entity
        .options()
        .html_row_selector
        .as_deref()
        .ok_or_else(|| ExtractError::parse("no html_row_selector configured for HTML scraping"))?;
    let row_selector = parse_selector(row_selector_source)?;

    let cell_selectors = entity
        .attributes()
        .iter()
        .filter(|attribute| !attribute.data_address().is_empty())
        .map(|attribute| {
            parse_selector(attribute.data_address())
                .map(|selector| (attribute.alias().to_string(), selector))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let document = Html::parse_document(body);
    let mut rows = Vec::new();
    for element in document.select(&row_selector) {
        let mut row = Map::new();
        for (alias, selector) in &cell_selectors {
            let value = element
                .select(selector)
                .next()
                .map(|cell| {
                    Value::String(cell.text().collect::<String>().trim().to_string())
                })
                .unwrap_or(Value::Null);
            row.insert(alias.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn parse_selector(source: &str) -> Result<Selector, ExtractError> {
    Selector::parse(source)
        .map_err(|e| ExtractError::parse(format!("invalid CSS selector \"{source}\": {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeSource;
    use crate::model::DataType;
    use crate::model::EntityOptions;
    use serde_json::json;

    fn entity() -> EntitySource {
        EntitySource::new("https://example.test/orders")
            .with_attribute(AttributeSource::new("Name", "td.name", DataType::String))
            .with_attribute(AttributeSource::new("Total", "td.total", DataType::Number))
            .with_options(EntityOptions {
                html_row_selector: Some("table#orders tr.row".into()),
                ..Default::default()
            })
    }

    #[test]
    fn test_scrapes_rows_by_selector() {
        let body = r#"
            <table id="orders">
              <tr class="row"><td class="name">A</td><td class="total">10</td></tr>
              <tr class="row"><td class="name">B</td><td class="total">20</td></tr>
            </table>"#;
        let rows = extract_rows(&entity(), body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some(&json!("A")));
        assert_eq!(rows[1].get("Total"), Some(&json!("20")));
    }

    #[test]
    fn test_missing_cell_yields_null() {
        let body = r#"<table id="orders"><tr class="row"><td class="name">A</td></tr></table>"#;
        let rows = extract_rows(&entity(), body).unwrap();
        assert_eq!(rows[0].get("Total"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_row_selector_is_an_error() {
        let bare = EntitySource::new("https://example.test/orders");
        assert!(extract_rows(&bare, "<html></html>").is_err());
    }
}
