use scraper::{ElementRef, Html, Selector};

use super::{RawTable, TableError};

fn selector(css: &str) -> Result<Selector, TableError> {
    Selector::parse(css).map_err(|e| TableError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// First `<table>` of an exported HTML document as a grid.
///
/// Cells holding `mailto:` links become the comma-joined link texts; all
/// other cells are their trimmed text. Rows without cells are dropped.
pub fn first_table(html: &str) -> Result<RawTable, TableError> {
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;
    let mailto_sel = selector("a[href^='mailto:']")?;

    let document = Html::parse_document(html);
    let table = document.select(&table_sel).next().ok_or(TableError::NotFound)?;

    let rows: Vec<Vec<String>> = table
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| cell_text(cell, &mailto_sel))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    if rows.is_empty() {
        return Err(TableError::Empty);
    }
    Ok(RawTable::new(rows))
}

fn cell_text(cell: ElementRef<'_>, mailto_sel: &Selector) -> String {
    let links: Vec<String> = cell
        .select(mailto_sel)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if links.is_empty() {
        cell.text().collect::<String>().trim().to_string()
    } else {
        links.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_table_only() {
        let html = r#"<html><body>
            <p>intro</p>
            <table><tr><td> Index </td><td>PR007</td></tr></table>
            <table><tr><td>Changelog</td></tr></table>
        </body></html>"#;
        let table = first_table(html).unwrap();
        assert_eq!(table, RawTable::from(vec![vec!["Index", "PR007"]]));
    }

    #[test]
    fn mailto_links_joined() {
        let html = r#"<table><tr>
            <td>Author(s)</td>
            <td><a href="mailto:a@x.com">a@x.com</a>, <a href="mailto:b@x.com">b@x.com</a></td>
            <td><a href="https://example.com">not a mail</a></td>
        </tr></table>"#;
        let table = first_table(html).unwrap();
        assert_eq!(table.rows()[0][1], "a@x.com,b@x.com");
        assert_eq!(table.rows()[0][2], "not a mail");
    }

    #[test]
    fn header_cells_included() {
        let html = "<table><tr><th>Type</th><th>Status</th></tr><tr><td>Process</td><td>Approved</td></tr></table>";
        let table = first_table(html).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], vec!["Type", "Status"]);
    }

    #[test]
    fn empty_rows_dropped() {
        let html = "<table><tr></tr><tr><td>status</td><td>Drafting</td></tr></table>";
        let table = first_table(html).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn no_table_is_not_found() {
        assert_eq!(first_table("<p>nothing</p>"), Err(TableError::NotFound));
    }

    #[test]
    fn table_without_rows_is_empty() {
        assert_eq!(first_table("<table></table>"), Err(TableError::Empty));
    }
}
