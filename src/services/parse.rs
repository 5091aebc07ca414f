// src/services/parse.rs

//! Portal page parsing.
//!
//! The markup belongs to a third party and may change without notice, so
//! every lookup here is best-effort: a missing element is reported as `None`
//! rather than an error, and the caller decides whether to retry.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{CourseStat, PortalSelectors};

/// Rows extracted from one results table.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub records: Vec<CourseStat>,
    /// Rows missing the order key or the enrollment cell
    pub malformed_rows: usize,
}

/// Selectors compiled once per run.
#[derive(Debug, Clone)]
pub struct PageParser {
    subject_select: Selector,
    subject_option: Selector,
    subject_separator: String,
    table: Selector,
    row: Selector,
    cell: Selector,
    order_attr: String,
    enrollment_column: usize,
}

impl PageParser {
    pub fn new(selectors: &PortalSelectors) -> Result<Self> {
        Ok(Self {
            subject_select: parse_selector(&selectors.subject_select)?,
            subject_option: parse_selector(&selectors.subject_option)?,
            subject_separator: selectors.subject_separator.clone(),
            table: parse_selector(&selectors.table)?,
            row: parse_selector(&selectors.row)?,
            cell: parse_selector(&selectors.cell)?,
            order_attr: selectors.order_attr.clone(),
            enrollment_column: selectors.enrollment_column,
        })
    }

    /// Subject codes from the selection control, in page order.
    ///
    /// Returns `None` when the control is absent. A code is the option text up
    /// to the first separator; blank placeholder options are dropped.
    pub fn subjects(&self, html: &str) -> Option<Vec<String>> {
        let document = Html::parse_document(html);
        let control = document.select(&self.subject_select).next()?;

        let subjects = control
            .select(&self.subject_option)
            .filter_map(|option| {
                let text: String = option.text().collect();
                let code = text
                    .split(self.subject_separator.as_str())
                    .next()
                    .unwrap_or("")
                    .trim();
                (!code.is_empty()).then(|| code.to_string())
            })
            .collect();
        Some(subjects)
    }

    /// Records from the results table. Returns `None` when the table is absent.
    pub fn course_table(&self, html: &str) -> Option<ParsedTable> {
        let document = Html::parse_document(html);
        let table = document.select(&self.table).next()?;

        let mut parsed = ParsedTable::default();
        for row in table.select(&self.row) {
            match self.parse_row(&row) {
                Some(record) => parsed.records.push(record),
                None => {
                    log::debug!("Skipping malformed row: {}", row.html());
                    parsed.malformed_rows += 1;
                }
            }
        }
        Some(parsed)
    }

    fn parse_row(&self, row: &ElementRef) -> Option<CourseStat> {
        let cells: Vec<ElementRef> = row.select(&self.cell).collect();
        let order_key = cells.first()?.value().attr(&self.order_attr)?;
        let enrollment: String = cells.get(self.enrollment_column)?.text().collect();
        Some(CourseStat::new(order_key, enrollment.trim()))
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PageParser {
        PageParser::new(&PortalSelectors::default()).unwrap()
    }

    fn row(order: &str, enrollment: &str) -> String {
        format!(
            r#"<tr><td data-order="{order}">Course</td><td></td><td></td><td></td><td></td><td></td><td></td><td>
                {enrollment}
            </td></tr>"#
        )
    }

    #[test]
    fn test_parse_selector_invalid() {
        let selectors = PortalSelectors {
            table: "[[invalid".to_string(),
            ..PortalSelectors::default()
        };
        assert!(matches!(
            PageParser::new(&selectors),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn reads_subject_codes_up_to_separator() {
        let html = r#"
            <form><select id="subjectCode">
                <option value=""></option>
                <option value="CPSC">CPSC - Computer Science</option>
                <option value="ECON">ECON - Economics</option>
                <option value="E&amp;EB">E&amp;EB - Ecology - Evolutionary Biology</option>
            </select></form>"#;
        assert_eq!(
            parser().subjects(html),
            Some(vec!["CPSC".into(), "ECON".into(), "E&EB".into()])
        );
    }

    #[test]
    fn missing_subject_control_is_none() {
        assert_eq!(parser().subjects("<html><body>Log in</body></html>"), None);
    }

    #[test]
    fn reads_table_rows_in_order() {
        let html = format!(
            r#"<table id="coursesTable"><thead><tr><th>Course</th></tr></thead>
               <tbody>{}{}</tbody></table>"#,
            row("1", "45"),
            row("2", "30")
        );
        let parsed = parser().course_table(&html).unwrap();
        assert_eq!(
            parsed.records,
            vec![CourseStat::new("1", "45"), CourseStat::new("2", "30")]
        );
        assert_eq!(parsed.malformed_rows, 0);
    }

    #[test]
    fn empty_table_is_found_but_has_no_records() {
        let html = r#"<table id="coursesTable"><tbody></tbody></table>"#;
        assert_eq!(parser().course_table(html), Some(ParsedTable::default()));
    }

    #[test]
    fn missing_table_is_none() {
        assert_eq!(parser().course_table("<p>Please try again</p>"), None);
    }

    #[test]
    fn short_rows_are_counted_as_malformed() {
        let html = format!(
            r#"<table id="coursesTable"><tbody>
                <tr><td data-order="9">Only one cell</td></tr>
                <tr><td>no key</td><td></td><td></td><td></td><td></td><td></td><td></td><td>5</td></tr>
                {}
            </tbody></table>"#,
            row("3", "12")
        );
        let parsed = parser().course_table(&html).unwrap();
        assert_eq!(parsed.records, vec![CourseStat::new("3", "12")]);
        assert_eq!(parsed.malformed_rows, 2);
    }

    #[test]
    fn enrollment_text_is_only_trimmed() {
        let html = format!(
            r#"<table id="coursesTable"><tbody>{}</tbody></table>"#,
            row("4", "1,234 (cap  1,500)")
        );
        let parsed = parser().course_table(&html).unwrap();
        assert_eq!(parsed.records[0].enrollment, "1,234 (cap  1,500)");
        assert_eq!(parsed.records[0].enrollment_count(), None);
    }
}
