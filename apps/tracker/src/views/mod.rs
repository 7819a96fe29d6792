// Server-rendered pages: the application list and the cover letter.
// Both read through a TieredSource and render with askama templates.

pub mod letter;
pub mod list;

use askama::Template;
use chrono::NaiveDate;

use crate::feed::Provenance;
use crate::models::record::format_long_date;

pub use letter::{LetterView, LETTER_UNAVAILABLE};
pub use list::ListView;

#[derive(Template)]
#[template(path = "list.html")]
pub struct ListPage<'a> {
    pub view: &'a ListView,
    pub collection: &'a str,
    /// One-off message above the table, e.g. after a refused change.
    pub notice: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "letter.html")]
pub struct LetterPage<'a> {
    pub loaded: bool,
    pub source: &'static str,
    pub company: &'a str,
    pub job_title: &'a str,
    pub color: &'a str,
    pub greeting: &'a str,
    pub body: &'a str,
    pub salutation: &'a str,
    pub today: String,
    pub unavailable: &'a str,
}

const DEFAULT_ACCENT: &str = "#2f4f6f";

impl<'a> LetterPage<'a> {
    pub fn new(view: &'a LetterView, today: NaiveDate) -> Self {
        let record = view.record();
        Self {
            loaded: record.is_some(),
            source: match view {
                LetterView::Loaded {
                    provenance: Provenance::Live,
                    ..
                } => "live",
                LetterView::Loaded { .. } => "fallback",
                LetterView::Missing => "none",
            },
            company: record.map(|r| r.company.as_str()).unwrap_or(""),
            job_title: record.map(|r| r.job_title.as_str()).unwrap_or(""),
            color: record
                .and_then(|r| r.color.as_deref())
                .unwrap_or(DEFAULT_ACCENT),
            greeting: record.and_then(|r| r.greeting.as_deref()).unwrap_or(""),
            body: record.and_then(|r| r.body.as_deref()).unwrap_or(""),
            salutation: record.and_then(|r| r.salutation.as_deref()).unwrap_or(""),
            today: format_long_date(today),
            unavailable: LETTER_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::record;
    use crate::feed::Sourced;
    use crate::models::Record;

    fn letter_record() -> Record {
        let mut rec = record("1", "Acme & Sons", "2024-01-10", "Submitted");
        rec.greeting = Some("Dear <b>Hiring</b> Team,".to_string());
        rec.body = Some("<p>I build things.</p>".to_string());
        rec.salutation = Some("Sincerely,".to_string());
        rec.color = Some("#aa3311".to_string());
        rec
    }

    #[test]
    fn test_live_list_renders_enabled_controls() {
        let view = ListView::from_sourced(Sourced {
            provenance: Provenance::Live,
            value: vec![record("1", "Acme & Sons", "2024-01-10", "Submitted")],
        });
        let html = ListPage {
            view: &view,
            collection: "applications",
            notice: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Acme &amp; Sons"));
        assert!(html.contains("January 10, 2024"));
        assert!(html.contains("/cover-letter?id=1"));
        assert!(!html.contains("disabled"));
        assert!(html.contains(r#"data-sync="confirmed""#));
    }

    #[test]
    fn test_degraded_list_disables_every_control() {
        let view = ListView::from_sourced(Sourced {
            provenance: Provenance::Fallback,
            value: vec![
                record("1", "Acme", "2024-01-10", "Submitted"),
                record("2", "Globex", "2024-01-11", "Interviewing"),
            ],
        });
        let html = ListPage {
            view: &view,
            collection: "applications",
            notice: None,
        }
        .render()
        .unwrap();

        assert_eq!(html.matches("<select").count(), 2);
        assert_eq!(html.matches("<select name=\"status\" disabled").count(), 2);
        assert!(html.contains("saved snapshot"));
    }

    #[test]
    fn test_letter_injects_content_verbatim_and_escapes_header() {
        let view = LetterView::Loaded {
            record: letter_record(),
            provenance: Provenance::Live,
        };
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let html = LetterPage::new(&view, today).render().unwrap();

        assert!(html.contains("Dear <b>Hiring</b> Team,"));
        assert!(html.contains("<p>I build things.</p>"));
        assert!(html.contains("Acme &amp; Sons"));
        assert!(html.contains("--dynamic-color: #aa3311"));
        assert!(html.contains("October 19, 2026"));
        assert!(html.contains(r#"data-source="live""#));
        assert!(!html.contains(LETTER_UNAVAILABLE));
    }

    #[test]
    fn test_missing_letter_renders_only_the_error() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let html = LetterPage::new(&LetterView::Missing, today)
            .render()
            .unwrap();

        assert!(html.contains(LETTER_UNAVAILABLE));
        assert!(!html.contains("id=\"greeting\""));
        assert!(!html.contains("id=\"salutation\""));
    }
}
