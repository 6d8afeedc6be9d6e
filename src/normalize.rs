use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{record::Record, slug};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

/// Turn raw source records into the session dataset.
///
/// Non-publications and records without a year are dropped, every record gets its human key,
/// and the result is ordered newest first.
pub fn normalize(records: Vec<Record>) -> Vec<Record> {
    let mut out: Vec<Record> = records
        .into_iter()
        .filter(|r| r.kind.is_publication())
        .filter_map(|mut r| match year_of(&r.date) {
            Some(year) => {
                r.human_key = slug::human_key(&year.to_string(), &r.title);
                r.language = r.language.as_deref().and_then(language_name);
                Some(r)
            }
            None => {
                log::warn!("skipping {} ({:?}): no year in {:?}", r.key, r.title, r.date);
                None
            }
        })
        .collect();
    sort_records(&mut out);
    disambiguate(&mut out);
    out
}

/// Year of a Zotero date field, which is free text ("2021-03-04", "March 2021", "2021").
pub fn year_of(date: &str) -> Option<i32> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

    let date = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .map(|d| d.year())
        .or_else(|| YEAR_RE.find(date).and_then(|m| m.as_str().parse().ok()))
}

/// Zotero language fields hold codes or names in any case; the list only tells Russian from
/// English.
fn language_name(raw: &str) -> Option<String> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        None
    } else if raw.contains("ru") {
        Some("russian".to_string())
    } else {
        Some("english".to_string())
    }
}

/// Date descending, then title descending. Plain case-insensitive string comparison.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by_cached_key(|r| Reverse((r.date.to_lowercase(), r.title.to_lowercase())));
}

/// Give later duplicates of a human key a numeric suffix so deep links stay unambiguous.
fn disambiguate(records: &mut [Record]) {
    let mut taken: HashSet<String> = HashSet::with_capacity(records.len());
    for record in records.iter_mut() {
        if taken.insert(record.human_key.clone()) {
            continue;
        }
        let base = record.human_key.clone();
        let unique = (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| format!("{base}-{}", record.key.to_lowercase()));
        log::warn!(
            "human key {base} is shared; {} ({:?}) gets {unique}",
            record.key,
            record.title
        );
        taken.insert(unique.clone());
        record.human_key = unique;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ItemKind;

    fn record(key: &str, date: &str, title: &str) -> Record {
        let mut r = Record::new(key, ItemKind::JournalArticle);
        r.date = date.into();
        r.title = title.into();
        r
    }

    fn titles(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn newer_dates_first() {
        let out = normalize(vec![record("A", "2021", "Old"), record("B", "2023", "New")]);
        assert_eq!(titles(&out), vec!["New", "Old"]);
    }

    #[test]
    fn equal_dates_sort_by_title_descending() {
        let out = normalize(vec![
            record("A", "2023", "A Paper"),
            record("B", "2023", "B Paper"),
        ]);
        assert_eq!(titles(&out), vec!["B Paper", "A Paper"]);
    }

    #[test]
    fn comparison_ignores_case() {
        let mut records = vec![record("A", "2023", "alpha"), record("B", "2023", "Beta")];
        sort_records(&mut records);
        assert_eq!(titles(&records), vec!["Beta", "alpha"]);
    }

    #[test]
    fn drops_attachments_notes_and_undated() {
        let mut attachment = record("A", "2020", "slides.pdf");
        attachment.kind = ItemKind::Attachment;
        let mut note = record("N", "2020", "note");
        note.kind = ItemKind::Note;
        let out = normalize(vec![
            attachment,
            note,
            record("U", "", "Undated"),
            record("K", "2020-05-01", "Kept"),
        ]);
        assert_eq!(titles(&out), vec!["Kept"]);
        assert_eq!(out[0].human_key, "2020-kept");
    }

    #[test]
    fn reads_years_out_of_free_text() {
        assert_eq!(year_of("2021-03-04"), Some(2021));
        assert_eq!(year_of("04.03.2019"), Some(2019));
        assert_eq!(year_of("March 2018"), Some(2018));
        assert_eq!(year_of("2017"), Some(2017));
        assert_eq!(year_of("n.d."), None);
    }

    #[test]
    fn language_codes_become_names() {
        assert_eq!(language_name("ru").as_deref(), Some("russian"));
        assert_eq!(language_name("ru-RU").as_deref(), Some("russian"));
        assert_eq!(language_name("Russian").as_deref(), Some("russian"));
        assert_eq!(language_name("en-US").as_deref(), Some("english"));
        assert_eq!(language_name("english").as_deref(), Some("english"));
        assert_eq!(language_name("  "), None);

        let mut r = record("R", "2021", "Поиск");
        r.language = Some("ru".into());
        let out = normalize(vec![r]);
        assert_eq!(out[0].language.as_deref(), Some("russian"));
    }

    #[test]
    fn colliding_keys_get_suffixes() {
        let out = normalize(vec![
            record("A", "2022", "Same Talk"),
            record("B", "2022", "Same  Talk!"),
            record("C", "2022", "same talk"),
        ]);
        let mut keys: Vec<&str> = out.iter().map(|r| r.human_key.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["2022-same-talk", "2022-same-talk-2", "2022-same-talk-3"]);
    }

    #[test]
    fn output_is_sorted_descending() {
        proptest::proptest!(|(items in proptest::collection::vec(("20[0-9]{2}", "[A-Za-z ]{0,12}"), 0..16))| {
            let records = items
                .iter()
                .enumerate()
                .map(|(i, (date, title))| record(&format!("K{i}"), date, title))
                .collect();
            let out = normalize(records);
            for pair in out.windows(2) {
                let a = (pair[0].date.to_lowercase(), pair[0].title.to_lowercase());
                let b = (pair[1].date.to_lowercase(), pair[1].title.to_lowercase());
                proptest::prop_assert!(a >= b, "{a:?} before {b:?}");
            }
        })
    }

    #[test]
    fn human_keys_are_url_safe() {
        let re = Regex::new(r"^[0-9]{4}-[a-z0-9-]*$").unwrap();
        proptest::proptest!(|(items in proptest::collection::vec(("(19|20)[0-9]{2}(-[01][0-9])?", "\\PC{0,30}"), 0..12))| {
            let records = items
                .iter()
                .enumerate()
                .map(|(i, (date, title))| record(&format!("K{i}"), date, title))
                .collect();
            let out = normalize(records);
            let mut seen = HashSet::new();
            for r in &out {
                proptest::prop_assert!(re.is_match(&r.human_key), "bad key {:?}", r.human_key);
                proptest::prop_assert!(seen.insert(r.human_key.clone()), "duplicate {:?}", r.human_key);
            }
        })
    }
}
