//! Typo-tolerant search over the session records.
//!
//! Every query term has to land in at least one indexed field, either as a substring or as a
//! word within edit-distance reach. Scores are distances: 0 is a perfect hit, anything above
//! the threshold is no hit at all.

use crate::record::Record;

/// Largest term score still counted as a hit.
pub const THRESHOLD: f64 = 0.4;
/// Upper bound of the position penalty for substring hits.
const POSITION_WEIGHT: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Url,
    Kind,
    Date,
    Language,
    Tag,
    FirstName,
    LastName,
    PresentationType,
}

impl Field {
    /// Tags are hand-picked keywords and rank above incidental text.
    fn weight(self) -> f64 {
        match self {
            Field::Tag => 0.5,
            _ => 1.0,
        }
    }
}

struct Document {
    fields: Vec<(Field, String)>,
}

impl Document {
    fn of(record: &Record) -> Self {
        let mut fields = vec![
            (Field::Title, record.title.to_lowercase()),
            (Field::Kind, record.kind.as_str().to_lowercase()),
            (Field::Date, record.date.to_lowercase()),
        ];
        if let Some(url) = record.link() {
            fields.push((Field::Url, url.to_lowercase()));
        }
        if let Some(language) = &record.language {
            fields.push((Field::Language, language.to_lowercase()));
        }
        fields.extend(record.tags.iter().map(|t| (Field::Tag, t.to_lowercase())));
        for creator in &record.creators {
            if let Some(name) = &creator.name {
                fields.push((Field::LastName, name.to_lowercase()));
            }
            fields.push((Field::FirstName, creator.first_name.to_lowercase()));
            fields.push((Field::LastName, creator.last_name.to_lowercase()));
        }
        if let Some(subtype) = &record.presentation_type {
            fields.push((Field::PresentationType, subtype.to_lowercase()));
        }
        fields.retain(|(_, text)| !text.is_empty());
        Document { fields }
    }

    /// Best weighted score of `term` over all fields. The threshold applies before weighting.
    fn score(&self, term: &str) -> Option<f64> {
        self.fields
            .iter()
            .map(|(field, text)| (term_score(term, text), field.weight()))
            .filter(|(score, _)| *score <= THRESHOLD)
            .map(|(score, weight)| score * weight)
            .min_by(f64::total_cmp)
    }
}

/// Distance of `term` to `text`, both lowercase.
fn term_score(term: &str, text: &str) -> f64 {
    if let Some(pos) = text.find(term) {
        return POSITION_WEIGHT * pos as f64 / text.len().max(1) as f64;
    }
    // Years and other numbers only match exactly.
    if term.chars().all(|c| c.is_ascii_digit()) {
        return 1.0;
    }
    let len = term.chars().count();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let prefix: String = word.chars().take(len).collect();
            let whole = strsim::normalized_damerau_levenshtein(term, word);
            let start = strsim::normalized_damerau_levenshtein(term, &prefix);
            1.0 - whole.max(start)
        })
        .fold(1.0, f64::min)
}

/// Fuzzy index over a slice of records. Cheap to build; rebuilt for every query.
pub struct SearchIndex<'a> {
    records: &'a [Record],
    documents: Vec<Document>,
}

impl<'a> SearchIndex<'a> {
    pub fn build(records: &'a [Record]) -> Self {
        SearchIndex {
            records,
            documents: records.iter().map(Document::of).collect(),
        }
    }

    /// Best matches first; equal scores keep dataset order. A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<&'a Record> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return self.records.iter().collect();
        }
        let mut hits: Vec<(usize, f64)> = self
            .documents
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| {
                let total = terms
                    .iter()
                    .map(|term| doc.score(term))
                    .sum::<Option<f64>>()?;
                Some((i, total / terms.len() as f64))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.into_iter().map(|(i, _)| &self.records[i]).collect()
    }
}
