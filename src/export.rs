use biblatex::{Chunk, Entry, EntryType, Spanned};

use crate::{
    normalize::year_of,
    record::{ItemKind, Record},
};

fn entry_type(kind: &ItemKind) -> &'static str {
    match kind {
        ItemKind::JournalArticle => "article",
        ItemKind::ConferencePaper => "inproceedings",
        ItemKind::Thesis => "thesis",
        ItemKind::Book => "book",
        ItemKind::BookSection => "incollection",
        ItemKind::Report => "report",
        ItemKind::Webpage | ItemKind::BlogPost | ItemKind::Preprint => "online",
        _ => "misc",
    }
}

fn normal(text: &str) -> Vec<Spanned<Chunk>> {
    vec![Spanned::detached(Chunk::Normal(text.to_string()))]
}

fn verbatim(text: &str) -> Vec<Spanned<Chunk>> {
    vec![Spanned::detached(Chunk::Verbatim(text.to_string()))]
}

/// `Last, First and ...`; single-field names are kept verbatim so BibLaTeX does not split them.
fn authors(record: &Record) -> Vec<Spanned<Chunk>> {
    let mut chunks = Vec::new();
    for creator in &record.creators {
        let chunk = match &creator.name {
            Some(name) => Chunk::Verbatim(name.clone()),
            None if creator.first_name.is_empty() && creator.last_name.is_empty() => continue,
            None if creator.first_name.is_empty() || creator.last_name.is_empty() => {
                Chunk::Normal(creator.to_string())
            }
            None => Chunk::Normal(format!("{}, {}", creator.last_name, creator.first_name)),
        };
        if !chunks.is_empty() {
            chunks.push(Spanned::detached(Chunk::Normal(" and ".into())));
        }
        chunks.push(Spanned::detached(chunk));
    }
    chunks
}

/// BibLaTeX entry keyed by the record's human key.
pub fn entry(record: &Record) -> Entry {
    let mut entry = Entry::new(
        record.human_key.clone(),
        EntryType::new(entry_type(&record.kind)),
    );
    entry.fields.insert("title".into(), normal(&record.title));
    let author = authors(record);
    if !author.is_empty() {
        entry.fields.insert("author".into(), author);
    }
    if let Some(year) = year_of(&record.date) {
        entry.fields.insert("date".into(), normal(&year.to_string()));
    }
    if let Some(url) = record.link() {
        entry.fields.insert("url".into(), verbatim(url));
    }
    if !record.tags.is_empty() {
        entry.fields.insert("keywords".into(), normal(&record.tags.join(", ")));
    }
    if let Some(language) = &record.language {
        entry.fields.insert("langid".into(), normal(&language.to_lowercase()));
    }
    entry
}

pub fn to_biblatex(records: &[&Record]) -> String {
    records
        .iter()
        .map(|r| entry(r).to_biblatex_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}
