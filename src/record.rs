use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

/// One bibliographic entry, as kept in the session and in the cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(alias = "id")]
    pub key: String,
    #[serde(default)]
    pub title: String,
    /// Raw date string from the source. Snapshots may store a bare `year` number instead.
    #[serde(default, alias = "year", deserialize_with = "string_or_number")]
    pub date: String,
    #[serde(rename = "itemType", alias = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, alias = "authors")]
    pub creators: Vec<Creator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_type: Option<String>,
    #[serde(default)]
    pub human_key: String,
}

impl Record {
    pub fn new(key: impl Into<String>, kind: ItemKind) -> Self {
        Record {
            key: key.into(),
            title: String::new(),
            date: String::new(),
            kind,
            url: None,
            tags: Vec::new(),
            language: None,
            creators: Vec::new(),
            website_type: None,
            presentation_type: None,
            human_key: String::new(),
        }
    }

    /// Url to send people to, skipping blank strings Zotero leaves in empty fields.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CreatorRepr")]
pub struct Creator {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Single-field creators (institutions) only carry a name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Zotero splits names into fields; archived snapshots list authors as plain strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum CreatorRepr {
    Name(String),
    #[serde(rename_all = "camelCase")]
    Fields {
        #[serde(default)]
        first_name: String,
        #[serde(default)]
        last_name: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<CreatorRepr> for Creator {
    fn from(repr: CreatorRepr) -> Self {
        match repr {
            CreatorRepr::Name(name) => Creator {
                name: Some(name),
                ..Creator::default()
            },
            CreatorRepr::Fields {
                first_name,
                last_name,
                name,
            } => Creator {
                first_name,
                last_name,
                name,
            },
        }
    }
}

impl fmt::Display for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            return f.write_str(name);
        }
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => write!(f, "{} {}", self.first_name, self.last_name),
            (true, _) => f.write_str(&self.last_name),
            (false, true) => f.write_str(&self.first_name),
        }
    }
}

/// Zotero item type. Unknown types are carried through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    JournalArticle,
    ConferencePaper,
    Preprint,
    Report,
    Thesis,
    Book,
    BookSection,
    BlogPost,
    Webpage,
    Presentation,
    VideoRecording,
    Attachment,
    Note,
    Other(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::JournalArticle => "journalArticle",
            ItemKind::ConferencePaper => "conferencePaper",
            ItemKind::Preprint => "preprint",
            ItemKind::Report => "report",
            ItemKind::Thesis => "thesis",
            ItemKind::Book => "book",
            ItemKind::BookSection => "bookSection",
            ItemKind::BlogPost => "blogPost",
            ItemKind::Webpage => "webpage",
            ItemKind::Presentation => "presentation",
            ItemKind::VideoRecording => "videoRecording",
            ItemKind::Attachment => "attachment",
            ItemKind::Note => "note",
            ItemKind::Other(s) => s,
        }
    }

    /// Attachments and notes hang off real items and are never listed.
    pub fn is_publication(&self) -> bool {
        !matches!(self, ItemKind::Attachment | ItemKind::Note)
    }
}

impl From<String> for ItemKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "journalArticle" => ItemKind::JournalArticle,
            "conferencePaper" => ItemKind::ConferencePaper,
            "preprint" => ItemKind::Preprint,
            "report" => ItemKind::Report,
            "thesis" => ItemKind::Thesis,
            "book" => ItemKind::Book,
            "bookSection" => ItemKind::BookSection,
            "blogPost" => ItemKind::BlogPost,
            "webpage" => ItemKind::Webpage,
            "presentation" => ItemKind::Presentation,
            "videoRecording" => ItemKind::VideoRecording,
            "attachment" => ItemKind::Attachment,
            "note" => ItemKind::Note,
            _ => ItemKind::Other(s),
        }
    }
}

impl From<&str> for ItemKind {
    fn from(s: &str) -> Self {
        ItemKind::from(s.to_string())
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected a date string or year, got {other}"
        ))),
    }
}
