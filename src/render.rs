use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::escape::escape;

use crate::{
    controller::View,
    record::{ItemKind, Record},
    share::ShareCard,
};

/// Characters left alone in `?q=` values.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type IconFn = fn(&Record) -> &'static str;

/// Icon strategy per item type. Types missing here render with [`misc`].
static TEMPLATES: &[(&str, IconFn)] = &[
    ("blogPost", blog_post),
    ("webpage", webpage),
    ("presentation", presentation),
    ("conferencePaper", paper),
    ("journalArticle", paper),
    ("preprint", paper),
    ("thesis", thesis),
    ("book", book),
    ("bookSection", book_section),
    ("report", report),
    ("videoRecording", video),
];

fn blog_post(record: &Record) -> &'static str {
    match record.website_type.as_deref() {
        Some("Habr") => "fas fa-heading",
        _ => "fas fa-globe",
    }
}

fn webpage(record: &Record) -> &'static str {
    match record.website_type.as_deref() {
        Some("GitHub") => "fab fa-github",
        _ => "fas fa-globe",
    }
}

fn presentation(record: &Record) -> &'static str {
    match record.presentation_type.as_deref() {
        Some("Lecture") => "fas fa-chalkboard-teacher",
        _ => "fas fa-comments",
    }
}

fn paper(_: &Record) -> &'static str {
    "fas fa-file-alt"
}

fn thesis(_: &Record) -> &'static str {
    "fas fa-user-graduate"
}

fn book(_: &Record) -> &'static str {
    "fas fa-book"
}

fn book_section(_: &Record) -> &'static str {
    "fas fa-book-open"
}

fn report(_: &Record) -> &'static str {
    "fas fa-file-contract"
}

fn video(_: &Record) -> &'static str {
    "fas fa-video"
}

fn misc(_: &Record) -> &'static str {
    "far fa-question-circle"
}

fn template_for(kind: &ItemKind) -> IconFn {
    TEMPLATES
        .iter()
        .find(|(name, _)| *name == kind.as_str())
        .map(|(_, icon)| *icon)
        .unwrap_or(misc)
}

/// Link that re-runs the page with `query` in the search box.
pub fn query_link(query: &str) -> String {
    format!("?q={}", utf8_percent_encode(query, QUERY_ENCODE_SET))
}

fn title(record: &Record) -> String {
    let text = escape(record.title.as_str());
    match record.link() {
        Some(url) => format!(r#"<a href="{}" target="_blank">{text}</a>"#, escape(url)),
        None => format!(r#"<span class="unavailable">{text}</span>"#),
    }
}

fn tags(record: &Record) -> String {
    record
        .tags
        .iter()
        .map(|tag| {
            let link = query_link(tag);
            format!(
                r#"<a href="{}" class="tag">{}</a>"#,
                escape(link.as_str()),
                escape(tag.as_str())
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn share(record: &Record) -> String {
    format!(
        r#"<a href="?s={}" class="qr"><i class="fa fa-qrcode"></i></a>"#,
        utf8_percent_encode(&record.human_key, QUERY_ENCODE_SET)
    )
}

/// One table row: icon and title, tags, share action.
pub fn row(record: &Record) -> String {
    let icon = template_for(&record.kind)(record);
    format!(
        r#"<tr id="{id}" class="publication"><td><span class="icon"><i class="{icon}"></i></span>{title}</td><td>{tags}</td><td>{share}</td></tr>"#,
        id = escape(record.human_key.as_str()),
        title = title(record),
        tags = tags(record),
        share = share(record),
    )
}

/// The whole results body. Always rebuilt from scratch.
pub fn table_body(records: &[&Record]) -> String {
    records.iter().map(|r| row(r)).collect::<Vec<_>>().join("\n")
}

fn share_view(card: &ShareCard) -> String {
    format!(
        r#"<table><tbody><tr><td id="qrcode"><a href="./">{svg}</a></td></tr>
<tr><td id="qrcaption">{title}</td></tr>
<tr><td id="qrlink"><a href="{link}">{link}</a></td></tr></tbody></table>"#,
        svg = card.svg,
        title = escape(card.title.as_str()),
        link = escape(card.link.as_str()),
    )
}

/// Full page for a view. Empty containers are hidden.
pub fn page(view: &View<'_>) -> String {
    let hidden = r#" style="display: none""#;
    let (query, results, message, qr) = match view {
        View::Results {
            query,
            records,
            notice,
        } => {
            let message = match notice {
                Some(notice) => notice.clone(),
                None if records.is_empty() && !query.trim().is_empty() => {
                    "Nothing found".to_string()
                }
                None => String::new(),
            };
            (query.as_str(), table_body(records), message, String::new())
        }
        View::Message(msg) => ("", String::new(), msg.clone(), String::new()),
        View::Share(card) => ("", String::new(), String::new(), share_view(card)),
    };
    let show = |visible: bool| if visible { "" } else { hidden };
    let results_visible = !results.is_empty();
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Publications</title>
<link rel="stylesheet" href="https://use.fontawesome.com/releases/v5.15.4/css/all.css">
</head>
<body>
<form method="get" action="./"><input id="request" name="q" type="search" autocomplete="off" value="{query}"></form>
<div id="publicationscontainer"{pub_style}><table><tbody>
{results}
</tbody></table></div>
<div id="messagecontainer"{msg_style}><p id="message">{message}</p></div>
<div id="qrcontainer"{qr_style}>{qr}</div>
<script>document.addEventListener('keydown', function (e) {{ if (e.key === 'Escape' && document.getElementById('qrcontainer').style.display !== 'none') {{ window.location.href = './'; }} }});</script>
</body>
</html>
"#,
        query = escape(query),
        pub_style = show(results_visible),
        msg_style = show(!message.is_empty()),
        message = escape(message.as_str()),
        qr_style = show(!qr.is_empty()),
    )
}
