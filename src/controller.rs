use url::{Url, form_urlencoded};

use crate::{record::Record, session::Session, share, share::ShareCard};

pub const NO_DATA: &str = "No data";

/// Query-string parameters the page understands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// `d`: human key to jump to.
    pub direct: Option<String>,
    /// `q`: free-text query for the search box.
    pub query: Option<String>,
    /// `s`: human key to show the share view for.
    pub share: Option<String>,
}

impl Params {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut params = Params::default();
        let Some(raw) = raw else { return params };
        for (name, value) in form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
            match name.as_ref() {
                "d" => params.direct = Some(value.trim().to_lowercase()),
                "q" => params.query = Some(value.into_owned()),
                "s" => params.share = Some(value.trim().to_lowercase()),
                _ => {}
            }
        }
        params
    }
}

/// What the page should display.
#[derive(Debug)]
pub enum View<'a> {
    Results {
        query: String,
        records: Vec<&'a Record>,
        /// Shown above the results, e.g. when a deep link did not resolve.
        notice: Option<String>,
    },
    Message(String),
    Share(ShareCard),
}

#[derive(Debug)]
pub enum Outcome<'a> {
    /// Leave the page for the record's own url.
    Redirect(String),
    Page(View<'a>),
}

fn not_found(human_key: &str) -> View<'static> {
    View::Message(format!("Hi! We didn't find publication \"{human_key}\""))
}

/// Look up a deep-link key and decide where it leads.
pub fn direct_link<'a>(session: &'a Session, human_key: &str) -> Outcome<'a> {
    match session.by_human_key(human_key) {
        Some(record) => match record.link() {
            Some(url) => Outcome::Redirect(url.to_string()),
            None => Outcome::Page(View::Message(format!(
                "Hi! There is no url in publication \"{human_key}\""
            ))),
        },
        None => Outcome::Page(not_found(human_key)),
    }
}

pub fn share_view<'a>(session: &'a Session, site_root: &Url, human_key: &str) -> View<'a> {
    let Some(record) = session.by_human_key(human_key) else {
        return not_found(human_key);
    };
    match share::card(site_root, record) {
        Ok(card) => View::Share(card),
        Err(e) => {
            log::warn!("share view for {human_key}: {e}");
            View::Message(e.user_message().to_string())
        }
    }
}

/// Resolve a page request once the dataset is ready.
pub fn resolve<'a>(session: &'a Session, params: &Params, site_root: &Url) -> Outcome<'a> {
    if session.is_unavailable() {
        return Outcome::Page(View::Message(NO_DATA.to_string()));
    }
    let mut notice = None;
    if let Some(key) = &params.direct {
        match direct_link(session, key) {
            Outcome::Page(View::Message(message)) => notice = Some(message),
            outcome => return outcome,
        }
    }
    if let Some(key) = &params.share {
        return Outcome::Page(share_view(session, site_root, key));
    }
    let query = params.query.clone().unwrap_or_default();
    let records = session.search(&query);
    Outcome::Page(View::Results {
        query,
        records,
        notice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::normalize, record::ItemKind, session::Origin};

    fn session() -> Session {
        let mut paper = Record::new("P1", ItemKind::JournalArticle);
        paper.date = "2023".into();
        paper.title = "My Paper".into();
        paper.url = Some("https://journal.example.org/my-paper".into());
        paper.tags = vec!["nlp".into(), "search".into()];
        let mut talk = Record::new("T1", ItemKind::Presentation);
        talk.date = "2022".into();
        talk.title = "Offline talk".into();
        Session::new(normalize(vec![paper, talk]), Origin::Snapshot, None)
    }

    fn root() -> Url {
        Url::parse("https://pubs.example.org/").unwrap()
    }

    #[test]
    fn parses_query_string() {
        let params = Params::parse(Some("d=2023-My-Paper&q=neural+search&x=1"));
        assert_eq!(params.direct.as_deref(), Some("2023-my-paper"));
        assert_eq!(params.query.as_deref(), Some("neural search"));
        assert_eq!(params.share, None);
        assert_eq!(Params::parse(None), Params::default());
    }

    #[test]
    fn deep_link_redirects_to_record_url() {
        let s = session();
        let params = Params::parse(Some("d=2023-my-paper"));
        match resolve(&s, &params, &root()) {
            Outcome::Redirect(url) => assert_eq!(url, "https://journal.example.org/my-paper"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn unknown_deep_link_shows_message() {
        let s = session();
        let params = Params::parse(Some("d=2023-nope"));
        match resolve(&s, &params, &root()) {
            Outcome::Page(View::Results { notice, records, .. }) => {
                assert!(notice.unwrap().contains("2023-nope"));
                assert_eq!(records.len(), 2);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_deep_link_still_runs_the_query() {
        let s = session();
        let params = Params::parse(Some("d=2022-offline-talk&q=nlp"));
        match resolve(&s, &params, &root()) {
            Outcome::Page(View::Results {
                query,
                records,
                notice,
            }) => {
                assert!(notice.unwrap().contains("no url"));
                assert_eq!(query, "nlp");
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].key, "P1");
            }
            other => panic!("expected results, got {other:?}"),
        }
    }

    #[test]
    fn deep_link_without_url_does_not_redirect() {
        let s = session();
        match direct_link(&s, "2022-offline-talk") {
            Outcome::Page(View::Message(msg)) => assert!(msg.contains("no url")),
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn query_prefills_and_filters() {
        let s = session();
        let params = Params::parse(Some("q=nlp"));
        match resolve(&s, &params, &root()) {
            Outcome::Page(View::Results {
                query,
                records,
                notice,
            }) => {
                assert_eq!(notice, None);
                assert_eq!(query, "nlp");
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].key, "P1");
            }
            other => panic!("expected results, got {other:?}"),
        }
    }

    #[test]
    fn no_params_lists_everything() {
        let s = session();
        match resolve(&s, &Params::default(), &root()) {
            Outcome::Page(View::Results { query, records, .. }) => {
                assert!(query.is_empty());
                assert_eq!(records.len(), 2);
            }
            other => panic!("expected results, got {other:?}"),
        }
    }

    #[test]
    fn share_param_opens_share_view() {
        let s = session();
        let params = Params::parse(Some("s=2022-offline-talk"));
        match resolve(&s, &params, &root()) {
            Outcome::Page(View::Share(card)) => {
                assert_eq!(card.link, "https://pubs.example.org/?d=2022-offline-talk");
            }
            other => panic!("expected share view, got {other:?}"),
        }
    }

    #[test]
    fn unavailable_session_says_no_data() {
        let s = Session::unavailable();
        let params = Params::parse(Some("d=2023-my-paper"));
        match resolve(&s, &params, &root()) {
            Outcome::Page(View::Message(msg)) => assert_eq!(msg, NO_DATA),
            other => panic!("expected message, got {other:?}"),
        }
    }
}
