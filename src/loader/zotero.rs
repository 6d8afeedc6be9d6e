use std::time::Duration;

use serde::Deserialize;
use ureq::{Agent, Body, RequestBuilder, http::Response, typestate::WithoutBody};
use url::Url;

use crate::{
    error::{Error, Result},
    loader::{Library, Listing, Probe},
    record::{Creator, ItemKind, Record},
    tags::TagSource,
};

pub const DEFAULT_API_BASE: &str = "https://api.zotero.org/";
const PAGE_SIZE: usize = 100;

/// Client for one Zotero library (`<api>/users/<id>/` or `<api>/groups/<id>/`).
pub struct ZoteroClient {
    agent: Agent,
    library: Url,
    api_key: Option<String>,
}

impl ZoteroClient {
    pub fn new(library: Url, api_key: Option<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        ZoteroClient {
            agent: Agent::new_with_config(config),
            library,
            api_key,
        }
    }

    /// `https://api.zotero.org/users/4809962/` from its parts.
    pub fn library_url(api_base: &Url, segment: &str, id: &str) -> Result<Url> {
        let mut base = api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(&format!("{segment}/{id}/"))?)
    }

    fn authorize(&self, req: RequestBuilder<WithoutBody>) -> RequestBuilder<WithoutBody> {
        let req = req.header("Zotero-API-Version", "3");
        match &self.api_key {
            Some(key) => req.header("Zotero-API-Key", key.as_str()),
            None => req,
        }
    }

    fn get(&self, url: &Url) -> Result<Response<Body>> {
        let res = self
            .authorize(self.agent.get(url.as_str()))
            .call()
            .map_err(|e| Error::http(url.as_str(), e))?;
        if !res.status().is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: res.status().as_u16(),
            });
        }
        Ok(res)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &Url) -> Result<(T, Response<Body>)> {
        let mut res = self.get(url)?;
        let body = res
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::http(url.as_str(), e))?;
        let value = serde_json::from_str(&body).map_err(|source| Error::Payload {
            origin: url.to_string(),
            source,
        })?;
        Ok((value, res))
    }
}

fn header(res: &Response<Body>, name: &str) -> Option<String> {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl Library for ZoteroClient {
    fn probe(&self, version: Option<&str>) -> Result<Probe> {
        let url = self.library.join("items")?;
        let mut req = self.authorize(self.agent.head(url.as_str()));
        if let Some(version) = version {
            req = req.header("If-Modified-Since-Version", version);
        }
        let res = req.call().map_err(|e| Error::http(url.as_str(), e))?;
        match res.status().as_u16() {
            304 => Ok(Probe::Unchanged),
            _ if res.status().is_success() => Ok(Probe::Changed),
            status => Err(Error::Status {
                url: url.to_string(),
                status,
            }),
        }
    }

    fn publications(&self) -> Result<Listing> {
        let mut listing = Listing::default();
        loop {
            let mut url = self.library.join("publications/items")?;
            url.query_pairs_mut()
                .append_pair("sort", "date")
                .append_pair("direction", "desc")
                .append_pair("limit", &PAGE_SIZE.to_string())
                .append_pair("start", &listing.records.len().to_string());
            let (page, res): (Vec<Item>, _) = self.get_json(&url)?;
            if listing.version.is_none() {
                listing.version = header(&res, "Last-Modified-Version");
            }
            let total = header(&res, "Total-Results").and_then(|t| t.parse::<usize>().ok());
            let received = page.len();
            listing
                .records
                .extend(page.into_iter().map(|item| Record::from(item.data)));
            log::debug!("listed {} of {total:?}", listing.records.len());
            if received == 0 || total.is_none_or(|t| listing.records.len() >= t) {
                break;
            }
        }
        Ok(listing)
    }
}

impl TagSource for ZoteroClient {
    fn tags(&self, key: &str) -> Result<Vec<String>> {
        let mut url = self.library.join(&format!("items/{key}/tags"))?;
        url.query_pairs_mut().append_pair("limit", &PAGE_SIZE.to_string());
        let (tags, _): (Vec<Tag>, _) = self.get_json(&url)?;
        Ok(tags.into_iter().map(|t| t.tag).collect())
    }
}

#[derive(Deserialize)]
struct Item {
    data: ItemData,
}

/// The subset of a Zotero item's `data` object the browser uses. Tags are not read here;
/// they come from the per-item tags call.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemData {
    key: String,
    #[serde(default)]
    item_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    creators: Vec<Creator>,
    #[serde(default)]
    website_type: Option<String>,
    #[serde(default)]
    presentation_type: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

impl From<ItemData> for Record {
    fn from(data: ItemData) -> Self {
        let mut record = Record::new(data.key, ItemKind::from(data.item_type));
        record.title = data.title;
        record.date = data.date;
        record.url = non_empty(data.url);
        record.language = non_empty(data.language);
        record.creators = data.creators;
        record.website_type = non_empty(data.website_type);
        record.presentation_type = non_empty(data.presentation_type);
        record
    }
}

#[derive(Deserialize)]
struct Tag {
    tag: String,
}
