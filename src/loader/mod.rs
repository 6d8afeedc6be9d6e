use crate::{
    cache::Cache,
    error::{Error, Result},
    normalize::normalize,
    record::Record,
    session::{Origin, Session},
};

pub mod snapshot;
pub mod zotero;

/// Answer of the cheap "has anything changed since version N" request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Changed,
    Unchanged,
}

/// Raw publication list plus the library version it belongs to.
#[derive(Debug, Default)]
pub struct Listing {
    pub records: Vec<Record>,
    pub version: Option<String>,
}

/// A remote bibliography that can be probed and listed.
pub trait Library {
    fn probe(&self, version: Option<&str>) -> Result<Probe>;
    fn publications(&self) -> Result<Listing>;
}

/// Dataset ready for a session.
#[derive(Debug)]
pub struct Loaded {
    pub records: Vec<Record>,
    pub origin: Origin,
    pub version: Option<String>,
}

impl Loaded {
    /// Freshly listed records still wait for their tags.
    pub fn needs_tags(&self) -> bool {
        self.origin == Origin::Remote
    }

    pub fn into_session(self) -> Session {
        Session::new(self.records, self.origin, self.version)
    }
}

/// Probe the library and either reuse the cache or fetch everything again.
///
/// An unreachable library falls back to the cache; with no cache the full fetch is attempted
/// anyway, and if that fails too the result is [`Error::NoData`].
pub fn load(library: &dyn Library, cache: &Cache) -> Result<Loaded> {
    let version = cache.version().unwrap_or_else(|e| {
        log::warn!("{e}");
        None
    });
    match library.probe(version.as_deref()) {
        Ok(Probe::Changed) => {
            log::info!("library changed since version {version:?}, fetching");
            return fetch(library, cache);
        }
        Ok(Probe::Unchanged) => log::info!("library unchanged at version {version:?}"),
        Err(e) => log::warn!("probe failed, trying cache: {e}"),
    }
    match cache.load() {
        Ok(Some(records)) => Ok(Loaded {
            records,
            origin: Origin::Cache,
            version,
        }),
        Ok(None) => fetch(library, cache),
        Err(e) => {
            log::warn!("{e}");
            fetch(library, cache)
        }
    }
}

/// Fetch the full list, normalize it and overwrite the cache.
///
/// The records are cached right away, but without a version: until [`seal`] runs after phase 2,
/// the next start probes unconditionally and fetches again.
pub fn fetch(library: &dyn Library, cache: &Cache) -> Result<Loaded> {
    let listing = library.publications().map_err(|e| {
        log::error!("fetching publications failed: {e}");
        Error::NoData
    })?;
    let records = normalize(listing.records);
    log::info!("fetched {} publications", records.len());
    if let Err(e) = cache.store(&records, None) {
        log::warn!("could not update cache: {e}");
    }
    Ok(Loaded {
        records,
        origin: Origin::Remote,
        version: listing.version,
    })
}

/// Persist the tagged records together with the library version they belong to.
pub fn seal(session: &Session, cache: &Cache) {
    match cache.store(session.records(), session.version()) {
        Ok(()) => log::info!("cached {} tagged publications", session.records().len()),
        Err(e) => log::warn!("could not update cache: {e}"),
    }
}
