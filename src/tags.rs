use std::sync::{
    Arc, Mutex,
    mpsc::{self, Receiver},
};
use std::thread;

use crate::error::Result;

/// Tags that arrived for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagUpdate {
    pub key: String,
    pub tags: Vec<String>,
}

/// Anything that can look up the tags of a record by key.
pub trait TagSource: Send + Sync {
    fn tags(&self, key: &str) -> Result<Vec<String>>;
}

impl<F> TagSource for F
where
    F: Fn(&str) -> Result<Vec<String>> + Send + Sync,
{
    fn tags(&self, key: &str) -> Result<Vec<String>> {
        self(key)
    }
}

/// Start fetching tags for `keys` on `workers` threads.
///
/// Each finished fetch is sent as a [`TagUpdate`]; the receiver closes once every key has been
/// tried. Failed fetches are logged and skipped.
pub fn spawn(
    source: Arc<dyn TagSource>,
    keys: Vec<String>,
    workers: usize,
) -> Receiver<TagUpdate> {
    let (tx, rx) = mpsc::channel();
    let queue = Arc::new(Mutex::new(keys.into_iter()));
    for _ in 0..workers.max(1) {
        let tx = tx.clone();
        let queue = Arc::clone(&queue);
        let source = Arc::clone(&source);
        thread::spawn(move || {
            loop {
                let next = match queue.lock() {
                    Ok(mut keys) => keys.next(),
                    Err(_) => None,
                };
                let Some(key) = next else { break };
                match source.tags(&key) {
                    Ok(tags) => {
                        if tx.send(TagUpdate { key, tags }).is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("tags for {key}: {e}"),
                }
            }
        });
    }
    rx
}
