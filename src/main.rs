use std::{
    net::SocketAddr,
    process::ExitCode,
    sync::{Arc, RwLock, mpsc::Receiver},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream};

use crate::{
    cache::Cache,
    cli::{Cli, Command, Format, Source},
    controller::{Outcome, View},
    loader::{Loaded, snapshot, zotero::ZoteroClient},
    record::Record,
    session::Session,
    tags::TagUpdate,
};

mod cache;
mod cli;
mod controller;
mod error;
mod export;
mod loader;
mod normalize;
mod record;
mod render;
mod search;
mod serve;
mod session;
mod share;
mod slug;
mod tags;

/// A session plus the tag stream still feeding it, if any.
struct Startup {
    session: Session,
    pending: Option<Receiver<TagUpdate>>,
}

fn zotero_client(args: &Cli) -> error::Result<ZoteroClient> {
    let z = &args.zotero;
    let library = ZoteroClient::library_url(&z.api_base, z.library_type.segment(), &z.library_id)?;
    Ok(ZoteroClient::new(
        library,
        z.api_key.clone(),
        Duration::from_secs(z.timeout),
    ))
}

fn start(args: &Cli, cache: &Cache, refresh: bool) -> error::Result<Startup> {
    let loaded = match &args.from {
        Source::File(path) => snapshot::from_file(path)?,
        Source::Url(url) => snapshot::from_url(url)?,
        Source::Zotero => {
            let client = Arc::new(zotero_client(args)?);
            let loaded = if refresh {
                loader::fetch(&*client, cache)?
            } else {
                loader::load(&*client, cache)?
            };
            if loaded.needs_tags() {
                let keys = loaded.records.iter().map(|r| r.key.clone()).collect();
                let pending = tags::spawn(client, keys, args.zotero.workers);
                return Ok(Startup {
                    session: loaded.into_session(),
                    pending: Some(pending),
                });
            }
            loaded
        }
    };
    Ok(ready(loaded))
}

fn ready(loaded: Loaded) -> Startup {
    Startup {
        session: loaded.into_session(),
        pending: None,
    }
}

/// Block until every tag request has answered, then persist the tagged dataset.
fn wait_for_tags(session: &mut Session, pending: Receiver<TagUpdate>, cache: &Cache) {
    let bar = ProgressBar::new(session.records().len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} tags {pos}/{len} {wide_bar}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for update in pending {
        session.apply(update);
        bar.inc(1);
    }
    bar.finish_and_clear();
    loader::seal(session, cache);
}

fn fail(message: &str) -> ExitCode {
    eprintln!("{}", message.if_supports_color(Stream::Stderr, |t| t.red()));
    ExitCode::FAILURE
}

fn print_text(records: &[&Record]) {
    for record in records {
        let tags = record.tags.join(", ");
        println!(
            "{}  {}  {}  {}",
            record.date.if_supports_color(Stream::Stdout, |t| t.dimmed()),
            record.title.if_supports_color(Stream::Stdout, |t| t.bold()),
            tags.if_supports_color(Stream::Stdout, |t| t.cyan()),
            record.human_key.if_supports_color(Stream::Stdout, |t| t.dimmed()),
        );
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Cli::parse();
    let cache = Cache::new(args.cache_dir.clone().unwrap_or_else(Cache::default_dir));

    if let Command::Serve { bind, port } = args.command {
        let startup = start(&args, &cache, false).unwrap_or_else(|e| {
            log::error!("{e}");
            Startup {
                session: Session::unavailable(),
                pending: None,
            }
        });
        log::info!(
            "{} publications from {:?}",
            startup.session.records().len(),
            startup.session.origin()
        );
        let session = Arc::new(RwLock::new(startup.session));
        if let Some(pending) = startup.pending {
            serve::follow_tags(Arc::clone(&session), pending, cache.clone());
        }
        let addr = SocketAddr::new(bind, port);
        tokio::runtime::Runtime::new()
            .context("starting the async runtime")?
            .block_on(serve::run(session, args.site_root.clone(), addr))
            .with_context(|| format!("serving on {addr}"))?;
        return Ok(ExitCode::SUCCESS);
    }

    if matches!(args.command, Command::Refresh) && args.from != Source::Zotero {
        return Ok(fail("refresh only works with --from zotero"));
    }

    let Startup {
        mut session,
        pending,
    } = match start(&args, &cache, matches!(args.command, Command::Refresh)) {
        Ok(startup) => startup,
        Err(e) => {
            log::error!("{e}");
            return Ok(fail(e.user_message()));
        }
    };
    if let Some(pending) = pending {
        wait_for_tags(&mut session, pending, &cache);
    }
    log::info!(
        "{} publications from {:?}",
        session.records().len(),
        session.origin()
    );

    match &args.command {
        Command::Search { query, format } => {
            let query = query.join(" ");
            let hits = session.search(&query);
            match format {
                Format::Text if hits.is_empty() => return Ok(fail("Nothing found")),
                Format::Text => print_text(&hits),
                Format::Rows => println!("{}", render::table_body(&hits)),
                Format::Page => {
                    let view = View::Results {
                        query,
                        records: hits,
                        notice: None,
                    };
                    println!("{}", render::page(&view));
                }
            }
        }
        Command::Open { key } => match controller::direct_link(&session, &key.trim().to_lowercase()) {
            Outcome::Redirect(url) => println!("{url}"),
            Outcome::Page(View::Message(message)) => return Ok(fail(&message)),
            Outcome::Page(_) => return Ok(fail(controller::NO_DATA)),
        },
        Command::Share { key, svg } => {
            let key = key.trim().to_lowercase();
            let Some(record) = session.by_human_key(&key) else {
                return Ok(fail(&format!("Hi! We didn't find publication \"{key}\"")));
            };
            let link = share::share_link(&args.site_root, &record.human_key);
            let code = if *svg {
                share::qr_svg(&link)
            } else {
                share::qr_terminal(&link)
            };
            match code {
                Ok(code) if *svg => println!("{code}"),
                Ok(code) => {
                    println!("{}", record.title.if_supports_color(Stream::Stdout, |t| t.bold()));
                    println!("{link}");
                    println!("{code}");
                }
                Err(e) => {
                    log::error!("{e}");
                    return Ok(fail(e.user_message()));
                }
            }
        }
        Command::Export { query } => {
            let hits = session.search(&query.join(" "));
            println!("{}", export::to_biblatex(&hits));
        }
        Command::Refresh => {
            println!(
                "{} {} publications cached in {}",
                "✓".if_supports_color(Stream::Stdout, |t| t.green()),
                session.records().len(),
                cache.dir().display()
            );
        }
        Command::Serve { .. } => unreachable!("handled above"),
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, session::Origin};

    #[test]
    fn unreadable_snapshot_reports_user_message() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let args = Cli::try_parse_from([
            "pubshelf",
            "--from",
            path.to_str().unwrap(),
            "--cache-dir",
            tmp.path().to_str().unwrap(),
            "search",
        ])
        .unwrap();
        let cache = Cache::new(tmp.path());
        let err = start(&args, &cache, false).err().unwrap();
        assert!(matches!(err, Error::Payload { .. }));
        assert_eq!(err.user_message(), "Publication list is unreadable");
    }

    #[test]
    fn snapshot_sessions_need_no_tags() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("list.json");
        std::fs::write(
            &path,
            r#"[{"key":"K1","title":"Paper","date":"2020","itemType":"thesis"}]"#,
        )
        .unwrap();
        let args = Cli::try_parse_from(["pubshelf", "--from", path.to_str().unwrap(), "export"]).unwrap();
        let startup = start(&args, &Cache::new(tmp.path()), false).unwrap();
        assert!(startup.pending.is_none());
        assert_eq!(startup.session.origin(), Origin::Snapshot);
        assert_eq!(startup.session.records()[0].human_key, "2020-paper");
    }
}
