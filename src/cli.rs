use std::{fs, net::IpAddr, path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

use crate::loader::zotero::DEFAULT_API_BASE;

#[derive(Parser, Debug)]
#[command(version, about = "Browse, search and share a publication list", long_about = None)]
pub struct Cli {
    /// Where publications come from: `zotero`, a JSON snapshot file, or a snapshot URL
    #[arg(long, global = true, value_name = "SRC", env = "PUBSHELF_SOURCE", default_value = "zotero")]
    pub from: Source,

    /// Directory holding the cached dataset and its version
    #[arg(long, global = true, env = "PUBSHELF_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Public address of the page, used to build share links
    #[arg(long, global = true, env = "PUBSHELF_SITE_ROOT", default_value = "http://localhost:8080/")]
    pub site_root: Url,

    #[command(flatten)]
    pub zotero: ZoteroArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct ZoteroArgs {
    /// Zotero user or group id
    #[arg(long = "library-id", global = true, env = "ZOTERO_LIBRARY_ID", default_value = "4809962")]
    pub library_id: String,

    #[arg(long = "library-type", global = true, env = "ZOTERO_LIBRARY_TYPE", value_enum, default_value_t = LibraryType::User)]
    pub library_type: LibraryType,

    /// API key; public libraries work without one
    #[arg(long = "api-key", global = true, env = "ZOTERO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long = "api-base", global = true, env = "ZOTERO_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: Url,

    /// Seconds before a single request is abandoned
    #[arg(long, global = true, default_value_t = 20)]
    pub timeout: u64,

    /// Parallel tag fetches
    #[arg(long, global = true, default_value_t = 8)]
    pub workers: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LibraryType {
    User,
    Group,
}

impl LibraryType {
    pub fn segment(self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One line per publication
    Text,
    /// HTML table rows
    Rows,
    /// A complete HTML page
    Page,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the publication list; no query lists everything
    Search {
        #[arg(value_name = "QUERY")]
        query: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Resolve a deep-link key to the publication's url
    Open {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Print the share link and QR code of a publication
    Share {
        #[arg(value_name = "KEY")]
        key: String,
        /// Print the QR code as SVG instead of terminal blocks
        #[arg(long)]
        svg: bool,
    },
    /// Print matching publications as BibLaTeX
    Export {
        #[arg(value_name = "QUERY")]
        query: Vec<String>,
    },
    /// Fetch everything from Zotero, including tags, and rewrite the cache
    Refresh,
    /// Serve the publication page over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,
        #[arg(long, short, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Clone, Debug, PartialEq)]
/// Where the publication list is read from, which can either be
///
/// - the Zotero library configured by the `--library-*` flags,
/// - a snapshot at an http(s) URL, or
/// - a snapshot file on disk.
pub enum Source {
    Zotero,
    Url(Url),
    File(PathBuf),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("zotero") {
            return Ok(Source::Zotero);
        }
        if let Ok(url) = Url::parse(s)
            && matches!(url.scheme(), "http" | "https")
        {
            return Ok(Source::Url(url));
        }
        fs::canonicalize(s)
            .map(Source::File)
            .map_err(|e| format!("{s} is neither `zotero`, an http(s) URL nor a readable file: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn from_str_identifies_existing_file() {
        let tmp = NamedTempFile::new().expect("tmp file");
        let path = tmp.path().to_path_buf();
        let src = Source::from_str(path.to_str().unwrap()).expect("parse");
        match src {
            Source::File(p) => {
                let can = std::fs::canonicalize(&path).unwrap();
                assert_eq!(p, can);
            }
            _ => panic!("expected file source"),
        }
    }

    #[test]
    fn from_str_knows_zotero_and_urls() {
        assert_eq!(Source::from_str("zotero"), Ok(Source::Zotero));
        assert_eq!(Source::from_str("Zotero"), Ok(Source::Zotero));
        assert!(matches!(
            Source::from_str("https://example.org/publications.json"),
            Ok(Source::Url(_))
        ));
    }

    #[test]
    fn from_str_rejects_missing_files() {
        proptest::proptest!(|(s in "[A-Za-z0-9._-]{1,32}")| {
            let path = PathBuf::from(&s);
            proptest::prop_assume!(!path.exists() && !s.eq_ignore_ascii_case("zotero"));
            proptest::prop_assert!(Source::from_str(&s).is_err());
        })
    }

    #[test]
    fn parses_search_invocation() {
        let cli = Cli::try_parse_from([
            "pubshelf",
            "--from",
            "zotero",
            "search",
            "neural",
            "search",
            "--format",
            "rows",
        ])
        .unwrap();
        match cli.command {
            Command::Search { query, format } => {
                assert_eq!(query, vec!["neural", "search"]);
                assert_eq!(format, Format::Rows);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.zotero.library_type.segment(), "users");
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
