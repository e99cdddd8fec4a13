// src/config/sources.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use url::Url;

const ENV_TARGETS: &str = "SCRAPE_TARGETS";
const SOURCES_FILE: &str = "config/feed_sources.toml";

/// One configured outlet: display name + feed URL.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeedSource {
    pub source: String,
    pub feed_url: String,
}

pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource {
            source: "The Stage".to_string(),
            feed_url: "https://www.thestage.co.uk/feed".to_string(),
        },
        FeedSource {
            source: "WhatsOnStage".to_string(),
            feed_url: "https://www.whatsonstage.com/news/feed/".to_string(),
        },
        FeedSource {
            source: "BroadwayWorld UK".to_string(),
            // fallback feed
            feed_url: "https://www.broadwayworld.com/bwwclassicalmusic.cfm?feed=rss".to_string(),
        },
    ]
}

/// Resolve the source list:
/// 1) $SCRAPE_TARGETS (comma-separated feed URLs, names derived from hosts)
/// 2) config/feed_sources.toml (`sources = ["https://...", ...]`)
/// 3) hard-coded defaults
///
/// An invalid override never aborts startup; it logs and falls back.
pub fn load_sources() -> Vec<FeedSource> {
    if let Ok(raw) = std::env::var(ENV_TARGETS) {
        match parse_targets(&raw) {
            Ok(list) => return list,
            Err(e) => {
                tracing::warn!(error = ?e, "invalid SCRAPE_TARGETS; falling back to defaults");
                return default_sources();
            }
        }
    }

    let file = Path::new(SOURCES_FILE);
    if file.exists() {
        match load_sources_from(file) {
            Ok(list) => return list,
            Err(e) => {
                tracing::warn!(error = ?e, path = SOURCES_FILE, "unreadable sources file; using defaults");
                return default_sources();
            }
        }
    }

    default_sources()
}

pub fn load_sources_from(path: &Path) -> Result<Vec<FeedSource>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<String>,
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let parsed: TomlSources = toml::from_str(&content).context("parsing sources toml")?;
    from_urls(parsed.sources.iter().map(String::as_str))
}

/// Parse the comma-separated override. Every element must be a valid
/// absolute URL; the display name falls back to the host.
pub fn parse_targets(raw: &str) -> Result<Vec<FeedSource>> {
    from_urls(raw.split(',').map(str::trim).filter(|p| !p.is_empty()))
}

fn from_urls<'a>(urls: impl Iterator<Item = &'a str>) -> Result<Vec<FeedSource>> {
    let mut out = Vec::new();
    for raw in urls {
        let parsed = Url::parse(raw).with_context(|| format!("invalid feed url: {raw}"))?;
        let source = parsed
            .host_str()
            .ok_or_else(|| anyhow!("feed url has no host: {raw}"))?
            .to_string();
        out.push(FeedSource {
            source,
            feed_url: raw.to_string(),
        });
    }
    if out.is_empty() {
        anyhow::bail!("no feed urls configured");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, io::Write};

    #[test]
    fn targets_parse_with_host_derived_names() {
        let list = parse_targets("https://a.example/feed, https://b.example/rss ").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].source, "a.example");
        assert_eq!(list[1].feed_url, "https://b.example/rss");
    }

    #[test]
    fn invalid_or_empty_targets_are_rejected() {
        assert!(parse_targets("not a url").is_err());
        assert!(parse_targets("  , ,").is_err());
    }

    #[test]
    fn toml_file_round_trips() {
        let mut f = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(f, r#"sources = ["https://c.example/feed"]"#).unwrap();
        let list = load_sources_from(f.path()).unwrap();
        assert_eq!(list[0].source, "c.example");
    }

    #[serial_test::serial]
    #[test]
    fn env_override_wins_and_bad_override_falls_back() {
        env::set_var(ENV_TARGETS, "https://override.example/feed");
        let list = load_sources();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].source, "override.example");

        env::set_var(ENV_TARGETS, "definitely-not-a-url");
        let fallback = load_sources();
        assert_eq!(fallback, default_sources());

        env::remove_var(ENV_TARGETS);
    }
}
