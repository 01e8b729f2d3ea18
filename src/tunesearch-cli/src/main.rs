use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use itunes_provider::{ItunesClient, ItunesConfig};
use thiserror::Error;
use tunesearch_audio::AudioEngine;
use tunesearch_core::{
    init_logging, AppDirs, Config, SearchResultItem, SearchService, ValidationError,
};
use tunesearch_player::{PreviewPlayer, SearchController, SearchPhase};
use tunesearch_ui::{run_ui, Theme, UiContext};

#[derive(Debug, Parser)]
#[command(name = "tunesearch", version, about = "Search the music catalog and play previews")]
struct Cli {
    /// Search endpoint override (takes precedence over config)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Never open an audio device; previews play silently
    #[arg(long)]
    no_audio: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single search and print the results
    Search(SearchCommand),
}

#[derive(Debug, Parser, Clone)]
struct SearchCommand {
    /// Search term, sent verbatim
    term: String,
    /// Print results as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum SearchCommandError {
    #[error("search term must not be blank")]
    BlankTerm,
    #[error("{0}")]
    Failed(String),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let mut config = Config::load_or_default(&dirs)?;
    apply_overrides(&mut config, &cli)?;
    // the terminal screen owns stdout; only one-shot commands log to it
    let _logging = init_logging(&config.logging, &dirs, cli.command.is_some())?;

    let client = ItunesClient::new(ItunesConfig::from(&config.search))
        .with_context(|| format!("invalid search endpoint '{}'", config.search.endpoint))?;
    tracing::info!(
        "Using search endpoint {} (config dir: {})",
        client.endpoint(),
        dirs.config_dir().display()
    );
    let service: Arc<dyn SearchService> = Arc::new(client);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    match cli.command {
        Some(Command::Search(search)) => {
            let items = runtime.block_on(run_search(service, &search.term))?;
            if search.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print!("{}", format_table(&items));
            }
        }
        None => {
            let _enter = runtime.enter();
            let context = UiContext {
                controller: SearchController::new(service),
                player: PreviewPlayer::new(audio_engine(cli.no_audio)),
                theme: Theme::from_config(config.ui.theme.as_deref()),
            };
            run_ui(context)?;
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), ValidationError> {
    if let Some(endpoint) = &cli.endpoint {
        config.search.endpoint = endpoint.clone();
        config.validate()?;
    }
    Ok(())
}

/// Drives one search inline, without a spawned task.
async fn run_search(
    service: Arc<dyn SearchService>,
    term: &str,
) -> Result<Vec<SearchResultItem>, SearchCommandError> {
    let controller = SearchController::new(service);
    let ticket = controller
        .begin(term)
        .ok_or(SearchCommandError::BlankTerm)?;
    controller.complete(ticket).await;

    let state = controller.snapshot();
    match state.phase() {
        SearchPhase::Success { items } => Ok(items.clone()),
        SearchPhase::Error { message } => Err(SearchCommandError::Failed(message.clone())),
        SearchPhase::Idle | SearchPhase::Loading => Err(SearchCommandError::Failed(
            "search did not complete".to_string(),
        )),
    }
}

fn format_table(items: &[SearchResultItem]) -> String {
    if items.is_empty() {
        return "No results found\n".to_string();
    }

    let artist_width = items
        .iter()
        .map(|item| item.artist_name().chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for item in items {
        let marker = if item.has_preview() { "▶" } else { " " };
        out.push_str(&format!(
            "{marker} {:<artist_width$}  {}  [{}, {}]\n",
            item.artist_name(),
            item.track_name(),
            item.kind(),
            item.genre_name(),
        ));
    }
    out
}

#[cfg(feature = "cpal-backend")]
fn audio_engine(no_audio: bool) -> Arc<dyn AudioEngine> {
    if no_audio {
        Arc::new(tunesearch_audio::NullAudioEngine::new())
    } else {
        Arc::new(tunesearch_audio::CpalAudioEngine)
    }
}

#[cfg(not(feature = "cpal-backend"))]
fn audio_engine(no_audio: bool) -> Arc<dyn AudioEngine> {
    if !no_audio {
        tracing::debug!("built without cpal-backend; previews play silently");
    }
    Arc::new(tunesearch_audio::NullAudioEngine::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tunesearch_core::{
        map_results, NetworkError, NetworkResult, RawResultItem, SearchResponse,
    };

    struct FixedService(NetworkResult<SearchResponse>);

    #[async_trait]
    impl SearchService for FixedService {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _term: &str) -> NetworkResult<SearchResponse> {
            self.0.clone()
        }
    }

    fn beatles() -> SearchResponse {
        SearchResponse {
            results: vec![
                RawResultItem {
                    kind: Some("song".into()),
                    artist_name: Some("The Beatles".into()),
                    track_name: Some("Yesterday".into()),
                    primary_genre_name: Some("Rock".into()),
                    preview_url: Some("https://example.test/y.m4a".into()),
                    ..RawResultItem::default()
                },
                RawResultItem::default(),
            ],
        }
    }

    #[test]
    fn no_subcommand_launches_screen() {
        let cli = Cli::try_parse_from(["tunesearch", "--no-audio"]).expect("args should parse");
        assert!(cli.command.is_none());
        assert!(cli.no_audio);
        assert!(cli.endpoint.is_none());
    }

    #[test]
    fn search_subcommand_parses_term_and_flags() {
        let cli = Cli::try_parse_from([
            "tunesearch",
            "search",
            "simon & garfunkel",
            "--json",
            "--endpoint",
            "http://localhost:9000/search",
        ])
        .expect("args should parse");

        let Some(Command::Search(search)) = cli.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(search.term, "simon & garfunkel");
        assert!(search.json);
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000/search"));
    }

    #[test]
    fn endpoint_override_replaces_config() {
        let cli = Cli::try_parse_from(["tunesearch", "--endpoint", "http://localhost/s"])
            .expect("args should parse");
        let mut config = Config::default();
        apply_overrides(&mut config, &cli).expect("override should validate");
        assert_eq!(config.search.endpoint, "http://localhost/s");
    }

    #[test]
    fn blank_endpoint_override_is_rejected() {
        let cli =
            Cli::try_parse_from(["tunesearch", "--endpoint", "  "]).expect("args should parse");
        let mut config = Config::default();
        let err = apply_overrides(&mut config, &cli).expect_err("blank endpoint");
        assert!(matches!(err, ValidationError::EmptyEndpoint));
    }

    #[tokio::test]
    async fn run_search_returns_mapped_items() {
        let items = run_search(Arc::new(FixedService(Ok(beatles()))), "Beatles")
            .await
            .expect("search should succeed");
        assert_eq!(items, map_results(beatles()));
        assert_eq!(items[1].artist_name(), "Unknown Artist");
    }

    #[tokio::test]
    async fn run_search_rejects_blank_term() {
        let err = run_search(Arc::new(FixedService(Ok(beatles()))), "   ")
            .await
            .expect_err("blank term");
        assert!(matches!(err, SearchCommandError::BlankTerm));
    }

    #[tokio::test]
    async fn run_search_reports_failures() {
        let failing = FixedService(Err(NetworkError::Transport {
            message: "connection refused".into(),
        }));
        let err = run_search(Arc::new(failing), "Beatles")
            .await
            .expect_err("search should fail");
        assert_eq!(
            err.to_string(),
            "Error: network error: connection refused"
        );
    }

    #[test]
    fn table_marks_rows_with_previews() {
        let table = format_table(&map_results(beatles()));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("▶ The Beatles"));
        assert!(lines[0].contains("Yesterday  [song, Rock]"));
        assert!(lines[1].starts_with("  Unknown Artist"));
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(format_table(&[]), "No results found\n");
    }
}
