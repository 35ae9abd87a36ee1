//! Async HTTP client for the chess.com published-data API.

use std::time::Duration;

use gambit_core::{Batch, game::RawGame, store::GameSource};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{PipelineConfig, error::FetchError};

#[derive(Deserialize)]
struct GamesResponse {
  #[serde(default)]
  games: Vec<RawGame>,
}

#[derive(Deserialize)]
struct ArchivesResponse {
  #[serde(default)]
  archives: Vec<String>,
}

/// A [`GameSource`] backed by `https://api.chess.com/pub`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ChessComClient {
  client:   Client,
  base_url: String,
  timeout:  Duration,
}

impl ChessComClient {
  pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(config.user_agent.as_str())
      .build()?;
    Ok(Self {
      client,
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
      timeout,
    })
  }

  fn url(&self, path: &str) -> String { format!("{}{path}", self.base_url) }

  /// GET `url` and decode the body. A non-2xx status is an error.
  async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
    let timed_out = |e: reqwest::Error| {
      if e.is_timeout() {
        FetchError::Timeout {
          secs: self.timeout.as_secs(),
        }
      } else {
        FetchError::Transport(e)
      }
    };

    let resp = self.client.get(&url).send().await.map_err(timed_out)?;
    if !resp.status().is_success() {
      return Err(FetchError::Status {
        url,
        status: resp.status().as_u16(),
      });
    }
    resp.json::<T>().await.map_err(timed_out)
  }
}

/// `.../games/2024/01` → 2024-01.
fn batch_from_archive_url(url: &str) -> Result<Batch, FetchError> {
  let decode = || FetchError::Decode(url.to_string());
  let mut segments = url.trim_end_matches('/').rsplit('/');
  let month = segments.next().and_then(|m| m.parse().ok()).ok_or_else(decode)?;
  let year = segments.next().and_then(|y| y.parse().ok()).ok_or_else(decode)?;
  Batch::new(year, month).map_err(|_| decode())
}

impl GameSource for ChessComClient {
  type Error = FetchError;

  async fn fetch_games(&self, username: &str, batch: Batch) -> Result<Vec<RawGame>, FetchError> {
    let url = self.url(&format!(
      "/player/{username}/games/{:04}/{:02}",
      batch.year(),
      batch.month()
    ));
    debug!(%url, "fetching monthly archive");
    let body: GamesResponse = self.get_json(url).await?;
    Ok(body.games)
  }

  async fn archives(&self, username: &str) -> Result<Vec<Batch>, FetchError> {
    let url = self.url(&format!("/player/{username}/games/archives"));
    let body: ArchivesResponse = self.get_json(url).await?;
    let mut batches = body
      .archives
      .iter()
      .map(|u| batch_from_archive_url(u))
      .collect::<Result<Vec<_>, _>>()?;
    batches.sort();
    Ok(batches)
  }
}

#[cfg(test)]
mod tests {
  use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
  };

  use super::*;

  /// Answer a single request on a local port with `status` and `body`.
  /// Returns the base URL to point the client at.
  async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut request = vec![0u8; 4096];
      let _ = socket.read(&mut request).await;
      let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
    });
    format!("http://{addr}/pub")
  }

  fn client_for(base_url: String) -> ChessComClient {
    let mut cfg = PipelineConfig::new("alice", "/tmp/lake");
    cfg.api_base_url = base_url;
    ChessComClient::new(&cfg).unwrap()
  }

  fn january() -> Batch { Batch::new(2024, 1).unwrap() }

  #[test]
  fn archive_urls_map_to_batches() {
    let b = batch_from_archive_url("https://api.chess.com/pub/player/x/games/2023/07")
      .unwrap();
    assert_eq!(b, Batch::new(2023, 7).unwrap());
  }

  #[test]
  fn malformed_archive_urls_are_rejected() {
    for url in ["", "https://api.chess.com/pub/player/x/games/2023/13", "a/b"] {
      assert!(matches!(
        batch_from_archive_url(url),
        Err(FetchError::Decode(_))
      ));
    }
  }

  #[test]
  fn games_response_tolerates_missing_list() {
    let body: GamesResponse = serde_json::from_str("{}").unwrap();
    assert!(body.games.is_empty());
  }

  #[test]
  fn base_url_trailing_slash_is_dropped() {
    let mut cfg = PipelineConfig::new("alice", "/tmp/lake");
    cfg.api_base_url = "http://localhost:9999/pub/".into();
    let client = ChessComClient::new(&cfg).unwrap();
    assert_eq!(
      client.url("/player/alice/games/archives"),
      "http://localhost:9999/pub/player/alice/games/archives"
    );
  }

  // ── HTTP ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn not_found_is_a_status_error() {
    let client = client_for(serve_once("404 Not Found", "").await);
    let err = client.fetch_games("alice", january()).await.unwrap_err();
    match err {
      FetchError::Status { url, status } => {
        assert_eq!(status, 404);
        assert!(url.ends_with("/pub/player/alice/games/2024/01"), "{url}");
      }
      other => panic!("expected a status error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn server_error_is_not_an_empty_month() {
    let client = client_for(serve_once("500 Internal Server Error", r#"{"games":[]}"#).await);
    let err = client.fetch_games("alice", january()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }), "{err:?}");
  }

  #[tokio::test]
  async fn empty_month_is_an_empty_list() {
    let client = client_for(serve_once("200 OK", r#"{"games":[]}"#).await);
    let games = client.fetch_games("alice", january()).await.unwrap();
    assert!(games.is_empty());
  }

  #[tokio::test]
  async fn archives_come_back_oldest_first() {
    let body = r#"{"archives":[
      "https://api.chess.com/pub/player/alice/games/2024/01",
      "https://api.chess.com/pub/player/alice/games/2023/11"
    ]}"#;
    let client = client_for(serve_once("200 OK", body).await);
    let batches = client.archives("alice").await.unwrap();
    assert_eq!(batches, vec![Batch::new(2023, 11).unwrap(), january()]);
  }
}
