use crate::api::parsers::{parse_scoreboard, Scoreboard, REGULAR_SEASON};
use crate::config::settings::EspnSettings;
use crate::domain::{Season, Week};
use crate::http::ThrottledClient;
use anyhow::{Context, Result};
use log::info;
use serde_json::Value;

const SCOREBOARD_PATH: &str = "/apis/site/v2/sports/football/nfl/scoreboard";

/// ESPN public scoreboard client
pub struct EspnClient {
    client: ThrottledClient,
    base_url: String,
}

impl EspnClient {
    pub fn new(settings: &EspnSettings) -> Result<Self> {
        let client = ThrottledClient::new(
            settings.user_agent,
            settings.timeout_secs,
            settings.min_request_gap_ms,
        )?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a scoreboard, either the current one or a specific regular
    /// season week. Returns the raw body alongside the parsed games so the
    /// caller can snapshot it.
    pub async fn fetch_scoreboard(&mut self, target: Option<(Season, Week)>) -> Result<(Value, Scoreboard)> {
        let url = self.build_scoreboard_url(target);
        info!("Fetching scoreboard from {}", url);

        let raw = self
            .client
            .get_json(&url)
            .await
            .context("Failed to fetch ESPN scoreboard")?;
        let scoreboard = parse_scoreboard(raw.clone())?;

        info!(
            "Scoreboard has {} games (season {:?}, week {:?})",
            scoreboard.games.len(),
            scoreboard.season,
            scoreboard.week
        );
        Ok((raw, scoreboard))
    }

    fn build_scoreboard_url(&self, target: Option<(Season, Week)>) -> String {
        match target {
            Some((season, week)) => format!(
                "{}{}?seasontype={}&week={}&dates={}",
                self.base_url, SCOREBOARD_PATH, REGULAR_SEASON, week, season
            ),
            None => format!("{}{}", self.base_url, SCOREBOARD_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::parsers::scoreboard::tests::event;
    use crate::domain::GameStatus;
    use mockito::Matcher;
    use serde_json::json;

    fn settings(base_url: &str) -> EspnSettings {
        EspnSettings {
            base_url: base_url.to_string(),
            min_request_gap_ms: 0,
            ..EspnSettings::default()
        }
    }

    #[test]
    fn test_build_scoreboard_url() {
        let client = EspnClient::new(&settings("https://site.api.espn.com/")).unwrap();
        assert_eq!(
            client.build_scoreboard_url(None),
            "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard"
        );
        assert_eq!(
            client.build_scoreboard_url(Some((2025, 7))),
            "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard?seasontype=2&week=7&dates=2025"
        );
    }

    #[tokio::test]
    async fn test_fetch_week_scoreboard() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "season": {"year": 2025},
            "week": {"number": 7},
            "events": [event("401", ("LV", "Las Vegas Raiders", "0"), ("KC", "Kansas City Chiefs", "31"), "STATUS_FINAL", true)]
        });
        let mock = server
            .mock("GET", SCOREBOARD_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("seasontype".into(), "2".into()),
                Matcher::UrlEncoded("week".into(), "7".into()),
                Matcher::UrlEncoded("dates".into(), "2025".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let mut client = EspnClient::new(&settings(&server.url())).unwrap();
        let (raw, board) = client.fetch_scoreboard(Some((2025, 7))).await.unwrap();

        mock.assert_async().await;
        assert_eq!(raw, body);
        assert_eq!(board.week, Some(7));
        assert_eq!(board.games[0].status, GameStatus::Final);
        assert_eq!(board.games[0].away_score, Some(31));
    }

    #[tokio::test]
    async fn test_fetch_fails_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", SCOREBOARD_PATH)
            .with_status(503)
            .create_async()
            .await;

        let mut client = EspnClient::new(&settings(&server.url())).unwrap();
        assert!(client.fetch_scoreboard(None).await.is_err());
    }
}
