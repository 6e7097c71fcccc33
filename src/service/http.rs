//! `GameService` over the backend's JSON HTTP API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    AnswerSubmission, AnswerVerdict, FinalScore, NextRound, NextRoundResponse, ScoreRecord,
    ServiceReply, StartSession, StartSessionResponse,
};
use super::GameService;
use crate::core::{EngineConfig, ServiceError, SessionId};

/// HTTP client for the game backend.
#[derive(Clone, Debug)]
pub struct HttpGameService {
    client: Client,
    base_url: String,
}

impl HttpGameService {
    /// Client for `base_url` with reqwest's default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Client built from `config`: service URL and request timeout.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(client, config.service_url.clone()))
    }

    /// Reuse an existing reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let bytes = response.error_for_status()?.bytes().await?;
        match serde_json::from_slice::<ServiceReply<T>>(&bytes)? {
            ServiceReply::Ok(value) => Ok(value),
            ServiceReply::Error { error } => Err(ServiceError::Rejected(error)),
        }
    }
}

#[async_trait]
impl GameService for HttpGameService {
    async fn start_session(&self, request: &StartSession) -> Result<SessionId, ServiceError> {
        debug!(count = request.count, mode = %request.mode, "POST start_game");
        let response = self
            .client
            .post(self.url("start_game"))
            .json(request)
            .send()
            .await?;
        let started: StartSessionResponse = Self::decode(response).await?;
        Ok(started.game_id)
    }

    async fn next_round(&self, session: SessionId) -> Result<NextRound, ServiceError> {
        debug!(%session, "GET next_question");
        let response = self
            .client
            .get(self.url("next_question"))
            .query(&[("game_id", session.0)])
            .send()
            .await?;
        let next: NextRoundResponse = Self::decode(response).await?;
        next.try_into()
    }

    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerVerdict, ServiceError> {
        debug!(session = %submission.session, errors = submission.errors_count, "POST submit_answer");
        let response = self
            .client
            .post(self.url("submit_answer"))
            .json(submission)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn final_score(&self, session: SessionId) -> Result<FinalScore, ServiceError> {
        debug!(%session, "GET total_score");
        let response = self
            .client
            .get(self.url("total_score"))
            .query(&[("game_id", session.0)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn record_score(&self, record: &ScoreRecord) -> Result<(), ServiceError> {
        debug!(username = %record.username, score = record.score, "POST submit_score");
        let response = self
            .client
            .post(self.url("submit_score"))
            .json(record)
            .send()
            .await?;
        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }
}
