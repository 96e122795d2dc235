//! HTTP adapter for the Memento diary backend

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{AccountApi, DiaryApi, DiaryApiError};
use crate::domain::account::{Signup, UserProfile};
use crate::domain::config::DEFAULT_SERVER_URL;
use crate::domain::diary::{Day, DiaryDate, DiaryId, DiaryRecord, DiarySubmission, Emotion};

// Request types

#[derive(Debug, Serialize)]
struct DiaryRequest<'a> {
    content: &'a str,
    date: DiaryDate,
    audio_path: Option<&'a str>,
    /// Base64-encoded audio
    audio_file: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmotionRequest {
    emotion: Emotion,
}

#[derive(Debug, Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Serialize)]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

// Response types

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Diary backend client over HTTP
pub struct HttpDiaryClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpDiaryClient {
    /// Create a client for the given server URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attach the bearer token used for authenticated calls
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn build_request(submission: &DiarySubmission) -> DiaryRequest<'_> {
        DiaryRequest {
            content: &submission.content,
            date: submission.date,
            audio_path: submission.audio.as_ref().map(|a| a.file_name()),
            audio_file: submission.audio.as_ref().map(|a| a.to_base64()),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DiaryApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| DiaryApiError::RequestFailed(e.to_string()))?;
        Self::check_status(response).await
    }

    /// Map HTTP error statuses onto the port's error taxonomy
    async fn check_status(response: Response) -> Result<Response, DiaryApiError> {
        let status = response.status();
        debug!(%status, url = %response.url(), "diary backend response");

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DiaryApiError::Unauthorized);
        }
        if status == StatusCode::CONFLICT {
            return Err(DiaryApiError::ReadOnly);
        }

        let url = response.url().path().to_string();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|e| e.detail)
            .map(describe_detail)
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            return Err(DiaryApiError::NotFound(url));
        }
        Err(DiaryApiError::ApiError(format!("HTTP {}: {}", status, detail)))
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, DiaryApiError> {
        response
            .json()
            .await
            .map_err(|e| DiaryApiError::ParseError(e.to_string()))
    }
}

/// `detail` is a message, or a list of validation errors each carrying `msg`
fn describe_detail(detail: serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(errors) => {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                serde_json::Value::Array(errors).to_string()
            } else {
                messages.join("; ")
            }
        }
        other => other.to_string(),
    }
}

impl Default for HttpDiaryClient {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

#[async_trait]
impl DiaryApi for HttpDiaryClient {
    async fn get_diary(&self, date: DiaryDate) -> Result<Option<DiaryRecord>, DiaryApiError> {
        let request = self.authorized(self.client.get(self.url(&format!("/api/diary/{date}"))));
        match self.send(request).await {
            Ok(response) => Self::parse::<Option<DiaryRecord>>(response).await,
            Err(DiaryApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_diaries(&self) -> Result<Vec<DiaryRecord>, DiaryApiError> {
        let request = self.authorized(self.client.get(self.url("/api/diary/")));
        Self::parse(self.send(request).await?).await
    }

    async fn save_diary(&self, submission: &DiarySubmission) -> Result<DiaryRecord, DiaryApiError> {
        let body = Self::build_request(submission);
        let request = self.authorized(self.client.post(self.url("/api/diary/")).json(&body));
        Self::parse(self.send(request).await?).await
    }

    async fn finalize_diary(
        &self,
        submission: &DiarySubmission,
    ) -> Result<DiaryRecord, DiaryApiError> {
        let body = Self::build_request(submission);
        let request =
            self.authorized(self.client.post(self.url("/api/diary/finalize")).json(&body));
        Self::parse(self.send(request).await?).await
    }

    async fn update_day_emotion(
        &self,
        date: DiaryDate,
        emotion: Emotion,
    ) -> Result<Day, DiaryApiError> {
        let request = self.authorized(
            self.client
                .patch(self.url(&format!("/api/day/{date}")))
                .json(&EmotionRequest { emotion }),
        );
        Self::parse(self.send(request).await?).await
    }

    async fn list_days(&self) -> Result<Vec<Day>, DiaryApiError> {
        let request = self.authorized(self.client.get(self.url("/api/day/")));
        Self::parse(self.send(request).await?).await
    }

    async fn download_audio(&self, id: DiaryId) -> Result<Vec<u8>, DiaryApiError> {
        let request = self.authorized(self.client.get(self.url(&format!("/api/diary/audio/{id}"))));
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|e| DiaryApiError::RequestFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, DiaryApiError> {
        let form = LoginForm {
            username: email,
            password,
            grant_type: "password",
        };
        let request = self
            .client
            .post(self.url("/api/auth/login/access-token"))
            .form(&form);
        let token: TokenResponse = Self::parse(self.send(request).await?).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl AccountApi for HttpDiaryClient {
    async fn signup(&self, signup: &Signup) -> Result<(), DiaryApiError> {
        let request = self.client.post(self.url("/api/user/signup")).json(signup);
        self.send(request).await?;
        debug!(email = %signup.email, "account registered");
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, DiaryApiError> {
        let request = self.authorized(self.client.get(self.url("/api/user/me")));
        Self::parse(self.send(request).await?).await
    }

    async fn change_password(&self, current: &str, new: &str) -> Result<(), DiaryApiError> {
        let body = PasswordChange {
            current_password: current,
            new_password: new,
        };
        let request =
            self.authorized(self.client.patch(self.url("/api/user/me/password")).json(&body));
        self.send(request).await?;
        Ok(())
    }
}
