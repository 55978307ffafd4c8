use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ErrorBody};
use crate::config::ApiConfig;
use crate::model::{NewStudent, Student, StudentId};

/// Operations the record store needs from the backend.
///
/// Each call is single-shot: no retries, no caching, no transformation of the
/// server's data beyond decoding it.
#[async_trait]
pub trait StudentApi: Send + Sync {
    /// `GET /students`, in server order.
    async fn list_students(&self) -> Result<Vec<Student>, ApiError>;

    /// `POST /students`.
    ///
    /// Returns the created record when the server echoes it back, `None` when
    /// it answers with an empty body.
    async fn create_student(&self, student: &NewStudent) -> Result<Option<Student>, ApiError>;

    /// `DELETE /students/{id}`.
    async fn delete_student(&self, id: StudentId) -> Result<(), ApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpStudentClient {
    http: Client,
    base_url: String,
}

impl HttpStudentClient {
    /// Create a client for the collection at `{base_url}/students`.
    ///
    /// No timeout is applied unless `timeout_secs` is configured.
    pub fn new(config: &ApiConfig) -> color_eyre::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn student_url(&self, id: StudentId) -> String {
        format!("{}/students/{id}", self.base_url)
    }

    /// Send a request and return the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder, url: &str) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|source| {
            warn!("Request to {url} failed: {source}");
            ApiError::Network {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Network {
                url: url.to_string(),
                source,
            })?;
        debug!("{url} answered {status}");

        if !status.is_success() {
            warn!("{url} answered {status}: {text}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: ErrorBody::parse(&text),
            });
        }
        Ok(text)
    }
}

fn decode<T: DeserializeOwned>(text: &str, url: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl StudentApi for HttpStudentClient {
    async fn list_students(&self) -> Result<Vec<Student>, ApiError> {
        let url = self.collection_url();
        let text = self.execute(self.http.get(&url), &url).await?;
        decode(&text, &url)
    }

    async fn create_student(&self, student: &NewStudent) -> Result<Option<Student>, ApiError> {
        let url = self.collection_url();
        let text = self.execute(self.http.post(&url).json(student), &url).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        decode(&text, &url).map(Some)
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), ApiError> {
        let url = self.student_url(id);
        self.execute(self.http.delete(&url), &url).await?;
        Ok(())
    }
}
