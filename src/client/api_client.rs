use crate::client::board::BoardApi;
use crate::dto;
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Shown when the server's error response doesn't say what went wrong
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request could not be sent: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("response could not be read: {0}")]
    Decode(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}


#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error_description: String,
}

/// Talks to the task board API. Keeps its own cookie jar, so the session cookie set by
/// [login](BoardApi::login) or [register](BoardApi::register) rides along on later calls.
pub struct ApiClient {
    base_url: String,
    http_client: ClientWithMiddleware,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_client = reqwest::Client::builder()
            .use_rustls_tls()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ClientError::Build)?;
        let http_client = ClientBuilder::new(base_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(ApiClient {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends the request and turns non-2xx responses into [ClientError::Api]
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorPayload>()
            .await
            .ok()
            .map(|payload| payload.error_description)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_owned());
        debug!(%status, %message, "API request failed");

        Err(ClientError::Api { status, message })
    }

    async fn send_for<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    fn credentials(email: &str, password: &str) -> dto::Credentials {
        dto::Credentials {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        }
    }
}

impl BoardApi for ApiClient {
    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/register")
            .json(&Self::credentials(email, password));

        self.send_for::<dto::OkResponse>(request).await?;
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/login")
            .json(&Self::credentials(email, password));

        self.send_for::<dto::OkResponse>(request).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.send_for::<dto::OkResponse>(self.request(Method::POST, "/api/auth/logout"))
            .await?;
        Ok(())
    }

    async fn session(&self) -> Result<dto::SessionInfo, ClientError> {
        self.send_for(self.request(Method::GET, "/api/auth/session"))
            .await
    }

    async fn list_tasks(
        &self,
        filter: &dto::TaskQuery,
    ) -> Result<Vec<dto::TaskResponse>, ClientError> {
        self.send_for(self.request(Method::GET, "/api/tasks").query(filter))
            .await
    }

    async fn create_task(
        &self,
        task: &dto::NewTask,
    ) -> Result<dto::TaskResponse, ClientError> {
        self.send_for(self.request(Method::POST, "/api/tasks").json(task))
            .await
    }

    async fn update_task(
        &self,
        task_id: Uuid,
        update: &dto::UpdateTask,
    ) -> Result<dto::TaskResponse, ClientError> {
        self.send_for(
            self.request(Method::PATCH, &format!("/api/tasks/{task_id}"))
                .json(update),
        )
        .await
    }

    async fn delete_task(&self, task_id: Uuid) -> Result<(), ClientError> {
        let response: dto::OkResponse = self
            .send_for(self.request(Method::DELETE, &format!("/api/tasks/{task_id}")))
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(ClientError::Api {
                status: StatusCode::OK,
                message: "Delete failed".to_owned(),
            })
        }
    }
}
