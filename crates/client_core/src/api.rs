//! Remote Data Client: one HTTP call per resource operation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{Company, CompanyId, CompanyStatistics, Scheme},
    error::{ApiError, FieldErrors},
    protocol::{ExportRequest, ListEnvelope, SchemeFilter, StatusAction},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    drafts::FormDraft,
    entity::{Editable, Entity},
};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid api base url '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("request to {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("backend rejected {path}: {error}")]
    Status { path: String, error: ApiError },
    #[error("unexpected response body from {path}: {message}")]
    Decode { path: String, message: String },
}

impl RemoteError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Status { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|error| error.status)
    }

    pub fn field_errors(&self) -> Option<FieldErrors> {
        self.api_error().and_then(ApiError::field_errors)
    }
}

/// Collection-level operations every entity resource supports.
#[async_trait]
pub trait EntityApi<T: Entity>: Send + Sync {
    async fn list(&self, filter: &T::Filter) -> Result<Vec<T>, RemoteError>;
    async fn retrieve(&self, id: T::Id) -> Result<T, RemoteError>;
    async fn delete(&self, id: T::Id) -> Result<(), RemoteError>;
    async fn transition(&self, id: T::Id, action: StatusAction) -> Result<(), RemoteError>;
    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, RemoteError>;
}

/// Create and update for entities edited through a form.
#[async_trait]
pub trait DraftApi<T: Editable>: EntityApi<T> {
    async fn create(&self, draft: &T::Draft) -> Result<T, RemoteError>;
    async fn update(&self, id: T::Id, draft: &T::Draft) -> Result<T, RemoteError>;
}

#[async_trait]
impl<T, A> EntityApi<T> for Arc<A>
where
    T: Entity,
    A: EntityApi<T> + ?Sized,
{
    async fn list(&self, filter: &T::Filter) -> Result<Vec<T>, RemoteError> {
        (**self).list(filter).await
    }

    async fn retrieve(&self, id: T::Id) -> Result<T, RemoteError> {
        (**self).retrieve(id).await
    }

    async fn delete(&self, id: T::Id) -> Result<(), RemoteError> {
        (**self).delete(id).await
    }

    async fn transition(&self, id: T::Id, action: StatusAction) -> Result<(), RemoteError> {
        (**self).transition(id, action).await
    }

    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, RemoteError> {
        (**self).export(request).await
    }
}

#[async_trait]
impl<T, A> DraftApi<T> for Arc<A>
where
    T: Editable,
    A: DraftApi<T> + ?Sized,
{
    async fn create(&self, draft: &T::Draft) -> Result<T, RemoteError> {
        (**self).create(draft).await
    }

    async fn update(&self, id: T::Id, draft: &T::Draft) -> Result<T, RemoteError> {
        (**self).update(id, draft).await
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, RemoteError> {
        let invalid = |message: String| RemoteError::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };
        let mut parsed = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("url cannot be used as a base".to_string()));
        }
        // Relative joins replace the last segment unless the base ends in '/'.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn company_statistics(&self) -> Result<CompanyStatistics, RemoteError> {
        let path = format!("{}/statistics/", Company::RESOURCE);
        let request = self.http.get(self.endpoint(&path)?);
        decode_json(self.send(request, &path).await?, &path).await
    }

    pub async fn company_schemes(&self, company_id: CompanyId) -> Result<Vec<Scheme>, RemoteError> {
        let filter = SchemeFilter {
            company: Some(company_id),
            ..SchemeFilter::default()
        };
        EntityApi::<Scheme>::list(self, &filter).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                message: err.to_string(),
            })
    }

    fn collection_path<T: Entity>() -> String {
        format!("{}/", T::RESOURCE)
    }

    fn member_path<T: Entity>(id: T::Id) -> String {
        format!("{}/{id}/", T::RESOURCE)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, RemoteError> {
        debug!(path, "sending api request");
        let response = request.send().await.map_err(|err| RemoteError::Transport {
            path: path.to_string(),
            message: err.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.map_err(|err| RemoteError::Transport {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let payload = serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
        debug!(path, status = status.as_u16(), "api request rejected");
        Err(RemoteError::Status {
            path: path.to_string(),
            error: ApiError::new(status.as_u16(), payload),
        })
    }

    async fn send_json<B, R>(
        &self,
        request: RequestBuilder,
        body: &B,
        path: &str,
    ) -> Result<R, RemoteError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(request.json(body), path).await?;
        decode_json(response, path).await
    }
}

async fn decode_json<R: DeserializeOwned>(response: Response, path: &str) -> Result<R, RemoteError> {
    let body = response.bytes().await.map_err(|err| RemoteError::Transport {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    serde_json::from_slice(&body).map_err(|err| RemoteError::Decode {
        path: path.to_string(),
        message: err.to_string(),
    })
}

#[async_trait]
impl<T: Entity> EntityApi<T> for ApiClient {
    async fn list(&self, filter: &T::Filter) -> Result<Vec<T>, RemoteError> {
        let path = Self::collection_path::<T>();
        let request = self.http.get(self.endpoint(&path)?).query(filter);
        let envelope: ListEnvelope<T> = decode_json(self.send(request, &path).await?, &path).await?;
        Ok(envelope.into_items())
    }

    async fn retrieve(&self, id: T::Id) -> Result<T, RemoteError> {
        let path = Self::member_path::<T>(id);
        let request = self.http.get(self.endpoint(&path)?);
        decode_json(self.send(request, &path).await?, &path).await
    }

    async fn delete(&self, id: T::Id) -> Result<(), RemoteError> {
        let path = Self::member_path::<T>(id);
        let request = self.http.delete(self.endpoint(&path)?);
        self.send(request, &path).await?;
        Ok(())
    }

    async fn transition(&self, id: T::Id, action: StatusAction) -> Result<(), RemoteError> {
        let path = format!("{}{}/", Self::member_path::<T>(id), action.path_segment());
        let request = self.http.post(self.endpoint(&path)?);
        self.send(request, &path).await?;
        Ok(())
    }

    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, RemoteError> {
        let path = format!("{}/export/", T::RESOURCE);
        let builder = self.http.get(self.endpoint(&path)?).query(request);
        let response = self.send(builder, &path).await?;
        let body = response.bytes().await.map_err(|err| RemoteError::Transport {
            path: path.clone(),
            message: err.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl<T: Editable> DraftApi<T> for ApiClient {
    async fn create(&self, draft: &T::Draft) -> Result<T, RemoteError> {
        let path = Self::collection_path::<T>();
        let request = self.http.post(self.endpoint(&path)?);
        self.send_json(request, &draft.payload(), &path).await
    }

    async fn update(&self, id: T::Id, draft: &T::Draft) -> Result<T, RemoteError> {
        let path = Self::member_path::<T>(id);
        let request = self.http.put(self.endpoint(&path)?);
        self.send_json(request, &draft.payload(), &path).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
