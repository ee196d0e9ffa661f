//! Requests against the grow API

use log::debug;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::api::{ApiError, GrowApi, HttpApi};
use crate::models::{LogResponse, Setpoint};

impl GrowApi for HttpApi {
    async fn latest_log(&self) -> Result<LogResponse, ApiError> {
        let response = self
            .client
            .get(self.log_url.clone())
            .send()
            .await
            .map_err(request_error)?;
        decode_json(check_status(response)?).await
    }

    async fn setpoint(&self) -> Result<Setpoint, ApiError> {
        let response = self
            .client
            .get(self.setpoint_url.clone())
            .send()
            .await
            .map_err(request_error)?;
        decode_json(check_status(response)?).await
    }

    async fn put_setpoint(&self, setpoint: Setpoint) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.setpoint_url.clone())
            .json(&setpoint)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response)?;
        Ok(())
    }
}

fn request_error(e: reqwest::Error) -> ApiError {
    ApiError::Request(e.to_string())
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        debug!("{} returned {}", response.url(), status);
        Err(ApiError::Server(status.as_u16()))
    }
}

/// Read the whole body, then decode it
///
/// Reading and decoding are split so that a dropped connection is reported
/// as a request failure and a bad payload as a malformed body.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(request_error)?;
    parse_body(&body)
}

pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))
}
