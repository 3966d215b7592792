//! REST client for the parking service.
//!
//! Every call sends `Authorization: Bearer <token>` when a session is given.
//! Non-success responses carry `{"error": "..."}`; that message becomes
//! `AppError::Remote` so it can be shown to the user verbatim.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use parkline_core::{LotId, ReservationId};

use super::ParkingBackend;
use crate::config::BackendMode;
use crate::dashboard::DashboardStats;
use crate::error::AppError;
use crate::models::{
    Identity, LoginRequest, ParkingLot, Registration, ReleaseReceipt, Reservation,
    SchedulerStatus, Session, UserSummary, ValidLotInput,
};

/// Shown when an error response has no usable `error` field.
const FALLBACK_ERROR: &str = "Something went wrong";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    user: Identity,
}

#[derive(Debug, Deserialize)]
struct LotsResponse {
    parking_lots: Vec<ParkingLot>,
}

#[derive(Debug, Deserialize)]
struct LotResponse {
    parking_lot: ParkingLot,
}

#[derive(Debug, Deserialize)]
struct ReservationsResponse {
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
struct BookResponse {
    reservation: Reservation,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<UserSummary>,
}

#[derive(Debug, serde::Serialize)]
struct BookRequest {
    lot_id: LotId,
}

/// Backend that calls the parking REST API.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteBackend {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Remote` if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Service base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `segments` to the base path, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Remote(format!("Invalid parking service URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        session: Option<&Session>,
    ) -> Result<RequestBuilder, AppError> {
        let builder = self.client.request(method, self.url(segments)?);
        Ok(match session {
            Some(session) => builder.bearer_auth(session.token().expose_secret()),
            None => builder,
        })
    }

    /// Send a request and fail on any non-success status.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR.to_string());
        warn!(status = status.as_u16(), error = %message, "Parking service returned an error");
        Err(AppError::Remote(message))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Invalid response from parking service: {e}")))
    }
}

#[async_trait]
impl ParkingBackend for RemoteBackend {
    fn kind(&self) -> BackendMode {
        BackendMode::Remote
    }

    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please enter username and password".to_string(),
            ));
        }
        let body = LoginRequest { username, password };
        let response: LoginResponse = self
            .json(self.request(Method::POST, &["api", "auth", "login"], None)?.json(&body))
            .await?;
        debug!(role = %response.user.role, "Login accepted");
        Ok(Session::new(response.access_token, response.user))
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> Result<(), AppError> {
        self.send(
            self.request(Method::POST, &["api", "auth", "register"], None)?
                .json(registration),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn dashboard_stats(&self, session: &Session) -> Result<DashboardStats, AppError> {
        self.json(self.request(Method::GET, &["api", "admin", "dashboard"], Some(session))?)
            .await
    }

    #[instrument(skip(self, session))]
    async fn admin_lots(&self, session: &Session) -> Result<Vec<ParkingLot>, AppError> {
        let response: LotsResponse = self
            .json(self.request(Method::GET, &["api", "admin", "parking-lots"], Some(session))?)
            .await?;
        Ok(response.parking_lots)
    }

    #[instrument(skip(self, session, input), fields(name = %input.name))]
    async fn create_lot(
        &self,
        session: &Session,
        input: &ValidLotInput,
    ) -> Result<ParkingLot, AppError> {
        let response: LotResponse = self
            .json(
                self.request(Method::POST, &["api", "admin", "parking-lots"], Some(session))?
                    .json(input),
            )
            .await?;
        Ok(response.parking_lot)
    }

    #[instrument(skip(self, session, input))]
    async fn update_lot(
        &self,
        session: &Session,
        id: LotId,
        input: &ValidLotInput,
    ) -> Result<ParkingLot, AppError> {
        let id = id.to_string();
        let response: LotResponse = self
            .json(
                self.request(Method::PUT, &["api", "admin", "parking-lots", &id], Some(session))?
                    .json(input),
            )
            .await?;
        Ok(response.parking_lot)
    }

    #[instrument(skip(self, session))]
    async fn delete_lot(&self, session: &Session, id: LotId) -> Result<(), AppError> {
        let id = id.to_string();
        self.send(self.request(
            Method::DELETE,
            &["api", "admin", "parking-lots", &id],
            Some(session),
        )?)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn list_users(&self, session: &Session) -> Result<Vec<UserSummary>, AppError> {
        let response: UsersResponse = self
            .json(self.request(Method::GET, &["api", "admin", "users"], Some(session))?)
            .await?;
        Ok(response.users)
    }

    #[instrument(skip(self, session))]
    async fn user_lots(&self, session: &Session) -> Result<Vec<ParkingLot>, AppError> {
        let response: LotsResponse = self
            .json(self.request(Method::GET, &["api", "user", "parking-lots"], Some(session))?)
            .await?;
        Ok(response.parking_lots)
    }

    #[instrument(skip(self, session))]
    async fn book(&self, session: &Session, lot_id: LotId) -> Result<Reservation, AppError> {
        let response: BookResponse = self
            .json(
                self.request(Method::POST, &["api", "user", "book"], Some(session))?
                    .json(&BookRequest { lot_id }),
            )
            .await?;
        Ok(response.reservation)
    }

    #[instrument(skip(self, session))]
    async fn release(
        &self,
        session: &Session,
        id: ReservationId,
    ) -> Result<ReleaseReceipt, AppError> {
        let id = id.to_string();
        self.json(self.request(Method::PUT, &["api", "user", "release", &id], Some(session))?)
            .await
    }

    #[instrument(skip(self, session))]
    async fn reservations(&self, session: &Session) -> Result<Vec<Reservation>, AppError> {
        let response: ReservationsResponse = self
            .json(self.request(Method::GET, &["api", "user", "my-reservations"], Some(session))?)
            .await?;
        Ok(response.reservations)
    }

    #[instrument(skip(self, session))]
    async fn export_csv(&self, session: &Session) -> Result<String, AppError> {
        let response = self
            .send(self.request(Method::GET, &["api", "user", "export-csv"], Some(session))?)
            .await?;
        Ok(response.text().await?)
    }

    #[instrument(skip(self, session))]
    async fn scheduler_status(&self, session: &Session) -> Result<SchedulerStatus, AppError> {
        self.json(self.request(Method::GET, &["api", "scheduler", "status"], Some(session))?)
            .await
    }

    #[instrument(skip(self, session))]
    async fn trigger_job(&self, session: &Session, job: &str) -> Result<(), AppError> {
        self.send(self.request(Method::GET, &["api", "scheduler", "trigger", job], Some(session))?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn backend(base: &str) -> RemoteBackend {
        RemoteBackend::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(
            backend("http://localhost:5000").url(&["api", "auth", "login"]).unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );
        assert_eq!(
            backend("http://localhost:5000/").url(&["api", "user", "book"]).unwrap().as_str(),
            "http://localhost:5000/api/user/book"
        );
        assert_eq!(
            backend("https://parking.example.com/v1/")
                .url(&["api", "admin", "users"])
                .unwrap()
                .as_str(),
            "https://parking.example.com/v1/api/admin/users"
        );
    }

    #[test]
    fn test_url_encodes_each_segment() {
        let url = backend("http://localhost:5000")
            .url(&["api", "scheduler", "trigger", "a/b?c#d"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/scheduler/trigger/a%2Fb%3Fc%23d"
        );
        assert!(url.query().is_none());

        let url = backend("http://localhost:5000")
            .url(&["api", "scheduler", "trigger", "../admin"])
            .unwrap();
        assert_eq!(url.path(), "/api/scheduler/trigger/..%2Fadmin");
    }

    #[test]
    fn test_url_rejects_opaque_base() {
        let err = backend("mailto:parking@example.com").url(&["api"]).unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn test_error_body_shapes() {
        let body: ErrorBody = serde_json::from_str(r#"{"error": "Invalid credentials"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Invalid credentials"));
        let body: ErrorBody = serde_json::from_str(r#"{"message": "nope"}"#).unwrap();
        assert!(body.error.is_none());
    }

    #[tokio::test]
    async fn test_blank_login_fails_before_any_request() {
        let backend = backend("http://127.0.0.1:9");
        assert!(matches!(
            backend.login("", "").await,
            Err(AppError::Validation(_))
        ));
    }
}
