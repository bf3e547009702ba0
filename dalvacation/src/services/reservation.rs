use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::form::{Errors, Value};

use super::http::{error_message, BackendError, ProxyResponse, ResponseExt};

/// Answer of the backend when a room has no reservation yet.
const RESERVATION_NOT_FOUND: &str = "Reservation not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReservationField {
    StartDate,
    EndDate,
}

impl std::fmt::Display for ReservationField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::StartDate => write!(f, "startDate"),
            Self::EndDate => write!(f, "endDate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Stay {
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Dates typed by the user, as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct ReservationForm {
    pub start_date: Value<String>,
    pub end_date: Value<String>,
}

impl ReservationForm {
    pub fn validate(&self, today: NaiveDate) -> Result<Stay, Errors<ReservationField>> {
        let mut errors = Errors::new();
        let start = parse_date(&self.start_date.value);
        let end = parse_date(&self.end_date.value);

        match start {
            None => errors.insert(ReservationField::StartDate, "Invalid start date"),
            Some(start) if start <= today => {
                errors.insert(ReservationField::StartDate, "Start date must be in the future")
            }
            Some(_) => {}
        }
        match (start, end) {
            (_, None) => errors.insert(ReservationField::EndDate, "Invalid end date"),
            (Some(start), Some(end)) if end <= start => errors.insert(
                ReservationField::EndDate,
                "End date cannot be earlier than start date.",
            ),
            _ => {}
        }

        match (start, end) {
            (Some(start), Some(end)) if errors.is_empty() => Ok(Stay { start, end }),
            _ => Err(errors),
        }
    }

    pub fn apply(&mut self, errors: &Errors<ReservationField>) {
        for (field, message) in errors.iter() {
            match field {
                ReservationField::StartDate => self.start_date.invalidate(message),
                ReservationField::EndDate => self.end_date.invalidate(message),
            }
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub room_id: String,
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub room_number: u32,
}

impl BookingDetails {
    pub fn new(room_id: String, user_id: String, room_number: u32, stay: Stay) -> Self {
        Self {
            room_id,
            user_id,
            start_date: midnight_utc(stay.start),
            end_date: midnight_utc(stay.end),
            room_number,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationRequest<'a> {
    booking_details: &'a BookingDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservationResponse {
    reservation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_id: String,
    pub user_id: String,
    #[serde(default)]
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReservationsResponse {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Clone)]
pub struct ReservationClient {
    http: reqwest::Client,
    create_url: String,
    by_room_url: String,
}

impl ReservationClient {
    pub fn new(create_url: String, by_room_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            create_url,
            by_room_url,
        }
    }

    /// Queues the booking request, returning the id of the pending reservation.
    pub async fn create_reservation(
        &self,
        details: &BookingDetails,
    ) -> Result<String, BackendError> {
        let req = self
            .http
            .post(&self.create_url)
            .header("Content-Type", "application/json")
            .json(&CreateReservationRequest {
                booking_details: details,
            });
        tracing::debug!("Sending http request: {:?}", req);
        let response: ProxyResponse = req.send().await?.check_success().await?.json().await?;
        if !response.is_success() {
            return Err(BackendError {
                http_status: response.status_code,
                error: error_message(&response.body),
            });
        }
        let created: CreateReservationResponse = response.parse_body()?;
        tracing::info!(
            "Booking request {} for room {} added to queue",
            created.reservation_id,
            details.room_id
        );
        Ok(created.reservation_id)
    }

    /// Reservations of `user_id` for the room.
    pub async fn fetch_user_reservations(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Vec<Reservation>, BackendError> {
        let req = self.http.get(&self.by_room_url).query(&[("roomId", room_id)]);
        tracing::debug!("Sending http request: {:?}", req);
        let response = match req.send().await?.check_success().await {
            Ok(response) => response,
            Err(info) if error_message(&info.text) == RESERVATION_NOT_FOUND => {
                return Ok(Vec::new())
            }
            Err(info) => return Err(info.into()),
        };
        let response: ProxyResponse = response.json().await?;
        if !response.is_success() {
            let error = error_message(&response.body);
            if error == RESERVATION_NOT_FOUND {
                return Ok(Vec::new());
            }
            return Err(BackendError {
                http_status: response.status_code,
                error,
            });
        }
        let body: ReservationsResponse = response.parse_body()?;
        Ok(body
            .reservations
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect())
    }
}
