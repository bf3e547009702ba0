use serde::{Deserialize, Deserializer, Serialize};

use super::http::{BackendError, ProxyResponse, ResponseExt};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    #[serde(deserialize_with = "number_or_string")]
    pub room_number: u32,
    pub room_type: String,
    #[serde(deserialize_with = "number_or_string")]
    pub tariff: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub capacity: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Room details are stored by the backend with numbers either as JSON numbers
/// or as strings.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + serde::Deserialize<'de>,
    T::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }
    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct S {
    #[serde(rename = "S")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct N {
    #[serde(rename = "N")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct SS {
    #[serde(rename = "SS")]
    values: Vec<String>,
}

/// A room as stored in the rooms table, with typed attribute values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomItem {
    room_id: S,
    room_number: S,
    room_type: S,
    tariff: N,
    capacity: N,
    amenities: Option<SS>,
    description: Option<S>,
    created_at: Option<S>,
    updated_at: Option<S>,
}

impl TryFrom<RoomItem> for Room {
    type Error = BackendError;
    fn try_from(item: RoomItem) -> Result<Self, Self::Error> {
        let invalid = |field: &str, value: &str| BackendError {
            http_status: None,
            error: format!("Invalid {} '{}' for room {}", field, value, item.room_id.value),
        };
        Ok(Room {
            room_number: item
                .room_number
                .value
                .parse()
                .map_err(|_| invalid("room number", &item.room_number.value))?,
            tariff: item
                .tariff
                .value
                .parse()
                .map_err(|_| invalid("tariff", &item.tariff.value))?,
            capacity: item
                .capacity
                .value
                .parse()
                .map_err(|_| invalid("capacity", &item.capacity.value))?,
            room_type: item.room_type.value,
            amenities: item.amenities.map(|a| a.values).unwrap_or_default(),
            description: item.description.map(|s| s.value).unwrap_or_default(),
            created_at: item.created_at.map(|s| s.value).unwrap_or_default(),
            updated_at: item.updated_at.map(|s| s.value).unwrap_or_default(),
            room_id: item.room_id.value,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RoomsClient {
    http: reqwest::Client,
    all_rooms_url: String,
    room_details_url: String,
}

impl RoomsClient {
    pub fn new(all_rooms_url: String, room_details_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            all_rooms_url,
            room_details_url,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<ProxyResponse, BackendError> {
        let req = self.http.get(url).query(query);
        tracing::debug!("Sending http request: {:?}", req);
        let response: ProxyResponse = req.send().await?.check_success().await?.json().await?;
        if !response.is_success() {
            return Err(BackendError {
                http_status: response.status_code,
                error: super::http::error_message(&response.body),
            });
        }
        Ok(response)
    }

    pub async fn fetch_rooms(&self) -> Result<Vec<Room>, BackendError> {
        let response = self.get(&self.all_rooms_url, &[]).await?;
        let items: Vec<RoomItem> = response.parse_body()?;
        items.into_iter().map(Room::try_from).collect()
    }

    pub async fn fetch_room(&self, room_id: &str) -> Result<Room, BackendError> {
        let response = self
            .get(&self.room_details_url, &[("roomId", room_id)])
            .await?;
        Ok(response.parse_body()?)
    }
}
