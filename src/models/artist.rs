use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtistStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub studio_id: String,
    pub name: String,
    pub status: ArtistStatus,
    pub specialty: Option<String>,
    pub hourly_rate: Option<f64>,
    pub created_at: i64,
}

impl Artist {
    pub fn is_active(&self) -> bool {
        self.status == ArtistStatus::Active
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateArtist {
    pub name: String,
    #[serde(default)]
    pub status: Option<ArtistStatus>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}
