use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Genres are stored joined with this; a genre containing it does not round-trip.
pub const GENRE_DELIMITER: &str = ",";

/// Running time in minutes. JSON form is `"<n> mins"`; a bare integer is accepted too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Runtime(pub i32);

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Minutes(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Minutes(n) => Ok(Runtime(n)),
            Raw::Text(s) => {
                let n = s
                    .strip_suffix(" mins")
                    .and_then(|n| n.parse::<i32>().ok())
                    .ok_or_else(|| de::Error::custom("invalid runtime format"))?;
                Ok(Runtime(n))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Movie {
    pub id: i64,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
}

#[derive(Debug, FromRow)]
pub struct MovieRow {
    pub id: i64,
    pub created_at: OffsetDateTime,
    pub title: String,
    pub year: i32,
    pub runtime: i32,
    pub genres: String,
    pub version: i32,
}

pub fn join_genres(genres: &[String]) -> String {
    genres.join(GENRE_DELIMITER)
}

pub fn split_genres(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(GENRE_DELIMITER).map(str::to_string).collect()
}

impl From<MovieRow> for Movie {
    fn from(r: MovieRow) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            title: r.title,
            year: r.year,
            runtime: Runtime(r.runtime),
            genres: split_genres(&r.genres),
            version: r.version,
        }
    }
}

/// Movie fields as supplied by a client, before the store assigns id and version.
#[derive(Debug, Clone, Default)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}
