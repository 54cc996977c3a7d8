//! Sample record schemas.
//!
//! These mirror the shapes real applications store: flat records, nested
//! plain mappings, records nested inside records, and computed fields
//! that take arguments.

use flexdb_core::{Args, CoreResult, Pool, Record, RecordId, RecordMeta, Resolve};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Names of the interests a [`Profile`] refers to by number.
pub const INTERESTS: [(i64, &str); 7] = [
    (1, "Drawing"),
    (2, "Blogging"),
    (3, "Gardening"),
    (4, "Photography"),
    (5, "Cooking"),
    (6, "Dancing"),
    (7, "Gaming"),
];

/// Returns the current calendar year (UTC).
#[must_use]
pub fn current_year() -> i64 {
    let days = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() / 86_400);
    year_of_day(i64::try_from(days).unwrap_or(0))
}

/// Calendar year of a day counted from 1970-01-01.
fn year_of_day(days: i64) -> i64 {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    yoe + era * 400 + i64::from(mp >= 10)
}

/// Reads the reference year of an age computation: the first positional
/// argument, the `year` named argument, or the current year.
fn reference_year(args: &Args) -> i64 {
    args.at(0)
        .or_else(|| args.get("year"))
        .and_then(Value::as_i64)
        .unwrap_or_else(current_year)
}

/// Contact details nested in a [`Person`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    /// Mail address.
    pub mail: String,
}

/// A person, stored in `persons` with ids above 10000 and at most 100
/// records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Full name.
    pub name: String,
    /// Year of birth.
    pub birth_year: i64,
    /// Contact details.
    pub contact: Contact,
}

impl Record for Person {
    const COLLECTION: &'static str = "persons";
    const MIN_ID: i64 = 10_000;
    const MAX_SIZE: i64 = 100;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn call(&self, name: &str, args: &Args) -> Option<Value> {
        match name {
            "actual_age" => Some(json!(reference_year(args) - self.birth_year)),
            _ => None,
        }
    }
}

/// Account credentials, stored in `logins`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Login {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Mail address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Password, as given.
    pub password: String,
    /// Whether the account is banned.
    pub is_banned: bool,
    /// Registration time, seconds since the epoch.
    pub registered_at: i64,
}

impl Record for Login {
    const COLLECTION: &'static str = "logins";
    const MIN_ID: i64 = 10_000;
    const MAX_SIZE: i64 = 100;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// A profile picture, stored in `photos` and nested in [`Profile`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Photo {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Owning login.
    pub login_id: i64,
    /// Where the picture lives.
    pub remote_path: String,
}

impl Photo {
    /// Last segment of the remote path.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.remote_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.remote_path)
    }
}

impl Record for Photo {
    const COLLECTION: &'static str = "photos";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn call(&self, name: &str, _args: &Args) -> Option<Value> {
        match name {
            "file_name" => Some(json!(self.file_name())),
            _ => None,
        }
    }
}

/// A point on the globe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Street name.
    pub street: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postcode: String,
    /// Country.
    pub country: String,
    /// Position.
    pub coordinates: Coordinates,
}

/// Gender of a [`Profile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male.
    #[default]
    Male,
    /// Female.
    Female,
}

/// Public details of a login, stored in `profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Owning login.
    pub login_id: i64,
    /// Profile picture.
    pub photo: Photo,
    /// Gender.
    pub gender: Gender,
    /// Display name.
    pub name: String,
    /// Year of birth.
    pub birth_year: i64,
    /// Postal address.
    pub location: Location,
    /// Landline number.
    pub phone: String,
    /// Mobile number.
    pub cellphone: String,
    /// Interest numbers, see [`INTERESTS`].
    pub interests: Vec<i64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            meta: RecordMeta::default(),
            login_id: 0,
            photo: Photo::default(),
            gender: Gender::Male,
            name: "???".to_string(),
            birth_year: 0,
            location: Location::default(),
            phone: String::new(),
            cellphone: String::new(),
            interests: Vec::new(),
        }
    }
}

impl Profile {
    /// Attaches the profile and its photo to `login`.
    pub fn link_login(&mut self, login: RecordId) {
        self.login_id = login.as_i64();
        self.photo.login_id = login.as_i64();
    }

    /// Returns the interests as a comma-separated list of names.
    #[must_use]
    pub fn text_interests(&self) -> String {
        self.interests
            .iter()
            .filter_map(|n| INTERESTS.iter().find(|(k, _)| k == n).map(|(_, name)| *name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Finds the profile of `login`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the profiles snapshot cannot be rebuilt.
    pub fn for_login(pool: &Pool, login: RecordId) -> CoreResult<Option<Self>> {
        let mut select = pool.collection::<Self>().select()?;
        let owned = select.field("login_id").eq(login.as_i64());
        select.filter([owned]);
        Ok(select.fetch_one().map(|row| row.record().clone()))
    }
}

impl Record for Profile {
    const COLLECTION: &'static str = "profiles";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn call(&self, name: &str, args: &Args) -> Option<Value> {
        match name {
            "calculate_age" => Some(json!(reference_year(args) - self.birth_year)),
            "text_interests" => Some(json!(self.text_interests())),
            _ => None,
        }
    }

    fn child(&self, name: &str) -> Option<&dyn Resolve> {
        match name {
            "photo" => Some(&self.photo),
            _ => None,
        }
    }
}

/// A log entry, stored in `logs` with ids starting at 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Log {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Day of the entry, `YYYY-MM-DD`.
    pub date: String,
}

impl Record for Log {
    const COLLECTION: &'static str = "logs";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// A message filed under a per-day collection such as `logs/20240101`.
///
/// Open it with [`Pool::collection_at`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogMessage {
    #[serde(flatten)]
    meta: RecordMeta,
    /// Day of the message, `YYYYMMDD`.
    pub date: i64,
    /// Text.
    pub message: String,
}

impl Record for LogMessage {
    const COLLECTION: &'static str = "logs/messages";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl LogMessage {
    /// Returns the collection name for messages of `date`.
    #[must_use]
    pub fn collection_for(date: i64) -> String {
        format!("logs/{date}")
    }
}
