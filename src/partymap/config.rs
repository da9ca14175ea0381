use std::fs::File;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use partymap_geo::Coordinate;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

use crate::partymap::locate::LocateOptions;
use crate::partymap::position::PositionOptions;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartymapConfig {
    pub http_address: String,

    // yaml file with places, events and performers
    pub catalog: PathBuf,

    #[serde(default)]
    pub locate: LocateConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateConfig {
    /// How long to wait for a live position before falling back.
    #[serde(default = "fallback_delay_ms_default")]
    pub fallback_delay_ms: NonZeroU64,

    #[serde(default = "position_timeout_ms_default")]
    pub position_timeout_ms: NonZeroU64,

    /// Maximum age of a position the provider may answer from its own cache.
    #[serde(default = "max_cached_age_ms_default")]
    pub max_cached_age_ms: u64,

    /// How long an observed user position is reused without asking again.
    #[serde(default = "freshness_ms_default")]
    pub freshness_ms: u64,

    /// A fixed position to use when the client can not tell where it is.
    #[serde(default, deserialize_with = "deserialize_coordinate_opt")]
    pub manual_position: Option<Coordinate>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    #[serde(default = "max_hits_default")]
    pub max_hits: usize,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            fallback_delay_ms: fallback_delay_ms_default(),
            position_timeout_ms: position_timeout_ms_default(),
            max_cached_age_ms: max_cached_age_ms_default(),
            freshness_ms: freshness_ms_default(),
            manual_position: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_hits: max_hits_default() }
    }
}

impl LocateConfig {
    pub fn options(&self) -> LocateOptions {
        LocateOptions {
            fallback_delay: Duration::from_millis(self.fallback_delay_ms.get()),
            position: PositionOptions {
                timeout: Duration::from_millis(self.position_timeout_ms.get()),
                max_cached_age: Duration::from_millis(self.max_cached_age_ms),
            },
        }
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.freshness_ms)
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<PartymapConfig> {
    let path = path.as_ref();
    let fp = File::open(path).with_context(|| format!("open config {:?}", path))?;
    let config = serde_yaml::from_reader(fp).with_context(|| format!("parse config {:?}", path))?;
    Ok(config)
}

const FALLBACK_DELAY_MS: NonZeroU64 = NonZeroU64::new(500).unwrap();
const POSITION_TIMEOUT_MS: NonZeroU64 = NonZeroU64::new(1500).unwrap();

fn fallback_delay_ms_default() -> NonZeroU64 {
    FALLBACK_DELAY_MS
}

fn position_timeout_ms_default() -> NonZeroU64 {
    POSITION_TIMEOUT_MS
}

fn max_cached_age_ms_default() -> u64 {
    600_000
}

fn freshness_ms_default() -> u64 {
    120_000
}

fn max_hits_default() -> usize {
    15
}

fn deserialize_coordinate_opt<'de, D: Deserializer<'de>>(deserialize: D) -> Result<Option<Coordinate>, D::Error> {
    let Some(raw) = Option::<Coordinate>::deserialize(deserialize)? else {
        return Ok(None);
    };

    let coordinate = Coordinate::new(raw.lat, raw.lng).map_err(|err| Error::custom(err.to_string()))?;
    Ok(Some(coordinate))
}
