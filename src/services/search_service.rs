use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::debug;

use crate::database::entities::{cities, connections};
use crate::errors::AirfareResult;
use crate::normalize::normalize_city_name;

/// Image URL reported for a city that has none.
pub const NO_IMAGE_AVAILABLE: &str = "No image available";

pub const NO_CONNECTIONS_FOUND: &str = "No connections found for the specified route.";

/// Result ordering for a route search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortPreference {
    /// Ascending airfare
    Cheapest,
    /// Ascending duration
    #[default]
    Fastest,
}

impl SortPreference {
    /// `cheapest` in any casing selects [`SortPreference::Cheapest`];
    /// anything else, including no keyword, selects `Fastest`.
    pub fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword {
            Some(k) if k.trim().eq_ignore_ascii_case("cheapest") => Self::Cheapest,
            _ => Self::Fastest,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatches {
    pub connections: Vec<connections::Model>,
    pub from_city_image: String,
    pub to_city_image: String,
}

/// Either the matching connections or a message saying there are none.
///
/// Serialized untagged, so clients tell the two apart by the presence of
/// `message` or `connections`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Found(RouteMatches),
    NoConnections { message: String },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Route Search
#[derive(Clone)]
pub struct SearchService {
    db: DatabaseConnection,
}

impl SearchService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn search(
        &self,
        from_city: &str,
        to_city: &str,
        sort: SortPreference,
    ) -> AirfareResult<SearchOutcome> {
        let from_city = normalize_city_name(from_city.trim());
        let to_city = normalize_city_name(to_city.trim());

        let sort_column = match sort {
            SortPreference::Cheapest => connections::Column::Airfare,
            SortPreference::Fastest => connections::Column::Duration,
        };

        let matches = connections::Entity::find()
            .filter(connections::Column::FromCity.eq(from_city.as_str()))
            .filter(connections::Column::ToCity.eq(to_city.as_str()))
            .order_by_asc(sort_column)
            .order_by_asc(connections::Column::Id)
            .all(&self.db)
            .await?;

        debug!(
            "Search {} -> {} ({:?}) matched {} connections",
            from_city,
            to_city,
            sort,
            matches.len()
        );

        if matches.is_empty() {
            return Ok(SearchOutcome::NoConnections {
                message: NO_CONNECTIONS_FOUND.to_string(),
            });
        }

        Ok(SearchOutcome::Found(RouteMatches {
            connections: matches,
            from_city_image: self.city_image(&from_city).await?,
            to_city_image: self.city_image(&to_city).await?,
        }))
    }

    async fn city_image(&self, name: &str) -> AirfareResult<String> {
        let city = cities::Entity::find()
            .filter(cities::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        Ok(city
            .and_then(|city| city.image_url)
            .unwrap_or_else(|| NO_IMAGE_AVAILABLE.to_string()))
    }
}
