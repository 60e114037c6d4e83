use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use tracing::info;

use crate::database::entities::connections;
use crate::errors::{AirfareError, AirfareResult};
use crate::services::{CityService, ValidationService};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnection {
    pub from_city: String,
    pub to_city: String,
    pub airfare: f64,
    pub duration: f64,
}

/// Partial update; only the supplied fields change.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConnection {
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub airfare: Option<f64>,
    pub duration: Option<f64>,
}

impl UpdateConnection {
    fn is_empty(&self) -> bool {
        self.from_city.is_none()
            && self.to_city.is_none()
            && self.airfare.is_none()
            && self.duration.is_none()
    }
}

/// Connection Registry
#[derive(Clone)]
pub struct ConnectionService {
    db: DatabaseConnection,
    cities: CityService,
}

impl ConnectionService {
    pub fn new(db: DatabaseConnection, cities: CityService) -> Self {
        Self { db, cities }
    }

    /// Create a connection, creating either endpoint city if it is unknown.
    pub async fn create_connection(
        &self,
        input: CreateConnection,
    ) -> AirfareResult<connections::Model> {
        let airfare = ValidationService::validate_airfare(input.airfare)?;
        let duration = ValidationService::validate_duration(input.duration)?;
        ValidationService::city_name(&input.from_city, "fromCity is required.")?;
        ValidationService::city_name(&input.to_city, "toCity is required.")?;

        let from = self.cities.ensure_city_exists(&input.from_city).await?;
        let to = self.cities.ensure_city_exists(&input.to_city).await?;

        let connection = connections::ActiveModel {
            from_city: Set(from.name),
            to_city: Set(to.name),
            airfare: Set(airfare),
            duration: Set(duration),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            "Created connection {} ({} -> {})",
            connection.id, connection.from_city, connection.to_city
        );
        Ok(connection)
    }

    /// Apply the supplied fields, validated the same way as on create.
    pub async fn update_connection(
        &self,
        id: i32,
        input: UpdateConnection,
    ) -> AirfareResult<connections::Model> {
        let connection = self.get_connection(id).await?;
        if input.is_empty() {
            return Ok(connection);
        }

        let airfare = input
            .airfare
            .map(ValidationService::validate_airfare)
            .transpose()?;
        let duration = input
            .duration
            .map(ValidationService::validate_duration)
            .transpose()?;
        if let Some(from_city) = &input.from_city {
            ValidationService::city_name(from_city, "fromCity cannot be empty.")?;
        }
        if let Some(to_city) = &input.to_city {
            ValidationService::city_name(to_city, "toCity cannot be empty.")?;
        }

        let mut active: connections::ActiveModel = connection.into();
        if let Some(from_city) = &input.from_city {
            active.from_city = Set(self.cities.ensure_city_exists(from_city).await?.name);
        }
        if let Some(to_city) = &input.to_city {
            active.to_city = Set(self.cities.ensure_city_exists(to_city).await?.name);
        }
        if let Some(airfare) = airfare {
            active.airfare = Set(airfare);
        }
        if let Some(duration) = duration {
            active.duration = Set(duration);
        }

        let updated = active.update(&self.db).await?;
        info!("Updated connection {}", updated.id);
        Ok(updated)
    }

    /// Delete a connection, returning the removed row.
    pub async fn delete_connection(&self, id: i32) -> AirfareResult<connections::Model> {
        let connection = self.get_connection(id).await?;
        connections::Entity::delete_by_id(id).exec(&self.db).await?;
        info!("Deleted connection {}", id);
        Ok(connection)
    }

    /// All connections, in no particular order.
    pub async fn list_connections(&self) -> AirfareResult<Vec<connections::Model>> {
        Ok(connections::Entity::find().all(&self.db).await?)
    }

    pub async fn get_connection(&self, id: i32) -> AirfareResult<connections::Model> {
        connections::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AirfareError::not_found("Connection", id))
    }
}
