use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::database::entities::{cities, connections};
use crate::errors::{AirfareError, AirfareResult};
use crate::imagegen::ImageGenerator;
use crate::services::ValidationService;
use crate::storage::{city_image_key, key_from_url, ObjectStore, StorageError};

const CITY_EXISTS: &str = "City with this name already exists.";

/// An image file supplied with a city create or update.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// How a failure while storing a city image is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Log the failure and carry on without an image.
    BestEffort,
    /// Fail the whole operation.
    Required,
}

/// City Registry: CRUD over cities plus the cascade onto connections.
#[derive(Clone)]
pub struct CityService {
    db: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
    generator: Arc<dyn ImageGenerator>,
}

impl CityService {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            db,
            store,
            generator,
        }
    }

    /// Create a city, optionally with an image.
    ///
    /// A failed image upload leaves the city in place without an image.
    pub async fn create_city(
        &self,
        name: &str,
        image: Option<ImageUpload>,
    ) -> AirfareResult<cities::Model> {
        let name = ValidationService::city_name(name, "City name is required.")?;
        let city = self.create_normalized_city(&name).await?;

        match image {
            Some(image) => match self.store_image(&city, image, ImagePolicy::BestEffort).await? {
                Some(url) => self.set_image_url(city, url).await,
                None => Ok(city),
            },
            None => Ok(city),
        }
    }

    /// Rename a city and/or replace its image.
    ///
    /// A rename rewrites every connection endpoint that carried the old name in
    /// the same transaction as the city row.
    pub async fn update_city(
        &self,
        id: i32,
        name: Option<&str>,
        image: Option<ImageUpload>,
    ) -> AirfareResult<cities::Model> {
        let city = self.get_city(id).await?;

        let new_name = match name {
            Some(raw) => {
                let normalized = ValidationService::city_name(raw, "City name cannot be empty.")?;
                if let Some(existing) = find_by_name(&self.db, &normalized).await? {
                    if existing.id != id {
                        return Err(AirfareError::Conflict(CITY_EXISTS.to_string()));
                    }
                }
                Some(normalized)
            }
            None => None,
        };

        let image_url = match image {
            Some(image) => self.store_image(&city, image, ImagePolicy::Required).await?,
            None => None,
        };

        if new_name.is_none() && image_url.is_none() {
            return Ok(city);
        }

        let result = self
            .apply_update(city, new_name, image_url.clone())
            .await;

        if let (Err(_), Some(url)) = (&result, image_url.as_deref()) {
            // Nothing references the new upload.
            if let Some(key) = key_from_url(url) {
                if let Err(e) = self.store.delete(&key).await {
                    warn!("Failed to remove orphaned image {} of city {}: {}", key, id, e);
                }
            }
        }

        result
    }

    /// Rename cascade plus city row update, in one transaction.
    async fn apply_update(
        &self,
        city: cities::Model,
        new_name: Option<String>,
        image_url: Option<String>,
    ) -> AirfareResult<cities::Model> {
        let old_name = city.name.clone();
        let txn = self.db.begin().await?;

        if let Some(new_name) = new_name.as_deref().filter(|n| *n != old_name) {
            let from = connections::Entity::update_many()
                .col_expr(connections::Column::FromCity, Expr::value(new_name))
                .filter(connections::Column::FromCity.eq(old_name.as_str()))
                .exec(&txn)
                .await?;
            let to = connections::Entity::update_many()
                .col_expr(connections::Column::ToCity, Expr::value(new_name))
                .filter(connections::Column::ToCity.eq(old_name.as_str()))
                .exec(&txn)
                .await?;
            debug!(
                "Renaming {} to {} touches {} departures and {} arrivals",
                old_name, new_name, from.rows_affected, to.rows_affected
            );
        }

        let mut active: cities::ActiveModel = city.into();
        if let Some(new_name) = new_name {
            active.name = Set(new_name);
        }
        if let Some(url) = image_url {
            active.image_url = Set(Some(url));
        }
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AirfareError::from_write(e, CITY_EXISTS))?;

        txn.commit().await?;
        info!("Updated city {} ({})", updated.name, updated.id);

        Ok(updated)
    }

    /// Delete a city together with every connection touching it.
    ///
    /// Returns a confirmation message naming the city.
    pub async fn delete_city(&self, id: i32) -> AirfareResult<String> {
        let city = self.get_city(id).await?;

        let txn = self.db.begin().await?;
        let removed = connections::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(connections::Column::FromCity.eq(city.name.as_str()))
                    .add(connections::Column::ToCity.eq(city.name.as_str())),
            )
            .exec(&txn)
            .await?;
        cities::Entity::delete_by_id(city.id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted city {} ({}) and {} connections",
            city.name, city.id, removed.rows_affected
        );

        if let Some(key) = city.image_url.as_deref().and_then(key_from_url) {
            if let Err(e) = self.store.delete(&key).await {
                warn!("Failed to delete image {} of city {}: {}", key, city.id, e);
            }
        }

        Ok(format!("City '{}' and all associated data deleted.", city.name))
    }

    /// All cities ordered by name.
    pub async fn list_cities(&self) -> AirfareResult<Vec<cities::Model>> {
        Ok(cities::Entity::find()
            .order_by_asc(cities::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn get_city(&self, id: i32) -> AirfareResult<cities::Model> {
        cities::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AirfareError::not_found("City", id))
    }

    pub async fn find_city_by_name(&self, name: &str) -> AirfareResult<Option<cities::Model>> {
        let Some(name) = crate::normalize::normalize_required(name) else {
            return Ok(None);
        };
        find_by_name(&self.db, &name).await
    }

    /// Return the city called `name`, creating it first when it is unknown.
    ///
    /// A newly created city gets a generated image; a generator failure is
    /// returned to the caller. This is the path connection writes use.
    pub async fn ensure_city_exists(&self, name: &str) -> AirfareResult<cities::Model> {
        let name = ValidationService::city_name(name, "City name is required.")?;

        if let Some(city) = find_by_name(&self.db, &name).await? {
            return Ok(city);
        }

        let city = self.create_normalized_city(&name).await?;

        let generated = self
            .generator
            .generate(&city.name, city.id)
            .await
            .map_err(|e| {
                tracing::error!("Image generation failed for {}: {}", city.name, e);
                AirfareError::external(format!(
                    "Failed to generate image for {}: {}",
                    city.name, e
                ))
            })?;

        match generated {
            Some(url) => self.set_image_url(city, url).await,
            None => Ok(city),
        }
    }

    /// Insert a city whose name is already validated and normalized.
    ///
    /// Both the explicit create and the create-on-connection path go through
    /// here. An existing city with that name, including one inserted by a
    /// concurrent request, is a [`AirfareError::Conflict`].
    async fn create_normalized_city(&self, name: &str) -> AirfareResult<cities::Model> {
        if find_by_name(&self.db, name).await?.is_some() {
            return Err(AirfareError::Conflict(CITY_EXISTS.to_string()));
        }

        let city = insert_city(&self.db, name).await?;
        info!("Created city {} ({})", city.name, city.id);
        Ok(city)
    }

    /// Upload `image` for `city`, removing the image it replaces.
    ///
    /// Under [`ImagePolicy::BestEffort`] a failure is logged and `None` is
    /// returned; under [`ImagePolicy::Required`] it becomes a validation error.
    async fn store_image(
        &self,
        city: &cities::Model,
        image: ImageUpload,
        policy: ImagePolicy,
    ) -> AirfareResult<Option<String>> {
        let result: Result<String, StorageError> = async {
            if let Some(old_key) = city.image_url.as_deref().and_then(key_from_url) {
                self.store.delete(&old_key).await?;
            }
            let key = city_image_key(city.id, &image.file_name);
            self.store.upload(image.bytes, &key, &image.content_type).await
        }
        .await;

        match (result, policy) {
            (Ok(url), _) => Ok(Some(url)),
            (Err(e), ImagePolicy::BestEffort) => {
                warn!("Failed to upload image for city {}: {}", city.id, e);
                Ok(None)
            }
            (Err(e), ImagePolicy::Required) => {
                warn!("Failed to update image for city {}: {}", city.id, e);
                Err(AirfareError::validation("Failed to update city image"))
            }
        }
    }

    async fn set_image_url(&self, city: cities::Model, url: String) -> AirfareResult<cities::Model> {
        let mut active: cities::ActiveModel = city.into();
        active.image_url = Set(Some(url));
        Ok(active.update(&self.db).await?)
    }
}

async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> AirfareResult<Option<cities::Model>> {
    Ok(cities::Entity::find()
        .filter(cities::Column::Name.eq(name))
        .one(db)
        .await?)
}

/// Insert a city row with an already normalized name. A concurrent insert of
/// the same name loses on the unique constraint and surfaces as a conflict.
async fn insert_city<C: ConnectionTrait>(db: &C, name: &str) -> AirfareResult<cities::Model> {
    cities::ActiveModel {
        name: Set(name.to_string()),
        image_url: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AirfareError::from_write(e, CITY_EXISTS))
}
