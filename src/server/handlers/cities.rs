use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::database::entities::cities;
use crate::errors::{AirfareError, AirfareResult};
use crate::server::app::AppState;
use crate::server::extract::{ApiMultipart, ApiPath};
use crate::services::ImageUpload;

/// Fields accepted by the city create and update forms.
#[derive(Debug, Default)]
pub struct CityForm {
    pub name: Option<String>,
    pub image: Option<ImageUpload>,
}

impl CityForm {
    /// Read a multipart city form. Unknown fields are skipped and empty file
    /// parts count as no image.
    pub async fn from_multipart(mut multipart: Multipart) -> AirfareResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AirfareError::validation(format!("Malformed form data: {e}")))?
        {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "name" | "cityName" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AirfareError::validation(format!("Malformed form data: {e}")))?;
                    form.name = Some(text);
                }
                "image" | "file" => {
                    let file_name = field.file_name().unwrap_or("image").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AirfareError::validation(format!("Malformed form data: {e}")))?;
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

pub async fn list_cities(State(state): State<AppState>) -> AirfareResult<Json<Vec<cities::Model>>> {
    Ok(Json(state.cities.list_cities().await?))
}

pub async fn get_city(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AirfareResult<Json<cities::Model>> {
    Ok(Json(state.cities.get_city(id).await?))
}

pub async fn create_city(
    State(state): State<AppState>,
    ApiMultipart(multipart): ApiMultipart,
) -> AirfareResult<(StatusCode, Json<cities::Model>)> {
    let form = CityForm::from_multipart(multipart).await?;
    let name = form.name.unwrap_or_default();
    let city = state.cities.create_city(&name, form.image).await?;
    Ok((StatusCode::CREATED, Json(city)))
}

pub async fn update_city(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiMultipart(multipart): ApiMultipart,
) -> AirfareResult<Json<cities::Model>> {
    let form = CityForm::from_multipart(multipart).await?;
    let city = state
        .cities
        .update_city(id, form.name.as_deref(), form.image)
        .await?;
    Ok(Json(city))
}

pub async fn delete_city(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AirfareResult<Json<Value>> {
    let message = state.cities.delete_city(id).await?;
    Ok(Json(json!({ "message": message })))
}
