use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::errors::{AirfareError, AirfareResult};
use crate::server::app::AppState;
use crate::server::extract::ApiQuery;
use crate::services::{SearchOutcome, SortPreference};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub filter_by: Option<String>,
}

fn required_param(value: Option<&str>, name: &str) -> AirfareResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AirfareError::validation(format!("{name} is required.")))
}

pub async fn search_routes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AirfareResult<Json<SearchOutcome>> {
    let from_city = required_param(query.from_city.as_deref(), "fromCity")?;
    let to_city = required_param(query.to_city.as_deref(), "toCity")?;
    let sort = SortPreference::from_keyword(query.filter_by.as_deref());

    Ok(Json(state.search.search(&from_city, &to_city, sort).await?))
}
