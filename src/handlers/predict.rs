use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::columns::get_feature_columns;
use crate::error::PipelineError;
use crate::handlers::AppState;
use crate::models::PredictQuery;
use crate::pipeline;

/// Predict outcomes for the rows matching the query filters
///
/// `GET /predict?year=2019&race_id=1010`. Either filter is optional; no
/// matching rows yields a 404 rather than an empty result.
pub async fn predict_race(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PredictQuery>,
) -> Result<HttpResponse, PipelineError> {
    let mut selected = match query.year {
        Some(year) => state.table.filter_year(year)?,
        None => state.table.filter_year_at_most(i32::MAX)?,
    };
    if let Some(race_id) = query.race_id {
        selected = selected.filter_race(race_id)?;
    }
    if selected.is_empty() {
        return Err(PipelineError::Data(
            "no feature rows match the requested filters".to_string(),
        ));
    }

    let (feature_cols, _) = get_feature_columns(&selected.column_names());

    let mut records = {
        let mut models = state.models.lock().unwrap();
        pipeline::predict(&selected, &mut models, &feature_cols)?
    };
    pipeline::attach_labels(&mut records, &state.dims);

    Ok(HttpResponse::Ok().json(records))
}
