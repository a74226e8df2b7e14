//! # School Directory API
//!
//! CRUD over school records plus a filtered, paginated listing.
//!
//! Updates (`PUT` full replacement, `PATCH` partial) are optimistic: the
//! write only lands if the record is still at the expected version, which is
//! the `version` field of the body when supplied and otherwise the version
//! read at the start of the request. A lost race is reported as 409.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use schools_core::filters::DEFAULT_PAGE_SIZE;
use schools_core::{validate_filters, validate_school, Filters, Metadata, School, Validator};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};
use crate::extractors::{nullable, parse_id, read_csv, read_int, read_string, JsonBody, Patch};
use crate::state::AppState;

/// Request to create a school. Missing fields are treated as empty and
/// reported by validation.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CreateSchoolRequest {
    pub name: String,
    pub level: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    /// `null` or omitted is reported as not provided.
    pub mode: Option<Vec<String>>,
}

/// Full replacement of a school. Every field is required.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReplaceSchoolRequest {
    pub name: String,
    pub level: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    #[serde(deserialize_with = "nullable")]
    pub mode: Option<Vec<String>>,
    /// Version the client last read.
    #[serde(default)]
    pub version: Option<i32>,
}

/// Partial update of a school. Omitted fields are left unchanged; `null`
/// clears a field.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateSchoolRequest {
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub level: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub contact: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub phone: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub email: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub website: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub address: Patch<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub mode: Patch<Vec<String>>,
    /// Version the client last read.
    pub version: Option<i32>,
}

impl UpdateSchoolRequest {
    fn apply_to(self, school: &mut School) {
        self.name.apply_to(&mut school.name);
        self.level.apply_to(&mut school.level);
        self.contact.apply_to(&mut school.contact);
        self.phone.apply_to(&mut school.phone);
        self.email.apply_to(&mut school.email);
        self.website.apply_to(&mut school.website);
        self.address.apply_to(&mut school.address);
        self.mode.apply_to(&mut school.mode);
    }
}

/// Query parameters for `GET /v1/schools`. Kept as raw strings so that
/// malformed numbers are reported per field rather than as one rejection.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSchoolsParams {
    /// Words that must all appear in the name.
    pub name: Option<String>,
    /// Words that must all appear in the level.
    pub level: Option<String>,
    /// Comma-separated modes the school must offer.
    pub mode: Option<String>,
    /// Page number, from 1.
    pub page: Option<String>,
    /// Records per page, up to 100.
    pub page_size: Option<String>,
    /// One of `id`, `name`, `level`; prefix `-` for descending.
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchoolEnvelope {
    #[schema(value_type = Object)]
    pub school: School,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchoolListEnvelope {
    #[schema(value_type = Vec<Object>)]
    pub schools: Vec<School>,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageEnvelope {
    pub message: String,
}

/// Build the schools router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/schools", get(list_schools).post(create_school))
        .route(
            "/v1/schools/{id}",
            get(show_school)
                .put(replace_school)
                .patch(update_school)
                .delete(delete_school),
        )
}

/// Validate `school`. `mode_provided` is false when the body left `mode` out
/// or sent it as `null`; that is reported ahead of the emptiness check.
fn check(school: &School, mode_provided: bool) -> Result<(), AppError> {
    let mut v = Validator::new();
    v.check(mode_provided, "mode", "must be provided");
    validate_school(&mut v, school);
    if v.is_valid() {
        Ok(())
    } else {
        Err(AppError::Validation(v.into_errors()))
    }
}

/// POST /v1/schools: Create a school.
#[utoipa::path(
    post,
    path = "/v1/schools",
    request_body = CreateSchoolRequest,
    responses(
        (status = 201, description = "School created", body = SchoolEnvelope),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    ),
    tag = "schools"
)]
pub(crate) async fn create_school(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateSchoolRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<SchoolEnvelope>), AppError> {
    let mode_provided = req.mode.is_some();
    let school = School {
        name: req.name,
        level: req.level,
        contact: req.contact,
        phone: req.phone,
        email: req.email,
        website: req.website,
        address: req.address,
        mode: req.mode.unwrap_or_default(),
        ..School::default()
    };
    check(&school, mode_provided)?;

    let school = state.schools.insert(&school).await?;
    tracing::info!(school_id = school.id, "school created");

    let location = format!("/v1/schools/{}", school.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(SchoolEnvelope { school }),
    ))
}

/// GET /v1/schools/{id}: Fetch one school.
#[utoipa::path(
    get,
    path = "/v1/schools/{id}",
    params(("id" = i64, Path, description = "School ID")),
    responses(
        (status = 200, description = "School found", body = SchoolEnvelope),
        (status = 404, description = "School not found", body = ErrorBody),
    ),
    tag = "schools"
)]
pub(crate) async fn show_school(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<SchoolEnvelope>, AppError> {
    let id = parse_id(&raw_id)?;
    let school = state.schools.get(id).await?;
    Ok(Json(SchoolEnvelope { school }))
}

/// PUT /v1/schools/{id}: Replace every client-supplied field of a school.
#[utoipa::path(
    put,
    path = "/v1/schools/{id}",
    params(("id" = i64, Path, description = "School ID")),
    request_body = ReplaceSchoolRequest,
    responses(
        (status = 200, description = "School replaced", body = SchoolEnvelope),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 404, description = "School not found", body = ErrorBody),
        (status = 409, description = "Edit conflict", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    ),
    tag = "schools"
)]
pub(crate) async fn replace_school(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<JsonBody<ReplaceSchoolRequest>, AppError>,
) -> Result<Json<SchoolEnvelope>, AppError> {
    let id = parse_id(&raw_id)?;
    let current = state.schools.get(id).await?;
    let JsonBody(req) = body?;

    let mode_provided = req.mode.is_some();
    let mut school = School {
        id: current.id,
        created_at: current.created_at,
        name: req.name,
        level: req.level,
        contact: req.contact,
        phone: req.phone,
        email: req.email,
        website: req.website,
        address: req.address,
        mode: req.mode.unwrap_or_default(),
        version: req.version.unwrap_or(current.version),
    };
    check(&school, mode_provided)?;

    school.version = state.schools.update(&school).await?;
    tracing::info!(school_id = id, version = school.version, "school replaced");
    Ok(Json(SchoolEnvelope { school }))
}

/// PATCH /v1/schools/{id}: Change some fields of a school.
#[utoipa::path(
    patch,
    path = "/v1/schools/{id}",
    params(("id" = i64, Path, description = "School ID")),
    request_body = UpdateSchoolRequest,
    responses(
        (status = 200, description = "School updated", body = SchoolEnvelope),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 404, description = "School not found", body = ErrorBody),
        (status = 409, description = "Edit conflict", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    ),
    tag = "schools"
)]
pub(crate) async fn update_school(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<JsonBody<UpdateSchoolRequest>, AppError>,
) -> Result<Json<SchoolEnvelope>, AppError> {
    let id = parse_id(&raw_id)?;
    let mut school = state.schools.get(id).await?;
    let JsonBody(req) = body?;

    if let Some(expected) = req.version {
        school.version = expected;
    }
    let mode_provided = !req.mode.is_null();
    req.apply_to(&mut school);
    check(&school, mode_provided)?;

    school.version = state.schools.update(&school).await?;
    tracing::info!(school_id = id, version = school.version, "school updated");
    Ok(Json(SchoolEnvelope { school }))
}

/// DELETE /v1/schools/{id}: Remove a school.
#[utoipa::path(
    delete,
    path = "/v1/schools/{id}",
    params(("id" = i64, Path, description = "School ID")),
    responses(
        (status = 200, description = "School deleted", body = MessageEnvelope),
        (status = 404, description = "School not found", body = ErrorBody),
    ),
    tag = "schools"
)]
pub(crate) async fn delete_school(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let id = parse_id(&raw_id)?;
    state.schools.delete(id).await?;
    tracing::info!(school_id = id, "school deleted");
    Ok(Json(MessageEnvelope {
        message: "school successfully deleted".to_string(),
    }))
}

/// GET /v1/schools: List schools with filtering, sorting and pagination.
#[utoipa::path(
    get,
    path = "/v1/schools",
    params(ListSchoolsParams),
    responses(
        (status = 200, description = "Page of schools", body = SchoolListEnvelope),
        (status = 422, description = "Invalid query parameters", body = ErrorBody),
    ),
    tag = "schools"
)]
pub(crate) async fn list_schools(
    State(state): State<AppState>,
    query: Result<Query<ListSchoolsParams>, QueryRejection>,
) -> Result<Json<SchoolListEnvelope>, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut v = Validator::new();
    let name = read_string(params.name.as_deref(), "");
    let level = read_string(params.level.as_deref(), "");
    let mode = read_csv(params.mode.as_deref());
    let page = read_int(params.page.as_deref(), 1, "page", &mut v);
    let page_size = read_int(
        params.page_size.as_deref(),
        DEFAULT_PAGE_SIZE,
        "page_size",
        &mut v,
    );
    let sort = read_string(params.sort.as_deref(), "id");

    let filters = Filters::for_schools(page, page_size, sort);
    validate_filters(&mut v, &filters);
    if !v.is_valid() {
        return Err(AppError::Validation(v.into_errors()));
    }

    let (schools, metadata) = state
        .schools
        .get_all(&name, &level, &mode, &filters)
        .await?;
    Ok(Json(SchoolListEnvelope { schools, metadata }))
}
