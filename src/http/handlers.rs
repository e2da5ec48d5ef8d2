//! OData request dispatch.
//!
//! Every request below the service root goes through [`dispatch`]: the path
//! is resolved to a [`ResourcePath`], the verb is checked, query options are
//! parsed for the addressed entity type, and the result is shaped into an
//! OData payload.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

use crate::http::request::{request_id, service_base};
use crate::http::response::{self, ApiError};
use crate::http::server::AppState;
use crate::model::{Author, Book, BookPatch, RateParameters, Translator};
use crate::observability::metrics;
use crate::odata::path::BOOKS;
use crate::odata::{
    apply_collection, count_matching, shape_entity, EdmEntity, NextPage, ODataQuery, QueryLimits,
    ResourcePath,
};

/// `GET {root}`: the service document.
pub async fn odata_root(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    dispatch(&state, "", &method, &headers, &uri, &body)
}

/// Any resource below the service root.
pub async fn odata_resource(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    dispatch(&state, &path, &method, &headers, &uri, &body)
}

/// Paths outside every route.
pub async fn not_found(uri: Uri) -> Response {
    response::error_response(
        StatusCode::NOT_FOUND,
        "ResourceNotFound",
        &format!("no resource found for '{}'", uri.path()),
    )
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub books: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        books: state.service.store().len(),
    })
}

fn dispatch(
    state: &AppState,
    raw_path: &str,
    method: &Method,
    headers: &HeaderMap,
    uri: &Uri,
    body: &Bytes,
) -> Response {
    let start = Instant::now();
    tracing::debug!(
        request_id = %request_id(headers),
        method = %method,
        path = %raw_path,
        "Dispatching OData request"
    );

    let (label, response) = match ResourcePath::parse(raw_path) {
        Ok(resource) => {
            let request = ODataRequest {
                state,
                base: service_base(headers, &state.settings.service_root),
                query: uri.query(),
            };
            let response = request
                .handle(resource, method, body)
                .unwrap_or_else(IntoResponse::into_response);
            (resource.label(), response)
        }
        Err(e) => ("unknown", ApiError::from(e).into_response()),
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), label, start);
    response
}

struct ODataRequest<'a> {
    state: &'a AppState,
    base: String,
    query: Option<&'a str>,
}

impl ODataRequest<'_> {
    fn handle(&self, resource: ResourcePath, method: &Method, body: &Bytes) -> Result<Response, ApiError> {
        if !resource.allows(method.as_str()) {
            return Err(ApiError::MethodNotAllowed {
                method: method.to_string(),
                allowed: resource.allowed_methods(),
            });
        }

        let service = &self.state.service;
        let defaults = QueryLimits::default();

        match resource {
            ResourcePath::ServiceDocument => Ok(self.service_document()),

            ResourcePath::Books => {
                let limits = &self.state.settings.list_limits;
                let query = ODataQuery::for_collection::<Book>(self.query, limits)?;
                let page = apply_collection(service.list(), &query, limits)?;
                let next_link = page.next.map(|next| self.next_link(BOOKS, next));
                Ok(response::collection(
                    self.context(&selected(BOOKS, &query)),
                    page,
                    next_link,
                ))
            }

            ResourcePath::BooksCount => {
                let limits = &self.state.settings.list_limits;
                let query = ODataQuery::for_collection::<Book>(self.query, limits)?;
                Ok(response::plain_count(count_matching(&service.list(), &query)))
            }

            ResourcePath::Book(key) => {
                let query = ODataQuery::for_entity::<Book>(self.query, &defaults)?;
                let book = if method == Method::PUT {
                    service.replace(key, parse_body::<Book>(body)?)?
                } else if method == Method::PATCH {
                    service.patch(key, &parse_body::<BookPatch>(body)?)?
                } else if method == Method::DELETE {
                    service.delete(key)?
                } else {
                    service.get(key)?
                };
                Ok(response::entity(
                    self.context(&format!("{}/$entity", selected(BOOKS, &query))),
                    shape_entity(&book, &query)?,
                ))
            }

            ResourcePath::MainAuthor(key) => {
                let query = ODataQuery::for_entity::<Author>(self.query, &defaults)?;
                let author = service.main_author(key)?;
                Ok(response::entity(
                    self.context(&format!("{BOOKS}({key})/MainAuthor/$entity")),
                    shape_entity(&author, &query)?,
                ))
            }

            ResourcePath::MostRecent => Ok(response::primitive(
                self.context("Edm.Int32"),
                json!(service.most_recent()?),
            )),

            ResourcePath::Rate(key) => {
                let params = parse_body::<RateParameters>(body)?;
                let rating = service.rate(key, params)?;
                Ok(response::entity(
                    self.context("Default.BookRating"),
                    serde_json::to_value(rating)?,
                ))
            }

            ResourcePath::ForKidsBooks => {
                let page = apply_collection(service.books_for_kids(), &ODataQuery::new(), &defaults)?;
                Ok(response::collection(self.context(BOOKS), page, None))
            }

            ResourcePath::Authors(key) => {
                self.navigation_collection::<Author>(key, "Authors", Ok(service.authors(key)))
            }

            ResourcePath::Translators(key) => {
                self.navigation_collection::<Translator>(key, "Translators", service.translators(key))
            }
        }
    }

    fn navigation_collection<E: EdmEntity>(
        &self,
        key: i32,
        navigation: &str,
        items: Result<Vec<E>, crate::books::ServiceError>,
    ) -> Result<Response, ApiError> {
        let defaults = QueryLimits::default();
        let query = ODataQuery::for_collection::<E>(self.query, &defaults)?;
        let page = apply_collection(items?, &query, &defaults)?;
        Ok(response::collection(
            self.context(&selected(&format!("{BOOKS}({key})/{navigation}"), &query)),
            page,
            None,
        ))
    }

    fn service_document(&self) -> Response {
        let body = json!({
            "@odata.context": format!("{}$metadata", self.base),
            "value": [
                { "name": BOOKS, "kind": "EntitySet", "url": BOOKS },
                {
                    "name": "ReturnAllForKidsBooks",
                    "kind": "FunctionImport",
                    "url": "ReturnAllForKidsBooks"
                }
            ]
        });
        response::document(body)
    }

    fn context(&self, fragment: &str) -> String {
        format!("{}$metadata#{}", self.base, fragment)
    }

    /// Continuation link: the original options with `$skip`/`$top` advanced.
    fn next_link(&self, path: &str, next: NextPage) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in url::form_urlencoded::parse(self.query.unwrap_or_default().as_bytes()) {
            if name != "$skip" && name != "$top" {
                serializer.append_pair(&name, &value);
            }
        }
        if let Some(top) = next.top {
            serializer.append_pair("$top", &top.to_string());
        }
        serializer.append_pair("$skip", &next.skip.to_string());
        format!("{}{}?{}", self.base, path, serializer.finish())
    }
}

/// Context fragment listing the `$select`ed properties, e.g. `Books(ID,Title)`.
fn selected(fragment: &str, query: &ODataQuery) -> String {
    match &query.select {
        Some(select) => format!("{fragment}({})", select.join(",")),
        None => fragment.to_string(),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Body(e.to_string()))
}
