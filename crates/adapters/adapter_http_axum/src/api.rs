//! Catch-all handler forwarding API requests to the dispatcher.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{self, Uri};

use tangorest_app::ports::DeviceModel;
use tangorest_app::services::assembler::Representation;
use tangorest_app::services::dispatcher::{Method, Request};

use crate::error::ApiError;
use crate::state::AppState;

/// `ANY {prefix}/…`
///
/// The raw, still percent-encoded path is passed on; decoding belongs to the
/// locator. An unparsable query string is treated as empty.
///
/// # Errors
///
/// Returns the dispatcher's error representation as an [`ApiError`].
pub async fn dispatch<M>(
    State(state): State<AppState<M>>,
    method: http::Method,
    uri: Uri,
    query: Result<Query<BTreeMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Representation>, ApiError>
where
    M: DeviceModel + Send + Sync + 'static,
{
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let mut request = Request::new(Method::from_name(method.as_str()), uri.path())
        .with_body(body.to_vec());
    request.params = params;

    let representation = state.dispatcher.dispatch(&request).await?;
    Ok(Json(representation))
}
