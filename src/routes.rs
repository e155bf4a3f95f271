use std::sync::Arc;

use log::{debug, error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum JSON body size to accept. Visit records are small; this
/// should also be enforced by the HTTP gateway.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

/// Every public route, with errors formatted as JSON.
pub fn make_api(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    make_health_route(environment.clone())
        .or(make_search_route(environment.clone()))
        .unify()
        .or(make_place_route(environment.clone()))
        .unify()
        .or(make_nearby_route(environment.clone()))
        .unify()
        .or(make_list_records_route(environment.clone()))
        .unify()
        .or(make_create_record_route(environment.clone()))
        .unify()
        .or(make_retrieve_record_route(environment.clone()))
        .unify()
        .or(make_update_record_route(environment.clone()))
        .unify()
        .or(make_delete_record_route(environment))
        .unify()
        .recover(move |r| format_rejection(logger.clone(), r))
}

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            debug!(logger, "Rejected request"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        BadRequest
        | MissingParameter(..)
        | InvalidNumber { .. }
        | InvalidDate(..)
        | InvalidTypeFilter(..)
        | MissingFields => StatusCode::BAD_REQUEST,
        NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post, put, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    fn json_body(
    ) -> impl Filter<Extract = (serde_json::Value,), Error = warp::Rejection> + Clone {
        warp::body::content_length_limit(MAX_CONTENT_LENGTH).and(warp::body::json())
    }

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let $route_variable = warp::any().map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_health_route => health, rt; p("health"), end(), g());
    route!(make_search_route => search, rt; p("shrines-temples"), end(), g(), query::<q::PlaceQuery>());
    route!(make_place_route => place, rt; p("shrines-temples"), par::<String>(), end(), g());
    route!(make_nearby_route => nearby, rt; p!("search" / "nearby"), end(), g(), query::<q::NearbyQuery>());
    route!(make_list_records_route => list_records, rt; p("visit-records"), end(), g());
    route!(make_create_record_route => create_record, rt; p("visit-records"), end(), post(), json_body());
    route!(make_retrieve_record_route => retrieve_record, rt; p("visit-records"), par::<String>(), end(), g());
    route!(make_update_record_route => update_record, rt; p("visit-records"), par::<String>(), end(), put(), json_body());
    route!(make_delete_record_route => delete_record, rt; p("visit-records"), par::<String>(), end(), delete());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_bad_requests() {
        assert_eq!(status_code_for(&BackendError::MissingFields), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_code_for(&BackendError::InvalidTypeFilter("church".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_code_for(&BackendError::NotFound {
                kind: "Place",
                id: "x".to_owned()
            }),
            StatusCode::NOT_FOUND
        );

        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            status_code_for(&BackendError::Serialization { source: malformed }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
