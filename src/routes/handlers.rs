use std::time::{Duration, Instant};

use log::{debug, o};
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, with_status, Json, Reply},
};

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    query::{NearbyQuery, NewRecordBody, PlaceQuery},
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::search::{self, SearchResults};
use crate::visit::VisitRecordUpdate;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn health(_environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Health {
            status: "ok",
            service: info::SERVICE_NAME,
        })
    }
}

pub async fn search(environment: Environment, query: PlaceQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::search(), e);

        let request = query
            .into_request(environment.config.default_radius_km())
            .map_err(error_handler)?;
        debug!(environment.logger, "Searching..."; "request" => ?request);

        let places = environment.catalog.scan().await.map_err(error_handler)?;

        reply_with_results(&environment, search::run(&places, &request))
    }
}

pub async fn nearby(environment: Environment, query: NearbyQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::nearby(), e);

        let request = query
            .into_request(environment.config.default_radius_km())
            .map_err(error_handler)?;
        debug!(environment.logger, "Searching nearby..."; "request" => ?request);

        let places = environment.catalog.scan().await.map_err(error_handler)?;

        reply_with_results(&environment, search::run(&places, &request))
    }
}

fn reply_with_results(environment: &Environment, results: SearchResults) -> Json {
    let logger = &environment.logger;

    match results {
        SearchResults::Places(places) => {
            debug!(logger, "Found places"; "count" => places.len());
            json(&places)
        }
        SearchResults::Nearby(nearby) => {
            for skipped in &nearby.skipped {
                debug!(logger, "Skipping place without coordinates"; "id" => &skipped.id, "name" => &skipped.name);
            }

            debug!(logger, "Found nearby places"; "count" => nearby.places.len(), "skipped" => nearby.skipped.len());
            json(&nearby.places)
        }
    }
}

pub async fn place(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::place(id.clone()), e);

        debug!(environment.logger, "Retrieving place..."; "id" => &id);
        let place = environment
            .catalog
            .get(&id)
            .await
            .map_err(error_handler)?
            .ok_or_else(|| error_handler(BackendError::NotFound { kind: "Place", id: id.clone() }))?;

        json(&place)
    }
}

pub async fn list_records(environment: Environment) -> RouteResult {
    timed! {
        let records = environment
            .records
            .list()
            .await
            .map_err(|e| Rejection::new(Context::list_records(), e))?;

        json(&records)
    }
}

pub async fn create_record(environment: Environment, body: serde_json::Value) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create_record(), e);

        let body: NewRecordBody = serde_json::from_value(body)
            .map_err(|_| BackendError::BadRequest)
            .map_err(error_handler)?;
        let new = body.into_new_record().map_err(error_handler)?;

        let record = environment.records.create(new).await.map_err(error_handler)?;

        let logger = environment.logger.new(o!("id" => record.id.clone()));
        debug!(logger, "Created visit record"; "place" => &record.shrine_temple_id);

        with_status(json(&record), StatusCode::CREATED)
    }
}

pub async fn retrieve_record(environment: Environment, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::record(id.clone()), e);

        debug!(environment.logger, "Retrieving visit record..."; "id" => &id);
        let record = environment
            .records
            .get(&id)
            .await
            .map_err(error_handler)?
            .ok_or_else(|| error_handler(not_found(&id)))?;

        json(&record)
    }
}

pub async fn update_record(
    environment: Environment,
    id: String,
    body: serde_json::Value,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::record(id.clone()), e);

        let update: VisitRecordUpdate = serde_json::from_value(body)
            .map_err(|_| BackendError::BadRequest)
            .map_err(error_handler)?;

        debug!(environment.logger, "Updating visit record..."; "id" => &id);
        let record = environment
            .records
            .update(&id, update)
            .await
            .map_err(error_handler)?
            .ok_or_else(|| error_handler(not_found(&id)))?;

        json(&record)
    }
}

pub async fn delete_record(environment: Environment, id: String) -> RouteResult {
    timed! {
        debug!(environment.logger, "Deleting visit record..."; "id" => &id);
        environment
            .records
            .delete(&id)
            .await
            .map_err(|e| Rejection::new(Context::record(id.clone()), e))?;

        StatusCode::NO_CONTENT
    }
}

fn not_found(id: &str) -> BackendError {
    BackendError::NotFound {
        kind: "Visit record",
        id: id.to_owned(),
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
