use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Search,
    Nearby,
    Place { id: String },
    ListRecords,
    CreateRecord,
    Record { id: String },
}

impl Context {
    pub fn search() -> Context {
        Context::Search
    }

    pub fn nearby() -> Context {
        Context::Nearby
    }

    pub fn place(id: String) -> Context {
        Context::Place { id }
    }

    pub fn list_records() -> Context {
        Context::ListRecords
    }

    pub fn create_record() -> Context {
        Context::CreateRecord
    }

    pub fn record(id: String) -> Context {
        Context::Record { id }
    }
}
