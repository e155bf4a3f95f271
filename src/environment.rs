use std::sync::Arc;

use log::Logger;

use crate::catalog::Catalog;
use crate::nearby::DEFAULT_SERVER_RADIUS_KM;
use crate::records::RecordStore;

#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub catalog: Arc<dyn Catalog>,
    pub records: Arc<dyn RecordStore>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        catalog: Arc<dyn Catalog>,
        records: Arc<dyn RecordStore>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            catalog,
            records,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pub(crate) default_radius_km: f64,
}

impl Config {
    pub fn new(default_radius_km: f64) -> Self {
        Self { default_radius_km }
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_RADIUS_KM)
    }
}
