pub mod catalog;
pub mod repositories;

pub use catalog::{CatalogError, ScheduleCatalog};
pub use repositories::{
    InMemoryScheduleRepository, InMemoryTouchpointRepository, RepositoryError, ScheduleRepository,
    TouchpointRepository,
};
