pub mod generator;
pub mod type_mapper;

use sdg_core::{Backend, BackendProvider};

pub use generator::SpringServerBackend;

/// Registry name of the Spring backend.
pub const BACKEND_NAME: &str = "custom-spring";

/// Statically linked provider for [`SpringServerBackend`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SpringServerProvider;

impl BackendProvider for SpringServerProvider {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn create(&self) -> Box<dyn Backend> {
        Box::new(SpringServerBackend::new())
    }
}
