pub mod graph_to_ir;
pub mod name_normalizer;
pub mod responses;
pub mod schema_resolver;

pub use graph_to_ir::build_document;
pub use responses::ResponseNormalizer;
