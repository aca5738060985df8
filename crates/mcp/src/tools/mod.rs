pub mod article;
pub mod search;
mod registry;

pub use article::{GetArticleTool, GET_ARTICLE};
pub use search::{SearchArticlesTool, MAX_QUERY_CHARS, SEARCH_ARTICLES};
pub use registry::{
    json_schema_object, json_schema_string, optional_string, required_exact_string,
    required_string, Tool, ToolRegistry,
};
