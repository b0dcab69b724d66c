//! Tool catalogs loaded from `*_tools.json` files

mod loader;

pub use loader::{ToolCatalogLoader, ToolFileError};
