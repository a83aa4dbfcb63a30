pub mod adapter;
pub mod api;
pub mod locator;
pub mod schema;

pub use adapter::{
    RemoteStore,
    SheetStore,
};
pub use locator::parse_spreadsheet_url;
pub use schema::{
    Column,
    ColumnMap,
};
