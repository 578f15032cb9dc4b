pub mod table;

pub use table::{TableDisplay, format_date};
