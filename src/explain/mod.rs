pub mod treeshap;

pub use treeshap::explain_row;
