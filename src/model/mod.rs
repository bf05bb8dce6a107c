pub mod bands;
pub mod confusion;
pub mod ensemble;
pub mod profile;
pub mod tree;
