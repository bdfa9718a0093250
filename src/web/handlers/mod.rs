pub mod apps;
pub mod topics;
