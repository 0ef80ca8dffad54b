pub mod dao;
pub mod rest;

pub use dao::GenericDao;
pub use rest::{RestDao, query_string};
