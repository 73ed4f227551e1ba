pub mod catalog_api;
