pub mod fixture_service;
pub mod memory_store;
pub mod mysql_store;
pub mod payment;
pub mod store;
pub mod ticket_service;
