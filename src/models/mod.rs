pub mod fixture;
pub mod ticket;
