pub mod auth;
pub mod bookings;
pub mod cart;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod queries;
