pub mod bookings;
pub mod chat;
pub mod health;
pub mod parks;
pub mod payments;
