mod bookings;
mod chat;
mod payments;

pub use bookings::*;
pub use chat::*;
pub use payments::*;
