pub mod booking;
pub mod conversation;
pub mod message;
pub mod park;

pub use booking::{Booking, BookingStatus, ConfirmOutcome, NewBooking};
pub use conversation::Conversation;
pub use message::{Message, Sender};
pub use park::{Park, SlotAvailability};
