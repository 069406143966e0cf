pub mod conversation;
pub mod intent;
pub mod slot;

pub use conversation::{BookingStep, CallSession, Contact, ConversationMessage};
pub use intent::{CallIntent, ExtractedContact};
pub use slot::{AppointmentSlot, BusyInterval};
