pub mod ai;
pub mod booking;
pub mod calendar;
pub mod contact;
pub mod conversation;
pub mod intent;
pub mod messaging;
pub mod scheduling;
pub mod sessions;
