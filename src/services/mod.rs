pub mod ai;
pub mod booking;
pub mod catalog;
pub mod intake;
pub mod session;
