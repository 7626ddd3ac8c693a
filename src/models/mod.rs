pub mod appointment;
pub mod intake;
pub mod session;
pub mod slot;
pub mod triage;

pub use appointment::{Appointment, NewAppointment};
pub use intake::{
    Answer, AnswerKind, GpIntake, IntakeAnswers, IntakeFlow, SexualHealthIntake, Sex, Step,
};
pub use session::{BookingPreferences, Session};
pub use slot::{format_minute, Slot, TimeOfDay};
pub use triage::{ClassificationResult, FlowVariant, Language, Mode, Priority, Urgency};
