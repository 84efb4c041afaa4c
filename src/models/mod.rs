/// Wires a struct with an `id: i64` field into the store as an [`Entity`].
///
/// [`Entity`]: crate::database::Entity
macro_rules! entity {
    ($ty:ty, $collection:literal) => {
        impl $crate::database::Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> i64 {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = id;
            }
        }
    };
}

pub mod appointment;
pub mod chatbot;
pub mod clinical_summary;
pub mod doctor;
pub mod medical_note;
pub mod patient;
pub mod role;
pub mod user;

pub use appointment::*;
pub use chatbot::*;
pub use clinical_summary::*;
pub use doctor::*;
pub use medical_note::*;
pub use patient::*;
pub use role::*;
pub use user::*;
