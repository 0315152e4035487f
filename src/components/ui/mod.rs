mod alert;
mod button;
mod card;
mod input;
mod label;
mod spinner;

pub use alert::*;
pub use button::*;
pub use card::*;
pub use input::*;
pub use label::*;
pub use spinner::*;
