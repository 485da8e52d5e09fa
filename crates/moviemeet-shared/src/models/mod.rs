mod meetup;
mod movie;
mod user;

pub use meetup::*;
pub use movie::*;
pub use user::*;
