//! Database entities

pub mod capture;
pub mod user;

pub use capture::Entity as Capture;
pub use user::Entity as User;

pub mod prelude {
    pub use super::capture::Entity as Capture;
    pub use super::user::Entity as User;
}
