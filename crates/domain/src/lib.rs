#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod clock;
mod controller;
mod elapsed;
mod error;
mod exercise;
mod exercise_tree;
mod name;
mod persistence;
mod scoring;
mod service;
mod session;
mod settings;
mod template;
mod user;
mod workout;

pub use clock::*;
pub use controller::*;
pub use elapsed::*;
pub use error::*;
pub use exercise::*;
pub use exercise_tree::*;
pub use name::*;
pub use persistence::*;
pub use scoring::*;
pub use service::*;
pub use session::*;
pub use settings::*;
pub use template::*;
pub use user::*;
pub use workout::*;
