mod appointment;
mod artist;
mod booking_link;
mod business_hours;
mod client;
mod payment;
mod service;
mod studio;

pub use appointment::*;
pub use artist::*;
pub use booking_link::*;
pub use business_hours::*;
pub use client::*;
pub use payment::*;
pub use service::*;
pub use studio::*;
