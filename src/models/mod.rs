//! Domain models

pub mod borrow;
pub mod copy;
pub mod damage_report;
pub mod edition;
pub mod enums;
pub mod fine_policy;
pub mod library;
pub mod reservation;
pub mod shipment;
pub mod user;
