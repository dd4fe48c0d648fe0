pub mod controller;

pub use controller::{AlarmController, AlarmHandle};
