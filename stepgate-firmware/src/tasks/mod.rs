//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! [`crate::channels`].

pub mod buttons;
pub mod emergency;
pub mod http;
pub mod led;
pub mod motion;
pub mod pushbutton;

pub use buttons::button_task;
pub use emergency::emergency_task;
pub use http::http_task;
pub use led::led_task;
pub use motion::motion_task;
pub use pushbutton::pushbutton_task;
