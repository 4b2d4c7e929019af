//! HTTP response rendering
//!
//! Responses are fully rendered into a fixed buffer before anything is sent.
//! Floats use two decimals; keys are followed by `": "`.

use core::fmt::Write;

use heapless::String;

use crate::params::{DriverFeedback, MotorParameters};

/// Response buffer size
pub const RESPONSE_CAPACITY: usize = 1024;

/// A rendered response
pub type Response = String<RESPONSE_CAPACITY>;

const JSON_HEADERS: &str = "Content-Type: application/json\r\nConnection: close\r\n\r\n";

fn start(status: &str) -> Response {
    let mut out = Response::new();
    // Headers are far below capacity
    let _ = write!(out, "HTTP/1.1 {}\r\n{}", status, JSON_HEADERS);
    out
}

fn write_params(out: &mut Response, p: &MotorParameters) -> core::fmt::Result {
    write!(
        out,
        "\"rotational_speed\": {:.2},\"rotational_accel\": {:.2},\"rotational_decel\": {:.2},\
         \"current_position\": {},\"final_position\": {},\"step_mode\": {},\"dwell_time\": {}",
        p.rotational_speed,
        p.rotational_accel,
        p.rotational_decel,
        p.current_position,
        p.final_position,
        p.step_mode.as_wire(),
        p.dwell_time_ms,
    )
}

fn write_json(out: &mut Response, p: &MotorParameters, direction: Option<u8>) -> core::fmt::Result {
    out.write_char('{')?;
    write_params(out, p)?;
    if let Some(direction) = direction {
        write!(out, ",\"direction\": {}", direction)?;
    }
    out.write_char('}')
}

/// `200 OK` body for `/getParams`: the parameters plus the direction flag
pub fn status(params: &MotorParameters, feedback: &DriverFeedback) -> Response {
    let mut out = start("200 OK");
    let _ = write_json(&mut out, params, Some(feedback.direction()));
    out
}

/// `200 OK` body for `/setParams`: the parameters after the merge
pub fn update(params: &MotorParameters) -> Response {
    let mut out = start("200 OK");
    let _ = write_json(&mut out, params, None);
    out
}

/// `404 Not Found` for every other request
pub fn not_found() -> Response {
    let mut out = start("404 Not Found");
    let _ = out.push_str("{\"error\": \"Unknown endpoint\"}");
    out
}

/// Body of a rendered response
pub fn body(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("")
}
