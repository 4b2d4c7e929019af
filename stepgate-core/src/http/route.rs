//! Request routing
//!
//! Only two literal prefixes are recognized. Anything else, including other
//! methods and malformed requests, is `NotFound`.

const GET_PARAMS: &[u8] = b"GET /getParams";
const SET_PARAMS: &[u8] = b"GET /setParams";

/// Routed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Status report
    GetParams,
    /// Parameter update with the raw query (empty when there is none)
    SetParams { query: &'a str },
    NotFound,
}

impl<'a> Route<'a> {
    /// Route a raw request buffer
    pub fn from_request(request: &'a [u8]) -> Self {
        if request.starts_with(GET_PARAMS) {
            Route::GetParams
        } else if request.starts_with(SET_PARAMS) {
            Route::SetParams {
                query: query_of(request_line(request)),
            }
        } else {
            Route::NotFound
        }
    }
}

/// First line of the request, cut at the first non-UTF-8 byte
fn request_line(request: &[u8]) -> &str {
    let line_end = request
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(request.len());
    let line = &request[..line_end];
    match core::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&line[..e.valid_up_to()]).unwrap_or(""),
    }
}

/// Everything after the first `?`
fn query_of(line: &str) -> &str {
    line.split_once('?').map(|(_, query)| query).unwrap_or("")
}
