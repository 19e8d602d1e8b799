pub mod http_utils;

pub use http_utils::{build_http_client, send_for_text, USER_AGENT};
