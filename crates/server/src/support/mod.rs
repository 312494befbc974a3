#![forbid(unsafe_code)]

mod build_info;
mod params;
mod proto;
mod session_log;
mod time;

pub(crate) use build_info::*;
pub(crate) use params::*;
pub(crate) use proto::*;
pub(crate) use session_log::*;
pub(crate) use time::*;
