//! Response middleware.

pub(crate) mod access_log;
pub(crate) mod headers;
