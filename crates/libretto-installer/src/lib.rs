//! Download, verify, unpack, journal and reverse a single package install
//! (§4.3, §4.4). The resolver and planner decide *what* to install or
//! remove; this crate is the only place that touches the filesystem under
//! `<root>/modules`.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod install;
mod prefix;
mod uninstall;

pub use error::{ErrorCode, InstallError, InstallResult, UninstallError, UninstallResult};
pub use install::install;
pub use uninstall::uninstall;
