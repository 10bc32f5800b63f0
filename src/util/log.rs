// Copyright (C) 2013-2020 Blockstack PBC, a public benefit corporation
// Copyright (C) 2020 Stacks Open Internet Foundation
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::env;
use std::sync::Mutex;

use slog::{Drain, Level, Logger};

lazy_static! {
    pub static ref LOGGER: Logger = make_logger();
    static ref LOGLEVEL: Level = inner_get_loglevel();
}

fn inner_get_loglevel() -> Level {
    if env::var("STACKS_LOG_TRACE") == Ok("1".into()) {
        Level::Trace
    } else if env::var("STACKS_LOG_DEBUG") == Ok("1".into()) {
        Level::Debug
    } else {
        Level::Info
    }
}

pub fn get_loglevel() -> Level {
    *LOGLEVEL
}

fn make_logger() -> Logger {
    let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let filtered = slog::LevelFilter::new(drain, get_loglevel()).fuse();
    let drain = Mutex::new(filtered).fuse();
    Logger::root(drain, o!())
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => ({
        if slog::Level::Trace.is_at_least($crate::util::log::get_loglevel()) {
            slog_trace!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        if slog::Level::Error.is_at_least($crate::util::log::get_loglevel()) {
            slog_error!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        if slog::Level::Warning.is_at_least($crate::util::log::get_loglevel()) {
            slog_warn!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => ({
        if slog::Level::Info.is_at_least($crate::util::log::get_loglevel()) {
            slog_info!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => ({
        if slog::Level::Debug.is_at_least($crate::util::log::get_loglevel()) {
            slog_debug!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}
