//! `weather-harness`: scans a year of weather for every climate template and
//! reports validation violations.

mod harness;

use bevy::prelude::*;

use harness::{HarnessOptions, USAGE};

fn main() -> AppExit {
    match HarnessOptions::from_args(std::env::args().skip(1)) {
        Ok(options) => harness::run(options),
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            AppExit::from_code(2)
        }
    }
}
