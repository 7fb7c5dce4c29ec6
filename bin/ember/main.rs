// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Ember.

// Ember is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ember is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ember.  If not, see <http://www.gnu.org/licenses/>.

//! Ember client application.

mod cli;
mod configuration;
mod run;

use std::process;

fn main() {
    let args = cli::parse();
    let configuration = match configuration::Configuration::from_args(&args) {
        Ok(configuration) => configuration,
        Err(error) => {
            eprintln!("Invalid configuration: {}", error);
            process::exit(1);
        }
    };
    if let Err(error) = run::execute(configuration) {
        eprintln!("{}", error);
        process::exit(1);
    }
}
