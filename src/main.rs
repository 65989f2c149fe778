#[macro_use] extern crate clap;
#[macro_use] extern crate log;

pub mod graphics;
pub mod interface;

use std::process;

use interface::cli::cli_main;

fn main() {
    process::exit(cli_main());
}
