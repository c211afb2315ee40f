//! Writes a few registers through the simulation handler, drives the trace
//! through the register-file model and prints every resolved value.

use std::time::Duration;

use axi_core::{
    drive, Command, Handler, RegisterFileConfig, RegisterFileModel, ResultState, SimHandler,
};
use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn main() {
    let config = RegisterFileConfig::default();
    let mut model = match RegisterFileModel::with_config(&config) {
        Ok(model) => model,
        Err(error) => {
            eprintln!("invalid model: {error}");
            std::process::exit(1);
        }
    };
    let mut handler = SimHandler::new();

    let commands = [
        Command::set_unsigned(27, 2).map(|command| command.with_description("store 27")),
        Command::set_signed(-1, 3).map(|command| command.with_description("store -1")),
        Command::get_unsigneds(2, 2, false).map(|command| command.with_description("read back")),
        Command::get_boolean(2).map(|command| command.with_description("not a boolean")),
        Command::fake_wait(config.latency, Duration::ZERO),
    ];
    let mut queued = Vec::new();
    for command in commands {
        match command {
            Ok(command) => queued.push(command),
            Err(error) => {
                eprintln!("invalid command: {error}");
                std::process::exit(1);
            }
        }
    }

    let handles: Vec<_> = queued
        .iter()
        .map(|command| (command.description().unwrap_or("wait").to_string(), command.result()))
        .collect();
    if let Err(error) = handler.send(queued) {
        eprintln!("{error}");
        std::process::exit(1);
    }

    let trace = handler.render();
    let responses = drive(&mut model, &trace);
    if let Err(error) = handler.consume(&responses) {
        eprintln!("{error}");
        std::process::exit(1);
    }

    println!("{} cycles", trace.len());
    for (label, handle) in handles {
        match handle.state() {
            ResultState::Resolved(value) => println!("{label}: {value}"),
            ResultState::Failed { fault, .. } => println!("{label}: {fault}"),
            ResultState::Pending => println!("{label}: pending"),
        }
    }
}
