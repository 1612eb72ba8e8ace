mod action;
mod audio;
mod cli;
mod config;
mod detectors;
mod error;
mod json;
mod monitor;
mod output;
mod peak;
mod states;

use clap::Parser;
use clap::error::ErrorKind;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use cli::Cli;
use config::Config;
use monitor::{Monitor, RunOutcome, TICK};
use output::{Output, fmt_db};
use peak::PeakSampler;

const ERR_FAILURE: u8 = 1;

fn print_settings(config: &Config) {
    let detector = &config.detector;
    debug!("[+] client name:         {}", config.client_name);
    if detector.silence_enabled() {
        debug!(
            "[+] silence threshold:   {} for {}s",
            fmt_db(detector.silence_threshold),
            detector.silence_period
        );
    }
    if detector.nodynamic_enabled() {
        debug!(
            "[+] no-dynamic delta:    {} for {}s",
            fmt_db(detector.nodynamic_threshold),
            detector.nodynamic_period
        );
    }
    debug!("[+] grace period:        {}s", detector.grace_period);
    if detector.reverse {
        debug!("[+] reverse mode");
    }
}

fn run(config: &Config) -> Result<RunOutcome, error::Error> {
    let output = Output::new(config);
    print_settings(config);

    let sampler = Arc::new(PeakSampler::new());
    let running = Arc::new(AtomicBool::new(true));
    let input = audio::open(config, Arc::clone(&sampler), Arc::clone(&running))?;

    let mut monitor = Monitor::new(config.detector)
        .with_client_name(config.client_name.clone())
        .with_json(config.json);
    let mut action = config.action.clone();
    let outcome = monitor.run(&input, &sampler, &running, &mut action, &output, TICK);

    output.finish();
    drop(input);
    Ok(outcome)
}

fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(ERR_FAILURE),
            };
        }
    };

    if args.list_devices {
        return match audio::list_inputs() {
            Ok(names) => {
                for name in names {
                    println!("{}", name);
                }
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("{}", err);
                ExitCode::from(ERR_FAILURE)
            }
        };
    }

    let config = match Config::try_from(&args) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::from(ERR_FAILURE);
        }
    };

    match run(&config) {
        Ok(RunOutcome::Shutdown) => {
            output!("Shutting down.");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::ActionExit) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(ERR_FAILURE)
        }
    }
}
