use std::fs::File;

use patchstep_core::clock::SystemClock;
use patchstep_core::config::{parse_transport, Config, TransportKind};
use patchstep_core::controller::Controller;
use patchstep_core::gpio::{Pinctrl, PinctrlIndicator};
use patchstep_core::midi::{AmidiBus, MidiBus, MidirBus};

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("patchstep")
        .join("patchstep.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    match File::create(&log_path).or_else(|_| File::create("/tmp/patchstep.log")) {
        Ok(log_file) => loggers.push(WriteLogger::new(log_level, simplelog::Config::default(), log_file)),
        Err(e) => eprintln!("patchstep: no log file ({}), logging to the terminal only", e),
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("patchstep: failed to initialize logger: {}", e);
    }

    log::debug!("patchstep starting (log level: {:?})", log_level);
}

/// Command line, parsed by hand like the rest of the workspace's binaries.
#[derive(Debug, Default, PartialEq)]
struct Args {
    verbose: bool,
    list_devices: bool,
    transport: Option<TransportKind>,
    device: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let list_devices = args.iter().any(|a| a == "--list-devices");

    let transport = match args.iter().position(|a| a == "--transport") {
        Some(i) => {
            let value = args
                .get(i + 1)
                .ok_or_else(|| "--transport needs a value (amidi or midir)".to_string())?;
            Some(
                parse_transport(value)
                    .ok_or_else(|| format!("unknown transport {:?} (expected amidi or midir)", value))?,
            )
        }
        None => None,
    };

    let device = match args.iter().position(|a| a == "--device") {
        Some(i) => Some(
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| "--device needs a name".to_string())?,
        ),
        None => None,
    };

    Ok(Args {
        verbose,
        list_devices,
        transport,
        device,
    })
}

fn list_devices<B: MidiBus>(mut bus: B, identity: &str) -> Result<(), String> {
    let endpoints = bus.endpoints().map_err(|e| e.to_string())?;
    if endpoints.is_empty() {
        println!("no MIDI endpoints");
    }
    for endpoint in endpoints {
        let mark = if endpoint.matches(identity) { "*" } else { " " };
        println!("{} {:<12} {}", mark, endpoint.id, endpoint.name);
    }
    Ok(())
}

fn run_with<B: MidiBus>(config: &Config, bus: B) -> ! {
    let indicator = PinctrlIndicator::new(config.pins().indicator);
    let mut controller = Controller::start(config, bus, Pinctrl::new(), indicator, SystemClock);
    controller.run()
}

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("patchstep: {}", e);
            eprintln!("usage: patchstep [-v] [--transport amidi|midir] [--device NAME] [--list-devices]");
            std::process::exit(1);
        }
    };

    let mut config = Config::load();
    if let Some(kind) = args.transport {
        config.set_transport(kind);
    }
    if let Some(name) = args.device {
        config.set_device_name(name);
    }

    if args.list_devices {
        let result = match config.transport() {
            TransportKind::Amidi => list_devices(AmidiBus::new(), config.device_name()),
            TransportKind::Midir => list_devices(MidirBus::new(), config.device_name()),
        };
        if let Err(e) = result {
            eprintln!("patchstep: cannot list {} endpoints: {}", config.transport(), e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(args.verbose);
    log::info!("~~~ Starting ZOOM Patch Switcher ~~~");
    log::info!(
        "looking for {:?} over {}",
        config.device_name(),
        config.transport()
    );

    match config.transport() {
        TransportKind::Amidi => run_with(&config, AmidiBus::new()),
        TransportKind::Midir => run_with(&config, MidirBus::new()),
    }
}
