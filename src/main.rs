use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use log::warn;

use midiscope::{
    rms_and_peak, EventBus, EventRouter, MidiInputHandler, MidiOutputHandler, VisualizationEngine,
    CHANNELS,
};

/// Headless channel monitor: connects a MIDI input port, routes it through
/// the visualization engine (optionally on to an output port), and prints
/// per-channel level meters to the terminal.
///
/// Usage: midiscope [input-port] [output-port]
/// With no arguments, lists the available ports.
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut input = MidiInputHandler::new();
    if args.is_empty() {
        println!("MIDI input ports:");
        for name in input.list_ports()? {
            println!("  {name}");
        }
        println!("MIDI output ports:");
        for name in MidiOutputHandler::list_ports()? {
            println!("  {name}");
        }
        println!("\nusage: midiscope <input-port> [output-port]");
        return Ok(());
    }
    if args.len() > 2 {
        bail!("expected at most two arguments: <input-port> [output-port]");
    }

    let engine = Arc::new(VisualizationEngine::new());
    let router = Arc::new(EventRouter::new(Arc::clone(&engine)));
    let bus = EventBus::new();

    input.connect(&args[0], bus.sender())?;

    if let Some(output_port) = args.get(1) {
        match MidiOutputHandler::connect(output_port) {
            Ok(sink) => {
                router.set_target(Some(Box::new(sink)));
            }
            // visualization works fine without an audio path
            Err(err) => warn!("continuing without output: {err}"),
        }
    }

    // delivery pump: drain the bus into the router
    {
        let router = Arc::clone(&router);
        thread::spawn(move || loop {
            bus.pump(&router, 256);
            thread::sleep(Duration::from_millis(2));
        });
    }

    // refresh loop: the terminal is the renderer
    loop {
        thread::sleep(Duration::from_millis(100));
        print!("\x1B[2J\x1B[H");
        for channel in 0..CHANNELS {
            let samples = engine.snapshot(channel, 1024)?;
            let (rms, peak) = rms_and_peak(&samples);
            println!(
                "ch {:2}  {:<24} |{:<32}| peak {:.2}",
                channel + 1,
                engine.instrument_name(channel)?,
                meter_bar(rms, peak),
                peak,
            );
        }
    }
}

fn meter_bar(rms: f32, peak: f32) -> String {
    const WIDTH: usize = 32;
    let rms_cells = (rms.clamp(0.0, 1.0) * WIDTH as f32).round() as usize;
    let peak_cell = (peak.clamp(0.0, 1.0) * WIDTH as f32).round() as usize;
    let mut bar = String::with_capacity(WIDTH);
    for i in 0..WIDTH {
        if i < rms_cells {
            bar.push('#');
        } else if i + 1 == peak_cell {
            bar.push('|');
        } else {
            bar.push(' ');
        }
    }
    bar
}
