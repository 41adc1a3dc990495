// Copyright 2026 the Vergence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drives a scripted headset session through the frame driver.
//!
//! The headset is absent for the first few polls, then connects. Over the
//! next few hundred frames a HUD overlay is removed again, the render scale
//! changes, the user runs a calibration and blinks, and the headset is
//! unplugged and replugged. Every trace event is recorded and exported as
//! Chrome trace JSON (`trace.json` unless a path is given). Pass `--pretty`
//! to also print each event.
//!
//! Run with `RUST_LOG=info` (or `debug`) to see the driver's own logging.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use vergence_backend_headless::{CallLog, HeadlessRuntime, RecordingConsumer};
use vergence_core::capability::Capabilities;
use vergence_core::config::SessionConfig;
use vergence_core::consumer::SharedConsumer;
use vergence_core::driver::{FrameDriver, TickOutcome};
use vergence_core::event::{DeviceEvent, DeviceEventKind};
use vergence_core::eye::{Eye, EyeMask};
use vergence_core::layer::{Extent, LayerConfig};
use vergence_core::pose::{Quat, Vec3};
use vergence_core::time::Duration;
use vergence_core::trace::TraceSink;
use vergence_core::tracking::{CalibrationState, EyeOpenness, GazeStatus};
use vergence_debug::pretty::PrettyPrintSink;
use vergence_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 360;
/// 90 Hz.
const FRAME_PERIOD: Duration = Duration(11_111_111);

fn main() {
    env_logger::init();

    let mut pretty = false;
    let mut path = String::from("trace.json");
    for arg in std::env::args().skip(1) {
        if arg == "--pretty" {
            pretty = true;
        } else {
            path = arg;
        }
    }

    // -- runtime -----------------------------------------------------------
    let log = CallLog::new();
    let mut runtime = HeadlessRuntime::with_log(log.clone()).with_frame_period(FRAME_PERIOD);
    runtime.script_connected([false, false, false, true]);
    runtime.set_ideal_dimensions(Extent::new(1512, 1680));
    runtime.pose_mut().standing_origin = Vec3::new(0.0, 1.6, 0.0);
    let data = runtime.eye_tracking_mut();
    data.status = GazeStatus::Valid;
    data.focus_distance = 1.5;
    for eye in Eye::ALL {
        let sample = &mut data.eyes[eye];
        sample.openness = EyeOpenness::Open;
        sample.gaze_status = GazeStatus::Valid;
        sample.pupil_diameter = 3.2;
    }

    // -- sinks -------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let sink: Box<dyn TraceSink> = if pretty {
        let printer = PrettyPrintSink::new(Box::new(std::io::stdout())).quiet_polls(true);
        Box::new((printer, recorder.clone()))
    } else {
        Box::new(recorder.clone())
    };

    // -- driver ------------------------------------------------------------
    let config = SessionConfig::new()
        .with_world_scale(100.0)
        .with_hardware_poll_interval(Duration::from_millis(50))
        .with_forced_capabilities(Capabilities::ORIENTATION);
    let mut driver = FrameDriver::new(runtime, config).with_trace_sink(sink);

    driver.subscribe_all(|event| log::info!("device event: {event:?}"));
    let blinks = Rc::new(RefCell::new(0_u32));
    let blink_count = blinks.clone();
    driver.subscribe(DeviceEventKind::EyeOpenness, move |event| {
        if let DeviceEvent::EyeOpennessChanged {
            openness: EyeOpenness::Closed,
            ..
        } = event
        {
            *blink_count.borrow_mut() += 1;
        }
    });

    let scene: SharedConsumer = RecordingConsumer::new(0, 0.0, log.clone())
        .with_capabilities(Capabilities::POSITION)
        .shared();
    let reticle: SharedConsumer = RecordingConsumer::new(1, 1.0, log.clone())
        .with_capabilities(Capabilities::GAZE | Capabilities::GAZE_DEPTH)
        .shared();
    let hud: SharedConsumer = RecordingConsumer::new(2, 0.0, log.clone())
        .with_capabilities(Capabilities::USER_PRESENCE)
        .with_eye_mask(EyeMask::LEFT)
        .shared();
    driver.register(LayerConfig::BASE, scene);
    driver.register(LayerConfig::BASE, reticle);
    driver.register(LayerConfig::OVERLAY, hud.clone());

    // -- simulated session -------------------------------------------------
    let mut rendered = 0_u64;
    let mut submitted = 0_u64;
    for frame in 0..FRAME_COUNT {
        script(&mut driver, frame, &hud);

        let t = frame as f64 * 0.02;
        let head = &mut driver.runtime_mut().pose_mut().head;
        head.orientation = Quat::from_rotation_y(t.sin() * 0.6);
        head.position = Vec3::new(t.cos() * 0.1, 0.0, 0.0);

        match driver.tick() {
            TickOutcome::Rendered { layers_submitted } => {
                rendered += 1;
                submitted += u64::from(layers_submitted);
            }
            // Only the render-pose barrier moves the headless clock.
            _ => driver.runtime_mut().advance(FRAME_PERIOD),
        }
    }

    log::info!(
        "final pose {:?}, standing at {:?}, gaze {:?}",
        driver.current_pose(),
        driver.standing_position(),
        driver.current_gaze()
    );
    let runtime = driver.shutdown();
    log::info!(
        "{} runtime calls, {} live surfaces after shutdown",
        log.len(),
        runtime.live_surfaces()
    );

    // -- export Chrome trace -----------------------------------------------
    let file = File::create(&path).expect("failed to create trace file");
    let mut writer = BufWriter::new(file);
    vergence_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "Wrote {path} ({FRAME_COUNT} frames, {rendered} rendered, {submitted} layer submissions, {} blinks)",
        blinks.borrow()
    );
}

/// Scripted changes to the session, keyed by frame number.
fn script(driver: &mut FrameDriver<HeadlessRuntime>, frame: u64, hud: &SharedConsumer) {
    match frame {
        60 => {
            driver.unregister(hud);
        }
        90 => driver.set_render_scale(1.25),
        120 => {
            driver.runtime_mut().eye_tracking_mut().calibration = CalibrationState::Calibrating;
        }
        150 => {
            driver.runtime_mut().eye_tracking_mut().calibration = CalibrationState::Calibrated;
        }
        180 | 240 => set_left_eye(driver, EyeOpenness::Closed),
        184 | 244 => set_left_eye(driver, EyeOpenness::Open),
        200 => driver.runtime_mut().set_connected(false),
        230 => driver.runtime_mut().set_connected(true),
        300 => {
            driver.register(LayerConfig::OVERLAY, hud.clone());
        }
        _ => {}
    }
}

fn set_left_eye(driver: &mut FrameDriver<HeadlessRuntime>, openness: EyeOpenness) {
    driver.runtime_mut().eye_tracking_mut().eyes[Eye::Left].openness = openness;
}
