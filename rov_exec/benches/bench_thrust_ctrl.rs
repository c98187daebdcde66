//! # Thrust Control Benchmark
//!
//! Times the hot path of one control cycle: mixing a setpoint into duty
//! cycle demands and building the frames for them. Both together must stay
//! well under the 20 ms control period.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::vesc::VescFrame;
use rov_lib::setpoint_store::Setpoint;
use rov_lib::thrust_ctrl::{Params, ThrustCtrl, NUM_THRUSTERS};
use util::module::State;

fn thrust_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build the module with the vehicle's vectored geometry ----

    let params = Params {
        mixing_matrix: [
            [1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0],
            [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0],
            [1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0],
            [-1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0],
        ],
        direction: [1.0; NUM_THRUSTERS],
        max_duty: 0.5,
    };

    let mut thrust_ctrl = ThrustCtrl::with_params(params).unwrap();

    let setpoint = Setpoint {
        surge: 53,
        sway: -12,
        heave: 127,
        roll: -128,
        pitch: 1,
        yaw: -90,
        light: 128,
        manipulator: 0,
    };

    c.bench_function("thrust_ctrl_proc", |b| {
        b.iter(|| thrust_ctrl.proc(black_box(&setpoint)).unwrap())
    });

    c.bench_function("vesc_set_duty_frame", |b| {
        b.iter(|| VescFrame::set_duty(black_box(0.25)))
    });

    c.bench_function("vesc_set_duty_forwarded_frame", |b| {
        b.iter(|| VescFrame::set_duty_forwarded(black_box(3), black_box(0.25)))
    });
}

criterion_group!(benches, thrust_ctrl_benchmark);
criterion_main!(benches);
