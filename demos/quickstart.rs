/*
 * This source file is part of the netbounds open source project
 *
 * See https://github.com/quint-lang/netbounds for more information
 */

use ndarray::{array, Array1};
use netbounds::bounds::compute_bounds;
use netbounds::layers::{LayerIR, Network};
use netbounds::property::input_box_from_text;

fn main() {
    env_logger::init();

    // A tiny FC -> ReLU -> FC network over two inputs.
    let fc1 = LayerIR::fully_connected(
        "fc1",
        vec![2],
        2,
        Some(array![[1.0f32, -1.0], [1.0, 1.0]]),
        true,
        Some(Array1::zeros(2)),
    )
    .unwrap();
    let relu = LayerIR::relu("relu1", vec![2]).unwrap();
    let fc2 = LayerIR::fully_connected(
        "fc2",
        vec![2],
        1,
        Some(array![[1.0f32, 1.0]]),
        true,
        Some(Array1::zeros(1)),
    )
    .unwrap();
    let network = Network::new(vec![fc1, relu, fc2]).unwrap();

    let input_box = input_box_from_text(
        "X_0 <= 1.0\n\
         X_0 >= -1.0\n\
         X_1 <= 1.0\n\
         X_1 >= -1.0\n",
    )
    .unwrap();

    let report = compute_bounds(&network, &input_box).unwrap();
    let output = report.output_bounds().unwrap();

    println!("output lower: {:?}", output.get_lower());
    println!("output upper: {:?}", output.get_upper());
}
