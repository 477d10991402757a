extern crate bspline_kernel;

use bspline_kernel::{interpolate, knot, CurveRef};
use nalgebra::Vector2;

fn main() {

    let points = vec![
        Vector2::new(0.0, 0.0),
        Vector2::new(1.0, 2.0),
        Vector2::new(2.0, 1.0),
        Vector2::new(3.0, 3.0),
        Vector2::new(4.0, 0.0),
        Vector2::new(5.0, 1.0)
    ];

    let knots = vec![0.0, 1.0, 2.0, 3.0];
    let mults = vec![4, 1, 1, 4];
    let flat = knot::knot_sequence(&knots, &mults, 3, false);
    let parameters = interpolate::build_schoenberg_points(3, &flat);

    let mut poles = points.clone();
    if let Err(error) = interpolate::interpolate(3, &flat, &parameters, &vec![0; points.len()], &mut poles) {
        eprintln!("{error}");
        return;
    }

    let curve = CurveRef::new(3, &poles, &knots, &mults);

    let number_of_steps = 60;
    let step = 3.0 / number_of_steps as f64;

    println!("x;y");
    for i in 0..=number_of_steps {
        let point = curve.d0(step * i as f64);
        println!("{:.2};{:.2}", point.x, point.y);
    }
}
