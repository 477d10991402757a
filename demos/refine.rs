extern crate bspline_kernel;

use bspline_kernel::{transform, CurveRef};

fn main() {

    let poles = vec![0.0, 2.0, -1.0, 1.5, 0.5];
    let knots = vec![0.0, 1.0, 2.0];
    let mults = vec![4, 1, 4];

    let curve = CurveRef::new(3, &poles, &knots, &mults);

    let refined = match transform::insert_knots(&curve, &[0.5, 1.5], None, 1e-9, true)
        .and_then(|curve| transform::increase_degree(&curve.as_curve(), 4))
    {
        Ok(refined) => refined,
        Err(error) => {
            eprintln!("{error}");
            return;
        }
    };
    let refined = refined.as_curve();

    let number_of_steps = 40;
    let step = 2.0 / number_of_steps as f64;

    println!("x;original;refined");
    for i in 0..=number_of_steps {
        let x = step * i as f64;
        println!("{:.2};{:.2};{:.2}", x, curve.d0(x), refined.d0(x));
    }
}
