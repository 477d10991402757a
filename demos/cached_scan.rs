extern crate bspline_kernel;

use bspline_kernel::{CurveRef, SpanCache};

fn main() {

    let poles = vec![0.0, 1.0, -1.0, 0.0, 3.0, 1.0, -1.0];
    let knots = vec![0.0, 1.0, 2.0, 4.0, 5.0];
    let mults = vec![4, 1, 1, 1, 4];

    let curve = CurveRef::new(3, &poles, &knots, &mults);

    let x_min = curve.first_parameter();
    let x_max = curve.last_parameter();
    let number_of_steps = 60;
    let step = (x_max - x_min) / number_of_steps as f64;

    let mut cache = SpanCache::build(&curve, x_min);

    println!("x;y;dy");
    for i in 0..=number_of_steps {
        let x = x_min + step * i as f64;
        if !cache.contains(x) {
            cache = SpanCache::build(&curve, x);
        }
        let (y, dy) = cache.d1(x);
        println!("{:.2};{:.2};{:.2}", x, y, dy);
    }
}
