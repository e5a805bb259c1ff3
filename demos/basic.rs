use bevy_math::{dvec2, ivec2};
use eikonal_march::{ConstantSlowness, EikonalSolver, GridSpec, LinearSlowness};

fn main() {
    // A uniform medium: T should come out as the Euclidean distance from
    // the source, to within the scheme's truncation error.
    let mut uniform = EikonalSolver::new(GridSpec::new(ivec2(21, 21), 0.1), ConstantSlowness(1.0));
    uniform.add_point_source(ivec2(10, 10), 0.0).unwrap();
    uniform.solve().unwrap();
    println!(
        "uniform medium: T(20,10) = {:.4} (expected 1.0000)",
        uniform.t(ivec2(20, 10))
    );

    // A linear slowness field on a 51x31 grid with a factored point
    // source of radius 0.1, the scenario the reference solver's own
    // main() wires up end to end.
    let slowness = LinearSlowness::new(1.0, dvec2(0.3, -0.2));
    let mut linear = EikonalSolver::new(GridSpec::new(ivec2(51, 31), 1.0 / 30.0), slowness);
    linear.add_point_source(ivec2(25, 15), 0.1).unwrap();
    linear.solve().unwrap();

    println!("linear medium:");
    for j in (0..31).step_by(5) {
        let row: Vec<String> = (0..51)
            .step_by(5)
            .map(|i| format!("{:6.3}", linear.t(ivec2(i, j))))
            .collect();
        println!("  {}", row.join(" "));
    }

    if !linear.warnings.is_empty() {
        eprintln!("{} root-finder warnings during march", linear.warnings.len());
    }
}
