//! Annular Couette flow between two immersed concentric circles: the
//! computed tangential velocity must follow the analytic
//! u_theta(r) = A r + B / r profile, and the integrated torque on the
//! inner cylinder must approach 4 pi mu omega r1^2 r2^2 / (r2^2 - r1^2).

use std::f64::consts::PI;

use ibflow::fem::fe_values::interpolate_velocity;
use ibflow::fem::mapping::find_cell_around_point;
use ibflow::flow::{SamplingSide, TaylorCouetteSolution};
use ibflow::{FlowSolver, SolverConfig};
use nalgebra::{Point2, Vector2};

fn solve_at_level(level: u32) -> FlowSolver {
    let mut config = SolverConfig::taylor_couette();
    config.refinement = level;
    let mut solver = FlowSolver::new(config);
    let stats = solver
        .newton_iterate(1e-9, 20, true)
        .expect("solve failed");
    assert!(
        stats.converged,
        "Taylor-Couette at level {} did not converge (residual {:.3e})",
        level, stats.residual_norm
    );
    solver
}

fn tangential_speed_at(solver: &FlowSolver, r: f64, theta: f64) -> f64 {
    let p = Point2::new(r * theta.cos(), r * theta.sin());
    let (cell, xi) =
        find_cell_around_point(solver.mesh(), &p).expect("sample point inside the mesh");
    let u = interpolate_velocity(
        solver.mesh(),
        solver.dof_handler(),
        cell,
        &xi,
        solver.present_solution(),
    );
    let tangent = Vector2::new(-theta.sin(), theta.cos());
    u.dot(&tangent)
}

#[test]
fn test_velocity_profile_in_annulus() {
    let solver = solve_at_level(4);
    let exact = TaylorCouetteSolution {
        center: Point2::origin(),
        inner_radius: 0.21,
        outer_radius: 0.91,
        omega: 1.0 / 0.21,
    };

    // sample the mid-annulus, away from both cut-cell layers
    let h = solver.mesh().min_cell_diameter();
    for &r in &[0.40, 0.55, 0.70] {
        for k in 0..8 {
            let theta = 2.0 * PI * k as f64 / 8.0 + 0.1;
            let computed = tangential_speed_at(&solver, r, theta);
            let expected = exact.tangential_speed(r);
            assert!(
                (computed - expected).abs() < 2.0 * h,
                "u_theta({:.2}, {:.2}) = {:.4}, analytic {:.4}, h = {:.4}",
                r,
                theta,
                computed,
                expected,
                h
            );
        }
    }
}

#[test]
fn test_annulus_error_decreases_under_refinement() {
    let coarse = solve_at_level(4)
        .velocity_l2_error()
        .unwrap()
        .annulus
        .unwrap();
    let fine = solve_at_level(5)
        .velocity_l2_error()
        .unwrap()
        .annulus
        .unwrap();
    assert!(
        fine < coarse,
        "annulus L2 error did not decrease: {:.4e} -> {:.4e}",
        coarse,
        fine
    );
}

#[test]
fn test_inner_torque_magnitude() {
    let solver = solve_at_level(5);
    let report = solver.compute_traction(0, SamplingSide::Outward);

    let (r1, r2, mu) = (0.21, 0.91, 1.0);
    let omega = 1.0 / r1;
    let b = omega * r1 * r1 * r2 * r2 / (r2 * r2 - r1 * r1);
    let expected = 4.0 * PI * mu * b;

    // the wall-shear sample sits half a cell off the surface, so the
    // coarse-level torque carries a sizeable one-sided bias
    let relative = (report.torque.abs() - expected).abs() / expected;
    assert!(
        relative < 0.35,
        "inner torque {:.4} vs analytic {:.4} ({:.0}% off)",
        report.torque,
        expected,
        100.0 * relative
    );
}

#[test]
#[ignore = "level-6 solve; minutes of dense LU"]
fn test_inner_torque_magnitude_fine() {
    let solver = solve_at_level(6);
    let report = solver.compute_traction(0, SamplingSide::Outward);

    let (r1, r2, mu) = (0.21, 0.91, 1.0);
    let omega = 1.0 / r1;
    let b = omega * r1 * r1 * r2 * r2 / (r2 * r2 - r1 * r1);
    let expected = 4.0 * PI * mu * b;

    let relative = (report.torque.abs() - expected).abs() / expected;
    assert!(
        relative < 0.25,
        "inner torque {:.4} vs analytic {:.4} ({:.0}% off)",
        report.torque,
        expected,
        100.0 * relative
    );
}
