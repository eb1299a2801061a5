use super::*;

fn unit(v: [f64; 3]) -> [f64; 3] {
  let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
  [v[0] / len, v[1] / len, v[2] / len]
}

#[test]
fn test_identity_passthrough() {
  let basis = Identity;
  assert_eq!(ColorBasis::<f32>::output_channels(&basis, 5).unwrap(), 5);

  let mut out = [0.0f32; 3];
  basis.eval([0.0, 0.0, 1.0], &[0.1, 0.2, 0.3], &mut out);
  assert_eq!(out, [0.1, 0.2, 0.3]);

  let mut grad = [1.0f32; 3];
  basis.backward([0.0, 0.0, 1.0], &[0.5, 0.25, 0.125], &mut grad);
  assert_eq!(grad, [1.5, 1.25, 1.125]);
}

#[test]
fn test_degree_limit() {
  assert!(SphericalHarmonics::new(3).is_ok());
  assert!(matches!(
    SphericalHarmonics::new(4),
    Err(FieldError::InvalidParameter { name: "degree", .. })
  ));
}

#[test]
fn test_coefficient_count_checked() {
  let sh = SphericalHarmonics::new(2).unwrap();
  assert_eq!(sh.basis_count(), 9);
  assert_eq!(ColorBasis::<f64>::output_channels(&sh, 27).unwrap(), 3);
  assert_eq!(
    ColorBasis::<f64>::output_channels(&sh, 26),
    Err(FieldError::BasisMismatch {
      expected: 27,
      actual: 26
    })
  );
}

/// Degree 0 is view independent: color = C0 * coefficient.
#[test]
fn test_degree_zero_is_constant() {
  let sh = SphericalHarmonics::new(0).unwrap();
  let coeffs = [1.0, 2.0, -1.0];
  let mut a = [0.0; 3];
  let mut b = [0.0; 3];
  sh.eval(unit([1.0, 0.0, 0.0]), &coeffs, &mut a);
  sh.eval(unit([-0.3, 0.9, 0.2]), &coeffs, &mut b);
  assert_eq!(a, b);
  assert!((a[1] - 2.0 * 0.282_094_791_773_878_14).abs() < 1e-12);
}

/// Orthonormality of the real SH basis, checked by numerical quadrature over
/// the sphere.
#[test]
fn test_basis_orthonormal() {
  let sh = SphericalHarmonics::new(3).unwrap();
  let steps_theta = 200;
  let steps_phi = 400;
  let mut gram = [[0.0f64; 16]; 16];
  for i in 0..steps_theta {
    let theta = (i as f64 + 0.5) / steps_theta as f64 * std::f64::consts::PI;
    for j in 0..steps_phi {
      let phi = (j as f64 + 0.5) / steps_phi as f64 * 2.0 * std::f64::consts::PI;
      let dir = [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()];
      let area = theta.sin() * (std::f64::consts::PI / steps_theta as f64)
        * (2.0 * std::f64::consts::PI / steps_phi as f64);
      let mut b = [0.0; 16];
      sh.basis(dir, &mut b);
      for r in 0..16 {
        for c in 0..16 {
          gram[r][c] += b[r] * b[c] * area;
        }
      }
    }
  }
  for r in 0..16 {
    for c in 0..16 {
      let expected = if r == c { 1.0 } else { 0.0 };
      assert!(
        (gram[r][c] - expected).abs() < 1e-3,
        "gram[{}][{}] = {}",
        r,
        c,
        gram[r][c]
      );
    }
  }
}

/// `<g, B c> == <Bᵀ g, c>`
#[test]
fn test_backward_is_transpose() {
  let sh = SphericalHarmonics::new(3).unwrap();
  let dir = unit([0.3, -0.5, 0.8]);
  let coeffs: Vec<f64> = (0..48).map(|i| (i as f64 * 0.37).sin()).collect();
  let grad_out = [0.7, -1.1, 0.4];

  let mut color = [0.0; 3];
  sh.eval(dir, &coeffs, &mut color);
  let mut grad_coeffs = vec![0.0; 48];
  sh.backward(dir, &grad_out, &mut grad_coeffs);

  let lhs: f64 = color.iter().zip(&grad_out).map(|(a, b)| a * b).sum();
  let rhs: f64 = grad_coeffs.iter().zip(&coeffs).map(|(a, b)| a * b).sum();
  assert!((lhs - rhs).abs() < 1e-12);
}
