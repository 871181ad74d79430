/// Projective geometry: homography estimation from point correspondences
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{OmrError, Result};
use crate::models::Point;

/// 3x3 projective transform in double precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    /// Wrap a matrix, normalizing so that `h[2][2] == 1` when possible
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        let scale = matrix[(2, 2)];
        let matrix = if scale.abs() > 1e-15 {
            matrix / scale
        } else {
            matrix
        };
        Self { matrix }
    }

    /// Identity transform
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Underlying matrix
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Row-major entries
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    /// Map `[x, y]`; points sent to infinity come back as NaN
    pub fn project(&self, p: [f64; 2]) -> [f64; 2] {
        let v = self.matrix * Vector3::new(p[0], p[1], 1.0);
        if v[2].abs() < 1e-15 {
            return [f64::NAN, f64::NAN];
        }
        [v[0] / v[2], v[1] / v[2]]
    }

    /// Map a single-precision point
    pub fn transform(&self, p: &Point) -> Point {
        let [x, y] = self.project(p.to_f64());
        Point::new(x as f32, y as f32)
    }

    /// Inverse transform, `None` when singular
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }

    /// Whether the transform is finite and safely invertible
    pub fn is_degenerate(&self) -> bool {
        if self.matrix.iter().any(|v| !v.is_finite()) {
            return true;
        }
        let det = self.matrix.determinant();
        !det.is_finite() || det.abs() < 1e-9 || self.inverse().is_none()
    }

    /// Reprojection error `|project(src) - dst|`
    pub fn reprojection_error(&self, src: [f64; 2], dst: [f64; 2]) -> f64 {
        let p = self.project(src);
        let dx = p[0] - dst[0];
        let dy = p[1] - dst[1];
        (dx * dx + dy * dy).sqrt()
    }
}

/// Translate the centroid to the origin and scale the mean radius to sqrt(2)
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, normalized)
}

/// Direct linear transform from >= 4 correspondences with Hartley normalization
///
/// Returns H such that `dst ~ H * src`.
pub fn estimate_homography_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Homography> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return Err(OmrError::alignment(format!(
            "homography needs at least 4 paired points, got {} and {}",
            n,
            dst.len()
        )));
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of the smallest eigenvalue of A^T A
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let (min_idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, v)| {
            if v.abs() < best.1 { (i, v.abs()) } else { best }
        });
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| OmrError::alignment("point normalization is singular"))?;
    Ok(Homography::from_matrix(t_dst_inv * h_norm * t_src))
}

/// RANSAC parameters for homography fitting
#[derive(Debug, Clone)]
pub struct RansacConfig {
    /// Maximum number of hypotheses
    pub max_iters: usize,
    /// Inlier threshold on reprojection error, pixels
    pub inlier_threshold: f64,
    /// Minimum inliers for an accepted model
    pub min_inliers: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            inlier_threshold: 5.0,
            min_inliers: 8,
            seed: 0,
        }
    }
}

/// Accepted RANSAC model
#[derive(Debug, Clone)]
pub struct RansacFit {
    /// Homography refit on all inliers
    pub homography: Homography,
    /// Per-correspondence inlier flags
    pub inlier_mask: Vec<bool>,
    /// Number of inliers under the refit model
    pub inliers: usize,
}

/// Robust homography fit mapping `src` onto `dst`
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    config: &RansacConfig,
) -> Result<RansacFit> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return Err(OmrError::alignment(format!(
            "only {n} correspondences, need at least 4"
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best_count = 0usize;
    let mut best_mask = vec![false; n];
    let mut best_h: Option<Homography> = None;

    for _ in 0..config.max_iters {
        let sample = sample_distinct(&mut rng, n);
        let s4: Vec<[f64; 2]> = sample.iter().map(|&i| src[i]).collect();
        let d4: Vec<[f64; 2]> = sample.iter().map(|&i| dst[i]).collect();

        let h = match estimate_homography_dlt(&s4, &d4) {
            Ok(h) if !h.is_degenerate() => h,
            _ => continue,
        };

        let mask: Vec<bool> = (0..n)
            .map(|i| h.reprojection_error(src[i], dst[i]) < config.inlier_threshold)
            .collect();
        let count = mask.iter().filter(|&&m| m).count();

        if count > best_count {
            best_count = count;
            best_mask = mask;
            best_h = Some(h);

            // Early exit when >90% agree
            if count * 10 > n * 9 {
                break;
            }
        }
    }

    let Some(best_h) = best_h else {
        return Err(OmrError::alignment("no non-degenerate homography hypothesis"));
    };
    if best_count < config.min_inliers.max(4) {
        return Err(OmrError::alignment(format!(
            "only {best_count} inliers, need {}",
            config.min_inliers.max(4)
        )));
    }

    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let refit = estimate_homography_dlt(&inlier_src, &inlier_dst)
        .ok()
        .filter(|h| !h.is_degenerate())
        .unwrap_or(best_h);

    let inlier_mask: Vec<bool> = (0..n)
        .map(|i| refit.reprojection_error(src[i], dst[i]) < config.inlier_threshold)
        .collect();
    let inliers = inlier_mask.iter().filter(|&&m| m).count();

    Ok(RansacFit {
        homography: refit,
        inlier_mask,
        inliers,
    })
}

fn sample_distinct(rng: &mut StdRng, n: usize) -> [usize; 4] {
    let mut picked = [usize::MAX; 4];
    let mut filled = 0;
    while filled < 4 {
        let candidate = rng.gen_range(0..n);
        if !picked[..filled].contains(&candidate) {
            picked[filled] = candidate;
            filled += 1;
        }
    }
    picked
}
