//! Similarity alignment of two ordered point sets (orthogonal Procrustes).

use nalgebra::{Matrix2, Vector2};

use crate::error::{Error, Result};
use crate::transform::Transform;
use crate::types::{Point, PointSet};

/// Spread below which a point set is treated as collapsed to a single point.
const MIN_STD: f64 = 1e-9;

/// Estimate the similarity transform that maps `source` onto `target`.
///
/// Both sets are centered and divided by their scalar coordinate standard
/// deviation, the rotation comes from the SVD of their cross-covariance, and
/// the result recombines the scale ratio, the rotation and the translation
/// between the centroids:
///
/// ```text
/// T(p) = (s_t / s_s) * R * (p - c_s) + c_t
/// ```
///
/// The rotation is always proper: a mirrored configuration yields the best
/// rotation rather than a reflection.
pub fn estimate_similarity(source: &PointSet, target: &PointSet) -> Result<Transform> {
    if source.len() != target.len() {
        return Err(Error::PointCountMismatch {
            source_len: source.len(),
            target_len: target.len(),
        });
    }
    let (Some(c_s), Some(c_t)) = (source.centroid(), target.centroid()) else {
        return Err(Error::IllConditionedInput("empty point set".into()));
    };

    let s_s = source.coordinate_std();
    let s_t = target.coordinate_std();
    if !(s_s.is_finite() && s_t.is_finite()) {
        return Err(Error::IllConditionedInput(
            "point set has non-finite coordinates".into(),
        ));
    }
    if s_s <= MIN_STD || s_t <= MIN_STD {
        return Err(Error::IllConditionedInput(format!(
            "point set has no spread (std {s_s:.3e} vs {s_t:.3e})"
        )));
    }

    let mut h = Matrix2::<f64>::zeros();
    for (p, q) in source.iter().zip(target.iter()) {
        let a = normalized(*p, c_s, s_s);
        let b = normalized(*q, c_t, s_t);
        h += a * b.transpose();
    }

    let svd = h.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(Error::IllConditionedInput(
            "cross-covariance decomposition failed".into(),
        ));
    };

    // Flip the weakest axis when U * V^T would be a reflection.
    let mut d = Matrix2::<f64>::identity();
    if (u * v_t).determinant() < 0.0 {
        let weakest = if svd.singular_values[0] < svd.singular_values[1] {
            0
        } else {
            1
        };
        d[(weakest, weakest)] = -1.0;
    }
    let rotation = (u * d * v_t).transpose();

    let scale = s_t / s_s;
    let c_s = Vector2::new(c_s.x, c_s.y);
    let c_t = Vector2::new(c_t.x, c_t.y);
    let translation = c_t - rotation * c_s * scale;

    log::debug!(
        "estimated similarity: scale {:.4}, rotation {:.4} rad",
        scale,
        rotation[(1, 0)].atan2(rotation[(0, 0)])
    );

    Ok(Transform::from_parts(scale, &rotation, &translation))
}

/// Root-mean-square distance between `transform(source)` and `target`.
///
/// Returns `None` if the sets differ in length or are empty.
pub fn alignment_rms(transform: &Transform, source: &PointSet, target: &PointSet) -> Option<f64> {
    if source.len() != target.len() || source.is_empty() {
        return None;
    }
    let sum_sq: f64 = source
        .iter()
        .zip(target.iter())
        .map(|(p, q)| {
            let d = transform.apply(*p).distance(q);
            d * d
        })
        .sum();
    Some((sum_sq / source.len() as f64).sqrt())
}

fn normalized(p: Point, center: Point, std: f64) -> Vector2<f64> {
    Vector2::new((p.x - center.x) / std, (p.y - center.y) / std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn face() -> PointSet {
        PointSet::mean_face(BoundingBox::new(40.0, 30.0, 120.0, 140.0))
    }

    #[test]
    fn recovers_known_similarity() {
        let cases = [
            Transform::similarity(1.0, 0.0, 0.0, 0.0),
            Transform::similarity(1.3, 0.25, -12.0, 40.0),
            Transform::similarity(0.5, -2.8, 100.0, 3.5),
            Transform::similarity(2.2, 3.0, 0.0, -60.0),
        ];

        for t in cases {
            let p = face();
            let moved = t.apply_all(&p);

            let forward = estimate_similarity(&p, &moved).unwrap();
            assert!(forward.approx_eq(&t, 1e-6), "{forward:?} vs {t:?}");

            let backward = estimate_similarity(&moved, &p).unwrap();
            let inverse = t.inverse().unwrap();
            assert!(backward.approx_eq(&inverse, 1e-6), "{backward:?} vs {inverse:?}");

            assert!(alignment_rms(&forward, &p, &moved).unwrap() < 1e-6);
        }
    }

    #[test]
    fn pure_translation() {
        let p = face();
        let moved = p.map(|q| q + Point::new(7.0, -3.0));
        let t = estimate_similarity(&p, &moved).unwrap();
        assert!((t.scale() - 1.0).abs() < 1e-9);
        assert!(t.rotation().abs() < 1e-9);
        assert!(t.translation().distance(&Point::new(7.0, -3.0)) < 1e-9);
    }

    #[test]
    fn mirrored_target_gives_proper_rotation() {
        let p = face();
        let mirrored = p.map(|q| Point::new(-q.x, q.y));
        let t = estimate_similarity(&p, &mirrored).unwrap();
        let [[a, b, _], [c, d, _]] = t.to_affine();
        let det = a * d - b * c;
        assert!(det > 0.0, "determinant {det}");
    }

    #[test]
    fn coincident_points_are_ill_conditioned() {
        let p = face();
        let collapsed = PointSet::new(vec![Point::new(3.0, 3.0); p.len()]);

        let err = estimate_similarity(&collapsed, &p).unwrap_err();
        assert!(matches!(err, Error::IllConditionedInput(_)));

        let err = estimate_similarity(&p, &collapsed).unwrap_err();
        assert!(matches!(err, Error::IllConditionedInput(_)));

        let err = estimate_similarity(&PointSet::default(), &PointSet::default()).unwrap_err();
        assert!(matches!(err, Error::IllConditionedInput(_)));
    }

    #[test]
    fn non_finite_points_are_ill_conditioned() {
        let p = face();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut broken = p.clone();
            broken.points[5] = Point::new(bad, 3.0);

            let err = estimate_similarity(&p, &broken).unwrap_err();
            assert!(matches!(err, Error::IllConditionedInput(_)), "{bad}: {err}");
            let err = estimate_similarity(&broken, &p).unwrap_err();
            assert!(matches!(err, Error::IllConditionedInput(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn length_mismatch() {
        let p = face();
        let short = PointSet::new(p.points[..10].to_vec());
        assert!(matches!(
            estimate_similarity(&p, &short),
            Err(Error::PointCountMismatch {
                source_len: 68,
                target_len: 10
            })
        ));
        assert!(alignment_rms(&Transform::identity(), &p, &short).is_none());
    }
}
