//! Vector geometry used by the crossover operators.
//!
//! Vectors are plain `&[f64]` slices of equal length; bases are returned as
//! `Vec<Vec<f64>>` with one inner vector per basis direction.

/// Residual norm below which a direction is considered degenerate.
pub const DEGENERATE_EPS: f64 = 1e-12;

/// Residual norm below which a candidate complement direction is dropped.
///
/// Candidates start as unit axes, so this threshold is relative to length 1,
/// unlike [`DEGENERATE_EPS`] which applies to caller vectors of any scale. An
/// axis lying almost inside the span leaves a residual that is mostly
/// rounding error; normalizing it would inject a noise direction.
const COMPLEMENT_EPS: f64 = 1e-8;

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `a - b`, component-wise.
#[inline]
pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// `acc += scale * v`, component-wise.
#[inline]
pub fn axpy(acc: &mut [f64], scale: f64, v: &[f64]) {
    for (a, x) in acc.iter_mut().zip(v) {
        *a += scale * x;
    }
}

/// Mean of a non-empty set of points.
///
/// Accumulates offsets from the first point, so identical points yield that
/// point exactly.
pub fn centroid<'a, I>(points: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut points = points.into_iter();
    let Some(first) = points.next() else {
        return Vec::new();
    };

    let mut offset = vec![0.0; first.len()];
    let mut count = 1usize;
    for p in points {
        for (o, (x, f)) in offset.iter_mut().zip(p.iter().zip(first)) {
            *o += x - f;
        }
        count += 1;
    }

    first
        .iter()
        .zip(&offset)
        .map(|(f, o)| f + o / count as f64)
        .collect()
}

/// Projection of `a` onto `b`. Zero if `b` is the zero vector.
pub fn project(a: &[f64], b: &[f64]) -> Vec<f64> {
    let bb = dot(b, b);
    if bb == 0.0 {
        return vec![0.0; a.len()];
    }
    let scale = dot(a, b) / bb;
    b.iter().map(|x| x * scale).collect()
}

/// Distance from point `a` to the line through the origin along `direction`.
pub fn perpendicular_distance(a: &[f64], direction: &[f64]) -> f64 {
    let d = norm(direction);
    let aa = dot(a, a);
    if d == 0.0 {
        return aa.sqrt();
    }
    let along = dot(a, direction) / d;
    (aa - along * along).max(0.0).sqrt()
}

/// Gram-Schmidt over `columns`, preserving order.
///
/// Each column is orthogonalized against the basis vectors already produced.
/// A column whose residual norm falls below [`DEGENERATE_EPS`] yields a zero
/// vector in its position.
pub fn orthonormalize<V: AsRef<[f64]>>(columns: &[V]) -> Vec<Vec<f64>> {
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(columns.len());

    for column in columns {
        let column = column.as_ref();
        let mut residual = column.to_vec();
        for b in &basis {
            let p = project(column, b);
            for (r, x) in residual.iter_mut().zip(&p) {
                *r -= x;
            }
        }

        let n = norm(&residual);
        if n < DEGENERATE_EPS {
            residual.iter_mut().for_each(|r| *r = 0.0);
        } else {
            residual.iter_mut().for_each(|r| *r /= n);
        }
        basis.push(residual);
    }

    basis
}

/// Orthonormal basis of the orthogonal complement of `span(vectors)`.
///
/// `dims` is the ambient dimension, needed when `vectors` is empty.
pub fn null_space_basis<V: AsRef<[f64]>>(vectors: &[V], dims: usize) -> Vec<Vec<f64>> {
    let mut span: Vec<Vec<f64>> = orthonormalize(vectors)
        .into_iter()
        .filter(|v| v.iter().any(|&x| x != 0.0))
        .collect();
    let rank = span.len();
    let mut complement = Vec::with_capacity(dims.saturating_sub(rank));

    for axis in 0..dims {
        if span.len() == dims {
            break;
        }

        let mut residual = vec![0.0; dims];
        residual[axis] = 1.0;
        // Two passes keep the result orthogonal when the span is nearly aligned
        // with an axis.
        for _ in 0..2 {
            for b in &span {
                let c = dot(&residual, b);
                axpy(&mut residual, -c, b);
            }
        }

        let n = norm(&residual);
        if n > COMPLEMENT_EPS {
            residual.iter_mut().for_each(|r| *r /= n);
            span.push(residual.clone());
            complement.push(residual);
        }
    }

    complement
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(basis: &[Vec<f64>]) {
        for (i, a) in basis.iter().enumerate() {
            assert!((norm(a) - 1.0).abs() < 1e-9);
            for b in &basis[i + 1..] {
                assert!(dot(a, b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_perpendicular_distance() {
        let d = perpendicular_distance(&[3.0, 4.0], &[1.0, 0.0]);
        assert!((d - 4.0).abs() < 1e-12);

        // Point on the line
        let d = perpendicular_distance(&[2.0, 2.0], &[5.0, 5.0]);
        assert!(d.abs() < 1e-7);
    }

    #[test]
    fn test_centroid_identical_points_exact() {
        let p = [0.1, 0.7, -3.3];
        let c = centroid([&p[..], &p[..], &p[..]]);
        assert_eq!(c, p.to_vec());
    }

    #[test]
    fn test_centroid() {
        let a = [0.0, 2.0];
        let b = [2.0, 4.0];
        let c = centroid([&a[..], &b[..]]);
        assert_eq!(c, vec![1.0, 3.0]);
    }

    #[test]
    fn test_orthonormalize_order_and_degeneracy() {
        let columns = vec![
            vec![2.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
            vec![3.0, 5.0, 0.0], // in the span of the first two
            vec![1.0, 1.0, 1.0],
        ];
        let basis = orthonormalize(&columns);

        assert_eq!(basis.len(), 4);
        assert_eq!(basis[0], vec![1.0, 0.0, 0.0]);
        assert!((basis[1][1] - 1.0).abs() < 1e-12);
        assert!(basis[2].iter().all(|&x| x == 0.0));
        assert!((basis[3][2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_null_space_dimension_and_orthogonality() {
        let vectors = vec![vec![1.0, 2.0, 0.0, -1.0], vec![0.5, 0.0, 1.0, 1.0]];
        let basis = null_space_basis(&vectors, 4);

        assert_eq!(basis.len(), 2);
        assert_orthonormal(&basis);
        for b in &basis {
            for v in &vectors {
                assert!(dot(b, v).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_null_space_of_dependent_vectors() {
        let vectors = vec![vec![1.0, 1.0, 0.0], vec![-2.0, -2.0, 0.0]];
        let basis = null_space_basis(&vectors, 3);
        assert_eq!(basis.len(), 2);
        assert_orthonormal(&basis);
    }

    #[test]
    fn test_null_space_skips_nearly_spanned_axis() {
        // The first axis is inside the span up to 1e-10.
        let vectors = vec![vec![1.0, 1e-10, 0.0]];
        let basis = null_space_basis(&vectors, 3);

        assert_eq!(basis.len(), 2);
        assert_orthonormal(&basis);
        for b in &basis {
            assert!(dot(b, &vectors[0]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_null_space_of_nothing_is_full_space() {
        let basis = null_space_basis::<Vec<f64>>(&[], 3);
        assert_eq!(basis.len(), 3);
        assert_orthonormal(&basis);
    }
}
