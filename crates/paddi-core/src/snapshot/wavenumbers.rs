use std::f64::consts::PI;

/// Spacing of the wavenumber grid for a periodic box of length `extent`.
pub fn wavenumber_step(extent: f64) -> f64 {
    2.0 * PI / extent
}

/// `0, step, 2·step, ...` for the half-spectrum axis.
pub fn ascending_wavenumbers(size: usize, step: f64) -> Vec<f64> {
    (0..size).map(|index| index as f64 * step).collect()
}

/// FFT ordering: non-negative wavenumbers up to `size/2`, then the
/// negative ones rising towards zero.
pub fn fft_wavenumbers(size: usize, step: f64) -> Vec<f64> {
    let head = (size / 2 + 1).min(size);
    let tail = size - head;
    let mut values = Vec::with_capacity(size);
    values.extend((0..head).map(|index| index as f64 * step));
    values.extend((1..=tail).rev().map(|index| -(index as f64) * step));
    values
}

#[cfg(test)]
mod tests {
    use super::{ascending_wavenumbers, fft_wavenumbers, wavenumber_step};
    use std::f64::consts::PI;

    #[test]
    fn ascending_axis_starts_at_zero() {
        let step = wavenumber_step(100.0);
        let kx = ascending_wavenumbers(5, step);
        assert_eq!(kx[0], 0.0);
        assert!(kx.windows(2).all(|pair| pair[1] > pair[0]));
        assert!((kx[4] - 4.0 * 2.0 * PI / 100.0).abs() < 1e-15);
    }

    #[test]
    fn fft_axis_wraps_to_negative_values() {
        assert_eq!(
            fft_wavenumbers(8, 1.0),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, -3.0, -2.0, -1.0]
        );
        assert_eq!(fft_wavenumbers(2, 0.5), vec![0.0, 0.5]);
        assert_eq!(fft_wavenumbers(1, 0.5), vec![0.0]);
        assert!(fft_wavenumbers(0, 0.5).is_empty());
    }
}
