//! FFT kernels shared by the tuner, resampler and PLL.

use radiocast_core::sample_types::*;
use rustfft::FftPlanner;

pub type Planner = FftPlanner<RealSample>;

/// Circular shift: element `i` of the input lands at `(i + shift) mod n`.
pub fn roll<T: Copy>(x: &[T], shift: i64) -> Vec<T> {
    let n = x.len() as i64;
    if n == 0 {
        return Vec::new();
    }
    let shift = shift.rem_euclid(n);
    (0..n).map(|i| x[(i - shift).rem_euclid(n) as usize]).collect()
}

/// Move the zero-frequency component to the center of the array.
pub fn fftshift<T: Copy>(x: &[T]) -> Vec<T> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let offset = n - n / 2;
    (0..n).map(|k| x[(k + offset) % n]).collect()
}

/// Analytic signal of a real input via the Hilbert transform.
pub fn hilbert(planner: &mut Planner, x: &[RealSample]) -> Vec<ComplexSample> {
    let n = x.len();
    let mut buffer: Vec<ComplexSample> = x.iter().map(|&v| ComplexSample::new(v, 0.0)).collect();
    if n == 0 {
        return buffer;
    }
    planner.plan_fft_forward(n).process(&mut buffer);

    // Double the positive frequencies, zero the negative ones.
    // DC (and the Nyquist bin for even lengths) stay untouched.
    let positive_end = n.div_ceil(2);
    for value in &mut buffer[1..positive_end] {
        *value = *value * 2.0;
    }
    let negative_start = if n % 2 == 0 { n / 2 + 1 } else { positive_end };
    for value in &mut buffer[negative_start..] {
        *value = ComplexSample::ZERO;
    }

    planner.plan_fft_inverse(n).process(&mut buffer);
    let scale = 1.0 / n as RealSample;
    for value in &mut buffer {
        *value = *value * scale;
    }
    buffer
}

/// Band-limited resample of an already-transformed spectrum to `num` bins,
/// with an optional spectral weighting applied first.
///
/// Returns the time-domain signal at the new rate. Bin bookkeeping follows
/// the scipy `resample` convention: the positive and negative halves are
/// copied separately, the negative Nyquist bin is folded into the positive
/// one when shrinking an even-length spectrum, and the amplitude is scaled
/// by `num / n`.
pub fn resample_spectrum(
    planner: &mut Planner,
    spectrum: &[ComplexSample],
    num: usize,
    window: Option<&[RealSample]>,
) -> Vec<ComplexSample> {
    let nx = spectrum.len();
    debug_assert!(num > 0 && nx > 0);

    let weighted: Vec<ComplexSample> = match window {
        Some(w) => {
            debug_assert_eq!(w.len(), nx);
            spectrum.iter().zip(w).map(|(v, &w)| *v * w).collect()
        }
        None => spectrum.to_vec(),
    };

    let n = num.min(nx);
    let nyq = n / 2 + 1;
    let mut output = vec![ComplexSample::ZERO; num];
    output[..nyq].copy_from_slice(&weighted[..nyq]);
    let negative = n - nyq;
    for j in 0..negative {
        output[num - negative + j] = weighted[nx - negative + j];
    }
    if n % 2 == 0 {
        if num < nx {
            output[n / 2] = output[n / 2] + weighted[nx - n / 2];
        } else if num > nx {
            output[n / 2] = output[n / 2] * 0.5;
            output[num - n / 2] = output[n / 2];
        }
    }

    planner.plan_fft_inverse(num).process(&mut output);
    let scale = 1.0 / nx as RealSample;
    for value in &mut output {
        *value = *value * scale;
    }
    output
}

/// Resample a real time-domain signal to exactly `num` samples.
pub fn resample_real(planner: &mut Planner, x: &[RealSample], num: usize) -> Vec<RealSample> {
    let mut buffer: Vec<ComplexSample> = x.iter().map(|&v| ComplexSample::new(v, 0.0)).collect();
    planner.plan_fft_forward(buffer.len()).process(&mut buffer);
    resample_spectrum(planner, &buffer, num, None)
        .into_iter()
        .map(|v| v.re)
        .collect()
}
