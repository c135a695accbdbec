#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    _CMP_GT_OQ, _mm256_add_pd, _mm256_cmp_pd, _mm256_loadu_pd, _mm256_movemask_pd,
    _mm256_set1_pd, _mm256_setzero_pd, _mm256_storeu_pd,
};

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    let mut sum_arr = [0f64; LANES];
    unsafe {
        let mut sum = _mm256_setzero_pd();
        for chunk in chunks {
            let v = _mm256_loadu_pd(chunk.as_ptr());
            sum = _mm256_add_pd(sum, v);
        }
        _mm256_storeu_pd(sum_arr.as_mut_ptr(), sum);
    }

    sum_arr.iter().sum::<f64>() + remainder.iter().sum::<f64>()
}

/// Sum over an f64 slice using AVX2 or scalar fallback
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { sum_f64_avx2(values) };
        }
    }
    values.iter().sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn filter_gt_f64_avx2(values: &[f64], threshold: f64) -> Vec<usize> {
    const LANES: usize = 4; // __m256d holds 4 f64
    let mut out = Vec::with_capacity(values.len());

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    unsafe {
        let t = _mm256_set1_pd(threshold);

        for (chunk_idx, chunk) in chunks.enumerate() {
            let v = _mm256_loadu_pd(chunk.as_ptr());
            // ordered compare: NaN lanes stay clear
            let mask_bits = _mm256_movemask_pd(_mm256_cmp_pd::<_CMP_GT_OQ>(v, t));
            for i in 0..LANES {
                if (mask_bits & (1 << i)) != 0 {
                    out.push(chunk_idx * LANES + i);
                }
            }
        }
    }

    let base = values.len() - remainder.len();
    for (i, &v) in remainder.iter().enumerate() {
        if v > threshold {
            out.push(base + i);
        }
    }

    out
}

fn filter_gt_f64_scalar(values: &[f64], threshold: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| (v > threshold).then_some(i))
        .collect()
}

/// Indices of the values strictly above `threshold`, ascending. NaN never matches.
pub fn filter_gt_f64(values: &[f64], threshold: f64) -> Vec<usize> {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { filter_gt_f64_avx2(values, threshold) };
        }
    }
    filter_gt_f64_scalar(values, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<f64> {
        vec![0.0, 5.5, -1.0, f64::NAN, 10.0, 0.0, 3.25, 7.0, 1e-9]
    }

    #[test]
    fn greater_than_skips_nan_and_zero() {
        assert_eq!(filter_gt_f64(&sample(), 0.0), vec![1, 4, 6, 7, 8]);
    }

    #[test]
    fn vector_and_scalar_paths_agree() {
        let values = sample();
        for threshold in [-2.0, 0.0, 3.0, 5.5, 100.0] {
            assert_eq!(
                filter_gt_f64(&values, threshold),
                filter_gt_f64_scalar(&values, threshold)
            );
        }
    }

    #[test]
    fn sum_handles_remainder() {
        assert_eq!(sum_f64(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.5]), 21.5);
        assert_eq!(sum_f64(&[]), 0.0);
    }
}
