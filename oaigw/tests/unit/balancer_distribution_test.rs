//! 重み付き選択の分布検証（固定シードでカイ二乗検定）

use std::sync::Arc;

use oaigw::balancer::Balancer;
use oaigw::types::EndpointDescriptor;

fn endpoints(weights: &[i64]) -> Vec<Arc<EndpointDescriptor>> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| {
            Arc::new(EndpointDescriptor::new(
                format!("p{}", i),
                format!("http://p{}", i),
                "",
                *w,
            ))
        })
        .collect()
}

fn observed(balancer: &Balancer, candidates: &[Arc<EndpointDescriptor>], draws: usize) -> Vec<usize> {
    let mut counts = vec![0usize; candidates.len()];
    for _ in 0..draws {
        let selected = balancer.select("m", candidates).unwrap();
        let index = candidates
            .iter()
            .position(|c| Arc::ptr_eq(c, selected))
            .unwrap();
        counts[index] += 1;
    }
    counts
}

fn chi_squared(counts: &[usize], effective_weights: &[u64]) -> f64 {
    let draws: usize = counts.iter().sum();
    let total: u64 = effective_weights.iter().sum();
    counts
        .iter()
        .zip(effective_weights)
        .map(|(&observed, &weight)| {
            let expected = draws as f64 * weight as f64 / total as f64;
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

#[test]
fn weighted_selection_matches_weights() {
    let candidates = endpoints(&[1, 2, 7]);
    let balancer = Balancer::with_seed(0x5eed);

    let counts = observed(&balancer, &candidates, 100_000);

    // 自由度2、有意水準 0.001 の臨界値は約 13.8
    let stat = chi_squared(&counts, &[1, 2, 7]);
    assert!(stat < 20.0, "chi-squared {stat} too large for counts {counts:?}");
    assert_eq!(balancer.counter("m"), 0);
}

#[test]
fn non_positive_weights_count_as_one_among_weighted() {
    let candidates = endpoints(&[0, -4, 2]);
    let balancer = Balancer::with_seed(1234);

    let counts = observed(&balancer, &candidates, 40_000);

    let stat = chi_squared(&counts, &[1, 1, 2]);
    assert!(stat < 20.0, "chi-squared {stat} too large for counts {counts:?}");
}
