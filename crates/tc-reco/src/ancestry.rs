//! Truth-record decay-chain consistency checks.

use tc_core::GenParticle;

const W_PID: i32 = 24;
const TOP_PID: i32 = 6;

/// Bounds-checked mother lookup. Generator records can carry out-of-range
/// or self-referential links; those resolve to `None` here instead of
/// panicking.
fn resolve(particles: &[GenParticle], idx: Option<usize>) -> Option<&GenParticle> {
    idx.and_then(|i| particles.get(i))
}

/// Whether the matched truth triple is consistent with t → bW, W → qq̄.
///
/// `gen_b`, `gen_q1` and `gen_q2` are match results indexing into
/// `particles`. The triple is consistent when all three are present and
/// distinct quarks, q1 and q2 share a mother that resolves to a W boson,
/// and that W's mother is also b's mother and resolves to a top quark.
/// Unmatched inputs, a repeated particle, or any unresolvable mother link
/// yield `false`; this is a normal outcome, not an error.
pub fn is_consistent_top_decay(
    gen_b: Option<usize>,
    gen_q1: Option<usize>,
    gen_q2: Option<usize>,
    particles: &[GenParticle],
) -> bool {
    let (Some(b_idx), Some(q1_idx), Some(q2_idx)) = (gen_b, gen_q1, gen_q2) else {
        return false;
    };
    if q1_idx == q2_idx {
        return false;
    }
    let (Some(b), Some(q1), Some(q2)) =
        (particles.get(b_idx), particles.get(q1_idx), particles.get(q2_idx))
    else {
        return false;
    };
    if q1.mother != q2.mother {
        return false;
    }
    let Some(w) = resolve(particles, q1.mother) else {
        return false;
    };
    if w.pid.abs() != W_PID || w.mother != b.mother {
        return false;
    }
    match resolve(particles, b.mother) {
        Some(top) => top.pid.abs() == TOP_PID,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(pid: i32, mother: Option<usize>) -> GenParticle {
        GenParticle { pid, pt: 50.0, eta: 0.0, phi: 0.0, mass: 0.0, mother }
    }

    /// [top, W←top, b←top, q←W, q̄←W]
    fn top_decay_pool() -> Vec<GenParticle> {
        vec![
            particle(6, None),
            particle(24, Some(0)),
            particle(5, Some(0)),
            particle(1, Some(1)),
            particle(-2, Some(1)),
        ]
    }

    #[test]
    fn accepts_full_chain() {
        let pool = top_decay_pool();
        assert!(is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
        // Order of the two light quarks does not matter.
        assert!(is_consistent_top_decay(Some(2), Some(4), Some(3), &pool));
    }

    #[test]
    fn accepts_conjugate_chain() {
        let pool = vec![
            particle(-6, None),
            particle(-24, Some(0)),
            particle(-5, Some(0)),
            particle(-1, Some(1)),
            particle(2, Some(1)),
        ];
        assert!(is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
    }

    #[test]
    fn false_on_any_missing_match() {
        let pool = top_decay_pool();
        assert!(!is_consistent_top_decay(None, Some(3), Some(4), &pool));
        assert!(!is_consistent_top_decay(Some(2), None, Some(4), &pool));
        assert!(!is_consistent_top_decay(Some(2), Some(3), None, &pool));
    }

    #[test]
    fn false_on_repeated_quark() {
        let pool = top_decay_pool();
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(3), &pool));
    }

    #[test]
    fn false_on_different_mothers() {
        let mut pool = top_decay_pool();
        pool.push(particle(3, None));
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(5), &pool));
    }

    #[test]
    fn false_when_mother_is_not_w() {
        let mut pool = top_decay_pool();
        pool[1].pid = 23;
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
    }

    #[test]
    fn false_when_grandmother_is_not_top() {
        let mut pool = top_decay_pool();
        pool[0].pid = 25;
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
    }

    #[test]
    fn false_when_w_and_b_mothers_differ() {
        let mut pool = top_decay_pool();
        pool.push(particle(6, None));
        pool[2].mother = Some(5);
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
    }

    #[test]
    fn tolerates_out_of_range_links() {
        let mut pool = top_decay_pool();
        pool[3].mother = Some(99);
        pool[4].mother = Some(99);
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
        assert!(!is_consistent_top_decay(Some(99), Some(3), Some(4), &pool));
    }

    #[test]
    fn tolerates_self_referential_links() {
        let mut pool = top_decay_pool();
        pool[3].mother = Some(3);
        pool[4].mother = Some(3);
        assert!(!is_consistent_top_decay(Some(2), Some(3), Some(4), &pool));
    }

    #[test]
    fn false_on_parentless_quarks() {
        let pool = vec![particle(5, None), particle(1, None), particle(2, None)];
        assert!(!is_consistent_top_decay(Some(0), Some(1), Some(2), &pool));
    }
}
