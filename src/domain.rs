//! Core lattice trait shared by abstract values and abstract stores.

use std::fmt::Debug;

/// A lattice element used for approximating program states.
///
/// Implementors must satisfy the usual lattice laws:
/// - Reflexivity: `∀a. a ⊑ a`
/// - Transitivity: `∀a,b,c. a ⊑ b ∧ b ⊑ c ⇒ a ⊑ c`
/// - Antisymmetry: `∀a,b. a ⊑ b ∧ b ⊑ a ⇒ a = b`
/// - Join/meet are least upper / greatest lower bounds
pub trait Lattice: Clone + Debug + PartialEq {
    /// The bottom element (⊥): no concrete state, i.e. unreachable.
    fn bottom() -> Self;

    /// The top element (⊤): every concrete state, i.e. no information.
    fn top() -> Self;

    /// Check whether this element is bottom.
    fn is_bottom(&self) -> bool;

    /// Partial order: `self ⊑ other` (self is at least as precise as other).
    fn le(&self, other: &Self) -> bool;

    /// Join (`⊔`): least upper bound. Over-approximates union; used at
    /// control-flow merges.
    fn join(&self, other: &Self) -> Self;

    /// Meet (`⊓`): greatest lower bound. Exact intersection; used when
    /// refining by an assumed condition.
    fn meet(&self, other: &Self) -> Self;

    /// Widening (`∇`): accelerates fixpoint iteration to termination.
    /// Must satisfy `self ⊑ self ∇ other` and `other ⊑ self ∇ other`.
    ///
    /// **Why no default?** Widening must extrapolate (e.g. to ±∞) to cut
    /// infinite ascending chains; join would not guarantee that. Each
    /// implementor needs its own widening rule.
    fn widen(&self, other: &Self) -> Self;

    /// Narrowing (`∆`): recovers precision after widening has converged.
    ///
    /// Meet is a safe conservative default as long as narrowing runs for a
    /// bounded number of iterations. Implementors can override for better
    /// precision.
    fn narrow(&self, other: &Self) -> Self {
        self.meet(other)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Test helper: validate the lattice laws on a set of sample elements.
    pub fn test_lattice_axioms<L: Lattice>(samples: &[L]) {
        for a in samples {
            // Reflexivity: a ⊑ a
            assert!(a.le(a), "reflexivity failed for {:?}", a);

            // Identity: a ⊔ ⊥ = a
            let joined = a.join(&L::bottom());
            assert!(a.le(&joined) && joined.le(a), "join with bottom failed for {:?}", a);

            // Identity: a ⊓ ⊤ = a
            let met = a.meet(&L::top());
            assert!(a.le(&met) && met.le(a), "meet with top failed for {:?}", a);

            // Absorption: a ⊓ ⊥ = ⊥
            assert!(a.meet(&L::bottom()).is_bottom(), "meet with bottom failed for {:?}", a);

            // Idempotence: a ⊔ a = a, a ⊓ a = a
            let jj = a.join(a);
            assert!(a.le(&jj) && jj.le(a), "join idempotence failed for {:?}", a);
            let mm = a.meet(a);
            assert!(a.le(&mm) && mm.le(a), "meet idempotence failed for {:?}", a);
        }

        for a in samples {
            for b in samples {
                // Commutativity: a ⊔ b = b ⊔ a
                let ab = a.join(b);
                let ba = b.join(a);
                assert!(ab.le(&ba) && ba.le(&ab), "join commutativity failed");

                // Commutativity: a ⊓ b = b ⊓ a
                let ab = a.meet(b);
                let ba = b.meet(a);
                assert!(ab.le(&ba) && ba.le(&ab), "meet commutativity failed");

                // Join is an upper bound: a ⊑ (a ⊔ b), b ⊑ (a ⊔ b)
                let joined = a.join(b);
                assert!(a.le(&joined), "join is not an upper bound for a");
                assert!(b.le(&joined), "join is not an upper bound for b");

                // Meet is a lower bound: (a ⊓ b) ⊑ a, (a ⊓ b) ⊑ b
                let met = a.meet(b);
                assert!(met.le(a), "meet is not a lower bound of a");
                assert!(met.le(b), "meet is not a lower bound of b");

                // Widening covers both arguments: a ⊑ (a ∇ b), b ⊑ (a ∇ b)
                let widened = a.widen(b);
                assert!(a.le(&widened), "widening does not cover the left argument");
                assert!(b.le(&widened), "widening does not cover the right argument");
            }
        }
    }
}
