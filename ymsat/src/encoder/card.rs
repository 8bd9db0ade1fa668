//! Cardinality constraints.
use ymsat_formula::Lit;

use crate::solver::{Solver, SolverError};

use super::Combinations;

impl Solver {
    /// At most one of the literals is true.
    pub fn add_at_most_one(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.add_at_most_k(lits, 1)
    }

    /// At most two of the literals are true.
    pub fn add_at_most_two(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.add_at_most_k(lits, 2)
    }

    /// At most `k` of the literals are true.
    ///
    /// Adds the negated clause of every `k + 1` element subset.
    pub fn add_at_most_k(&mut self, lits: &[Lit], k: usize) -> Result<(), SolverError> {
        if k >= lits.len() {
            // The bound can never be exceeded.
            return Ok(());
        }

        let mut clause = Vec::with_capacity(k + 1);
        let mut combinations = Combinations::new(lits.len(), k + 1);

        while let Some(indices) = combinations.next() {
            clause.clear();
            clause.extend(indices.iter().map(|&index| !lits[index]));
            self.add_clause(&clause)?;
        }

        Ok(())
    }

    /// At least one of the literals is true.
    pub fn add_at_least_one(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.add_clause(lits)
    }

    /// At least two of the literals are true.
    pub fn add_at_least_two(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.add_at_least_k(lits, 2)
    }

    /// At least `k` of the literals are true.
    ///
    /// Adds the clause of every `n - k + 1` element subset.
    pub fn add_at_least_k(&mut self, lits: &[Lit], k: usize) -> Result<(), SolverError> {
        if k == 0 {
            // Always satisfied.
            return Ok(());
        }
        if k > lits.len() {
            // Cannot be satisfied.
            return self.add_clause(&[]);
        }

        let subset_size = lits.len() - k + 1;
        let mut clause = Vec::with_capacity(subset_size);
        let mut combinations = Combinations::new(lits.len(), subset_size);

        while let Some(indices) = combinations.next() {
            clause.clear();
            clause.extend(indices.iter().map(|&index| lits[index]));
            self.add_clause(&clause)?;
        }

        Ok(())
    }

    /// Exactly one of the literals is true.
    pub fn add_exact_one(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.add_exact_k(lits, 1)
    }

    /// Exactly two of the literals are true.
    pub fn add_exact_two(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        self.add_exact_k(lits, 2)
    }

    /// Exactly `k` of the literals are true.
    pub fn add_exact_k(&mut self, lits: &[Lit], k: usize) -> Result<(), SolverError> {
        self.add_at_most_k(lits, k)?;
        self.add_at_least_k(lits, k)
    }

    /// The number of true literals is different from one.
    pub fn add_not_one(&mut self, lits: &[Lit]) -> Result<(), SolverError> {
        let mut clause = Vec::with_capacity(lits.len());

        for (index, &lit) in lits.iter().enumerate() {
            clause.clear();
            clause.push(!lit);
            clause.extend(
                lits.iter()
                    .enumerate()
                    .filter(|&(other, _)| other != index)
                    .map(|(_, &other_lit)| other_lit),
            );
            self.add_clause(&clause)?;
        }

        Ok(())
    }

    /// Fresh literals representing the binary count of true inputs, least significant bit first.
    ///
    /// The count is built as an adder tree over half and full adders.
    pub fn add_counter(&mut self, lits: &[Lit]) -> Result<Vec<Lit>, SolverError> {
        match lits.len() {
            0 => Ok(vec![]),
            1 => Ok(vec![lits[0]]),
            2 => {
                let sum = self.fresh_lit();
                let carry = self.fresh_lit();
                self.add_half_adder(lits[0], lits[1], sum, carry)?;
                Ok(vec![sum, carry])
            }
            3 => {
                let sum = self.fresh_lit();
                let carry = self.fresh_lit();
                self.add_full_adder(lits[0], lits[1], lits[2], sum, carry)?;
                Ok(vec![sum, carry])
            }
            n => {
                let low = self.add_counter(&lits[..n / 2])?;
                let high = self.add_counter(&lits[n / 2..])?;
                self.add_bitvec_sum(&low, &high)
            }
        }
    }

    /// Sum of two bit vectors as fresh literals, zero extending the shorter one.
    fn add_bitvec_sum(&mut self, a: &[Lit], b: &[Lit]) -> Result<Vec<Lit>, SolverError> {
        let width = a.len().max(b.len());
        let zero = self.constant_false_lit()?;

        let mut sum = Vec::with_capacity(width + 1);
        let mut carry = zero;

        for index in 0..width {
            let bit_a = a.get(index).copied().unwrap_or(zero);
            let bit_b = b.get(index).copied().unwrap_or(zero);

            let bit_sum = self.fresh_lit();
            let bit_carry = self.fresh_lit();
            self.add_full_adder(bit_a, bit_b, carry, bit_sum, bit_carry)?;

            sum.push(bit_sum);
            carry = bit_carry;
        }

        sum.push(carry);
        Ok(sum)
    }
}
