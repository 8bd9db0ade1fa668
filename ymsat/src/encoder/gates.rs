//! Boolean gate primitives.
use ymsat_formula::Lit;

use crate::solver::{Solver, SolverError};

impl Solver {
    /// Add clauses forcing `output ⇔ input`.
    pub fn add_buffgate(&mut self, input: Lit, output: Lit) -> Result<(), SolverError> {
        self.add_clause(&[!input, output])?;
        self.add_clause(&[input, !output])
    }

    /// Add clauses forcing `output ⇔ ¬input`.
    pub fn add_notgate(&mut self, input: Lit, output: Lit) -> Result<(), SolverError> {
        self.add_buffgate(input, !output)
    }

    /// Add clauses forcing `output ⇔ input_1 ∧ … ∧ input_n`.
    pub fn add_andgate(&mut self, output: Lit, inputs: &[Lit]) -> Result<(), SolverError> {
        let mut last = Vec::with_capacity(inputs.len() + 1);
        for &input in inputs {
            self.add_clause(&[input, !output])?;
            last.push(!input);
        }
        last.push(output);
        self.add_clause(&last)
    }

    /// Add clauses forcing `output ⇔ ¬(input_1 ∧ … ∧ input_n)`.
    pub fn add_nandgate(&mut self, output: Lit, inputs: &[Lit]) -> Result<(), SolverError> {
        self.add_andgate(!output, inputs)
    }

    /// Add clauses forcing `output ⇔ input_1 ∨ … ∨ input_n`.
    pub fn add_orgate(&mut self, output: Lit, inputs: &[Lit]) -> Result<(), SolverError> {
        let mut any = Vec::with_capacity(inputs.len() + 1);
        for &input in inputs {
            self.add_clause(&[!input, output])?;
            any.push(input);
        }
        any.push(!output);
        self.add_clause(&any)
    }

    /// Add clauses forcing `output ⇔ ¬(input_1 ∨ … ∨ input_n)`.
    pub fn add_norgate(&mut self, output: Lit, inputs: &[Lit]) -> Result<(), SolverError> {
        self.add_orgate(!output, inputs)
    }

    /// Add clauses forcing `output ⇔ input_1 ⊕ … ⊕ input_n`.
    ///
    /// The encoding enumerates all `2^n` parity lines, so this is meant for the small gate widths
    /// found in circuit encodings.
    pub fn add_xorgate(&mut self, output: Lit, inputs: &[Lit]) -> Result<(), SolverError> {
        let n = inputs.len();
        let mut clause = Vec::with_capacity(n + 1);

        for pattern in 0u64..(1u64 << n) {
            let mut parity = false;
            clause.clear();

            for (bit, &input) in inputs.iter().enumerate() {
                let bit_set = pattern & (1 << bit) != 0;
                parity ^= bit_set;
                clause.push(input ^ bit_set);
            }

            // Forbid the assignment where the output disagrees with the parity of the pattern.
            clause.push(output ^ !parity);
            self.add_clause(&clause)?;
        }

        Ok(())
    }

    /// Add clauses forcing `output ⇔ ¬(input_1 ⊕ … ⊕ input_n)`.
    pub fn add_xnorgate(&mut self, output: Lit, inputs: &[Lit]) -> Result<(), SolverError> {
        self.add_xorgate(!output, inputs)
    }

    /// Add clauses forcing `sum ⇔ a ⊕ b` and `carry ⇔ a ∧ b`.
    pub fn add_half_adder(
        &mut self,
        a: Lit,
        b: Lit,
        sum: Lit,
        carry: Lit,
    ) -> Result<(), SolverError> {
        self.add_xorgate(sum, &[a, b])?;
        self.add_andgate(carry, &[a, b])
    }

    /// Add clauses forcing `sum ⇔ a ⊕ b ⊕ carry_in` and `carry_out ⇔ majority(a, b, carry_in)`.
    pub fn add_full_adder(
        &mut self,
        a: Lit,
        b: Lit,
        carry_in: Lit,
        sum: Lit,
        carry_out: Lit,
    ) -> Result<(), SolverError> {
        self.add_xorgate(sum, &[a, b, carry_in])?;

        self.add_clause(&[!a, !b, carry_out])?;
        self.add_clause(&[!a, !carry_in, carry_out])?;
        self.add_clause(&[!b, !carry_in, carry_out])?;
        self.add_clause(&[a, b, !carry_out])?;
        self.add_clause(&[a, carry_in, !carry_out])?;
        self.add_clause(&[b, carry_in, !carry_out])
    }

    /// Add a ripple carry adder over equal length bit vectors, least significant bit first.
    pub fn add_adder(
        &mut self,
        a: &[Lit],
        b: &[Lit],
        carry_in: Lit,
        sum: &[Lit],
        carry_out: Lit,
    ) -> Result<(), SolverError> {
        if a.len() != b.len() || a.len() != sum.len() {
            return Err(SolverError::Usage(format!(
                "adder operand lengths differ: {} + {} = {}",
                a.len(),
                b.len(),
                sum.len()
            )));
        }
        if a.is_empty() {
            return self.add_buffgate(carry_in, carry_out);
        }

        let mut carry = carry_in;
        for index in 0..a.len() {
            let next_carry = if index + 1 == a.len() {
                carry_out
            } else {
                self.fresh_lit()
            };
            self.add_full_adder(a[index], b[index], carry, sum[index], next_carry)?;
            carry = next_carry;
        }

        Ok(())
    }
}
