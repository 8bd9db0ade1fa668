//! Bit-vector comparators, least significant bit first.
//!
//! Comparisons between two vectors build a comparator circuit whose output literal is then
//! asserted. Comparisons against an integer constant need no fresh variables: one clause per zero
//! (or one) bit of the constant plus a disequality clause. Vectors of different length are zero
//! extended; constants outside the representable range short-circuit to a tautology or an
//! unsatisfiable clause.

use ymsat_formula::Lit;

use crate::solver::{Solver, SolverError};

impl Solver {
    /// The two vectors have the same value.
    pub fn add_eq(&mut self, a: &[Lit], b: &[Lit]) -> Result<(), SolverError> {
        let width = a.len().max(b.len());

        for index in 0..width {
            match (a.get(index), b.get(index)) {
                (Some(&bit_a), Some(&bit_b)) => {
                    self.add_clause(&[!bit_a, bit_b])?;
                    self.add_clause(&[bit_a, !bit_b])?;
                }
                // The shorter vector is zero extended.
                (Some(&bit_a), None) => self.add_clause(&[!bit_a])?,
                (None, Some(&bit_b)) => self.add_clause(&[!bit_b])?,
                (None, None) => unreachable!(),
            }
        }

        Ok(())
    }

    /// The two vectors have different values.
    pub fn add_ne(&mut self, a: &[Lit], b: &[Lit]) -> Result<(), SolverError> {
        let width = a.len().max(b.len());
        let mut differs = Vec::with_capacity(width);

        for index in 0..width {
            match (a.get(index), b.get(index)) {
                (Some(&bit_a), Some(&bit_b)) => {
                    let diff = self.fresh_lit();
                    self.add_xorgate(diff, &[bit_a, bit_b])?;
                    differs.push(diff);
                }
                (Some(&bit_a), None) => differs.push(bit_a),
                (None, Some(&bit_b)) => differs.push(bit_b),
                (None, None) => unreachable!(),
            }
        }

        self.add_clause(&differs)
    }

    /// The first vector is strictly smaller.
    pub fn add_lt(&mut self, a: &[Lit], b: &[Lit]) -> Result<(), SolverError> {
        let less = self.encode_less(a, b)?;
        self.add_clause(&[less])
    }

    /// The first vector is smaller or equal.
    pub fn add_le(&mut self, a: &[Lit], b: &[Lit]) -> Result<(), SolverError> {
        let greater = self.encode_less(b, a)?;
        self.add_clause(&[!greater])
    }

    /// The first vector is strictly greater.
    pub fn add_gt(&mut self, a: &[Lit], b: &[Lit]) -> Result<(), SolverError> {
        let greater = self.encode_less(b, a)?;
        self.add_clause(&[greater])
    }

    /// The first vector is greater or equal.
    pub fn add_ge(&mut self, a: &[Lit], b: &[Lit]) -> Result<(), SolverError> {
        let less = self.encode_less(a, b)?;
        self.add_clause(&[!less])
    }

    /// The vector equals the constant.
    pub fn add_eq_const(&mut self, a: &[Lit], value: u64) -> Result<(), SolverError> {
        if !const_in_range(value, a.len()) {
            return self.add_clause(&[]);
        }

        for (index, &bit) in a.iter().enumerate() {
            self.add_clause(&[bit ^ !const_bit(value, index)])?;
        }

        Ok(())
    }

    /// The vector differs from the constant.
    pub fn add_ne_const(&mut self, a: &[Lit], value: u64) -> Result<(), SolverError> {
        if !const_in_range(value, a.len()) {
            return Ok(());
        }

        let differs: Vec<Lit> = a
            .iter()
            .enumerate()
            .map(|(index, &bit)| bit ^ const_bit(value, index))
            .collect();
        self.add_clause(&differs)
    }

    /// The vector is strictly smaller than the constant.
    pub fn add_lt_const(&mut self, a: &[Lit], value: u64) -> Result<(), SolverError> {
        if value == 0 {
            return self.add_clause(&[]);
        }
        if !const_in_range(value, a.len()) {
            return Ok(());
        }

        // At the highest differing bit the vector must be 0 and the constant 1: for every zero
        // bit of the constant, forbid the vector being 1 there while matching above.
        for (index, &bit) in a.iter().enumerate() {
            if !const_bit(value, index) {
                let mut clause = vec![!bit];
                clause.extend(self.const_differs_above(a, value, index));
                self.add_clause(&clause)?;
            }
        }

        self.add_ne_const(a, value)
    }

    /// The vector is smaller than or equal to the constant.
    pub fn add_le_const(&mut self, a: &[Lit], value: u64) -> Result<(), SolverError> {
        if !const_in_range(value, a.len()) || value == max_const(a.len()) {
            return Ok(());
        }
        self.add_lt_const(a, value + 1)
    }

    /// The vector is strictly greater than the constant.
    pub fn add_gt_const(&mut self, a: &[Lit], value: u64) -> Result<(), SolverError> {
        if !const_in_range(value, a.len()) || value == max_const(a.len()) {
            return self.add_clause(&[]);
        }

        for (index, &bit) in a.iter().enumerate() {
            if const_bit(value, index) {
                let mut clause = vec![bit];
                clause.extend(self.const_differs_above(a, value, index));
                self.add_clause(&clause)?;
            }
        }

        self.add_ne_const(a, value)
    }

    /// The vector is greater than or equal to the constant.
    pub fn add_ge_const(&mut self, a: &[Lit], value: u64) -> Result<(), SolverError> {
        if value == 0 {
            return Ok(());
        }
        if !const_in_range(value, a.len()) {
            return self.add_clause(&[]);
        }
        self.add_gt_const(a, value - 1)
    }

    /// A fresh literal that is true exactly when `a < b`, zero extending the shorter vector.
    fn encode_less(&mut self, a: &[Lit], b: &[Lit]) -> Result<Lit, SolverError> {
        let width = a.len().max(b.len());

        let mut a = a.to_vec();
        let mut b = b.to_vec();
        if a.len() != b.len() {
            let zero = self.constant_false_lit()?;
            a.resize(width, zero);
            b.resize(width, zero);
        }

        // Walk from the most significant bit down, tracking a literal that is true while all
        // higher bits are equal.
        let mut equal_above: Option<Lit> = None;
        let mut smaller_at = Vec::with_capacity(width);

        for index in (0..width).rev() {
            let bit_a = a[index];
            let bit_b = b[index];

            let here = self.fresh_lit();
            match equal_above {
                None => self.add_andgate(here, &[!bit_a, bit_b])?,
                Some(prefix) => self.add_andgate(here, &[prefix, !bit_a, bit_b])?,
            }
            smaller_at.push(here);

            if index > 0 {
                let bits_equal = self.fresh_lit();
                self.add_xnorgate(bits_equal, &[bit_a, bit_b])?;

                equal_above = Some(match equal_above {
                    None => bits_equal,
                    Some(prefix) => {
                        let chained = self.fresh_lit();
                        self.add_andgate(chained, &[prefix, bits_equal])?;
                        chained
                    }
                });
            }
        }

        let less = self.fresh_lit();
        self.add_orgate(less, &smaller_at)?;
        Ok(less)
    }

    /// Literals witnessing that the vector differs from the constant above the given bit.
    fn const_differs_above(&self, a: &[Lit], value: u64, index: usize) -> Vec<Lit> {
        a.iter()
            .enumerate()
            .skip(index + 1)
            .map(|(position, &bit)| bit ^ const_bit(value, position))
            .collect()
    }
}

fn const_bit(value: u64, index: usize) -> bool {
    index < 64 && (value >> index) & 1 != 0
}

fn const_in_range(value: u64, width: usize) -> bool {
    width >= 64 || value < (1u64 << width)
}

fn max_const(width: usize) -> u64 {
    if width >= 64 {
        u64::max_value()
    } else {
        (1u64 << width) - 1
    }
}
