//! An `LpSolver` trait abstracting the flow and potential heuristics' linear programs away from
//! any particular backend, plus a dependency-free dense two-phase simplex as the default
//! implementation — so the flow/potential heuristics are never skipped for lack of an external
//! solver.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOp {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone)]
pub struct LpRow {
    pub coeffs: Vec<(usize, f64)>,
    pub op: RowOp,
    pub rhs: f64,
}

impl LpRow {
    pub fn new(op: RowOp, rhs: f64) -> Self {
        LpRow {
            coeffs: Vec::new(),
            op,
            rhs,
        }
    }

    pub fn with(mut self, var: usize, coeff: f64) -> Self {
        self.coeffs.push((var, coeff));
        self
    }
}

/// A maximization LP: `max c^T x` subject to `rows`, `x >= 0`.
#[derive(Debug, Clone)]
pub struct LpProblem {
    pub num_vars: usize,
    pub objective: Vec<f64>,
    pub rows: Vec<LpRow>,
}

impl LpProblem {
    pub fn new(num_vars: usize) -> Self {
        LpProblem {
            num_vars,
            objective: vec![0.0; num_vars],
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LpResult {
    Optimal { value: f64, assignment: Vec<f64> },
    Infeasible,
    Unbounded,
}

pub trait LpSolver {
    fn solve(&self, problem: &LpProblem) -> LpResult;
}

const EPS: f64 = 1e-9;

/// Dense tableau two-phase simplex. Handles `<=`/`>=`/`=` rows with possibly-negative RHS by
/// negating the row first; `>=` and `=` rows get an artificial variable driven out in phase 1.
#[derive(Default)]
pub struct TwoPhaseSimplex;

impl TwoPhaseSimplex {
    pub fn new() -> Self {
        TwoPhaseSimplex
    }
}

impl LpSolver for TwoPhaseSimplex {
    fn solve(&self, problem: &LpProblem) -> LpResult {
        solve_simplex(problem)
    }
}

struct Tableau {
    // rows x (num_vars + num_rows_with_slack_or_surplus + artificials + 1 rhs column)
    rows: Vec<Vec<f64>>,
    num_cols: usize,
    basis: Vec<usize>,
}

fn solve_simplex(problem: &LpProblem) -> LpResult {
    let n = problem.num_vars;
    let m = problem.rows.len();

    // Column layout: [0..n) structural, [n..n+m) slack/surplus (one per row), [n+m..n+m+k)
    // artificials (one per >=/= row), then rhs.
    let mut artificial_rows: Vec<usize> = Vec::new();
    for (i, row) in problem.rows.iter().enumerate() {
        if row.op != RowOp::Le || row.rhs < 0.0 {
            artificial_rows.push(i);
        }
    }
    let num_slack = m;
    let num_art = artificial_rows.len();
    let num_cols = n + num_slack + num_art + 1;
    let rhs_col = num_cols - 1;

    let mut rows = vec![vec![0.0; num_cols]; m];
    let mut basis = vec![usize::MAX; m];
    let mut art_idx_of_row = vec![None; m];
    {
        let mut next_art = n + num_slack;
        for (i, row) in problem.rows.iter().enumerate() {
            let mut rhs = row.rhs;
            let mut sign = 1.0;
            if rhs < 0.0 {
                sign = -1.0;
                rhs = -rhs;
            }
            for &(var, coeff) in &row.coeffs {
                rows[i][var] = sign * coeff;
            }
            let effective_op = if sign < 0.0 {
                match row.op {
                    RowOp::Le => RowOp::Ge,
                    RowOp::Ge => RowOp::Le,
                    RowOp::Eq => RowOp::Eq,
                }
            } else {
                row.op
            };
            rows[i][rhs_col] = rhs;
            let slack_col = n + i;
            match effective_op {
                RowOp::Le => {
                    rows[i][slack_col] = 1.0;
                    basis[i] = slack_col;
                }
                RowOp::Ge => {
                    rows[i][slack_col] = -1.0;
                    let art = next_art;
                    next_art += 1;
                    rows[i][art] = 1.0;
                    basis[i] = art;
                    art_idx_of_row[i] = Some(art);
                }
                RowOp::Eq => {
                    let art = next_art;
                    next_art += 1;
                    rows[i][art] = 1.0;
                    basis[i] = art;
                    art_idx_of_row[i] = Some(art);
                }
            }
        }
    }

    let mut tableau = Tableau { rows, num_cols, basis };

    if num_art > 0 {
        // Phase 1: minimize sum of artificials, i.e. maximize -sum(artificials).
        let mut phase1_obj = vec![0.0; num_cols];
        for i in n + num_slack..n + num_slack + num_art {
            phase1_obj[i] = -1.0;
        }
        if !run_simplex(&mut tableau, &phase1_obj) {
            return LpResult::Unbounded; // phase 1 is always bounded above by 0; unreachable in practice
        }
        let obj_value = objective_value(&tableau, &phase1_obj);
        if obj_value < -EPS {
            return LpResult::Infeasible;
        }
        // Drive any artificial still in the basis at value 0 out, if possible.
        for r in 0..tableau.basis.len() {
            if tableau.basis[r] >= n + num_slack {
                if let Some(pivot_col) = (0..n + num_slack).find(|&c| tableau.rows[r][c].abs() > EPS) {
                    pivot(&mut tableau, r, pivot_col);
                }
            }
        }
        // Zero out artificial columns so phase 2 can never reintroduce them.
        for art_col in n + num_slack..n + num_slack + num_art {
            for row in tableau.rows.iter_mut() {
                row[art_col] = 0.0;
            }
        }
    }

    let mut phase2_obj = vec![0.0; num_cols];
    phase2_obj[..n].copy_from_slice(&problem.objective);
    if !run_simplex(&mut tableau, &phase2_obj) {
        return LpResult::Unbounded;
    }
    let value = objective_value(&tableau, &phase2_obj);
    let mut assignment = vec![0.0; n];
    for (r, &b) in tableau.basis.iter().enumerate() {
        if b < n {
            assignment[b] = tableau.rows[r][rhs_col];
        }
    }
    LpResult::Optimal { value, assignment }
}

/// Maximizes `obj^T x` over the current tableau via the standard simplex pivoting rule. Returns
/// `false` if an unbounded direction is found.
fn run_simplex(tableau: &mut Tableau, obj: &[f64]) -> bool {
    let rhs_col = tableau.num_cols - 1;
    loop {
        // reduced costs: obj[j] - sum_r obj[basis[r]] * rows[r][j]
        let mut reduced = obj.to_vec();
        for (r, &b) in tableau.basis.iter().enumerate() {
            let cb = obj[b];
            if cb == 0.0 {
                continue;
            }
            for j in 0..tableau.num_cols {
                reduced[j] -= cb * tableau.rows[r][j];
            }
        }
        let entering = (0..rhs_col).filter(|&j| reduced[j] > EPS).max_by(|&a, &b| {
            reduced[a].partial_cmp(&reduced[b]).unwrap()
        });
        let Some(entering) = entering else { return true };

        let mut leaving: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for r in 0..tableau.rows.len() {
            let coeff = tableau.rows[r][entering];
            if coeff > EPS {
                let ratio = tableau.rows[r][rhs_col] / coeff;
                if ratio < best_ratio - EPS {
                    best_ratio = ratio;
                    leaving = Some(r);
                }
            }
        }
        let Some(leaving) = leaving else { return false };
        pivot(tableau, leaving, entering);
    }
}

fn pivot(tableau: &mut Tableau, row: usize, col: usize) {
    let pivot_val = tableau.rows[row][col];
    for v in tableau.rows[row].iter_mut() {
        *v /= pivot_val;
    }
    for r in 0..tableau.rows.len() {
        if r == row {
            continue;
        }
        let factor = tableau.rows[r][col];
        if factor.abs() > EPS {
            for c in 0..tableau.num_cols {
                let pr = tableau.rows[row][c];
                tableau.rows[r][c] -= factor * pr;
            }
        }
    }
    tableau.basis[row] = col;
}

fn objective_value(tableau: &Tableau, obj: &[f64]) -> f64 {
    let rhs_col = tableau.num_cols - 1;
    tableau
        .basis
        .iter()
        .enumerate()
        .map(|(r, &b)| obj[b] * tableau.rows[r][rhs_col])
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_maximization() {
        // max x + y s.t. x + 2y <= 4, 3x + y <= 6, x,y >= 0  => optimum at (8/5, 6/5), value 14/5
        let mut p = LpProblem::new(2);
        p.objective = vec![1.0, 1.0];
        p.rows.push(LpRow::new(RowOp::Le, 4.0).with(0, 1.0).with(1, 2.0));
        p.rows.push(LpRow::new(RowOp::Le, 6.0).with(0, 3.0).with(1, 1.0));
        let result = TwoPhaseSimplex::new().solve(&p);
        match result {
            LpResult::Optimal { value, .. } => assert!((value - 2.8).abs() < 1e-6),
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    #[test]
    fn detects_infeasible_system() {
        // x <= 1 and x >= 2 is infeasible.
        let mut p = LpProblem::new(1);
        p.objective = vec![1.0];
        p.rows.push(LpRow::new(RowOp::Le, 1.0).with(0, 1.0));
        p.rows.push(LpRow::new(RowOp::Ge, 2.0).with(0, 1.0));
        let result = TwoPhaseSimplex::new().solve(&p);
        assert!(matches!(result, LpResult::Infeasible));
    }

    #[test]
    fn solves_equality_constraint() {
        // max x s.t. x + y = 3, y >= 1  => x <= 2
        let mut p = LpProblem::new(2);
        p.objective = vec![1.0, 0.0];
        p.rows.push(LpRow::new(RowOp::Eq, 3.0).with(0, 1.0).with(1, 1.0));
        p.rows.push(LpRow::new(RowOp::Ge, 1.0).with(1, 1.0));
        let result = TwoPhaseSimplex::new().solve(&p);
        match result {
            LpResult::Optimal { value, .. } => assert!((value - 2.0).abs() < 1e-6),
            other => panic!("expected optimal, got {other:?}"),
        }
    }
}
