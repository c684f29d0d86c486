//! A minimal text-based problem loader. This is a fixture format for building small synthetic
//! problems in tests and examples, not a PDDL or SAS+ grounder — grounding a real planning
//! domain into finite-domain variables is explicitly out of scope (see the problem-format
//! non-goal).
//!
//! Grammar (blank lines and `#`-prefixed lines are ignored):
//!
//! ```text
//! var <name> <range>            # declares the next variable, in order
//! init <v0> <v1> ...            # one value per declared variable, in order
//! goal <var> <val>              # repeatable; one fact per line
//! op <name> <cost>
//! pre <var> <val>               # repeatable, belongs to the most recent `op`
//! eff <var> <val>               # repeatable, belongs to the most recent `op`
//! ```

use crate::error::PlanError;
use crate::operator::{OpId, Operator, Operators};
use crate::variable::{Fact, VarId, VarSet, Variable};

#[derive(Debug)]
pub struct Problem {
    pub vars: VarSet,
    pub ops: Operators,
    pub init: Vec<u32>,
    pub goal: Vec<Fact>,
}

impl Problem {
    pub fn op_ids(&self) -> impl Iterator<Item = OpId> + '_ {
        self.ops.iter()
    }
}

pub fn load_text(src: &str) -> Result<Problem, PlanError> {
    let mut vars = VarSet::new();
    let mut ops = Operators::new();
    let mut init: Vec<u32> = Vec::new();
    let mut goal: Vec<Fact> = Vec::new();

    let mut pending_op: Option<(String, u32, Vec<Fact>, Vec<Fact>)> = None;
    let flush_op = |ops: &mut Operators, pending: &mut Option<(String, u32, Vec<Fact>, Vec<Fact>)>| {
        if let Some((name, cost, pre, eff)) = pending.take() {
            ops.push(Operator::new(name, pre, eff, cost));
        }
    };

    for (lineno, raw) in src.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let kw = parts.next().unwrap();
        let rest: Vec<&str> = parts.collect();
        let err = |msg: String| PlanError::Load(format!("line {}: {}", lineno + 1, msg));

        match kw {
            "var" => {
                let [name, range] = rest.as_slice() else {
                    return Err(err("expected `var <name> <range>`".into()));
                };
                let range: u32 = range
                    .parse()
                    .map_err(|_| err(format!("bad range {range:?}")))?;
                vars.push(Variable::new(*name, range));
            }
            "init" => {
                init = rest
                    .iter()
                    .map(|s| s.parse::<u32>().map_err(|_| err(format!("bad init value {s:?}"))))
                    .collect::<Result<_, _>>()?;
            }
            "goal" => {
                let [var, val] = rest.as_slice() else {
                    return Err(err("expected `goal <var> <val>`".into()));
                };
                goal.push(parse_fact(var, val, &err)?);
            }
            "op" => {
                flush_op(&mut ops, &mut pending_op);
                let [name, cost] = rest.as_slice() else {
                    return Err(err("expected `op <name> <cost>`".into()));
                };
                let cost: u32 = cost.parse().map_err(|_| err(format!("bad cost {cost:?}")))?;
                pending_op = Some((name.to_string(), cost, Vec::new(), Vec::new()));
            }
            "pre" => {
                let [var, val] = rest.as_slice() else {
                    return Err(err("expected `pre <var> <val>`".into()));
                };
                let fact = parse_fact(var, val, &err)?;
                match &mut pending_op {
                    Some((_, _, pre, _)) => pre.push(fact),
                    None => return Err(err("`pre` outside of an `op` block".into())),
                }
            }
            "eff" => {
                let [var, val] = rest.as_slice() else {
                    return Err(err("expected `eff <var> <val>`".into()));
                };
                let fact = parse_fact(var, val, &err)?;
                match &mut pending_op {
                    Some((_, _, _, eff)) => eff.push(fact),
                    None => return Err(err("`eff` outside of an `op` block".into())),
                }
            }
            other => return Err(err(format!("unknown directive {other:?}"))),
        }
    }
    flush_op(&mut ops, &mut pending_op);

    if init.len() != vars.len() {
        return Err(PlanError::Load(format!(
            "init has {} values but {} variables were declared",
            init.len(),
            vars.len()
        )));
    }

    Ok(Problem { vars, ops, init, goal })
}

fn parse_fact(
    var: &str,
    val: &str,
    err: &impl Fn(String) -> PlanError,
) -> Result<Fact, PlanError> {
    let var: usize = var.parse().map_err(|_| err(format!("bad var id {var:?}")))?;
    let val: u32 = val.parse().map_err(|_| err(format!("bad value {val:?}")))?;
    Ok(Fact::new(VarId::from(var), val))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "
        # two switches, one light wired to both
        var switch-a 2
        var switch-b 2
        var light 2

        init 0 0 0
        goal 2 1

        op flip-a 1
        pre switch-a-unused 0
    ";

    #[test]
    fn rejects_unknown_identifier_in_pre() {
        // `pre` fields are positional var ids, not names; this exercises the numeric-parse error
        // path rather than a name lookup.
        let err = load_text(SRC).unwrap_err();
        assert!(matches!(err, PlanError::Load(_)));
    }

    #[test]
    fn loads_well_formed_problem() {
        let src = "
            var a 2
            var b 2

            init 0 1

            op flip-a 1
            pre 0 0
            eff 0 1

            goal 0 1
        ";
        let problem = load_text(src).unwrap();
        assert_eq!(problem.vars.len(), 2);
        assert_eq!(problem.init, vec![0, 1]);
        assert_eq!(problem.goal, vec![Fact::new(VarId::from(0usize), 1)]);
        assert_eq!(problem.ops.len(), 1);
        let op = problem.ops.get(OpId::from(0usize));
        assert_eq!(op.name, "flip-a");
        assert_eq!(op.cost, 1);
    }

    #[test]
    fn mismatched_init_length_is_rejected() {
        let src = "
            var a 2
            var b 2
            init 0
        ";
        assert!(load_text(src).is_err());
    }
}
