//! Finite-domain variables and the agent-ownership metadata multi-agent search needs.

use plan_collections::create_ref_type;

create_ref_type!(VarId);

/// A bitset of agent ids, used for "which agents may use this value/operator". Plain `u64`
/// caps agent count at 64, which comfortably covers every multi-agent benchmark this planner
/// targets; if that ever needs lifting, this is the one place to widen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentMask(u64);

impl AgentMask {
    pub const EMPTY: AgentMask = AgentMask(0);

    pub fn singleton(agent: u32) -> Self {
        AgentMask(1u64 << agent)
    }

    pub fn insert(&mut self, agent: u32) {
        self.0 |= 1u64 << agent;
    }

    pub fn contains(&self, agent: u32) -> bool {
        self.0 & (1u64 << agent) != 0
    }

    pub fn union(&self, other: AgentMask) -> AgentMask {
        AgentMask(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..64).filter(move |&a| self.contains(a))
    }
}

/// One named value of a `Variable`.
#[derive(Debug, Clone, Default)]
pub struct ValueInfo {
    pub name: Option<String>,
    /// Agents whose operators reference this specific value.
    pub used_by: AgentMask,
}

/// A finite-domain state variable with range `[0, range)`.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub range: u32,
    pub values: Vec<ValueInfo>,
    /// True if only one agent's operators ever touch this variable (see the public/private
    /// definition in the glossary: a fact is private unless more than one agent's operator
    /// mentions it).
    pub is_private: bool,
    /// True for the single, distinguished ma-privacy variable that reserves a whole machine
    /// word to identify another agent's private sub-state. At most one variable in a `VarSet`
    /// may set this.
    pub ma_privacy: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, range: u32) -> Self {
        Variable {
            name: name.into(),
            range,
            values: (0..range).map(|_| ValueInfo::default()).collect(),
            is_private: false,
            ma_privacy: false,
        }
    }

    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    pub fn value_name(&self, val: u32) -> Option<&str> {
        self.values.get(val as usize).and_then(|v| v.name.as_deref())
    }
}

/// An ordered collection of `Variable`s, referenced (never owned) by the packer, operators,
/// partial states and heuristics.
#[derive(Debug, Clone, Default)]
pub struct VarSet {
    vars: Vec<Variable>,
}

impl VarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, var: Variable) -> VarId {
        self.vars.push(var);
        VarId::from(self.vars.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.vars.iter().enumerate().map(|(i, v)| (VarId::from(i), v))
    }

    pub fn ma_privacy_var(&self) -> Option<VarId> {
        self.iter().find(|(_, v)| v.ma_privacy).map(|(id, _)| id)
    }
}

impl std::ops::Index<VarId> for VarSet {
    type Output = Variable;
    fn index(&self, id: VarId) -> &Variable {
        &self.vars[usize::from(id)]
    }
}
impl std::ops::IndexMut<VarId> for VarSet {
    fn index_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.vars[usize::from(id)]
    }
}

/// A fact: a variable bound to one of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub var: VarId,
    pub val: u32,
}

impl Fact {
    pub fn new(var: VarId, val: u32) -> Self {
        Fact { var, val }
    }
}
