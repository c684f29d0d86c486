//! One multi-agent search thread: a local lazy best-first kernel (see `plan_search::lazy_bfs`,
//! which this replicates per-agent per §4.8) with the message loop folded into the step loop via
//! non-blocking `recv` between local expansions, exactly as §5 calls for so no mutex ever has to
//! guard the state pool.

use crate::comm::{Comm, CommError};
use crate::message::{Message, PublicState, TracePath};
use crate::snapshot::Snapshot;
use crate::terminate::Terminate;
use crate::trace::{self, TraceStep};
use plan_core::state_space::ExternalOrigin;
use plan_core::{Instance, OpId, PackedState, Path, StateID, Status};
use plan_heuristics::Heuristic;
use plan_search::kernel::{Context, SearchStats};
use plan_search::lazy_list::{Backend, Entry, LazyOpenList};
use plan_search::preferred::PreferredOpsPolicy;

/// A sentinel `resume_state` marking a `TracePath` as the final, fully-assembled plan rather than
/// a mid-trace handoff (no real `StateID` in this crate's address space ever reaches `u32::MAX`
/// in practice, since every pool is local to one process's run).
const FINAL_PLAN: u32 = u32::MAX;

#[derive(Debug)]
pub enum AgentStep {
    Continue,
    /// The termination ring has closed for this agent. Carries the assembled plan if this agent
    /// ever received (or produced) the final broadcast, `None` if it terminated without one
    /// (e.g. it ran out of local search space before any agent's goal was confirmed optimal).
    Terminated(Option<Path>),
}

pub struct MaAgent<'a, H: Heuristic, C: Comm> {
    id: u32,
    num_agents: u32,
    ctx: Context<'a>,
    heuristic: H,
    /// Operator view `heuristic.evaluate` is called against; see `crate::scope`. Successor
    /// generation always goes through `ctx.expand`, which uses the full instance regardless.
    heur_ops: plan_core::Operators,
    policy: PreferredOpsPolicy,
    open: LazyOpenList,
    comm: C,
    snapshot: Snapshot,
    terminate: Terminate,
    pending_goal: Option<StateID>,
    best_pending: u32,
    next_token: u32,
    plan: Option<Vec<OpId>>,
}

impl<'a, H: Heuristic, C: Comm> MaAgent<'a, H, C> {
    pub fn new(
        instance: &'a Instance,
        mut heuristic: H,
        heur_ops: plan_core::Operators,
        policy: PreferredOpsPolicy,
        backend: Backend,
        comm: C,
    ) -> Self {
        let id = comm.id();
        let num_agents = comm.num_peers();
        let mut ctx = Context::new(instance);
        let init = ctx.initial_state();
        let values = ctx.pool.get_values(init);
        let estimate = heuristic.evaluate(&instance.vars, &heur_ops, &instance.goal, &values);
        ctx.space.open(init, None, None, 0, estimate.h).expect("fresh state");

        let mut open = LazyOpenList::new(backend);
        let mut best_pending = u32::MAX;
        if !estimate.is_dead_end() {
            open.push(estimate.h, Entry { state: init, parent: None, op: None, g: 0 });
            best_pending = estimate.h;
        }

        MaAgent {
            id,
            num_agents,
            ctx,
            heuristic,
            heur_ops,
            policy,
            open,
            comm,
            snapshot: Snapshot::new(),
            terminate: Terminate::new(),
            pending_goal: None,
            best_pending,
            next_token: 0,
            plan: None,
        }
    }

    pub fn stats(&self) -> &SearchStats {
        &self.ctx.stats
    }

    fn fresh_token(&mut self) -> u32 {
        let token = (self.id << 24) | self.next_token;
        self.next_token += 1;
        token
    }

    /// Drains every message currently queued, dispatching each; during termination, anything
    /// that isn't part of the terminate protocol is silently discarded.
    fn drain_messages(&mut self) -> Result<(), CommError> {
        while let Some(msg) = self.comm.recv()? {
            if self.terminate.is_winding_down() && !matches!(msg, Message::TerminateRequest { .. } | Message::TerminateFinal { .. }) {
                continue;
            }
            self.handle_message(msg)?;
        }
        Ok(())
    }

    fn handle_message(&mut self, msg: Message) -> Result<(), CommError> {
        tracing::trace!(agent = self.id, ?msg, "handling message");
        match msg {
            Message::PublicState(ps) => self.handle_public_state(ps),
            Message::TracePath(tp) => self.handle_trace_path(tp)?,
            Message::SnapshotInit { token, cost, initiator } => {
                self.snapshot.handle_init(self.id, token, cost, initiator, self.best_pending, &self.comm)?;
            }
            Message::SnapshotResponse { token, from, lowest } => {
                if let Some(cost) = self.snapshot.handle_response(token, from, lowest, self.num_agents, &self.comm)? {
                    if let Some(goal) = self.pending_goal.take() {
                        self.begin_trace(token, goal)?;
                    } else {
                        // this agent's own prior goal was superseded before confirmation landed.
                        let _ = cost;
                    }
                }
            }
            Message::SnapshotFinal { .. } => {}
            Message::TerminateRequest { token, initiator } => {
                self.terminate.handle_request(self.id, token, initiator, &self.comm)?;
            }
            Message::TerminateFinal { token } => {
                self.terminate.handle_final(token);
            }
        }
        Ok(())
    }

    fn handle_public_state(&mut self, ps: PublicState) {
        let mut full = PackedState::zeroed(self.ctx.instance.packer.num_words());
        self.ctx.instance.packer.set_public(&mut full, &PackedState::from_words(ps.public_words));
        let id = self.ctx.pool.insert(full);
        let merged_h = self.ctx.space.get(id).map(|n| n.h).unwrap_or(0).max(ps.h);
        if matches!(self.ctx.space.status(id), Status::New) {
            self.ctx.space.open(id, None, None, ps.g, merged_h).expect("fresh state");
            self.ctx.space.set_external_origin(
                id,
                ExternalOrigin {
                    sender: ps.sender,
                    remote_id: StateID::from_u32(ps.remote_id),
                },
            );
            self.open.push(merged_h, Entry { state: id, parent: None, op: None, g: ps.g });
            self.best_pending = self.best_pending.min(merged_h);
        } else {
            self.ctx.space.set_h(id, merged_h);
        }
        self.snapshot.observe_public_cost(ps.g);
    }

    fn handle_trace_path(&mut self, tp: TracePath) -> Result<(), CommError> {
        if tp.resume_state == FINAL_PLAN {
            self.plan = Some(tp.ops.into_iter().map(OpId::from_u32).collect());
            if !self.terminate.is_winding_down() {
                let token = self.fresh_token();
                self.terminate.request(self.id, token, &self.comm)?;
            }
            return Ok(());
        }
        match trace::trace_local(&self.ctx.space, StateID::from_u32(tp.resume_state)) {
            TraceStep::Root { ops } => {
                let mut full = ops;
                full.extend(tp.ops.into_iter().map(OpId::from_u32));
                self.finish_trace(tp.token, full)?;
            }
            TraceStep::External { sender, remote_id, ops } => {
                trace::forward(&self.comm, self.id, tp.token, sender, remote_id, &ops, tp.ops)?;
            }
        }
        Ok(())
    }

    fn begin_trace(&mut self, token: u32, goal: StateID) -> Result<(), CommError> {
        match trace::trace_local(&self.ctx.space, goal) {
            TraceStep::Root { ops } => self.finish_trace(token, ops),
            TraceStep::External { sender, remote_id, ops } => {
                trace::forward(&self.comm, self.id, token, sender, remote_id, &ops, Vec::new())
            }
        }
    }

    fn finish_trace(&mut self, token: u32, ops: Vec<OpId>) -> Result<(), CommError> {
        self.plan = Some(ops.clone());
        let wire_ops = ops.iter().map(|op| op.to_u32()).collect();
        self.comm.send_to_all(Message::TracePath(TracePath {
            token,
            origin: self.id,
            resume_state: FINAL_PLAN,
            ops: wire_ops,
        }))?;
        let term_token = self.fresh_token();
        self.terminate.request(self.id, term_token, &self.comm)
    }

    /// Notifies every agent in `op`'s `owners` set (besides this one) that `succ` was generated.
    fn publish(&self, op: OpId, succ: StateID, g: u32, h: u32) -> Result<(), CommError> {
        let owners = self.ctx.instance.ops.get(op).owners;
        if owners.is_empty() {
            return Ok(());
        }
        let public_words = self.ctx.instance.packer.extract_public(self.ctx.pool.get_packed(succ)).words().to_vec();
        for peer in owners.iter() {
            if peer == self.id {
                continue;
            }
            self.comm.send_to(
                peer,
                Message::PublicState(PublicState {
                    sender: self.id,
                    remote_id: succ.to_u32(),
                    g,
                    h,
                    public_words: public_words.clone(),
                }),
            )?;
        }
        Ok(())
    }

    /// One iteration: drain pending messages, then (unless winding down) pop and process one
    /// local open-list entry the way `plan_search::lazy_bfs` does, plus the MA hooks: starting a
    /// snapshot on a local goal, and publishing successors to their operator's owning agents.
    pub fn step(&mut self) -> Result<AgentStep, CommError> {
        self.drain_messages()?;

        if self.terminate.is_done() {
            tracing::debug!(agent = self.id, "termination ring closed");
            return Ok(AgentStep::Terminated(self.plan.take().map(|ops| self.assemble_path(ops))));
        }
        if self.terminate.is_winding_down() {
            return Ok(AgentStep::Continue);
        }

        let Some(entry) = self.open.pop() else {
            // local search space exhausted with no goal found; wind down.
            tracing::debug!(agent = self.id, "local open list exhausted, requesting termination");
            let token = self.fresh_token();
            self.terminate.request(self.id, token, &self.comm)?;
            return Ok(AgentStep::Continue);
        };
        self.best_pending = u32::MAX; // conservative: recomputed as later pushes arrive

        let already_closed = matches!(self.ctx.space.status(entry.state), Status::Closed);
        let better_g_seen = self.ctx.space.get(entry.state).map(|n| n.g < entry.g).unwrap_or(false);
        if already_closed && better_g_seen {
            return Ok(AgentStep::Continue);
        }
        if matches!(self.ctx.space.status(entry.state), Status::New) {
            self.ctx.space.open(entry.state, entry.parent, entry.op, entry.g, 0).expect("fresh state");
        }

        if self.ctx.instance.goal_satisfied(&self.ctx.pool.get_values(entry.state)) {
            self.ctx.space.close(entry.state).ok();
            if !self.snapshot.is_initiating() {
                tracing::debug!(agent = self.id, cost = entry.g, "local goal reached, initiating snapshot");
                let token = self.fresh_token();
                self.pending_goal = Some(entry.state);
                self.snapshot.initiate(self.id, token, entry.g, self.best_pending, &self.comm)?;
            }
            return Ok(AgentStep::Continue);
        }

        let values = self.ctx.pool.get_values(entry.state);
        let estimate = self
            .heuristic
            .evaluate(&self.ctx.instance.vars, &self.heur_ops, &self.ctx.instance.goal, &values);
        self.ctx.stats.evaluated += 1;
        if estimate.is_dead_end() {
            self.ctx.stats.dead_ends += 1;
            return Ok(AgentStep::Continue);
        }
        self.ctx.space.set_h(entry.state, estimate.h);
        self.ctx.space.close(entry.state).ok();

        let succs = self.ctx.expand(entry.state);
        let mut ops: Vec<_> = succs.iter().map(|(op, _)| *op).collect();
        self.policy.order(&mut ops, &estimate.preferred);
        let order: hashbrown::HashMap<_, _> = ops.iter().enumerate().map(|(i, &o)| (o, i)).collect();
        let mut succs = succs;
        succs.sort_by_key(|(op, _)| order[op]);

        let parent_g = self.ctx.space.get(entry.state).map(|n| n.g).unwrap_or(0);
        for (op, succ) in succs {
            let cost = self.ctx.instance.ops.get(op).cost;
            let g = parent_g + cost;
            self.publish(op, succ, g, estimate.h)?;
            if matches!(self.ctx.space.status(succ), Status::New) {
                self.best_pending = self.best_pending.min(estimate.h);
                self.open.push(estimate.h, Entry { state: succ, parent: Some(entry.state), op: Some(op), g });
            }
        }

        Ok(AgentStep::Continue)
    }

    fn assemble_path(&self, ops: Vec<OpId>) -> Path {
        // The locally-held path object is only meaningful for a single agent's own segment of
        // history; the cross-agent plan this function reports is the flat op sequence assembled
        // by `finish_trace`/`handle_trace_path`, with no single agent's `StateSpace` covering the
        // full chain of states, so `states` is left empty rather than fabricated.
        Path { states: Vec::new(), ops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm_queue::build_pool;
    use plan_core::loader::Problem;
    use plan_core::{AgentMask, Fact, Operator, Operators, VarSet, Variable};
    use plan_heuristics::AddHeuristic;

    fn two_agent_instance() -> Instance {
        // agent 0 owns `step1` (touches the shared public var), agent 1 owns `step2`; both
        // operators are visible to both agents so a successor of either gets published.
        let mut vars = VarSet::new();
        vars.push(Variable::new("a", 3));

        let mut ops = Operators::new();
        let both = {
            let mut mask = AgentMask::EMPTY;
            mask.insert(0);
            mask.insert(1);
            mask
        };
        ops.push(Operator {
            owners: both,
            ..Operator::new("step1", vec![Fact::new(0usize.into(), 0)], vec![Fact::new(0usize.into(), 1)], 1).with_owner(0)
        });
        ops.push(Operator {
            owners: both,
            ..Operator::new("step2", vec![Fact::new(0usize.into(), 1)], vec![Fact::new(0usize.into(), 2)], 1).with_owner(1)
        });

        let problem = Problem {
            vars,
            ops,
            init: vec![0],
            goal: vec![Fact::new(0usize.into(), 2)],
        };
        Instance::build(problem).unwrap()
    }

    #[test]
    fn two_agents_exchange_public_states() {
        let instance = two_agent_instance();
        let pool = build_pool(2);
        let mut comms = pool.into_iter();
        let heur_ops = crate::scope::scoped_ops(&instance.ops, 0, crate::scope::HeurScope::Global);
        let mut a0 = MaAgent::new(
            &instance,
            AddHeuristic,
            heur_ops,
            PreferredOpsPolicy::None,
            Backend::Heap,
            comms.next().unwrap(),
        );
        let a1_comm = comms.next().unwrap();

        // agent 0 expands its own initial state and should publish the successor to agent 1.
        a0.step().unwrap();
        let msg = a1_comm.recv().unwrap();
        assert!(matches!(msg, Some(Message::PublicState(_))), "expected a public state, got {msg:?}");
    }
}
